use serde::{Deserialize, Serialize};

/// Kind of model behind the classifier call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModelType {
    #[default]
    Chat,
    Reasoning,
}

/// Version tuple stamped unmodified on every assembled record.
///
/// Same input + same tuple must yield the same output.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PipelineVersion {
    #[serde(alias = "dictionaryversion")]
    pub dictionary_version: u32,
    #[serde(alias = "modelversion")]
    pub model_version: String,
    #[serde(default, alias = "model_type")]
    pub model_type: ModelType,
    #[serde(alias = "parserversion")]
    pub parser_version: String,
    #[serde(alias = "stoplistversion")]
    pub stoplist_version: String,
    #[serde(alias = "nermodelversion")]
    pub ner_model_version: String,
    #[serde(alias = "schemaversion")]
    pub schema_version: String,
}

impl PipelineVersion {
    /// Short tag used in log fields.
    pub fn tag(&self) -> String {
        format!("pipeline-{}-{}", self.dictionary_version, self.model_version)
    }
}

impl std::fmt::Display for PipelineVersion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "dict={} model={} ({:?}) parser={} stoplist={} ner={} schema={}",
            self.dictionary_version,
            self.model_version,
            self.model_type,
            self.parser_version,
            self.stoplist_version,
            self.ner_model_version,
            self.schema_version
        )
    }
}
