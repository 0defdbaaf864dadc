use crate::model::{CandidateCatalog, PipelineVersion};

use super::error::ClassifierError;

/// What the classifier is asked to label.
#[derive(Debug, Clone, Copy)]
pub struct ClassifierRequest<'a> {
    pub message_id: &'a str,
    pub canonical_text: &'a str,
    pub catalog: &'a CandidateCatalog,
    pub pipeline_version: &'a PipelineVersion,
    /// 1-based attempt number within the validation loop.
    pub attempt: u32,
}

/// Upstream classification boundary. Returns the raw, untrusted JSON output.
pub trait Classifier: Send + Sync {
    fn classify(
        &self,
        request: &ClassifierRequest<'_>,
    ) -> impl std::future::Future<Output = Result<String, ClassifierError>> + Send;
}

/// Replays a recorded classifier output on every attempt.
#[derive(Debug, Clone)]
pub struct ReplayClassifier {
    raw_output: String,
}

impl ReplayClassifier {
    pub fn new(raw_output: impl Into<String>) -> Self {
        Self {
            raw_output: raw_output.into(),
        }
    }

    pub fn raw_output(&self) -> &str {
        &self.raw_output
    }
}

impl Classifier for ReplayClassifier {
    async fn classify(&self, _request: &ClassifierRequest<'_>) -> Result<String, ClassifierError> {
        Ok(self.raw_output.clone())
    }
}

#[cfg(any(test, feature = "mock"))]
#[derive(Debug, Clone)]
enum MockResponse {
    Output(String),
    Unavailable(String),
}

/// Scripted classifier. Responses are served in order; the last one repeats.
#[cfg(any(test, feature = "mock"))]
#[derive(Debug, Default)]
pub struct MockClassifier {
    responses: parking_lot::Mutex<std::collections::VecDeque<MockResponse>>,
    last: parking_lot::Mutex<Option<MockResponse>>,
    calls: std::sync::atomic::AtomicU32,
    delay: Option<std::time::Duration>,
}

#[cfg(any(test, feature = "mock"))]
impl MockClassifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Always answers with `raw_output`.
    pub fn always(raw_output: impl Into<String>) -> Self {
        Self::new().then_output(raw_output)
    }

    pub fn then_output(self, raw_output: impl Into<String>) -> Self {
        self.responses
            .lock()
            .push_back(MockResponse::Output(raw_output.into()));
        self
    }

    pub fn then_unavailable(self, reason: impl Into<String>) -> Self {
        self.responses
            .lock()
            .push_back(MockResponse::Unavailable(reason.into()));
        self
    }

    /// Sleeps before answering; used to exercise the per-attempt timeout.
    pub fn with_delay(mut self, delay: std::time::Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn calls(&self) -> u32 {
        self.calls.load(std::sync::atomic::Ordering::Acquire)
    }

    fn next_response(&self) -> Option<MockResponse> {
        let mut responses = self.responses.lock();
        let mut last = self.last.lock();
        if let Some(next) = responses.pop_front() {
            *last = Some(next);
        }
        last.clone()
    }
}

#[cfg(any(test, feature = "mock"))]
impl Classifier for MockClassifier {
    async fn classify(&self, _request: &ClassifierRequest<'_>) -> Result<String, ClassifierError> {
        self.calls
            .fetch_add(1, std::sync::atomic::Ordering::AcqRel);
        let response = self.next_response();

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        match response {
            Some(MockResponse::Output(raw)) => Ok(raw),
            Some(MockResponse::Unavailable(reason)) => Err(ClassifierError::Unavailable { reason }),
            None => Err(ClassifierError::Unavailable {
                reason: "mock classifier has no scripted response".to_string(),
            }),
        }
    }
}
