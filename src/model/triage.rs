use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SentimentValue {
    Positive,
    Neutral,
    Negative,
}

impl std::str::FromStr for SentimentValue {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "positive" => Ok(Self::Positive),
            "neutral" => Ok(Self::Neutral),
            "negative" => Ok(Self::Negative),
            _ => Err(format!("unknown sentiment '{}'", s)),
        }
    }
}

/// Sentiment as asserted by the classifier, confidence clamped.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sentiment {
    pub value: SentimentValue,
    pub confidence: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PriorityLevel {
    Low,
    Medium,
    High,
    Urgent,
}

impl std::str::FromStr for PriorityLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "low" => Ok(Self::Low),
            "medium" => Ok(Self::Medium),
            "high" => Ok(Self::High),
            "urgent" => Ok(Self::Urgent),
            _ => Err(format!("unknown priority '{}'", s)),
        }
    }
}

/// Priority block proposed by the classifier. Kept for audit only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassifierPriority {
    pub value: PriorityLevel,
    pub confidence: f64,
    pub signals: Vec<String>,
}

/// Priority computed by [`PriorityScorer`](crate::priority::PriorityScorer).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PriorityAssessment {
    pub value: PriorityLevel,
    pub confidence: f64,
    pub signals: Vec<String>,
    pub raw_score: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CustomerValue {
    New,
    Existing,
    Unknown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CustomerStatusSource {
    CrmExactMatch,
    CrmDomainMatch,
    TextSignal,
    NoCrmNoSignal,
    LookupFailed,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomerStatus {
    pub value: CustomerValue,
    pub confidence: f64,
    pub source: CustomerStatusSource,
}
