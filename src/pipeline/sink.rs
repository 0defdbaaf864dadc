use crate::model::AssembledRecord;

use super::error::SinkError;

/// Audit store for classifier payloads, acting as the write barrier.
///
/// Raw output is recorded for every attempt that produced one. The normalized record is
/// written only when the message reaches `Done`, so a rejected message leaves raw payloads
/// behind and nothing else.
pub trait PayloadSink: Send + Sync {
    fn record_raw(
        &self,
        message_id: &str,
        attempt: u32,
        raw_output: &str,
    ) -> impl std::future::Future<Output = Result<(), SinkError>> + Send;

    fn record_normalized(
        &self,
        message_id: &str,
        record: &AssembledRecord,
    ) -> impl std::future::Future<Output = Result<(), SinkError>> + Send;
}

/// Sink used when no audit store is wired in.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoPayloadSink;

impl PayloadSink for NoPayloadSink {
    async fn record_raw(
        &self,
        _message_id: &str,
        _attempt: u32,
        _raw_output: &str,
    ) -> Result<(), SinkError> {
        Ok(())
    }

    async fn record_normalized(
        &self,
        _message_id: &str,
        _record: &AssembledRecord,
    ) -> Result<(), SinkError> {
        Ok(())
    }
}

/// One raw classifier payload as written to a [`MockPayloadSink`].
#[cfg(any(test, feature = "mock"))]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawPayload {
    pub message_id: String,
    pub attempt: u32,
    pub raw_output: String,
}

/// In-memory sink that keeps every write.
#[cfg(any(test, feature = "mock"))]
#[derive(Debug, Default)]
pub struct MockPayloadSink {
    raw: parking_lot::Mutex<Vec<RawPayload>>,
    normalized: parking_lot::Mutex<Vec<AssembledRecord>>,
    fail: bool,
}

#[cfg(any(test, feature = "mock"))]
impl MockPayloadSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every write fails and nothing is kept.
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub fn raw_payloads(&self) -> Vec<RawPayload> {
        self.raw.lock().clone()
    }

    pub fn normalized(&self) -> Vec<AssembledRecord> {
        self.normalized.lock().clone()
    }

    fn check(&self) -> Result<(), SinkError> {
        if self.fail {
            return Err(SinkError::WriteFailed {
                reason: "mock sink unavailable".to_string(),
            });
        }
        Ok(())
    }
}

#[cfg(any(test, feature = "mock"))]
impl PayloadSink for MockPayloadSink {
    async fn record_raw(
        &self,
        message_id: &str,
        attempt: u32,
        raw_output: &str,
    ) -> Result<(), SinkError> {
        self.check()?;
        self.raw.lock().push(RawPayload {
            message_id: message_id.to_string(),
            attempt,
            raw_output: raw_output.to_string(),
        });
        Ok(())
    }

    async fn record_normalized(
        &self,
        _message_id: &str,
        record: &AssembledRecord,
    ) -> Result<(), SinkError> {
        self.check()?;
        self.normalized.lock().push(record.clone());
        Ok(())
    }
}
