use std::time::Duration;

use async_trait::async_trait;

use crate::decision::Decision;

use super::{Sink, SinkError};

/// Writes each decision to `decisions/<uuid>.yod`; delivery is the write
/// itself, so `send` never fails once `serialize` has succeeded.
pub struct FileSink;

#[async_trait]
impl Sink for FileSink {
    fn file_extension(&self) -> &'static str {
        "yod"
    }

    fn serialize(&self, decision: &Decision) -> Result<Vec<u8>, SinkError> {
        Ok(decision.to_compact_json()?.into_bytes())
    }

    async fn send(&self, _body: &[u8]) -> Result<(), SinkError> {
        Ok(())
    }

    fn retry_delay_hint(&self, _last_send_ok: bool) -> Duration {
        Duration::from_secs(0)
    }

    fn min_file_age(&self) -> Duration {
        Duration::from_secs(0)
    }
}

impl From<serde_json::Error> for SinkError {
    fn from(e: serde_json::Error) -> Self {
        SinkError::Transport(e.to_string())
    }
}
