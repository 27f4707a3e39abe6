use std::time::Duration;

use async_trait::async_trait;
use tokio::io::AsyncWriteExt;
use tokio::net::TcpStream;

use crate::decision::Decision;

use super::{Sink, SinkError};

/// Control-character name table for the SOCKET sink's `options` field,
/// mirroring the original's `ASCII` option-substitution table.
fn control_char(name: &str) -> Option<u8> {
    match name {
        "STX" => Some(0x02),
        "ETX" => Some(0x03),
        "EOT" => Some(0x04),
        "CR" => Some(0x0D),
        "LF" => Some(0x0A),
        _ => None,
    }
}

/// Opens a TCP connection per transfer, assembles a `;`-joined payload from
/// `options`-selected decision fields (or control characters), sends, closes.
pub struct SocketSink {
    host: String,
    port: u16,
    options: Vec<String>,
}

impl SocketSink {
    pub fn new(host: String, port: u16, options: &str) -> Self {
        let options = options
            .split(';')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();
        SocketSink { host, port, options }
    }

    fn assemble_payload(&self, decision: &Decision) -> Result<Vec<u8>, SinkError> {
        let value = serde_json::to_value(decision).map_err(|e| SinkError::Transport(e.to_string()))?;
        let mut parts: Vec<Vec<u8>> = Vec::new();
        for key in &self.options {
            if let Some(byte) = control_char(key) {
                parts.push(vec![byte]);
            } else if let Some(field) = value.get(key) {
                let s = match field {
                    serde_json::Value::String(s) => s.clone(),
                    other => other.to_string(),
                };
                parts.push(s.into_bytes());
            }
        }
        Ok(parts.join(&b";"[..]))
    }
}

#[async_trait]
impl Sink for SocketSink {
    fn file_extension(&self) -> &'static str {
        "yod"
    }

    fn serialize(&self, decision: &Decision) -> Result<Vec<u8>, SinkError> {
        decision
            .to_compact_json()
            .map(|s| s.into_bytes())
            .map_err(|e| SinkError::Transport(e.to_string()))
    }

    async fn send(&self, body: &[u8]) -> Result<(), SinkError> {
        let decision: Decision = serde_json::from_slice(body).map_err(|e| SinkError::Transport(e.to_string()))?;
        let payload = self.assemble_payload(&decision)?;
        let addr = format!("{}:{}", self.host, self.port);
        let mut stream = TcpStream::connect(&addr)
            .await
            .map_err(|e| SinkError::Transport(e.to_string()))?;
        stream
            .write_all(&payload)
            .await
            .map_err(|e| SinkError::Transport(e.to_string()))?;
        stream.shutdown().await.map_err(|e| SinkError::Transport(e.to_string()))?;
        Ok(())
    }

    fn retry_delay_hint(&self, last_send_ok: bool) -> Duration {
        if last_send_ok {
            Duration::from_millis(800)
        } else {
            Duration::from_secs(30)
        }
    }

    fn min_file_age(&self) -> Duration {
        Duration::from_millis(800)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decision::Direction;
    use crate::reading::BBox;
    use std::collections::HashSet;

    fn sample() -> Decision {
        Decision {
            device_address: "cam0".into(),
            uuid: uuid::Uuid::new_v4(),
            timestamp: "2026-01-01T00:00:00Z".into(),
            plate: "ABC123".into(),
            direction: Direction::Front,
            score: 0.9,
            dscore: 0.9,
            image: String::new(),
            full_image: None,
            rectangle: BBox::default(),
            speed: 10.0,
            region: Default::default(),
            vehicle: None,
            candidates: vec![],
            pending: false,
            delete: false,
            index: 0,
            acked_by: HashSet::new(),
            dispatched: false,
        }
    }

    #[test]
    fn assembles_payload_with_control_chars() {
        let sink = SocketSink::new("127.0.0.1".into(), 9000, "STX;plate;ETX");
        let payload = sink.assemble_payload(&sample()).unwrap();
        assert_eq!(payload, b"\x02;ABC123;\x03".to_vec());
    }
}
