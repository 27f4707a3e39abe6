use std::time::Duration;

use async_trait::async_trait;
use suppaftp::AsyncFtpStream;

use crate::decision::Decision;

use super::{Sink, SinkError};

/// Uploads decisions to an FTPS server; success requires the server's
/// `226 Transfer complete` on stream close (§4.4).
pub struct FtpSink {
    host: String,
    port: u16,
    username: String,
    password: String,
    remote_dir: String,
}

impl FtpSink {
    pub fn new(host: String, port: u16, username: String, password: String, remote_dir: String) -> Self {
        FtpSink {
            host,
            port,
            username,
            password,
            remote_dir,
        }
    }
}

#[async_trait]
impl Sink for FtpSink {
    fn file_extension(&self) -> &'static str {
        "yod"
    }

    fn serialize(&self, decision: &Decision) -> Result<Vec<u8>, SinkError> {
        Ok(decision
            .to_compact_json()
            .map_err(|e| SinkError::Transport(e.to_string()))?
            .into_bytes())
    }

    async fn send(&self, body: &[u8]) -> Result<(), SinkError> {
        let addr = format!("{}:{}", self.host, self.port);
        let mut ftp = AsyncFtpStream::connect(&addr)
            .await
            .map_err(|e| SinkError::Transport(e.to_string()))?;
        ftp.login(&self.username, &self.password)
            .await
            .map_err(|e| SinkError::Transport(e.to_string()))?;
        if !self.remote_dir.is_empty() {
            ftp.cwd(&self.remote_dir)
                .await
                .map_err(|e| SinkError::Transport(e.to_string()))?;
        }
        let name = uuid::Uuid::new_v4().to_string();
        let mut cursor = std::io::Cursor::new(body.to_vec());
        ftp.put_file(format!("{name}.yod"), &mut cursor)
            .await
            .map_err(|e| SinkError::Transport(e.to_string()))?;
        ftp.quit().await.map_err(|e| SinkError::Transport(e.to_string()))?;
        Ok(())
    }

    fn retry_delay_hint(&self, last_send_ok: bool) -> Duration {
        if last_send_ok {
            Duration::from_secs(2)
        } else {
            Duration::from_secs(30)
        }
    }

    fn min_file_age(&self) -> Duration {
        Duration::from_secs(5)
    }
}
