use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;

use crate::config::camera::AuthMethod;
use crate::decision::Decision;

use super::{Sink, SinkError};

/// Posts decisions to a configured webhook URL. Holds inter-post delay at
/// 60s after failure and collapses to 2s after a 200 response (§4.4).
pub struct WebhookSink {
    client: Client,
    url: String,
    auth: AuthMethod,
    username: String,
    password: String,
    last_ok: AtomicBool,
}

impl WebhookSink {
    pub fn new(url: String, auth: AuthMethod, username: String, password: String) -> Self {
        let client = Client::builder()
            .danger_accept_invalid_certs(true)
            .timeout(Duration::from_secs(10))
            .build()
            .expect("reqwest client");
        WebhookSink {
            client,
            url,
            auth,
            username,
            password,
            last_ok: AtomicBool::new(true),
        }
    }
}

#[async_trait]
impl Sink for WebhookSink {
    fn file_extension(&self) -> &'static str {
        "yop"
    }

    fn serialize(&self, decision: &Decision) -> Result<Vec<u8>, SinkError> {
        Ok(decision
            .to_compact_json()
            .map_err(|e| SinkError::Transport(e.to_string()))?
            .into_bytes())
    }

    async fn send(&self, body: &[u8]) -> Result<(), SinkError> {
        let mut req = self
            .client
            .post(&self.url)
            .header("Content-Type", "application/json")
            .body(body.to_vec());

        req = match self.auth {
            AuthMethod::Basic | AuthMethod::Proxy => req.basic_auth(&self.username, Some(&self.password)),
            AuthMethod::Digest | AuthMethod::None => req,
        };

        let resp = req
            .send()
            .await
            .map_err(|e| SinkError::Transport(e.to_string()))?;

        if resp.status().is_success() {
            self.last_ok.store(true, Ordering::SeqCst);
            Ok(())
        } else {
            self.last_ok.store(false, Ordering::SeqCst);
            Err(SinkError::Rejected(resp.status().to_string()))
        }
    }

    fn retry_delay_hint(&self, last_send_ok: bool) -> Duration {
        if last_send_ok {
            Duration::from_secs(2)
        } else {
            Duration::from_secs(60)
        }
    }

    fn min_file_age(&self) -> Duration {
        Duration::from_secs(5)
    }
}
