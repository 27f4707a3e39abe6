//! Recognition-engine client (§4.2): multipart POST of the masked frame to
//! `/alpr`, plus the `/info/` poll used by the housekeeper.

pub mod bounds;

use reqwest::multipart;
use serde::Serialize;

use crate::config::device::SdkInformation;
use crate::error::{Result, YoloCamError};
use crate::reading::PlateReading;

pub struct RecognitionClient {
    http: reqwest::Client,
    base_url: String,
    token: String,
}

#[derive(Serialize)]
struct EngineConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    mode: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    detection_rule: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    detection_mode: Option<String>,
}

impl RecognitionClient {
    pub fn new(address: &str, token: String) -> Self {
        let http = reqwest::Client::builder()
            .build()
            .expect("reqwest client");
        RecognitionClient {
            http,
            base_url: format!("http://{address}"),
            token,
        }
    }

    /// POST `frame` (JPEG bytes) to `/alpr`; parses a non-2xx response as a
    /// NETWORK-class failure rather than panicking.
    pub async fn recognize(
        &self,
        frame: Vec<u8>,
        camera_id: &str,
        region: &str,
        mmc: bool,
    ) -> Result<PlateReading> {
        let cfg = EngineConfig {
            mode: None,
            detection_rule: None,
            detection_mode: None,
        };
        let cfg_json = serde_json::to_string(&cfg)?;

        let mut form = multipart::Form::new()
            .part("upload", multipart::Part::bytes(frame).file_name("frame.jpg"))
            .text("camera_id", camera_id.to_string())
            .text("config", cfg_json)
            .text("mmc", mmc.to_string());
        if !region.is_empty() {
            form = form.text("regions", region.to_string());
        }

        let resp = self
            .http
            .post(format!("{}/alpr", self.base_url))
            .header("Authorization", format!("Token {}", self.token))
            .multipart(form)
            .send()
            .await?;

        if !resp.status().is_success() {
            return Err(YoloCamError::Http(
                resp.error_for_status().unwrap_err(),
            ));
        }

        let mut reading: PlateReading = resp.json().await?;
        reading.results.retain(|r| !r.plate.is_empty());
        Ok(reading)
    }

    pub async fn info(&self) -> Result<SdkInformation> {
        let resp = self
            .http
            .get(format!("{}/info/", self.base_url))
            .header("Authorization", format!("Token {}", self.token))
            .send()
            .await?;
        Ok(resp.json().await?)
    }
}
