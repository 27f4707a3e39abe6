//! Network-camera backend: pulls one JPEG snapshot per `grab_jpeg()` call
//! from an HTTP/MJPEG-capable camera at `camera.address`. The tuning knobs
//! (exposure, gain, ...) are sent back via the same HTTP control surface
//! most IP cameras expose, best-effort — a camera that rejects a setting
//! logs a warning rather than failing the capture loop.

use crate::config::camera::Camera as CameraConfig;
use crate::error::{Result, YoloCamError};

use super::CameraSource;

pub struct IpCameraSource {
    http: reqwest::blocking::Client,
    snapshot_url: String,
    control_url: String,
}

impl IpCameraSource {
    pub fn open(cfg: &CameraConfig) -> Result<Self> {
        if cfg.address.is_empty() {
            return Err(YoloCamError::Camera("no camera address configured".to_string()));
        }
        let http = reqwest::blocking::Client::builder()
            .timeout(std::time::Duration::from_secs(5))
            .build()
            .map_err(YoloCamError::Http)?;
        Ok(IpCameraSource {
            http,
            snapshot_url: format!("http://{}/snapshot.jpg", cfg.address),
            control_url: format!("http://{}/control", cfg.address),
        })
    }
}

impl CameraSource for IpCameraSource {
    fn configure(&mut self, cfg: &CameraConfig) -> Result<()> {
        let body = serde_json::json!({
            "exposure": cfg.exposure,
            "autoExposure": cfg.autoExposure,
            "brightness": cfg.brightness,
            "contrast": cfg.contrast,
            "hue": cfg.hue,
            "saturation": cfg.saturation,
            "sharpness": cfg.sharpness,
            "gamma": cfg.gamma,
            "gain": cfg.gain,
        });
        if let Err(e) = self.http.post(&self.control_url).json(&body).send() {
            crate::logging::log_event(
                crate::logging::EventKind::Warning,
                &format!("camera control request failed: {e}"),
            );
        }
        Ok(())
    }

    fn grab_jpeg(&mut self) -> Result<Vec<u8>> {
        let resp = self.http.get(&self.snapshot_url).send().map_err(YoloCamError::Http)?;
        if !resp.status().is_success() {
            return Err(YoloCamError::Camera(format!("snapshot request returned {}", resp.status())));
        }
        Ok(resp.bytes().map_err(YoloCamError::Http)?.to_vec())
    }
}
