//! `DeviceParameters`: device identity, live status, statistics and
//! auxiliary-output status. Read-mostly at runtime; rewritten hourly by the
//! housekeeper and on `<SET_DEV_PARAMS>`.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct Device {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub model: String,
    #[serde(default)]
    pub firmwareVersion: String,
}

/// Connectivity/health snapshot surfaced over `<GET_DEV_PARAMS>` and in the
/// hourly `SystemStatus` monitor POST.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct Status {
    #[serde(default)]
    pub sdkStatus: bool,
    #[serde(default)]
    pub dockerStatus: bool,
    #[serde(default)]
    pub cameraConnected: bool,
    #[serde(default)]
    pub cpuTemperature: f64,
    #[serde(default)]
    pub cpuUsage: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct Statistics {
    #[serde(default)]
    pub decisions: u64,
    #[serde(default)]
    pub fanTime: f64,
    #[serde(default)]
    pub unexpectedReboots: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub struct OutputState {
    #[serde(default)]
    pub on: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct AuxiliaryStatus {
    #[serde(default)]
    pub output1: OutputState,
    #[serde(default)]
    pub output2: OutputState,
    #[serde(default)]
    pub fanOn: bool,
    #[serde(default)]
    pub irOn: bool,
    #[serde(default)]
    pub positionAlarmTripped: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct DeviceParameters {
    #[serde(default)]
    pub device: Device,
    #[serde(default)]
    pub status: Status,
    #[serde(default)]
    pub statistics: Statistics,
    #[serde(default)]
    pub auxiliary: AuxiliaryStatus,
}

/// `/info/` response consumed from the recognition engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SdkInformation {
    pub version: String,
    #[serde(rename = "license_key")]
    pub license_key: String,
}

/// Hourly monitor-POST payload shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SystemStatus {
    pub device: Device,
    pub status: Status,
    pub statistics: Statistics,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_through_json() {
        let doc = DeviceParameters::default();
        let raw = serde_json::to_string(&doc).unwrap();
        let back: DeviceParameters = serde_json::from_str(&raw).unwrap();
        assert_eq!(doc, back);
    }
}
