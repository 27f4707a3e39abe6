//! `CameraParameters`: the tunable half of the configuration split described
//! in SPEC_FULL.md §4.8. Field names mirror the wire names used by the
//! control protocol and the recognition engine so that `<GET_CAM_PARAMS>`
//! round-trips byte-for-byte with external tooling.

use serde::{Deserialize, Serialize};

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Size {
    pub width: u32,
    pub height: u32,
}

impl Default for Size {
    fn default() -> Self {
        Size {
            width: 1920,
            height: 1080,
        }
    }
}

/// Pixel margin from each frame edge, in the bounds-check sieve (§4.2).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub struct Margin {
    pub left: u32,
    pub top: u32,
    pub right: u32,
    pub bottom: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub struct Position {
    pub x: i32,
    pub y: i32,
}

/// Mask polygon plus the grey fill value applied outside it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageMask {
    pub points: Vec<Position>,
    #[serde(default = "default_mask_fill")]
    pub fill: u8,
}

fn default_mask_fill() -> u8 {
    160
}

impl Default for ImageMask {
    fn default() -> Self {
        ImageMask {
            points: Vec::new(),
            fill: default_mask_fill(),
        }
    }
}

/// Camera connection and image tuning. `PartialEq` backs the
/// change-detection the control server performs on `<SET_CAM_PARAMS>`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Camera {
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub resolution: Size,
    /// Mounting rotation in degrees: one of 0, 90, 180, 270.
    #[serde(default)]
    pub angle: u16,
    #[serde(default)]
    pub exposure: i32,
    #[serde(default = "default_true")]
    pub autoExposure: bool,
    /// 0 selects auto-brightness (§4.1); nonzero is applied directly.
    #[serde(default)]
    pub brightness: i32,
    #[serde(default)]
    pub contrast: i32,
    #[serde(default)]
    pub hue: i32,
    #[serde(default)]
    pub saturation: i32,
    #[serde(default)]
    pub sharpness: i32,
    #[serde(default)]
    pub gamma: i32,
    #[serde(default)]
    pub gain: i32,
    #[serde(default)]
    pub imageMask: ImageMask,
}

impl Default for Camera {
    fn default() -> Self {
        Camera {
            address: String::new(),
            resolution: Size::default(),
            angle: 0,
            exposure: 0,
            autoExposure: true,
            brightness: 0,
            contrast: 0,
            hue: 0,
            saturation: 0,
            sharpness: 0,
            gamma: 0,
            gain: 0,
            imageMask: ImageMask::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct CropDecision {
    pub width: u32,
    pub height: u32,
}

/// `direction.both`/`unknown` share bucket `3`, matching the original
/// bitmask-style filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DirectionFilter {
    Front = 1,
    Rear = 2,
    Both = 3,
}

impl Default for DirectionFilter {
    fn default() -> Self {
        DirectionFilter::Both
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DecisionModel {
    AccessControl,
    FreeFlow,
}

impl Default for DecisionModel {
    fn default() -> Self {
        DecisionModel::FreeFlow
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SelectedDecision {
    First,
    Middle,
    Last,
}

impl Default for SelectedDecision {
    fn default() -> Self {
        SelectedDecision::Last
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SinkKind {
    File,
    Excel,
    Webhook,
    Ftp,
    Socket,
    Api,
}

impl Default for SinkKind {
    fn default() -> Self {
        SinkKind::File
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AuthMethod {
    None,
    Basic,
    Digest,
    Proxy,
}

impl Default for AuthMethod {
    fn default() -> Self {
        AuthMethod::None
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct SinkInterface {
    #[serde(rename = "type")]
    pub kind: SinkKind,
    /// Destination host/URL/directory depending on `kind`.
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub port: u16,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub auth: AuthMethod,
    /// `;`-separated option keys; semantics depend on `kind` (EXCEL bucket
    /// granularity, SOCKET payload field list).
    #[serde(default)]
    pub options: String,
}

/// The master LPR tunables struct.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LprOptions {
    #[serde(default = "default_min_recognitions")]
    pub minRecognitions: u32,
    #[serde(default = "default_true")]
    pub useCandidates: bool,
    #[serde(default)]
    pub selectedDecision: SelectedDecision,
    /// Milliseconds subtracted... applied as a forward shift to reading
    /// timestamps before enqueue.
    #[serde(default)]
    pub decisionDelay: i64,
    #[serde(default = "default_result_expire")]
    pub resultExpireTime: f64,
    #[serde(default = "default_plate_blocking")]
    pub plateBlockingTime: f64,
    /// Percentage hysteresis disambiguating left/right vs front/rear.
    #[serde(default = "default_direction_threshold")]
    pub directionThreshold: f64,
    /// Height of the visible scene in centimeters at the camera's mounting
    /// distance, used with `camera.resolution.height` to convert a track's
    /// pixel displacement into a speed (§4.3 step 4). `0` disables speed
    /// estimation.
    #[serde(default)]
    pub frameHeight: f64,
    #[serde(default)]
    pub directionFilter: DirectionFilter,
    #[serde(default)]
    pub denyNumericDecision: bool,
    #[serde(default = "default_frame_rate")]
    pub frameRate: f64,
    #[serde(default)]
    pub decisionModel: DecisionModel,
    #[serde(default)]
    pub cropDecision: Option<CropDecision>,
    /// Forward-looking post-buffer offset for full-scene attachment; `<= 0`
    /// reads from the rolling video buffer instead.
    #[serde(default)]
    pub includeFullImage: i32,
    #[serde(default)]
    pub region: String,
    #[serde(default)]
    pub margin: Margin,
    #[serde(default = "default_plate_size_max")]
    pub plateSizeMax: u32,
    #[serde(default = "default_plate_size_min")]
    pub plateSizeMin: u32,
    #[serde(default = "default_text_score")]
    pub textScoreMin: f64,
    #[serde(default = "default_plate_score")]
    pub plateScoreMin: f64,
    #[serde(default)]
    pub interface: SinkInterface,
}

fn default_min_recognitions() -> u32 {
    3
}
fn default_result_expire() -> f64 {
    2.0
}
fn default_plate_blocking() -> f64 {
    5.0
}
fn default_direction_threshold() -> f64 {
    20.0
}
fn default_frame_rate() -> f64 {
    2.0
}
fn default_plate_size_max() -> u32 {
    600
}
fn default_plate_size_min() -> u32 {
    30
}
fn default_text_score() -> f64 {
    0.7
}
fn default_plate_score() -> f64 {
    0.5
}

impl Default for LprOptions {
    fn default() -> Self {
        LprOptions {
            minRecognitions: default_min_recognitions(),
            useCandidates: true,
            selectedDecision: SelectedDecision::default(),
            decisionDelay: 0,
            resultExpireTime: default_result_expire(),
            plateBlockingTime: default_plate_blocking(),
            directionThreshold: default_direction_threshold(),
            frameHeight: 0.0,
            directionFilter: DirectionFilter::default(),
            denyNumericDecision: false,
            frameRate: default_frame_rate(),
            decisionModel: DecisionModel::default(),
            cropDecision: None,
            includeFullImage: 0,
            region: String::new(),
            margin: Margin::default(),
            plateSizeMax: default_plate_size_max(),
            plateSizeMin: default_plate_size_min(),
            textScoreMin: default_text_score(),
            plateScoreMin: default_plate_score(),
            interface: SinkInterface::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub struct DecisionRecording {
    #[serde(default)]
    pub enabled: bool,
    /// Number of frames either side of the decision frame to encode.
    #[serde(default = "default_recording_length")]
    pub length: u32,
}

fn default_recording_length() -> u32 {
    25
}

impl Default for VideoStream {
    fn default() -> Self {
        VideoStream {
            decisionRecording: DecisionRecording {
                enabled: false,
                length: default_recording_length(),
            },
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct VideoStream {
    pub decisionRecording: DecisionRecording,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OutputPolicy {
    None,
    WhitelistPulse,
    BlacklistPulse,
    RunningHigh,
    NewPlatePulse,
    PositionAlarm,
    ExternalIrLight,
}

impl Default for OutputPolicy {
    fn default() -> Self {
        OutputPolicy::None
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum IrMode {
    Off,
    On,
    Auto,
}

impl Default for IrMode {
    fn default() -> Self {
        IrMode::Auto
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct IrLightControl {
    #[serde(default)]
    pub mode: IrMode,
    #[serde(default = "default_brightness_threshold")]
    pub brightnessThreshold: i32,
}

fn default_brightness_threshold() -> i32 {
    0
}

impl Default for IrLightControl {
    fn default() -> Self {
        IrLightControl {
            mode: IrMode::default(),
            brightnessThreshold: default_brightness_threshold(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Auxiliary {
    #[serde(default)]
    pub output1: OutputPolicy,
    #[serde(default)]
    pub output2: OutputPolicy,
    #[serde(default = "default_pulse_length")]
    pub pulseLength: f64,
    #[serde(default)]
    pub irLightControl: IrLightControl,
    #[serde(default = "default_start_fan")]
    pub startFan: f64,
    #[serde(default = "default_position_alarm")]
    pub positionAlarm: f64,
}

fn default_pulse_length() -> f64 {
    0.5
}
fn default_start_fan() -> f64 {
    60.0
}
fn default_position_alarm() -> f64 {
    15.0
}

impl Default for Auxiliary {
    fn default() -> Self {
        Auxiliary {
            output1: OutputPolicy::default(),
            output2: OutputPolicy::default(),
            pulseLength: default_pulse_length(),
            irLightControl: IrLightControl::default(),
            startFan: default_start_fan(),
            positionAlarm: default_position_alarm(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct Firmware {
    #[serde(default)]
    pub autoUpdate: bool,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub version: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct Monitor {
    #[serde(default)]
    pub url: String,
    #[serde(default = "default_monitor_interval")]
    pub interval: u64,
}

fn default_monitor_interval() -> u64 {
    3600
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CameraParameters {
    #[serde(default)]
    pub camera: Camera,
    #[serde(default)]
    pub lpr: LprOptions,
    #[serde(default)]
    pub videoStream: VideoStream,
    #[serde(default)]
    pub auxiliary: Auxiliary,
    #[serde(default)]
    pub firmware: Firmware,
    #[serde(default)]
    pub monitor: Monitor,
}

impl Default for CameraParameters {
    fn default() -> Self {
        CameraParameters {
            camera: Camera::default(),
            lpr: LprOptions::default(),
            videoStream: VideoStream::default(),
            auxiliary: Auxiliary::default(),
            firmware: Firmware::default(),
            monitor: Monitor {
                url: String::new(),
                interval: default_monitor_interval(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_through_json() {
        let doc = CameraParameters::default();
        let raw = serde_json::to_string(&doc).unwrap();
        let back: CameraParameters = serde_json::from_str(&raw).unwrap();
        assert_eq!(doc, back);
    }

    #[test]
    fn missing_fields_fall_back_to_defaults() {
        let doc: CameraParameters = serde_json::from_str("{}").unwrap();
        assert_eq!(doc.lpr.minRecognitions, 3);
        assert_eq!(doc.lpr.frameRate, 2.0);
    }

    #[test]
    fn camera_equality_covers_image_mask() {
        let mut a = Camera::default();
        let b = a.clone();
        assert_eq!(a, b);
        a.imageMask.points.push(Position { x: 1, y: 1 });
        assert_ne!(a, b);
    }
}
