//! Position-alarm accelerometer/gyroscope read-out over I2C (§4.7). The
//! camera mount's baseline tilt is captured at `<CALIBRATE_POSITION>`, and
//! the housekeeper's 1s tick compares the live reading against it.

use crate::error::{Result, YoloCamError};

/// Default I2C address for the accelerometer used on the reference mount
/// (matches the ADXL345-family address seen across the pack's I2C examples).
pub const DEFAULT_I2C_ADDRESS: u16 = 0x53;

pub trait TiltSensor: Send + Sync {
    /// Returns `(pitch_deg, roll_deg)`.
    fn read_tilt(&self) -> Result<(f64, f64)>;
}

#[cfg(target_os = "linux")]
pub struct I2cTiltSensor {
    dev: std::sync::Mutex<rppal::i2c::I2c>,
}

#[cfg(target_os = "linux")]
impl I2cTiltSensor {
    pub fn open(address: u16) -> Result<Self> {
        let mut i2c = rppal::i2c::I2c::new()
            .map_err(|e| YoloCamError::GpioUnavailable(e.to_string()))?;
        i2c.set_slave_address(address)
            .map_err(|e| YoloCamError::GpioUnavailable(e.to_string()))?;
        Ok(I2cTiltSensor {
            dev: std::sync::Mutex::new(i2c),
        })
    }
}

#[cfg(target_os = "linux")]
impl TiltSensor for I2cTiltSensor {
    fn read_tilt(&self) -> Result<(f64, f64)> {
        let mut buf = [0u8; 6];
        self.dev
            .lock()
            .unwrap()
            .read(&mut buf)
            .map_err(|e| YoloCamError::GpioUnavailable(e.to_string()))?;
        let x = i16::from_le_bytes([buf[0], buf[1]]) as f64;
        let y = i16::from_le_bytes([buf[2], buf[3]]) as f64;
        let z = i16::from_le_bytes([buf[4], buf[5]]) as f64;
        let pitch = (x / z.max(1.0)).atan().to_degrees();
        let roll = (y / z.max(1.0)).atan().to_degrees();
        Ok((pitch, roll))
    }
}

/// In-memory fake returning a fixed reading, for tests and non-Linux builds.
pub struct FixedTiltSensor(pub f64, pub f64);

impl TiltSensor for FixedTiltSensor {
    fn read_tilt(&self) -> Result<(f64, f64)> {
        Ok((self.0, self.1))
    }
}

/// Angular distance between the live reading and the calibrated baseline.
fn deviation_degrees(baseline: (f64, f64), current: (f64, f64)) -> f64 {
    let dp = current.0 - baseline.0;
    let dr = current.1 - baseline.1;
    (dp * dp + dr * dr).sqrt()
}

/// True once the mount has rotated past `threshold_deg` from its calibrated
/// baseline (`auxiliary.positionAlarm`, default 15°).
pub fn position_alarm_tripped(baseline: (f64, f64), current: (f64, f64), threshold_deg: f64) -> bool {
    deviation_degrees(baseline, current) >= threshold_deg
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deviation_within_threshold_does_not_trip() {
        assert!(!position_alarm_tripped((0.0, 0.0), (5.0, 5.0), 15.0));
    }

    #[test]
    fn deviation_past_threshold_trips() {
        assert!(position_alarm_tripped((0.0, 0.0), (12.0, 12.0), 15.0));
    }
}
