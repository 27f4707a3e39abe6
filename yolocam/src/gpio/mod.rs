//! GPIO abstraction and the auxiliary-output policy dispatcher (§4.7).
//! Concrete pin access is behind [`Gpio`] so the policy logic is testable
//! without a physical board; [`RppalGpio`] is the Linux/Raspberry Pi
//! backend, grounded on the rppal-based GPIO usage in the pack's Raspberry
//! Pi streamer/housekeeping examples.

pub mod gyro;

use std::time::Duration;

use crate::config::camera::{Auxiliary, IrMode, OutputPolicy};
use crate::error::Result;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Pin {
    Output1,
    Output2,
    Fan,
    InternalIr,
    RunLed,
    PlateLed,
}

pub trait Gpio: Send + Sync {
    fn set_high(&self, pin: Pin) -> Result<()>;
    fn set_low(&self, pin: Pin) -> Result<()>;
    fn is_high(&self, pin: Pin) -> Result<bool>;
}

#[cfg(target_os = "linux")]
pub struct RppalGpio {
    inner: std::sync::Mutex<std::collections::HashMap<Pin, rppal::gpio::OutputPin>>,
}

#[cfg(target_os = "linux")]
impl RppalGpio {
    pub fn open(pin_numbers: &std::collections::HashMap<Pin, u8>) -> Result<Self> {
        let gpio = rppal::gpio::Gpio::new()
            .map_err(|e| crate::error::YoloCamError::GpioUnavailable(e.to_string()))?;
        let mut pins = std::collections::HashMap::new();
        for (logical, bcm) in pin_numbers {
            let pin = gpio
                .get(*bcm)
                .map_err(|e| crate::error::YoloCamError::GpioUnavailable(e.to_string()))?
                .into_output();
            pins.insert(*logical, pin);
        }
        Ok(RppalGpio {
            inner: std::sync::Mutex::new(pins),
        })
    }
}

#[cfg(target_os = "linux")]
impl Gpio for RppalGpio {
    fn set_high(&self, pin: Pin) -> Result<()> {
        if let Some(p) = self.inner.lock().unwrap().get_mut(&pin) {
            p.set_high();
        }
        Ok(())
    }

    fn set_low(&self, pin: Pin) -> Result<()> {
        if let Some(p) = self.inner.lock().unwrap().get_mut(&pin) {
            p.set_low();
        }
        Ok(())
    }

    fn is_high(&self, pin: Pin) -> Result<bool> {
        Ok(self
            .inner
            .lock()
            .unwrap()
            .get(&pin)
            .map(|p| p.is_set_high())
            .unwrap_or(false))
    }
}

/// In-memory fake used off-device and in tests.
#[derive(Default)]
pub struct NullGpio {
    state: std::sync::Mutex<std::collections::HashMap<Pin, bool>>,
}

impl Gpio for NullGpio {
    fn set_high(&self, pin: Pin) -> Result<()> {
        self.state.lock().unwrap().insert(pin, true);
        Ok(())
    }
    fn set_low(&self, pin: Pin) -> Result<()> {
        self.state.lock().unwrap().insert(pin, false);
        Ok(())
    }
    fn is_high(&self, pin: Pin) -> Result<bool> {
        Ok(*self.state.lock().unwrap().get(&pin).unwrap_or(&false))
    }
}

/// Pulse `pin` high for `length`, driving it low afterward, spawned as a
/// fire-and-forget task (§5: "GPIO is single-writer per pin").
pub fn pulse(gpio: std::sync::Arc<dyn Gpio>, pin: Pin, length: Duration) {
    let _ = gpio.set_high(pin);
    tokio::spawn(async move {
        tokio::time::sleep(length).await;
        let _ = gpio.set_low(pin);
    });
}

fn apply_policy(gpio: &dyn Gpio, pin: Pin, policy: OutputPolicy, pulse_len: Duration, trigger: bool, running: bool) {
    match policy {
        OutputPolicy::None => {}
        OutputPolicy::RunningHigh => {
            let _ = if running { gpio.set_high(pin) } else { gpio.set_low(pin) };
        }
        OutputPolicy::WhitelistPulse
        | OutputPolicy::BlacklistPulse
        | OutputPolicy::NewPlatePulse
        | OutputPolicy::PositionAlarm
        | OutputPolicy::ExternalIrLight => {
            if trigger {
                let _ = gpio.set_high(pin);
                let _ = pulse_len;
            }
        }
    }
}

/// Fan hysteresis: on when `cpu_temp_c >= aux.startFan`, off at
/// `startFan - 7`, and forced on during the first 45 seconds of every
/// wall-clock hour (§4.7).
pub fn fan_should_be_on(cpu_temp_c: f64, fan_currently_on: bool, aux: &Auxiliary, minute: u32, second: u32) -> bool {
    let forced = minute * 100 + second <= 45;
    if forced {
        return true;
    }
    if fan_currently_on {
        cpu_temp_c > aux.startFan - 7.0
    } else {
        cpu_temp_c >= aux.startFan
    }
}

/// Internal IR line policy: off/on/auto, where auto gates on the current
/// brightness step vs `brightnessThreshold` (§4.1, §4.7).
pub fn internal_ir_should_be_on(aux: &Auxiliary, current_brightness_step: i32) -> bool {
    match aux.irLightControl.mode {
        IrMode::Off => false,
        IrMode::On => true,
        IrMode::Auto => current_brightness_step <= aux.irLightControl.brightnessThreshold,
    }
}

/// Dispatches the per-output policy for both auxiliary outputs, given the
/// triggering events observed this tick (§4.7).
pub struct AuxTriggers {
    pub whitelist_hit: bool,
    pub blacklist_hit: bool,
    pub new_plate: bool,
    pub position_alarm: bool,
    pub running: bool,
}

pub fn auxiliary_control(gpio: &dyn Gpio, aux: &Auxiliary, triggers: &AuxTriggers) {
    let pulse_len = Duration::from_secs_f64(aux.pulseLength);
    let trigger_for = |policy: OutputPolicy| match policy {
        OutputPolicy::WhitelistPulse => triggers.whitelist_hit,
        OutputPolicy::BlacklistPulse => triggers.blacklist_hit,
        OutputPolicy::NewPlatePulse => triggers.new_plate,
        OutputPolicy::PositionAlarm => triggers.position_alarm,
        OutputPolicy::ExternalIrLight => true,
        _ => false,
    };

    apply_policy(gpio, Pin::Output1, aux.output1, pulse_len, trigger_for(aux.output1), triggers.running);
    apply_policy(gpio, Pin::Output2, aux.output2, pulse_len, trigger_for(aux.output2), triggers.running);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fan_forces_on_at_top_of_hour() {
        let aux = Auxiliary::default();
        assert!(fan_should_be_on(10.0, false, &aux, 0, 30));
        assert!(!fan_should_be_on(10.0, false, &aux, 0, 46));
    }

    #[test]
    fn fan_hysteresis_outside_forced_window() {
        let mut aux = Auxiliary::default();
        aux.startFan = 60.0;
        assert!(fan_should_be_on(61.0, false, &aux, 30, 0));
        assert!(!fan_should_be_on(59.0, false, &aux, 30, 0));
        assert!(fan_should_be_on(54.0, true, &aux, 30, 0));
        assert!(!fan_should_be_on(52.0, true, &aux, 30, 0));
    }

    #[test]
    fn auxiliary_control_pulses_on_new_plate() {
        let gpio = NullGpio::default();
        let mut aux = Auxiliary::default();
        aux.output1 = OutputPolicy::NewPlatePulse;
        let triggers = AuxTriggers {
            whitelist_hit: false,
            blacklist_hit: false,
            new_plate: true,
            position_alarm: false,
            running: true,
        };
        auxiliary_control(&gpio, &aux, &triggers);
        assert!(gpio.is_high(Pin::Output1).unwrap());
    }
}
