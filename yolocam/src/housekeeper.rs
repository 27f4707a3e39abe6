//! Single-threaded timed dispatcher driving everything that isn't on the
//! capture/recognize/aggregate hot path (§4.6): LED/fan/IR/position-alarm
//! policy, decision-queue draining into the configured sink, sink retry
//! pumps, Excel rollover, email drain, hourly status POST, and daily
//! pruning/firmware check. Ticks on a single 250ms base interval with
//! modular counters for the coarser intervals, mirroring the original's
//! independent-counter design without spinning up one timer per interval.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, RwLock};
use std::time::{Duration, Instant};

use crate::config::camera::{CameraParameters, SinkKind};
use crate::gpio::gyro::TiltSensor;
use crate::gpio::{auxiliary_control, AuxTriggers, Gpio, Pin};
use crate::outbox::email_sink::EmailConfig;
use crate::outbox::{self, Sink};
use crate::recognition::RecognitionClient;
use crate::state::AppState;

const TICK: Duration = Duration::from_millis(250);
const TICKS_PER_SEC: u64 = 4;

pub struct HousekeeperDeps {
    pub gpio: Arc<dyn Gpio>,
    pub tilt: Arc<dyn TiltSensor>,
    pub recognition: Arc<RecognitionClient>,
    pub email: EmailConfig,
}

pub async fn run(state: Arc<AppState>, deps: HousekeeperDeps) -> crate::error::Result<()> {
    let mut tick = tokio::time::interval(TICK);
    let mut ticks: u64 = 0;
    let baseline_tilt: RwLock<Option<(f64, f64)>> = RwLock::new(None);
    let fan_on = std::sync::atomic::AtomicBool::new(false);
    let watchdog = AtomicU32::new(0);
    let mut post_due_at = Instant::now();
    let mut post_delay = Duration::from_secs(2);

    loop {
        if !state.is_started() {
            break;
        }
        tokio::select! {
            _ = tick.tick() => {
                ticks += 1;

                run_250ms(&state, deps.gpio.as_ref(), ticks);

                if ticks % TICKS_PER_SEC == 0 {
                    run_1s(&state, deps.gpio.as_ref(), deps.tilt.as_ref(), &baseline_tilt, &fan_on, &watchdog, &deps.recognition).await;
                }
                if ticks % (2 * TICKS_PER_SEC) == 0 {
                    run_2s(&state);
                }
                if Instant::now() >= post_due_at {
                    post_delay = run_post_delay(&state).await;
                    post_due_at = Instant::now() + post_delay;
                }
                if ticks % (30 * TICKS_PER_SEC) == 0 {
                    run_30s(&state);
                }
                if ticks % (300 * TICKS_PER_SEC) == 0 {
                    run_5min(&state, &deps.email).await;
                }
                if ticks % (3600 * TICKS_PER_SEC) == 0 {
                    run_1h(&state, &deps.recognition).await;
                }
                if ticks % (86400 * TICKS_PER_SEC) == 0 {
                    run_daily(&state).await;
                }
            }
            _ = state.shutdown.notified() => break,
        }
    }

    shutdown_sequence(&state, deps.gpio.as_ref());
    Ok(())
}

fn run_250ms(state: &AppState, gpio: &dyn Gpio, ticks: u64) {
    let _ = if ticks % 2 == 0 {
        gpio.set_high(Pin::RunLed)
    } else {
        gpio.set_low(Pin::RunLed)
    };

    let camera: CameraParameters = state.camera.read().unwrap().as_ref().clone();
    let last_plate = state.decisions.read().unwrap().iter().last().map(|d| d.plate.clone());
    let whitelist_hit = last_plate
        .as_deref()
        .map(|p| state.whitelist.read().unwrap().contains(p))
        .unwrap_or(false);
    let blacklist_hit = last_plate
        .as_deref()
        .map(|p| state.blacklist.read().unwrap().contains(p))
        .unwrap_or(false);
    let new_plate = *state.new_plate_flag.read().unwrap();
    let position_alarm = state.device.read().unwrap().as_ref().auxiliary.positionAlarmTripped;

    let triggers = AuxTriggers {
        whitelist_hit,
        blacklist_hit,
        new_plate,
        position_alarm,
        running: state.is_started(),
    };
    auxiliary_control(gpio, &camera.auxiliary, &triggers);
}

#[allow(clippy::too_many_arguments)]
async fn run_1s(
    state: &AppState,
    gpio: &dyn Gpio,
    tilt: &dyn TiltSensor,
    baseline_tilt: &RwLock<Option<(f64, f64)>>,
    fan_on: &std::sync::atomic::AtomicBool,
    watchdog: &AtomicU32,
    recognition: &RecognitionClient,
) {
    let camera = state.camera.read().unwrap().as_ref().clone();
    let was_fan_on = fan_on.load(Ordering::SeqCst);

    let cpu_temp = read_cpu_temperature().unwrap_or(0.0);
    let (minute, second) = wall_clock_minute_second();
    let should_fan = crate::gpio::fan_should_be_on(cpu_temp, was_fan_on, &camera.auxiliary, minute, second);
    if should_fan != was_fan_on {
        let _ = if should_fan { gpio.set_high(Pin::Fan) } else { gpio.set_low(Pin::Fan) };
        fan_on.store(should_fan, Ordering::SeqCst);
    }

    let wd = watchdog.fetch_add(1, Ordering::SeqCst) % 100;

    if let Ok((pitch, roll)) = tilt.read_tilt() {
        let mut baseline = baseline_tilt.write().unwrap();
        if baseline.is_none() {
            *baseline = Some((pitch, roll));
        }
        if let Some(base) = *baseline {
            let tripped = crate::gpio::gyro::position_alarm_tripped(base, (pitch, roll), camera.auxiliary.positionAlarm);
            state.device.write().unwrap().modify(|d| {
                d.auxiliary.positionAlarmTripped = tripped;
            });
        }
    }

    state.device.write().unwrap().modify(|d| {
        d.status.cpuTemperature = cpu_temp;
        d.status.cameraConnected = state_camera_connected(state);
        if should_fan {
            d.statistics.fanTime += 1.0;
        }
    });

    if wd < 30 {
        if let Ok(info) = recognition.info().await {
            state.device.write().unwrap().modify(|d| {
                d.status.sdkStatus = true;
                d.device.firmwareVersion = info.version.clone();
            });
        }
    }
}

fn state_camera_connected(state: &AppState) -> bool {
    state.frame_slot.peek().is_some()
}

fn run_2s(state: &AppState) {
    let camera = state.camera.read().unwrap().as_ref().clone();
    let interface = camera.lpr.interface.clone();

    let mut decisions = state.decisions.write().unwrap();
    let ready: Vec<_> = decisions
        .iter()
        .filter(|d| !d.pending && !d.delete && !d.dispatched)
        .map(|d| d.uuid)
        .collect();

    for uuid in ready {
        let Some(decision) = decisions.iter_mut().find(|d| d.uuid == uuid) else {
            continue;
        };
        let outcome = match interface.kind {
            SinkKind::Api => Ok(()),
            SinkKind::File => outbox::enqueue(&state.paths.decisions_dir(), &crate::outbox::file_sink::FileSink, decision),
            SinkKind::Excel => {
                let bucket = crate::outbox::excel_sink::Bucket::from_options(&interface.options);
                crate::outbox::excel_sink::add_row(&state.paths.excel_dir(), bucket, decision, chrono::Utc::now())
                    .map_err(|e| crate::outbox::SinkError::Transport(e.to_string()))
            }
            SinkKind::Webhook => {
                let sink = crate::outbox::webhook_sink::WebhookSink::new(
                    interface.address.clone(),
                    interface.auth,
                    interface.username.clone(),
                    interface.password.clone(),
                );
                outbox::enqueue(&state.paths.post_dir(), &sink, decision)
            }
            SinkKind::Ftp => {
                let sink = crate::outbox::ftp_sink::FtpSink::new(
                    interface.address.clone(),
                    interface.port,
                    interface.username.clone(),
                    interface.password.clone(),
                    interface.options.clone(),
                );
                outbox::enqueue(&state.paths.ftp_dir(), &sink, decision)
            }
            SinkKind::Socket => {
                let sink = crate::outbox::socket_sink::SocketSink::new(interface.address.clone(), interface.port, &interface.options);
                outbox::enqueue(&state.paths.tcp_dir(), &sink, decision)
            }
        };

        if let Err(e) = outcome {
            crate::logging::log_event(crate::logging::EventKind::Warning, &format!("decision dispatch failed: {e}"));
            continue;
        }
        decision.dispatched = true;
        state.device.write().unwrap().modify(|d| d.statistics.decisions += 1);
    }
}

/// Drives the configured sink's retry pump; returns the next delay to wait
/// before calling again, per that sink's success/failure backoff schedule.
async fn run_post_delay(state: &AppState) -> Duration {
    let interface = state.camera.read().unwrap().as_ref().lpr.interface.clone();
    let (dir, sink): (std::path::PathBuf, Box<dyn Sink>) = match interface.kind {
        SinkKind::Webhook => (
            state.paths.post_dir(),
            Box::new(crate::outbox::webhook_sink::WebhookSink::new(
                interface.address.clone(),
                interface.auth,
                interface.username.clone(),
                interface.password.clone(),
            )),
        ),
        SinkKind::Ftp => (
            state.paths.ftp_dir(),
            Box::new(crate::outbox::ftp_sink::FtpSink::new(
                interface.address.clone(),
                interface.port,
                interface.username.clone(),
                interface.password.clone(),
                interface.options.clone(),
            )),
        ),
        SinkKind::Socket => (
            state.paths.tcp_dir(),
            Box::new(crate::outbox::socket_sink::SocketSink::new(interface.address.clone(), interface.port, &interface.options)),
        ),
        SinkKind::File | SinkKind::Excel | SinkKind::Api => return Duration::from_secs(2),
    };

    match outbox::drain_oldest(&dir, sink.as_ref()).await {
        Some(ok) => sink.retry_delay_hint(ok),
        None => Duration::from_secs(2),
    }
}

fn run_30s(state: &AppState) {
    let device = state.device.read().unwrap().as_ref().clone();
    let camera = state.camera.read().unwrap().as_ref().clone();
    let lpr_enabled = !camera.lpr.region.is_empty() || camera.lpr.minRecognitions > 0;
    if device.status.dockerStatus && lpr_enabled && device.status.cameraConnected && !device.status.sdkStatus {
        crate::logging::log_event(
            crate::logging::EventKind::Error,
            "recognition engine usage counter appears stuck",
        );
    }
}

async fn run_5min(state: &AppState, email: &EmailConfig) {
    if email.host.is_empty() {
        return;
    }
    let email_dir = state.paths.email_dir();
    let Ok(entries) = std::fs::read_dir(&email_dir) else {
        return;
    };
    for entry in entries.filter_map(|e| e.ok()) {
        let path = entry.path();
        if path.extension().and_then(|s| s.to_str()) != Some("eml") {
            continue;
        }
        let Ok(bytes) = std::fs::read(&path) else { continue };
        let name = path.file_stem().and_then(|s| s.to_str()).unwrap_or("attachment").to_string();
        let monitor = state.camera.read().unwrap().as_ref().monitor.clone();
        let result = crate::outbox::email_sink::send_with_attachment(
            email,
            &monitor.url,
            "yolocam decision export",
            "Attached is the rolled decision export.",
            &format!("{name}.xlsx"),
            bytes,
        )
        .await;
        match result {
            Ok(()) => {
                let _ = std::fs::remove_file(&path);
            }
            Err(e) => {
                crate::logging::log_event(crate::logging::EventKind::Network, &format!("email send failed: {e}"));
            }
        }
    }
}

async fn run_1h(state: &AppState, recognition: &RecognitionClient) {
    let doc = state.device.read().unwrap().as_ref().clone();
    let status = crate::config::device::SystemStatus {
        device: doc.device.clone(),
        status: doc.status.clone(),
        statistics: doc.statistics.clone(),
    };
    let monitor = state.camera.read().unwrap().as_ref().monitor.clone();
    if !monitor.url.is_empty() {
        if let Ok(body) = serde_json::to_string(&status) {
            let client = reqwest::Client::new();
            if let Err(e) = client.post(&monitor.url).header("Content-Type", "application/json").body(body).send().await {
                crate::logging::log_event(crate::logging::EventKind::Network, &format!("status POST failed: {e}"));
            }
        }
    }

    if let Ok(info) = recognition.info().await {
        state.device.write().unwrap().modify(|d| {
            d.status.sdkStatus = true;
            d.device.firmwareVersion = info.version;
        });
    }

    crate::logging::reset_fatal_counter();
    let _ = state.persist_device_config();
}

async fn run_daily(state: &AppState) {
    const DAY: Duration = Duration::from_secs(86400);
    outbox::prune_older_than(&state.paths.logs_dir(), DAY * 30);
    for dir in [state.paths.post_dir(), state.paths.ftp_dir(), state.paths.tcp_dir(), state.paths.flushed_dir()] {
        outbox::prune_older_than(&dir, DAY * 60);
    }
    outbox::prune_older_than(&state.paths.excel_dir(), DAY * 365);

    let camera = state.camera.read().unwrap().as_ref().clone();
    let bucket = crate::outbox::excel_sink::Bucket::from_options(&camera.lpr.interface.options);
    let current_key_now = chrono::Utc::now();
    let current_key = match bucket {
        crate::outbox::excel_sink::Bucket::Daily => current_key_now.format("%Y-%m-%d").to_string(),
        crate::outbox::excel_sink::Bucket::Weekly => {
            use chrono::Datelike;
            format!("{}-W{:02}", current_key_now.year(), current_key_now.iso_week().week())
        }
        crate::outbox::excel_sink::Bucket::Monthly => current_key_now.format("%Y-%m").to_string(),
    };
    let _ = crate::outbox::excel_sink::roll_over(&state.paths.excel_dir(), &current_key);

    match crate::firmware::check_and_apply(&camera.firmware, &state.paths.data_dir).await {
        Ok(true) => state.request_shutdown(),
        Ok(false) => {}
        Err(e) => crate::logging::log_event(crate::logging::EventKind::Warning, &format!("firmware check failed: {e}")),
    }
}

fn shutdown_sequence(state: &AppState, gpio: &dyn Gpio) {
    let _ = state.persist_device_config();
    let _ = state.persist_camera_config();
    for pin in [Pin::Output1, Pin::Output2, Pin::Fan, Pin::InternalIr, Pin::RunLed, Pin::PlateLed] {
        let _ = gpio.set_low(pin);
    }
}

fn read_cpu_temperature() -> Option<f64> {
    #[cfg(target_os = "linux")]
    {
        let raw = std::fs::read_to_string("/sys/class/thermal/thermal_zone0/temp").ok()?;
        let milli: f64 = raw.trim().parse().ok()?;
        Some(milli / 1000.0)
    }
    #[cfg(not(target_os = "linux"))]
    {
        None
    }
}

fn wall_clock_minute_second() -> (u32, u32) {
    use chrono::Timelike;
    let now = chrono::Utc::now();
    (now.minute(), now.second())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gpio::NullGpio;

    #[test]
    fn run_250ms_toggles_run_led() {
        let state = AppState::new(std::env::temp_dir().join(format!("yolocam-hk-test-{}", uuid::Uuid::new_v4())));
        let gpio = NullGpio::default();
        run_250ms(&state, &gpio, 2);
        assert!(gpio.is_high(Pin::RunLed).unwrap());
        run_250ms(&state, &gpio, 3);
        assert!(!gpio.is_high(Pin::RunLed).unwrap());
    }

    #[test]
    fn run_30s_flags_stuck_sdk_usage() {
        let state = AppState::new(std::env::temp_dir().join(format!("yolocam-hk-test-{}", uuid::Uuid::new_v4())));
        state.device.write().unwrap().modify(|d| {
            d.status.dockerStatus = true;
            d.status.cameraConnected = true;
            d.status.sdkStatus = false;
        });
        crate::logging::reset_fatal_counter();
        run_30s(&state);
        assert!(crate::logging::FATAL_ERROR_COUNT.load(std::sync::atomic::Ordering::SeqCst) >= 1);
    }
}
