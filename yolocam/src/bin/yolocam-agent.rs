//! Long-running LPR appliance process: wires `AppState` to the capture,
//! recognizer, housekeeper, and control-server activities, then blocks on a
//! shutdown signal.

use std::sync::Arc;

use clap::Parser;

use yolocam::capture::ip_source::IpCameraSource;
use yolocam::cli::AgentArgs;
use yolocam::control;
use yolocam::gpio::gyro::{FixedTiltSensor, TiltSensor};
use yolocam::gpio::{Gpio, NullGpio};
use yolocam::housekeeper::{self, HousekeeperDeps};
use yolocam::outbox::email_sink::EmailConfig;
use yolocam::recognition::RecognitionClient;
use yolocam::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _logger = yolocam::logging::init();
    let args = AgentArgs::parse();

    let data_dir = yolocam::config::expand_path(&args.data_dir)?;
    let state = Arc::new(AppState::load_from_disk(data_dir));

    let recognition = Arc::new(RecognitionClient::new(&args.address, args.token.clone()));
    let device_address = {
        let doc = state.device.read().unwrap();
        let addr = doc.as_ref().device.address.clone();
        if addr.is_empty() {
            args.address.clone()
        } else {
            addr
        }
    };

    let gpio: Arc<dyn Gpio> = open_gpio(args.no_gpio);
    let tilt: Arc<dyn TiltSensor> = open_tilt(args.no_gpio);

    let camera_cfg = state.camera.read().unwrap().as_ref().camera.clone();
    let capture_source: Box<dyn yolocam::capture::CameraSource> = Box::new(IpCameraSource::open(&camera_cfg)?);
    let reopen_address = camera_cfg.address.clone();
    let open_source = move || -> yolocam::Result<Box<dyn yolocam::capture::CameraSource>> {
        let cfg = yolocam::config::camera::Camera {
            address: reopen_address.clone(),
            ..Default::default()
        };
        Ok(Box::new(IpCameraSource::open(&cfg)?))
    };

    let mut tasks = Vec::new();

    tasks.push(tokio::spawn(yolocam::capture::run_capture_loop(
        state.clone(),
        capture_source,
        open_source,
    )));

    tasks.push(tokio::spawn(yolocam::recognizer::run(
        state.clone(),
        recognition.clone(),
        device_address,
    )));

    tasks.push(tokio::spawn(housekeeper::run(
        state.clone(),
        HousekeeperDeps {
            gpio,
            tilt,
            recognition: recognition.clone(),
            email: EmailConfig::default(),
        },
    )));

    {
        let state = state.clone();
        tasks.push(tokio::spawn(async move {
            let _ = control::command_server::run(state, control::COMMAND_PORT).await;
        }));
    }
    {
        let state = state.clone();
        tasks.push(tokio::spawn(async move {
            let _ = control::stream_server::run(state, control::STREAM_PORT).await;
        }));
    }
    {
        let state = state.clone();
        tasks.push(tokio::spawn(async move {
            let _ = control::web_server::run(state, control::WEB_PORT).await;
        }));
    }

    tokio::signal::ctrl_c().await?;
    yolocam::logging::log_event(yolocam::logging::EventKind::Debug, "shutdown signal received");
    state.request_shutdown();

    for task in tasks {
        let _ = task.await;
    }

    Ok(())
}

fn open_gpio(no_gpio: bool) -> Arc<dyn Gpio> {
    #[cfg(target_os = "linux")]
    {
        if !no_gpio {
            let mut pins = std::collections::HashMap::new();
            pins.insert(yolocam::gpio::Pin::Output1, 17u8);
            pins.insert(yolocam::gpio::Pin::Output2, 27u8);
            pins.insert(yolocam::gpio::Pin::Fan, 22u8);
            pins.insert(yolocam::gpio::Pin::InternalIr, 23u8);
            pins.insert(yolocam::gpio::Pin::RunLed, 24u8);
            pins.insert(yolocam::gpio::Pin::PlateLed, 25u8);
            match yolocam::gpio::RppalGpio::open(&pins) {
                Ok(g) => return Arc::new(g),
                Err(e) => {
                    yolocam::logging::log_event(
                        yolocam::logging::EventKind::Error,
                        &format!("GPIO unavailable, falling back to null backend: {e}"),
                    );
                }
            }
        }
    }
    let _ = no_gpio;
    Arc::new(NullGpio::default())
}

fn open_tilt(no_gpio: bool) -> Arc<dyn TiltSensor> {
    #[cfg(target_os = "linux")]
    {
        if !no_gpio {
            match yolocam::gpio::gyro::I2cTiltSensor::open(yolocam::gpio::gyro::DEFAULT_I2C_ADDRESS) {
                Ok(s) => return Arc::new(s),
                Err(e) => {
                    yolocam::logging::log_event(
                        yolocam::logging::EventKind::Error,
                        &format!("tilt sensor unavailable, falling back to fixed reading: {e}"),
                    );
                }
            }
        }
    }
    let _ = no_gpio;
    Arc::new(FixedTiltSensor(0.0, 0.0))
}
