//! Process-wide shared state (§5, §9). Centralizes what the original
//! implementation keeps as module-level globals into one owned,
//! `Arc`-shared container, with config documents broadcast to observers via
//! [`async_change_tracker::ChangeTracker`] the way `strand-cam` shares its
//! `StoreType`.

use std::path::PathBuf;
use std::sync::{Arc, RwLock};

use async_change_tracker::ChangeTracker;
use tokio::sync::Notify;

use crate::aggregator::Aggregator;
use crate::config::camera::CameraParameters;
use crate::config::device::DeviceParameters;
use crate::decision::DecisionQueue;
use crate::frame_slot::FrameSlot;
use crate::lists::{ListKind, PlateList};
use crate::outbox::flushed::FlushedStore;
use crate::reading::ReadingHistory;

pub struct Paths {
    pub data_dir: PathBuf,
}

impl Paths {
    pub fn new(data_dir: PathBuf) -> Self {
        Paths { data_dir }
    }

    pub fn sub(&self, name: &str) -> PathBuf {
        self.data_dir.join(name)
    }
    pub fn decisions_dir(&self) -> PathBuf {
        self.sub("decisions")
    }
    pub fn flushed_dir(&self) -> PathBuf {
        self.sub("flushed")
    }
    pub fn post_dir(&self) -> PathBuf {
        self.sub("post")
    }
    pub fn ftp_dir(&self) -> PathBuf {
        self.sub("ftp")
    }
    pub fn tcp_dir(&self) -> PathBuf {
        self.sub("tcp")
    }
    pub fn excel_dir(&self) -> PathBuf {
        self.sub("excel")
    }
    pub fn email_dir(&self) -> PathBuf {
        self.sub("email")
    }
    pub fn logs_dir(&self) -> PathBuf {
        self.sub("logs")
    }
    pub fn videos_dir(&self) -> PathBuf {
        self.sub("videos")
    }
    pub fn lists_dir(&self) -> PathBuf {
        self.sub("lists")
    }
    pub fn device_config_path(&self) -> PathBuf {
        self.sub("yolodev.json")
    }
    pub fn camera_config_path(&self) -> PathBuf {
        self.sub("yolocam.json")
    }
}

/// Everything shared across the capture, recognition, aggregator, control,
/// and housekeeper activities.
pub struct AppState {
    pub paths: Paths,
    pub device: Arc<RwLock<ChangeTracker<DeviceParameters>>>,
    pub camera: Arc<RwLock<ChangeTracker<CameraParameters>>>,
    pub frame_slot: Arc<FrameSlot>,
    pub history: Arc<RwLock<ReadingHistory>>,
    pub aggregator: Arc<RwLock<Aggregator>>,
    pub decisions: Arc<RwLock<DecisionQueue>>,
    pub flushed: Arc<RwLock<FlushedStore>>,
    pub blacklist: Arc<RwLock<PlateList>>,
    pub whitelist: Arc<RwLock<PlateList>>,
    pub ignorelist: Arc<RwLock<PlateList>>,
    /// Gates every long-lived activity's loop; flipped false on shutdown
    /// signal (§5 Cancellation).
    pub started: Arc<RwLock<bool>>,
    pub shutdown: Arc<Notify>,
    /// Edge-triggered new-plate flag surfaced by `<GET_NEW_PLATE>`.
    pub new_plate_flag: Arc<RwLock<bool>>,
}

impl AppState {
    pub fn new(data_dir: PathBuf) -> Self {
        let paths = Paths::new(data_dir);
        let device = DeviceParameters::default();
        let camera = CameraParameters::default();

        let lists_dir = paths.lists_dir();
        AppState {
            device: Arc::new(RwLock::new(ChangeTracker::new(device))),
            camera: Arc::new(RwLock::new(ChangeTracker::new(camera))),
            frame_slot: Arc::new(FrameSlot::new()),
            history: Arc::new(RwLock::new(ReadingHistory::default())),
            aggregator: Arc::new(RwLock::new(Aggregator::new())),
            decisions: Arc::new(RwLock::new(DecisionQueue::new())),
            flushed: Arc::new(RwLock::new(FlushedStore::new(paths.flushed_dir()))),
            blacklist: Arc::new(RwLock::new(PlateList::load(&lists_dir, ListKind::Blacklist))),
            whitelist: Arc::new(RwLock::new(PlateList::load(&lists_dir, ListKind::Whitelist))),
            ignorelist: Arc::new(RwLock::new(PlateList::load(&lists_dir, ListKind::Ignorelist))),
            started: Arc::new(RwLock::new(true)),
            shutdown: Arc::new(Notify::new()),
            new_plate_flag: Arc::new(RwLock::new(false)),
            paths,
        }
    }

    pub fn is_started(&self) -> bool {
        *self.started.read().unwrap()
    }

    pub fn request_shutdown(&self) {
        *self.started.write().unwrap() = false;
        self.shutdown.notify_waiters();
    }

    pub fn load_from_disk(data_dir: PathBuf) -> Self {
        let paths = Paths::new(data_dir);
        let device = crate::config::load_or_default::<DeviceParameters>(&paths.device_config_path());
        let camera = crate::config::load_or_default::<CameraParameters>(&paths.camera_config_path());
        let lists_dir = paths.lists_dir();

        AppState {
            device: Arc::new(RwLock::new(ChangeTracker::new(device))),
            camera: Arc::new(RwLock::new(ChangeTracker::new(camera))),
            frame_slot: Arc::new(FrameSlot::new()),
            history: Arc::new(RwLock::new(ReadingHistory::default())),
            aggregator: Arc::new(RwLock::new(Aggregator::new())),
            decisions: Arc::new(RwLock::new(DecisionQueue::new())),
            flushed: Arc::new(RwLock::new(FlushedStore::new(paths.flushed_dir()))),
            blacklist: Arc::new(RwLock::new(PlateList::load(&lists_dir, ListKind::Blacklist))),
            whitelist: Arc::new(RwLock::new(PlateList::load(&lists_dir, ListKind::Whitelist))),
            ignorelist: Arc::new(RwLock::new(PlateList::load(&lists_dir, ListKind::Ignorelist))),
            started: Arc::new(RwLock::new(true)),
            shutdown: Arc::new(Notify::new()),
            new_plate_flag: Arc::new(RwLock::new(false)),
            paths,
        }
    }

    pub fn persist_device_config(&self) -> crate::error::Result<()> {
        let doc = self.device.read().unwrap().as_ref().clone();
        crate::config::save_atomic(&self.paths.device_config_path(), &doc)
    }

    pub fn persist_camera_config(&self) -> crate::error::Result<()> {
        let doc = self.camera.read().unwrap().as_ref().clone();
        crate::config::save_atomic(&self.paths.camera_config_path(), &doc)
    }
}
