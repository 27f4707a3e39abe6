//! YOLOCAM: an embedded license-plate-recognition edge appliance.
//!
//! Seven long-lived activities share one [`state::AppState`]: capture
//! (`capture`), recognition + aggregation (`recognizer`, `aggregator`),
//! the [`housekeeper`] dispatcher, and the three framed control servers
//! (`control::{command_server, stream_server, web_server}`).

pub mod aggregator;
pub mod capture;
pub mod cli;
pub mod config;
pub mod control;
pub mod decision;
pub mod error;
pub mod firmware;
pub mod frame_slot;
pub mod gpio;
pub mod housekeeper;
pub mod installer;
pub mod lists;
pub mod logging;
pub mod outbox;
pub mod reading;
pub mod recognition;
pub mod recognizer;
pub mod state;

pub use error::{Result, YoloCamError};
