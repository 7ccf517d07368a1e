//! Aidwatch Library
//!
//! Terminal dashboard for a wearable assistive device: recent obstacle
//! detections, ML-prediction analytics, device status, and system health,
//! polled from the device's REST backend through a shared response cache.

pub mod app;
pub mod cache;
pub mod cli;
pub mod data;
pub mod logging;
pub mod refresh;
pub mod ui;
