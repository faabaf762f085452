//! Imagery analysis algorithms
//!
//! - Change detection: binary change map between two classified rasters

mod change_detection;

pub use change_detection::{
    change_detection, ChangeDetection, ChangeDetector, ChangeParams, ChangeStatistics, CHANGED,
    UNCHANGED,
};
