//! Classification of score columns into graduated classes
//!
//! Class break methods for one-dimensional values:
//! - **Jenks**: natural breaks (Fisher's exact optimisation)
//! - **Quantile**: equal-count classes
//! - **Equal interval**: equal-width classes

mod breaks;

pub use breaks::{
    class_breaks, equal_interval_breaks, jenks_breaks, quantile_breaks, ClassificationMode,
    MAX_JENKS_VALUES,
};
