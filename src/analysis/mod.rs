//! Analysis modules.
//!
//! `aggregator` holds the generic statistics, `questions` the fixed set of
//! queries answered over the collected tables.

pub mod aggregator;
pub mod questions;

pub use questions::{answer_all, QuestionSettings};
