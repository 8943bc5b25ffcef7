//! Type definitions for the scoring service

pub mod record;
pub mod verdict;

pub use record::InputRecord;
pub use verdict::{Status, Verdict};
