#![forbid(unsafe_code)]

pub mod model;
pub mod scoring;
pub mod time;

pub use scoring::{Score, score_exam};
pub use time::Clock;
