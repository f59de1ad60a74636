//! Multiple-choice trivia generated from a song-contest archive.
//!
//! A [`store::ContestStore`] answers queries over the archive, the strategies in
//! [`questions`] and [`videos`] turn random draws into questions, and
//! [`orchestrator::QuizGenerator`] assembles shuffled [`model::QuestionRecord`]s.
pub mod config;
pub mod error;
pub mod filter;
pub mod memory_store;
pub mod model;
pub mod orchestrator;
pub mod questions;
pub mod shuffle;
pub mod sql_store;
pub mod store;
pub mod telemetry;
pub mod videos;

#[cfg(test)]
mod testdata;

pub use error::{Result, TriviaError};
pub use filter::FilterContext;
pub use model::{ContestRecord, Entry, QuestionRecord, RecordKind};
pub use orchestrator::{DrawMode, QuizGenerator};
pub use questions::StrategyKind;
pub use store::ContestStore;
