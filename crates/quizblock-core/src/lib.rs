//! quizblock-core — Quiz session state machine, timer, and block scoring.
//!
//! This crate defines the question model, the per-block session state
//! machine, and the scoring rules that the rest of quizblock builds on.
//! Discursive answers are graded outside the core through the
//! `DiscursiveGrader` trait.

pub mod answers;
pub mod bank;
pub mod engine;
pub mod error;
pub mod model;
pub mod parser;
pub mod report;
pub mod scoring;
pub mod session;
pub mod timer;
pub mod traits;
