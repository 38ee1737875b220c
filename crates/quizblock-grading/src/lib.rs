//! quizblock-grading — Discursive grading collaborators.
//!
//! Implements the `DiscursiveGrader` trait for a fixed grade, an operator
//! scoring a rubric over any async reader/writer, and a channel that hands
//! the answer to another task. Also owns the quizblock configuration file.

pub mod channel;
pub mod config;
pub mod fixed;
pub mod mock;
pub mod prompt;

pub use channel::{grade_channel, ChannelGrader, GradeInbox, GradeTicket};
pub use config::{create_grader, load_config, load_config_from, GraderConfig, QuizblockConfig};
pub use fixed::FixedGrader;
pub use prompt::RubricPromptGrader;
