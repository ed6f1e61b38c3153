//! Entity managers over the SQLite datastore.
//!
//! One manager per entity family: surveys, questions (with their options),
//! and responses (with their answers). Managers never call each other;
//! cross-entity consistency comes from foreign keys and from ordering the
//! datastore calls inside a single operation. Each manager keeps an
//! in-memory mirror of its last successful fetch for display reads, owned by
//! the manager instance rather than held in ambient globals.
//!
//! Multi-step writes (question + options, response + answers, the reorder
//! loop, the slug probe) are not transactional. A failure after the first
//! step leaves that step's write in place and surfaces as
//! [`AppError::Partial`](crate::errors::AppError).

mod question;
mod response;
mod survey;

pub use question::QuestionManager;
pub use response::ResponseManager;
pub use survey::SurveyManager;
