//! Data models for the survey backend.
//!
//! Field names match the persisted table columns exactly; they are the wire
//! contract for clients that already hold survey data.

mod question;
mod response;
mod survey;

pub use question::*;
pub use response::*;
pub use survey::*;
