//! External service integrations

pub mod google;
pub mod openai;
pub mod timetable;

pub use google::{GoogleAuth, GoogleWorkspaceClient};
pub use openai::OpenAIClient;
pub use timetable::TimetableClient;
