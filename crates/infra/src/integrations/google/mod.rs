//! Google Calendar and Google Tasks integration
//!
//! One [`GoogleWorkspaceClient`] serves every calendar and task list of the
//! account and implements the core `CalendarWorkspace` port. Credentials
//! are non-interactive: a static access token, a service account or a
//! refresh-token grant, handled by [`GoogleAuth`].

pub mod auth;
pub mod client;
mod types;

pub use auth::GoogleAuth;
pub use client::GoogleWorkspaceClient;
