//! Shared types used across the Barokah store workspace.

pub mod mail;
pub mod response;
pub mod util;

pub use mail::EmailMessage;
pub use response::{ApiResponse, Empty};
