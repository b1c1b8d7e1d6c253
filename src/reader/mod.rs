pub mod commands;
pub mod controller;
pub mod events;
pub mod import;

pub use controller::{CaptureOutcome, DatabaseSize, NotificationReader, SkipReason};
pub use events::{forward_posted, NOTIFICATION_POSTED_EVENT};
