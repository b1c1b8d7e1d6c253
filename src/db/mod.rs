pub mod connection;
pub mod helpers;
mod migrations;
pub mod models;
pub mod query;
pub mod repositories;

pub use connection::Database;
pub use models::{NotificationFilter, NotificationPage, NotificationRecord, PageCursor};
