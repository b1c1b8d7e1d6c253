pub mod filter;
pub mod notification;

pub use filter::{NotificationFilter, NotificationPage, PageCursor};
pub use notification::{
    Blob, MessageEntry, NotificationAction, NotificationCategory, NotificationPayload,
    NotificationRecord, NotificationStyle, Progress, StyleContent,
};
