pub mod parser;
pub mod source;

pub use parser::parse;
pub use source::{NotificationSource, RawAction, RawNotification, UnsupportedSource};
