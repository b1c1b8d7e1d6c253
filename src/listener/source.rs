use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::{
    db::models::{Blob, MessageEntry},
    error::{Error, Result},
};

/// Notification event as reported by the platform listener, before mapping.
///
/// Field names follow the platform's own vocabulary (`template` class name,
/// raw category string, flag bits) so native glue can forward them untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RawNotification {
    /// Stable id if the platform has one; a UUID is generated otherwise.
    pub id: Option<String>,
    pub package_name: String,
    pub app_label: Option<String>,
    pub post_time: Option<i64>,
    pub template: Option<String>,
    pub category: Option<String>,
    pub flags: u32,
    pub priority: i32,
    pub number: i32,
    pub group: Option<String>,
    pub channel_id: Option<String>,
    pub title: Option<String>,
    pub text: Option<String>,
    pub sub_text: Option<String>,
    pub info_text: Option<String>,
    pub summary_text: Option<String>,
    pub big_text: Option<String>,
    pub picture: Option<Blob>,
    pub picture_content_description: Option<String>,
    pub text_lines: Option<Vec<String>>,
    pub conversation_title: Option<String>,
    pub is_group_conversation: bool,
    pub messages: Option<Vec<MessageEntry>>,
    pub caller_name: Option<String>,
    pub progress: Option<i32>,
    pub progress_max: Option<i32>,
    pub progress_indeterminate: bool,
    pub actions: Vec<RawAction>,
    pub small_icon: Option<Blob>,
    pub large_icon: Option<Blob>,
    pub app_icon: Option<Blob>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RawAction {
    pub title: Option<String>,
    pub icon: Option<Blob>,
    pub remote_input_count: u32,
}

/// Platform notification listener, injected into the plugin.
///
/// The platform owns the listener's lifecycle; the plugin only asks it
/// questions. Newly observed notifications are pushed in through
/// [`crate::NotificationReader::capture`].
#[async_trait]
pub trait NotificationSource: Send + Sync {
    /// Notifications currently shown by the OS. Fails with
    /// [`Error::Permission`] when listener access is not granted.
    async fn active_notifications(&self) -> Result<Vec<RawNotification>>;

    async fn is_access_enabled(&self) -> Result<bool>;

    /// Sends the user to the access settings screen and reports the access
    /// state once they come back.
    async fn open_access_settings(&self) -> Result<bool>;
}

/// Source for platforms without a notification listener.
#[derive(Debug, Default, Clone, Copy)]
pub struct UnsupportedSource;

impl UnsupportedSource {
    fn reject<T>(operation: &str) -> Result<T> {
        Err(Error::UnsupportedPlatform(format!(
            "{operation} requires a notification listener, which {} does not provide",
            std::env::consts::OS
        )))
    }
}

#[async_trait]
impl NotificationSource for UnsupportedSource {
    async fn active_notifications(&self) -> Result<Vec<RawNotification>> {
        Self::reject("getActiveNotifications")
    }

    async fn is_access_enabled(&self) -> Result<bool> {
        Self::reject("isAccessEnabled")
    }

    async fn open_access_settings(&self) -> Result<bool> {
        Self::reject("openAccessSettings")
    }
}
