//! Notification record data model.
//!
//! A record is one captured (or imported) notification. The presentation
//! template is carried by exactly one tag, the variant of [`StyleContent`],
//! whose fields are the template-specific payload. On the wire the record is
//! flat camelCase JSON (see [`NotificationPayload`]).

use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use serde::{de, Deserialize, Deserializer, Serialize, Serializer};

use crate::error::Error;

/// Opaque binary payload (icons, pictures). Base64 on the wire, BLOB in SQLite.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Blob(Vec<u8>);

impl Blob {
    pub fn new(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

impl From<Vec<u8>> for Blob {
    fn from(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }
}

impl Serialize for Blob {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&BASE64.encode(&self.0))
    }
}

impl<'de> Deserialize<'de> for Blob {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let encoded = String::deserialize(deserializer)?;
        BASE64
            .decode(encoded.trim())
            .map(Blob)
            .map_err(|err| de::Error::custom(format!("invalid base64 blob: {err}")))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationCategory {
    Alarm,
    Call,
    Email,
    Error,
    Event,
    Message,
    MissedCall,
    Navigation,
    Progress,
    Promo,
    Recommendation,
    Reminder,
    Service,
    Social,
    Status,
    Stopwatch,
    System,
    Transport,
    Workout,
    LocationSharing,
    #[default]
    Unknown,
}

impl NotificationCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            NotificationCategory::Alarm => "alarm",
            NotificationCategory::Call => "call",
            NotificationCategory::Email => "email",
            NotificationCategory::Error => "error",
            NotificationCategory::Event => "event",
            NotificationCategory::Message => "message",
            NotificationCategory::MissedCall => "missed_call",
            NotificationCategory::Navigation => "navigation",
            NotificationCategory::Progress => "progress",
            NotificationCategory::Promo => "promo",
            NotificationCategory::Recommendation => "recommendation",
            NotificationCategory::Reminder => "reminder",
            NotificationCategory::Service => "service",
            NotificationCategory::Social => "social",
            NotificationCategory::Status => "status",
            NotificationCategory::Stopwatch => "stopwatch",
            NotificationCategory::System => "system",
            NotificationCategory::Transport => "transport",
            NotificationCategory::Workout => "workout",
            NotificationCategory::LocationSharing => "location_sharing",
            NotificationCategory::Unknown => "unknown",
        }
    }

    /// Lenient parse; anything unrecognised is `Unknown`.
    pub fn from_name(value: &str) -> Self {
        match value {
            "alarm" => NotificationCategory::Alarm,
            "call" => NotificationCategory::Call,
            "email" => NotificationCategory::Email,
            "error" => NotificationCategory::Error,
            "event" => NotificationCategory::Event,
            "message" => NotificationCategory::Message,
            "missed_call" => NotificationCategory::MissedCall,
            "navigation" => NotificationCategory::Navigation,
            "progress" => NotificationCategory::Progress,
            "promo" => NotificationCategory::Promo,
            "recommendation" => NotificationCategory::Recommendation,
            "reminder" => NotificationCategory::Reminder,
            "service" => NotificationCategory::Service,
            "social" => NotificationCategory::Social,
            "status" => NotificationCategory::Status,
            "stopwatch" => NotificationCategory::Stopwatch,
            "system" => NotificationCategory::System,
            "transport" => NotificationCategory::Transport,
            "workout" => NotificationCategory::Workout,
            "location_sharing" => NotificationCategory::LocationSharing,
            _ => NotificationCategory::Unknown,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationStyle {
    BigText,
    BigPicture,
    Inbox,
    Messaging,
    Media,
    Call,
    DecoratedCustom,
    #[default]
    Default,
}

impl NotificationStyle {
    pub fn as_str(&self) -> &'static str {
        match self {
            NotificationStyle::BigText => "big_text",
            NotificationStyle::BigPicture => "big_picture",
            NotificationStyle::Inbox => "inbox",
            NotificationStyle::Messaging => "messaging",
            NotificationStyle::Media => "media",
            NotificationStyle::Call => "call",
            NotificationStyle::DecoratedCustom => "decorated_custom",
            NotificationStyle::Default => "default",
        }
    }

    pub fn from_name(value: &str) -> Self {
        match value {
            "big_text" => NotificationStyle::BigText,
            "big_picture" => NotificationStyle::BigPicture,
            "inbox" => NotificationStyle::Inbox,
            "messaging" => NotificationStyle::Messaging,
            "media" => NotificationStyle::Media,
            "call" => NotificationStyle::Call,
            "decorated_custom" => NotificationStyle::DecoratedCustom,
            _ => NotificationStyle::Default,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct NotificationAction {
    pub title: Option<String>,
    pub icon: Option<Blob>,
    pub allows_remote_input: bool,
}

/// One line of a messaging-style conversation.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MessageEntry {
    pub sender: Option<String>,
    pub text: Option<String>,
    pub timestamp: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Progress {
    pub current: i32,
    pub max: i32,
    pub indeterminate: bool,
}

/// Template-specific payload. The variant *is* the record's style.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum StyleContent {
    BigText {
        big_text: Option<String>,
    },
    BigPicture {
        picture: Option<Blob>,
        content_description: Option<String>,
    },
    Inbox {
        lines: Vec<String>,
    },
    Messaging {
        conversation_title: Option<String>,
        is_group_conversation: bool,
        messages: Vec<MessageEntry>,
    },
    Media,
    Call {
        caller_name: Option<String>,
    },
    DecoratedCustom,
    #[default]
    Default,
}

impl StyleContent {
    pub fn style(&self) -> NotificationStyle {
        match self {
            StyleContent::BigText { .. } => NotificationStyle::BigText,
            StyleContent::BigPicture { .. } => NotificationStyle::BigPicture,
            StyleContent::Inbox { .. } => NotificationStyle::Inbox,
            StyleContent::Messaging { .. } => NotificationStyle::Messaging,
            StyleContent::Media => NotificationStyle::Media,
            StyleContent::Call { .. } => NotificationStyle::Call,
            StyleContent::DecoratedCustom => NotificationStyle::DecoratedCustom,
            StyleContent::Default => NotificationStyle::Default,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(into = "NotificationPayload", try_from = "NotificationPayload")]
pub struct NotificationRecord {
    pub id: String,
    pub source_app: String,
    pub display_name: Option<String>,
    pub title: Option<String>,
    pub text: Option<String>,
    pub sub_text: Option<String>,
    pub info_text: Option<String>,
    pub summary_text: Option<String>,
    pub posted_at: i64,
    pub category: NotificationCategory,
    pub content: StyleContent,
    pub progress: Option<Progress>,
    pub actions: Vec<NotificationAction>,
    pub is_ongoing: bool,
    pub auto_cancel: bool,
    pub is_local_only: bool,
    pub is_group_summary: bool,
    pub priority: i32,
    pub number: Option<u32>,
    pub group_key: Option<String>,
    pub channel_id: Option<String>,
    pub small_icon: Option<Blob>,
    pub large_icon: Option<Blob>,
    pub app_icon: Option<Blob>,
}

impl NotificationRecord {
    /// Bare record with every optional field empty.
    pub fn new(id: impl Into<String>, source_app: impl Into<String>, posted_at: i64) -> Self {
        Self {
            id: id.into(),
            source_app: source_app.into(),
            display_name: None,
            title: None,
            text: None,
            sub_text: None,
            info_text: None,
            summary_text: None,
            posted_at,
            category: NotificationCategory::Unknown,
            content: StyleContent::Default,
            progress: None,
            actions: Vec::new(),
            is_ongoing: false,
            auto_cancel: false,
            is_local_only: false,
            is_group_summary: false,
            priority: 0,
            number: None,
            group_key: None,
            channel_id: None,
            small_icon: None,
            large_icon: None,
            app_icon: None,
        }
    }

    pub fn style(&self) -> NotificationStyle {
        self.content.style()
    }
}

/// Flat wire shape of a record.
///
/// Every field is optional on input (missing and `null` are equivalent) and
/// every field is emitted on output, `null` when absent. Aliases accept the
/// field names of older exports.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct NotificationPayload {
    pub id: Option<String>,
    #[serde(alias = "app", alias = "packageName")]
    pub source_app: Option<String>,
    #[serde(alias = "appName")]
    pub display_name: Option<String>,
    pub title: Option<String>,
    pub text: Option<String>,
    pub sub_text: Option<String>,
    pub info_text: Option<String>,
    pub summary_text: Option<String>,
    #[serde(alias = "timestamp", alias = "postTime")]
    pub posted_at: Option<i64>,
    pub category: Option<String>,
    pub style: Option<String>,
    pub big_text: Option<String>,
    pub big_picture: Option<Blob>,
    pub picture_content_description: Option<String>,
    pub inbox_lines: Option<Vec<String>>,
    pub conversation_title: Option<String>,
    pub is_group_conversation: Option<bool>,
    pub messages: Option<Vec<MessageEntry>>,
    pub caller_name: Option<String>,
    pub progress: Option<Progress>,
    pub actions: Option<Vec<NotificationAction>>,
    pub is_ongoing: Option<bool>,
    pub auto_cancel: Option<bool>,
    pub is_local_only: Option<bool>,
    pub is_group_summary: Option<bool>,
    pub priority: Option<i32>,
    pub number: Option<u32>,
    #[serde(alias = "group")]
    pub group_key: Option<String>,
    pub channel_id: Option<String>,
    pub small_icon: Option<Blob>,
    pub large_icon: Option<Blob>,
    pub app_icon: Option<Blob>,
}

impl From<NotificationRecord> for NotificationPayload {
    fn from(record: NotificationRecord) -> Self {
        let style = record.style();
        let mut payload = NotificationPayload {
            id: Some(record.id),
            source_app: Some(record.source_app),
            display_name: record.display_name,
            title: record.title,
            text: record.text,
            sub_text: record.sub_text,
            info_text: record.info_text,
            summary_text: record.summary_text,
            posted_at: Some(record.posted_at),
            category: Some(record.category.as_str().to_string()),
            style: Some(style.as_str().to_string()),
            progress: record.progress,
            actions: Some(record.actions),
            is_ongoing: Some(record.is_ongoing),
            auto_cancel: Some(record.auto_cancel),
            is_local_only: Some(record.is_local_only),
            is_group_summary: Some(record.is_group_summary),
            priority: Some(record.priority),
            number: record.number,
            group_key: record.group_key,
            channel_id: record.channel_id,
            small_icon: record.small_icon,
            large_icon: record.large_icon,
            app_icon: record.app_icon,
            ..NotificationPayload::default()
        };

        match record.content {
            StyleContent::BigText { big_text } => payload.big_text = big_text,
            StyleContent::BigPicture {
                picture,
                content_description,
            } => {
                payload.big_picture = picture;
                payload.picture_content_description = content_description;
            }
            StyleContent::Inbox { lines } => payload.inbox_lines = Some(lines),
            StyleContent::Messaging {
                conversation_title,
                is_group_conversation,
                messages,
            } => {
                payload.conversation_title = conversation_title;
                payload.is_group_conversation = Some(is_group_conversation);
                payload.messages = Some(messages);
            }
            StyleContent::Call { caller_name } => payload.caller_name = caller_name,
            StyleContent::Media | StyleContent::DecoratedCustom | StyleContent::Default => {}
        }

        payload
    }
}

impl TryFrom<NotificationPayload> for NotificationRecord {
    type Error = Error;

    fn try_from(payload: NotificationPayload) -> Result<Self, Self::Error> {
        let id = payload
            .id
            .filter(|id| !id.trim().is_empty())
            .ok_or_else(|| Error::validation("notification id is missing or empty"))?;
        let posted_at = payload
            .posted_at
            .ok_or_else(|| Error::validation(format!("notification '{id}' has no postedAt")))?;
        if posted_at < 0 {
            return Err(Error::validation(format!(
                "notification '{id}' has negative postedAt {posted_at}"
            )));
        }

        let style = payload
            .style
            .as_deref()
            .map(NotificationStyle::from_name)
            .unwrap_or_default();

        // Only the payload matching the style tag is kept.
        let content = match style {
            NotificationStyle::BigText => StyleContent::BigText {
                big_text: payload.big_text,
            },
            NotificationStyle::BigPicture => StyleContent::BigPicture {
                picture: payload.big_picture,
                content_description: payload.picture_content_description,
            },
            NotificationStyle::Inbox => StyleContent::Inbox {
                lines: payload.inbox_lines.unwrap_or_default(),
            },
            NotificationStyle::Messaging => StyleContent::Messaging {
                conversation_title: payload.conversation_title,
                is_group_conversation: payload.is_group_conversation.unwrap_or(false),
                messages: payload.messages.unwrap_or_default(),
            },
            NotificationStyle::Media => StyleContent::Media,
            NotificationStyle::Call => StyleContent::Call {
                caller_name: payload.caller_name,
            },
            NotificationStyle::DecoratedCustom => StyleContent::DecoratedCustom,
            NotificationStyle::Default => StyleContent::Default,
        };

        Ok(NotificationRecord {
            id,
            source_app: payload.source_app.unwrap_or_default(),
            display_name: payload.display_name.filter(|name| !name.is_empty()),
            title: payload.title,
            text: payload.text,
            sub_text: payload.sub_text,
            info_text: payload.info_text,
            summary_text: payload.summary_text,
            posted_at,
            category: payload
                .category
                .as_deref()
                .map(NotificationCategory::from_name)
                .unwrap_or_default(),
            content,
            progress: payload.progress,
            actions: payload.actions.unwrap_or_default(),
            is_ongoing: payload.is_ongoing.unwrap_or(false),
            auto_cancel: payload.auto_cancel.unwrap_or(false),
            is_local_only: payload.is_local_only.unwrap_or(false),
            is_group_summary: payload.is_group_summary.unwrap_or(false),
            priority: payload.priority.unwrap_or(0),
            number: payload.number,
            group_key: payload.group_key,
            channel_id: payload.channel_id,
            small_icon: payload.small_icon,
            large_icon: payload.large_icon,
            app_icon: payload.app_icon,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn missing_and_null_fields_are_equivalent() {
        let omitted: NotificationRecord = serde_json::from_value(json!({
            "id": "a",
            "sourceApp": "com.example.chat",
            "postedAt": 100,
        }))
        .unwrap();
        let nulls: NotificationRecord = serde_json::from_value(json!({
            "id": "a",
            "sourceApp": "com.example.chat",
            "postedAt": 100,
            "title": null,
            "category": null,
            "style": null,
            "actions": null,
            "number": null,
        }))
        .unwrap();

        assert_eq!(omitted, nulls);
        assert_eq!(omitted.category, NotificationCategory::Unknown);
        assert_eq!(omitted.style(), NotificationStyle::Default);
    }

    #[test]
    fn output_emits_nulls_for_absent_fields() {
        let record = NotificationRecord::new("a", "com.example.chat", 100);
        let value = serde_json::to_value(&record).unwrap();

        assert!(value["title"].is_null());
        assert!(value["displayName"].is_null());
        assert!(value["messages"].is_null());
        assert_eq!(value["style"], "default");
        assert_eq!(value["category"], "unknown");
        assert_eq!(value["actions"], json!([]));
    }

    #[test]
    fn messaging_payload_is_attached_to_style_tag() {
        let record: NotificationRecord = serde_json::from_value(json!({
            "id": "m1",
            "app": "com.example.chat",
            "timestamp": 5,
            "style": "messaging",
            "conversationTitle": "Team",
            "messages": [{ "sender": "Ana", "text": "hi", "timestamp": 4 }],
            "inboxLines": ["ignored"],
        }))
        .unwrap();

        match &record.content {
            StyleContent::Messaging {
                conversation_title,
                messages,
                ..
            } => {
                assert_eq!(conversation_title.as_deref(), Some("Team"));
                assert_eq!(messages.len(), 1);
                assert_eq!(messages[0].sender.as_deref(), Some("Ana"));
            }
            other => panic!("unexpected content {other:?}"),
        }

        let value = serde_json::to_value(&record).unwrap();
        assert!(value["inboxLines"].is_null());
        assert_eq!(value["sourceApp"], "com.example.chat");
    }

    #[test]
    fn blobs_travel_as_base64() {
        let mut record = NotificationRecord::new("a", "pkg", 1);
        record.small_icon = Some(Blob::new(vec![0x89, b'P', b'N', b'G']));

        let value = serde_json::to_value(&record).unwrap();
        assert_eq!(value["smallIcon"], "iVBORw==");

        let decoded: NotificationRecord = serde_json::from_value(value).unwrap();
        assert_eq!(decoded.small_icon, record.small_icon);
    }

    #[test]
    fn unknown_category_falls_back() {
        assert_eq!(
            NotificationCategory::from_name("car_warning"),
            NotificationCategory::Unknown
        );
        assert_eq!(
            NotificationCategory::from_name("missed_call"),
            NotificationCategory::MissedCall
        );
    }

    #[test]
    fn rejects_blank_id() {
        let err = serde_json::from_value::<NotificationRecord>(json!({
            "id": "  ",
            "postedAt": 1,
        }))
        .unwrap_err();
        assert!(err.to_string().contains("id is missing or empty"));
    }
}
