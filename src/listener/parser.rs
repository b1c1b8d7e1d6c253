//! Maps a [`RawNotification`] into a [`NotificationRecord`].

use chrono::Utc;
use uuid::Uuid;

use crate::db::models::{
    NotificationAction, NotificationCategory, NotificationRecord, Progress, StyleContent,
};

use super::source::RawNotification;

pub const FLAG_ONGOING_EVENT: u32 = 0x0000_0002;
pub const FLAG_AUTO_CANCEL: u32 = 0x0000_0010;
pub const FLAG_LOCAL_ONLY: u32 = 0x0000_0100;
pub const FLAG_GROUP_SUMMARY: u32 = 0x0000_0200;

pub fn parse(raw: RawNotification) -> NotificationRecord {
    let id = raw
        .id
        .filter(|id| !id.trim().is_empty())
        .unwrap_or_else(|| Uuid::new_v4().to_string());
    let posted_at = raw
        .post_time
        .filter(|ts| *ts >= 0)
        .unwrap_or_else(|| Utc::now().timestamp_millis());

    let content = match raw.template.as_deref().map(template_kind) {
        Some(TemplateKind::BigText) => StyleContent::BigText {
            big_text: raw.big_text,
        },
        Some(TemplateKind::BigPicture) => StyleContent::BigPicture {
            picture: raw.picture,
            content_description: raw.picture_content_description,
        },
        Some(TemplateKind::Inbox) => StyleContent::Inbox {
            lines: raw.text_lines.unwrap_or_default(),
        },
        Some(TemplateKind::Messaging) => StyleContent::Messaging {
            conversation_title: raw.conversation_title,
            is_group_conversation: raw.is_group_conversation,
            messages: raw.messages.unwrap_or_default(),
        },
        Some(TemplateKind::Media) => StyleContent::Media,
        Some(TemplateKind::Call) => StyleContent::Call {
            caller_name: raw.caller_name,
        },
        Some(TemplateKind::DecoratedCustom) => StyleContent::DecoratedCustom,
        Some(TemplateKind::Plain) | None => StyleContent::Default,
    };

    let progress = match (raw.progress, raw.progress_max) {
        (current, Some(max)) if max > 0 || raw.progress_indeterminate => Some(Progress {
            current: current.unwrap_or(0),
            max,
            indeterminate: raw.progress_indeterminate,
        }),
        _ => None,
    };

    let actions = raw
        .actions
        .into_iter()
        .map(|action| NotificationAction {
            title: action.title,
            icon: action.icon,
            allows_remote_input: action.remote_input_count > 0,
        })
        .collect();

    NotificationRecord {
        id,
        source_app: raw.package_name,
        display_name: raw.app_label.filter(|label| !label.trim().is_empty()),
        title: raw.title,
        text: raw.text,
        sub_text: raw.sub_text,
        info_text: raw.info_text,
        summary_text: raw.summary_text,
        posted_at,
        category: raw
            .category
            .as_deref()
            .map(category_from_platform)
            .unwrap_or_default(),
        content,
        progress,
        actions,
        is_ongoing: raw.flags & FLAG_ONGOING_EVENT != 0,
        auto_cancel: raw.flags & FLAG_AUTO_CANCEL != 0,
        is_local_only: raw.flags & FLAG_LOCAL_ONLY != 0,
        is_group_summary: raw.flags & FLAG_GROUP_SUMMARY != 0,
        priority: raw.priority,
        number: u32::try_from(raw.number).ok().filter(|n| *n > 0),
        group_key: raw.group,
        channel_id: raw.channel_id,
        small_icon: raw.small_icon,
        large_icon: raw.large_icon,
        app_icon: raw.app_icon,
    }
}

enum TemplateKind {
    BigText,
    BigPicture,
    Inbox,
    Messaging,
    Media,
    Call,
    DecoratedCustom,
    Plain,
}

/// Template class names look like `android.app.Notification$MessagingStyle`.
fn template_kind(template: &str) -> TemplateKind {
    // DecoratedMediaCustomViewStyle must be checked before MediaStyle.
    if template.contains("DecoratedMediaCustomViewStyle")
        || template.contains("DecoratedCustomViewStyle")
    {
        TemplateKind::DecoratedCustom
    } else if template.contains("BigTextStyle") {
        TemplateKind::BigText
    } else if template.contains("BigPictureStyle") {
        TemplateKind::BigPicture
    } else if template.contains("InboxStyle") {
        TemplateKind::Inbox
    } else if template.contains("MessagingStyle") {
        TemplateKind::Messaging
    } else if template.contains("MediaStyle") {
        TemplateKind::Media
    } else if template.contains("CallStyle") {
        TemplateKind::Call
    } else {
        TemplateKind::Plain
    }
}

fn category_from_platform(value: &str) -> NotificationCategory {
    match value {
        "msg" => NotificationCategory::Message,
        "err" => NotificationCategory::Error,
        "sys" => NotificationCategory::System,
        other => NotificationCategory::from_name(other),
    }
}
