//! Query-side models: filter, cursor and page.

use serde::{Deserialize, Serialize};

use super::notification::{NotificationCategory, NotificationRecord, NotificationStyle};

/// Conjunction of constraints; `None` fields impose nothing.
///
/// Timestamp bounds are both exclusive: `after_timestamp < postedAt < before_timestamp`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct NotificationFilter {
    pub text_contains: Option<String>,
    pub text_contains_insensitive: Option<String>,
    pub title_contains: Option<String>,
    pub title_contains_insensitive: Option<String>,
    /// Membership in display names. An empty list is no constraint.
    pub app_names: Option<Vec<String>>,
    pub package_name: Option<String>,
    pub category: Option<NotificationCategory>,
    pub style: Option<NotificationStyle>,
    pub is_ongoing: Option<bool>,
    pub is_group_summary: Option<bool>,
    pub channel_id: Option<String>,
    pub after_timestamp: Option<i64>,
    pub before_timestamp: Option<i64>,
}

impl NotificationFilter {
    /// Same predicate the SQL query applies, evaluated in memory.
    pub fn matches(&self, record: &NotificationRecord) -> bool {
        fn contains(haystack: &Option<String>, needle: &Option<String>) -> bool {
            match needle {
                Some(needle) => haystack.as_deref().is_some_and(|h| h.contains(needle.as_str())),
                None => true,
            }
        }

        fn contains_folded(haystack: &Option<String>, needle: &Option<String>) -> bool {
            match needle {
                Some(needle) => haystack
                    .as_deref()
                    .is_some_and(|h| h.to_lowercase().contains(&needle.to_lowercase())),
                None => true,
            }
        }

        fn equals<T: PartialEq>(value: &T, wanted: &Option<T>) -> bool {
            wanted.as_ref().map_or(true, |wanted| value == wanted)
        }

        let app_ok = match self.app_names.as_deref() {
            Some(names) if !names.is_empty() => record
                .display_name
                .as_ref()
                .is_some_and(|name| names.contains(name)),
            _ => true,
        };

        contains(&record.text, &self.text_contains)
            && contains_folded(&record.text, &self.text_contains_insensitive)
            && contains(&record.title, &self.title_contains)
            && contains_folded(&record.title, &self.title_contains_insensitive)
            && app_ok
            && equals(&record.source_app, &self.package_name)
            && equals(&record.category, &self.category)
            && equals(&record.style(), &self.style)
            && equals(&record.is_ongoing, &self.is_ongoing)
            && equals(&record.is_group_summary, &self.is_group_summary)
            && self
                .channel_id
                .as_ref()
                .map_or(true, |wanted| record.channel_id.as_ref() == Some(wanted))
            && self.after_timestamp.map_or(true, |after| record.posted_at > after)
            && self.before_timestamp.map_or(true, |before| record.posted_at < before)
    }
}

/// Exclusive upper bound of the next page.
///
/// With only `posted_at`, every record at that timestamp is excluded. With
/// `id` too, records at the same timestamp whose id sorts below it are still
/// returned, so equal timestamps never split a page sequence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageCursor {
    pub posted_at: i64,
    #[serde(default)]
    pub id: Option<String>,
}

impl PageCursor {
    pub fn before(posted_at: i64) -> Self {
        Self { posted_at, id: None }
    }

    pub fn after_record(record: &NotificationRecord) -> Self {
        Self {
            posted_at: record.posted_at,
            id: Some(record.id.clone()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationPage {
    pub notifications: Vec<NotificationRecord>,
    pub next_cursor: Option<PageCursor>,
}

impl NotificationPage {
    pub fn new(notifications: Vec<NotificationRecord>) -> Self {
        let next_cursor = notifications.last().map(PageCursor::after_record);
        Self {
            notifications,
            next_cursor,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.notifications.is_empty()
    }
}
