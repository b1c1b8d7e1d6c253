use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;
use tauri::State;

use crate::{
    db::{NotificationFilter, NotificationPage, NotificationRecord, PageCursor},
    error::{Error, Result},
    settings::ReaderConfig,
};

use super::controller::{DatabaseSize, NotificationReader};

#[derive(Debug, Serialize)]
pub struct NotificationList {
    pub notifications: Vec<NotificationRecord>,
}

#[derive(Debug, Serialize)]
pub struct AccessStatus {
    pub enabled: bool,
}

#[derive(Debug, Serialize)]
pub struct TotalCount {
    pub count: u64,
}

#[tauri::command]
pub async fn get_active_notifications(
    reader: State<'_, NotificationReader>,
) -> Result<NotificationList> {
    let notifications = reader.get_active_notifications().await?;
    Ok(NotificationList { notifications })
}

#[tauri::command]
pub async fn open_access_settings(reader: State<'_, NotificationReader>) -> Result<AccessStatus> {
    let enabled = reader.open_access_settings().await?;
    Ok(AccessStatus { enabled })
}

#[tauri::command]
pub async fn is_access_enabled(reader: State<'_, NotificationReader>) -> Result<AccessStatus> {
    let enabled = reader.is_access_enabled().await?;
    Ok(AccessStatus { enabled })
}

/// Arguments of `get_notifications`, decoded from raw JSON so that malformed
/// values surface as validation errors instead of generic invoke failures.
#[derive(Debug, Default, PartialEq)]
pub struct PageRequest {
    pub filter: NotificationFilter,
    pub cursor: Option<PageCursor>,
    pub limit: Option<i64>,
}

impl PageRequest {
    pub fn from_args(
        cursor: Option<Value>,
        cursor_id: Option<Value>,
        limit: Option<Value>,
        filter: Option<Value>,
    ) -> Result<Self> {
        let posted_at: Option<i64> = decode_arg("cursor", cursor)?;
        let id: Option<String> = decode_arg("cursorId", cursor_id)?;
        let limit: Option<i64> = decode_arg("limit", limit)?;
        let filter: Option<NotificationFilter> = decode_arg("filter", filter)?;

        let cursor = match (posted_at, id) {
            (Some(posted_at), id) => Some(PageCursor { posted_at, id }),
            (None, Some(_)) => return Err(Error::validation("cursorId requires cursor")),
            (None, None) => None,
        };

        Ok(Self {
            filter: filter.unwrap_or_default(),
            cursor,
            limit,
        })
    }
}

pub fn parse_config(config: Option<Value>) -> Result<ReaderConfig> {
    decode_arg("config", config)?.ok_or_else(|| Error::validation("config is required"))
}

fn decode_arg<T: DeserializeOwned>(name: &str, value: Option<Value>) -> Result<Option<T>> {
    match value {
        None | Some(Value::Null) => Ok(None),
        Some(value) => serde_json::from_value(value)
            .map(Some)
            .map_err(|err| Error::validation(format!("invalid {name}: {err}"))),
    }
}

/// Pages newest first.
///
/// `cursor` alone pages strictly before that timestamp, so records sharing
/// the cursor's timestamp are skipped. Callers paging through equal
/// timestamps must pass `nextCursor.postedAt` as `cursor` and `nextCursor.id`
/// as `cursor_id`, which resumes exactly after the last record returned.
#[tauri::command]
pub async fn get_notifications(
    reader: State<'_, NotificationReader>,
    cursor: Option<Value>,
    cursor_id: Option<Value>,
    limit: Option<Value>,
    filter: Option<Value>,
) -> Result<NotificationPage> {
    let request = PageRequest::from_args(cursor, cursor_id, limit, filter)?;
    reader
        .get_notifications(&request.filter, request.cursor.as_ref(), request.limit)
        .await
}

#[tauri::command]
pub async fn delete_all_notifications(reader: State<'_, NotificationReader>) -> Result<()> {
    reader.delete_all_notifications().await
}

#[tauri::command]
pub async fn get_total_count(reader: State<'_, NotificationReader>) -> Result<TotalCount> {
    let count = reader.get_total_count().await?;
    Ok(TotalCount { count })
}

#[tauri::command]
pub async fn get_database_size(reader: State<'_, NotificationReader>) -> Result<DatabaseSize> {
    reader.get_database_size().await
}

#[tauri::command]
pub async fn import_notifications(
    reader: State<'_, NotificationReader>,
    notifications: Vec<Value>,
) -> Result<()> {
    reader.import_notifications(notifications).await.map(|_| ())
}

#[tauri::command]
pub async fn get_config(reader: State<'_, NotificationReader>) -> Result<ReaderConfig> {
    Ok(reader.get_config())
}

#[tauri::command]
pub async fn set_config(
    reader: State<'_, NotificationReader>,
    config: Option<Value>,
) -> Result<()> {
    reader.set_config(parse_config(config)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::models::NotificationCategory;
    use serde_json::json;

    #[test]
    fn decodes_full_page_request() {
        let request = PageRequest::from_args(
            Some(json!(1_700_000_000_000i64)),
            Some(json!("b")),
            Some(json!(25)),
            Some(json!({ "category": "message", "appNames": ["Chat"] })),
        )
        .unwrap();

        assert_eq!(
            request.cursor,
            Some(PageCursor {
                posted_at: 1_700_000_000_000,
                id: Some("b".into()),
            })
        );
        assert_eq!(request.limit, Some(25));
        assert_eq!(request.filter.category, Some(NotificationCategory::Message));
        assert_eq!(request.filter.app_names, Some(vec!["Chat".to_string()]));
    }

    #[test]
    fn absent_and_null_arguments_mean_defaults() {
        assert_eq!(
            PageRequest::from_args(None, None, None, None).unwrap(),
            PageRequest::default()
        );
        assert_eq!(
            PageRequest::from_args(
                Some(Value::Null),
                Some(Value::Null),
                Some(Value::Null),
                Some(Value::Null)
            )
            .unwrap(),
            PageRequest::default()
        );
    }

    #[test]
    fn timestamp_only_cursor_has_no_id() {
        let request = PageRequest::from_args(Some(json!(30)), None, None, None).unwrap();
        assert_eq!(request.cursor, Some(PageCursor::before(30)));
    }

    #[test]
    fn malformed_arguments_are_validation_errors() {
        let cases = [
            PageRequest::from_args(None, None, None, Some(json!({ "category": "bogus" }))),
            PageRequest::from_args(None, None, None, Some(json!("not a filter"))),
            PageRequest::from_args(Some(json!("yesterday")), None, None, None),
            PageRequest::from_args(Some(json!(1.5)), None, None, None),
            PageRequest::from_args(None, None, Some(json!("ten")), None),
            PageRequest::from_args(Some(json!(10)), Some(json!(7)), None, None),
        ];

        for result in cases {
            assert_eq!(result.unwrap_err().kind(), "validation");
        }
    }

    #[test]
    fn cursor_id_without_cursor_is_rejected() {
        let err = PageRequest::from_args(None, Some(json!("b")), None, None).unwrap_err();
        assert_eq!(err.kind(), "validation");
        assert!(err.to_string().contains("cursorId"));
    }

    #[test]
    fn parses_config_objects() {
        let config = parse_config(Some(json!({ "filterOngoing": false, "storageLimit": 64.0 })))
            .unwrap();
        assert!(!config.filter_ongoing);
        assert!(config.filter_transport);
        assert_eq!(config.storage_limit, Some(64.0));
    }

    #[test]
    fn malformed_config_is_a_validation_error() {
        for value in [
            Some(json!({ "filterOngoing": "yes" })),
            Some(json!(42)),
            Some(Value::Null),
            None,
        ] {
            assert_eq!(parse_config(value).unwrap_err().kind(), "validation");
        }
    }
}
