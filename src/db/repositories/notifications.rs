use anyhow::{anyhow, Context, Result as AnyResult};
use rusqlite::{params, params_from_iter, Connection, OptionalExtension, Row};

use crate::{
    db::{
        connection::Database,
        helpers::{parse_json, parse_optional_json, to_i32, to_json, to_u32},
        models::{
            Blob, MessageEntry, NotificationAction, NotificationCategory, NotificationFilter,
            NotificationPage, NotificationRecord, NotificationStyle, PageCursor, Progress,
            StyleContent,
        },
        query::{resolve_limit, validate_cursor, QueryPlan},
    },
    error::{Error, Result},
};

// Set to true to enable verbose logging in this module
const ENABLE_LOGS: bool = false;

use crate::log_info;

/// Rows per write transaction in a batch.
pub const WRITE_CHUNK_SIZE: usize = 250;

const COLUMNS: &str = "id, source_app, display_name, title, text, sub_text, info_text, summary_text,
    posted_at, category, style, big_text, big_picture, picture_content_description,
    inbox_lines_json, conversation_title, is_group_conversation, messages_json, caller_name,
    progress_current, progress_max, progress_indeterminate, actions_json, is_ongoing,
    auto_cancel, is_local_only, is_group_summary, priority, number, group_key, channel_id,
    small_icon, large_icon, app_icon";

const UPSERT_SQL: &str = "INSERT OR REPLACE INTO notifications (
        id, source_app, display_name, title, text, sub_text, info_text, summary_text,
        posted_at, category, style, big_text, big_picture, picture_content_description,
        inbox_lines_json, conversation_title, is_group_conversation, messages_json, caller_name,
        progress_current, progress_max, progress_indeterminate, actions_json, is_ongoing,
        auto_cancel, is_local_only, is_group_summary, priority, number, group_key, channel_id,
        small_icon, large_icon, app_icon
    ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17,
        ?18, ?19, ?20, ?21, ?22, ?23, ?24, ?25, ?26, ?27, ?28, ?29, ?30, ?31, ?32, ?33, ?34)";

/// Style payload flattened into its nullable columns.
#[derive(Default)]
struct StyleColumns<'a> {
    big_text: Option<&'a str>,
    big_picture: Option<&'a [u8]>,
    picture_content_description: Option<&'a str>,
    inbox_lines_json: Option<String>,
    conversation_title: Option<&'a str>,
    is_group_conversation: bool,
    messages_json: Option<String>,
    caller_name: Option<&'a str>,
}

impl<'a> StyleColumns<'a> {
    fn from_content(content: &'a StyleContent) -> AnyResult<Self> {
        let mut columns = StyleColumns::default();
        match content {
            StyleContent::BigText { big_text } => columns.big_text = big_text.as_deref(),
            StyleContent::BigPicture {
                picture,
                content_description,
            } => {
                columns.big_picture = picture.as_ref().map(Blob::as_bytes);
                columns.picture_content_description = content_description.as_deref();
            }
            StyleContent::Inbox { lines } => {
                columns.inbox_lines_json = Some(to_json(lines, "inbox_lines_json")?);
            }
            StyleContent::Messaging {
                conversation_title,
                is_group_conversation,
                messages,
            } => {
                columns.conversation_title = conversation_title.as_deref();
                columns.is_group_conversation = *is_group_conversation;
                columns.messages_json = Some(to_json(messages, "messages_json")?);
            }
            StyleContent::Call { caller_name } => columns.caller_name = caller_name.as_deref(),
            StyleContent::Media | StyleContent::DecoratedCustom | StyleContent::Default => {}
        }
        Ok(columns)
    }
}

fn upsert(conn: &Connection, record: &NotificationRecord) -> AnyResult<()> {
    let style = StyleColumns::from_content(&record.content)?;
    let actions_json = to_json(&record.actions, "actions_json")?;

    let mut stmt = conn.prepare_cached(UPSERT_SQL)?;
    stmt.execute(params![
        record.id,
        record.source_app,
        record.display_name,
        record.title,
        record.text,
        record.sub_text,
        record.info_text,
        record.summary_text,
        record.posted_at,
        record.category.as_str(),
        record.style().as_str(),
        style.big_text,
        style.big_picture,
        style.picture_content_description,
        style.inbox_lines_json,
        style.conversation_title,
        style.is_group_conversation,
        style.messages_json,
        style.caller_name,
        record.progress.map(|p| p.current),
        record.progress.map(|p| p.max),
        record.progress.map(|p| p.indeterminate),
        actions_json,
        record.is_ongoing,
        record.auto_cancel,
        record.is_local_only,
        record.is_group_summary,
        record.priority,
        record.number,
        record.group_key,
        record.channel_id,
        record.small_icon.as_ref().map(Blob::as_bytes),
        record.large_icon.as_ref().map(Blob::as_bytes),
        record.app_icon.as_ref().map(Blob::as_bytes),
    ])
    .with_context(|| format!("failed to store notification {}", record.id))?;
    Ok(())
}

fn row_to_notification(row: &Row) -> AnyResult<NotificationRecord> {
    let style: String = row.get("style")?;
    let content = match NotificationStyle::from_name(&style) {
        NotificationStyle::BigText => StyleContent::BigText {
            big_text: row.get("big_text")?,
        },
        NotificationStyle::BigPicture => StyleContent::BigPicture {
            picture: row.get::<_, Option<Vec<u8>>>("big_picture")?.map(Blob::from),
            content_description: row.get("picture_content_description")?,
        },
        NotificationStyle::Inbox => StyleContent::Inbox {
            lines: parse_optional_json(row.get("inbox_lines_json")?, "inbox_lines_json")?
                .unwrap_or_default(),
        },
        NotificationStyle::Messaging => StyleContent::Messaging {
            conversation_title: row.get("conversation_title")?,
            is_group_conversation: row.get("is_group_conversation")?,
            messages: parse_optional_json::<Vec<MessageEntry>>(
                row.get("messages_json")?,
                "messages_json",
            )?
            .unwrap_or_default(),
        },
        NotificationStyle::Media => StyleContent::Media,
        NotificationStyle::Call => StyleContent::Call {
            caller_name: row.get("caller_name")?,
        },
        NotificationStyle::DecoratedCustom => StyleContent::DecoratedCustom,
        NotificationStyle::Default => StyleContent::Default,
    };

    let progress = match row.get::<_, Option<i64>>("progress_max")? {
        Some(max) => Some(Progress {
            current: to_i32(
                row.get::<_, Option<i64>>("progress_current")?.unwrap_or(0),
                "progress_current",
            )?,
            max: to_i32(max, "progress_max")?,
            indeterminate: row
                .get::<_, Option<bool>>("progress_indeterminate")?
                .unwrap_or(false),
        }),
        None => None,
    };

    let actions_json: String = row.get("actions_json")?;
    let category: String = row.get("category")?;
    let priority: i64 = row.get("priority")?;
    let number: Option<i64> = row.get("number")?;

    Ok(NotificationRecord {
        id: row.get("id")?,
        source_app: row.get("source_app")?,
        display_name: row.get("display_name")?,
        title: row.get("title")?,
        text: row.get("text")?,
        sub_text: row.get("sub_text")?,
        info_text: row.get("info_text")?,
        summary_text: row.get("summary_text")?,
        posted_at: row.get("posted_at")?,
        category: NotificationCategory::from_name(&category),
        content,
        progress,
        actions: parse_json::<Vec<NotificationAction>>(&actions_json, "actions_json")?,
        is_ongoing: row.get("is_ongoing")?,
        auto_cancel: row.get("auto_cancel")?,
        is_local_only: row.get("is_local_only")?,
        is_group_summary: row.get("is_group_summary")?,
        priority: to_i32(priority, "priority")?,
        number: number.map(|n| to_u32(n, "number")).transpose()?,
        group_key: row.get("group_key")?,
        channel_id: row.get("channel_id")?,
        small_icon: row.get::<_, Option<Vec<u8>>>("small_icon")?.map(Blob::from),
        large_icon: row.get::<_, Option<Vec<u8>>>("large_icon")?.map(Blob::from),
        app_icon: row.get::<_, Option<Vec<u8>>>("app_icon")?.map(Blob::from),
    })
}

/// Result of a chunked batch write, computed on the database thread.
struct BatchOutcome {
    committed: Vec<String>,
    failure: Option<(String, String)>,
}

impl Database {
    /// Insert-or-replace by id. Writing the same record twice leaves one copy.
    pub async fn upsert_notification(&self, record: &NotificationRecord) -> Result<()> {
        let record = record.clone();
        self.execute(move |conn| upsert(conn, &record))
            .await
            .map_err(Error::storage)
    }

    /// Insert-or-replace a batch, one transaction per [`WRITE_CHUNK_SIZE`] rows.
    ///
    /// On failure the failing chunk is rolled back, earlier chunks stay
    /// committed and are listed in [`Error::PartialWrite`]; later chunks are
    /// not attempted.
    pub async fn upsert_notifications(&self, records: Vec<NotificationRecord>) -> Result<usize> {
        if records.is_empty() {
            return Ok(0);
        }

        let outcome = self
            .execute(move |conn| {
                let mut committed = Vec::with_capacity(records.len());

                for chunk in records.chunks(WRITE_CHUNK_SIZE) {
                    let tx = conn.transaction().context("failed to open write transaction")?;
                    let mut failure = None;

                    for record in chunk {
                        if let Err(err) = upsert(&tx, record) {
                            failure = Some((record.id.clone(), format!("{err:#}")));
                            break;
                        }
                    }

                    if let Some(failure) = failure {
                        tx.rollback().context("failed to roll back write transaction")?;
                        return Ok(BatchOutcome {
                            committed,
                            failure: Some(failure),
                        });
                    }

                    tx.commit().context("failed to commit write transaction")?;
                    committed.extend(chunk.iter().map(|record| record.id.clone()));
                    log_info!("committed {} notifications", committed.len());
                }

                Ok(BatchOutcome {
                    committed,
                    failure: None,
                })
            })
            .await
            .map_err(Error::storage)?;

        match outcome.failure {
            None => Ok(outcome.committed.len()),
            Some((failed_id, message)) => Err(Error::PartialWrite {
                committed: outcome.committed,
                failed_id,
                message,
            }),
        }
    }

    /// Removes every stored notification; returns how many were removed.
    pub async fn delete_all_notifications(&self) -> Result<usize> {
        self.execute(|conn| {
            let removed = conn
                .execute("DELETE FROM notifications", [])
                .context("failed to clear notifications")?;
            Ok(removed)
        })
        .await
        .map_err(Error::storage)
    }

    pub async fn count_notifications(&self) -> Result<u64> {
        self.execute(|conn| {
            let count: i64 =
                conn.query_row("SELECT COUNT(*) FROM notifications", [], |row| row.get(0))?;
            u64::try_from(count).map_err(|_| anyhow!("negative row count {count}"))
        })
        .await
        .map_err(Error::storage)
    }

    /// Bytes used on disk by the database file and its WAL companions.
    pub async fn size_on_disk(&self) -> Result<u64> {
        let path = self.path().to_path_buf();
        self.execute(move |_conn| {
            let mut total = 0u64;
            for suffix in ["", "-wal", "-shm"] {
                let mut file = path.clone().into_os_string();
                file.push(suffix);
                match std::fs::metadata(&file) {
                    Ok(meta) => total += meta.len(),
                    Err(err) if err.kind() == std::io::ErrorKind::NotFound => {}
                    Err(err) => {
                        return Err(anyhow::Error::new(err)
                            .context(format!("failed to stat {}", path.display())))
                    }
                }
            }
            Ok(total)
        })
        .await
        .map_err(Error::storage)
    }

    pub async fn get_notification(&self, id: &str) -> Result<Option<NotificationRecord>> {
        let id = id.to_string();
        self.execute(move |conn| {
            let sql = format!("SELECT {COLUMNS} FROM notifications WHERE id = ?1");
            let mut stmt = conn.prepare(&sql)?;
            let record = stmt
                .query_row(params![id], |row| Ok(row_to_notification(row)))
                .optional()?
                .transpose()?;
            Ok(record)
        })
        .await
        .map_err(Error::storage)
    }

    /// One page of notifications, newest first, ties broken by id descending.
    pub async fn query_notifications(
        &self,
        filter: &NotificationFilter,
        cursor: Option<&PageCursor>,
        limit: Option<i64>,
    ) -> Result<NotificationPage> {
        let limit = resolve_limit(limit)?;
        validate_cursor(cursor)?;

        let plan = QueryPlan::new(filter, cursor);
        let sql = plan.select_sql(COLUMNS);
        let params = plan.into_params(limit);

        let notifications = self
            .execute(move |conn| {
                let mut stmt = conn.prepare(&sql).context("failed to prepare page query")?;
                let mut rows = stmt.query(params_from_iter(params))?;
                let mut notifications = Vec::new();
                while let Some(row) = rows.next()? {
                    notifications.push(row_to_notification(row)?);
                }
                Ok(notifications)
            })
            .await
            .map_err(Error::storage)?;

        Ok(NotificationPage::new(notifications))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::models::MessageEntry;
    use tempfile::TempDir;

    fn open_db() -> (TempDir, Database) {
        let dir = tempfile::tempdir().unwrap();
        let db = Database::new(dir.path().join("notifications.sqlite3")).unwrap();
        (dir, db)
    }

    fn record(id: &str, posted_at: i64) -> NotificationRecord {
        let mut record = NotificationRecord::new(id, "com.example.chat", posted_at);
        record.display_name = Some("Chat".into());
        record.title = Some(format!("title {id}"));
        record
    }

    fn ids(page: &NotificationPage) -> Vec<&str> {
        page.notifications.iter().map(|r| r.id.as_str()).collect()
    }

    async fn drain(db: &Database, filter: &NotificationFilter, limit: i64) -> Vec<NotificationRecord> {
        let mut collected = Vec::new();
        let mut cursor: Option<PageCursor> = None;
        loop {
            let page = db
                .query_notifications(filter, cursor.as_ref(), Some(limit))
                .await
                .unwrap();
            if page.is_empty() {
                break;
            }
            cursor = page.next_cursor.clone();
            collected.extend(page.notifications);
        }
        collected
    }

    #[tokio::test]
    async fn put_twice_keeps_one_copy() {
        let (_dir, db) = open_db();
        let r = record("a", 100);

        db.upsert_notification(&r).await.unwrap();
        db.upsert_notification(&r).await.unwrap();

        assert_eq!(db.count_notifications().await.unwrap(), 1);
        let page = db
            .query_notifications(&NotificationFilter::default(), None, None)
            .await
            .unwrap();
        assert_eq!(page.notifications, vec![r]);
    }

    #[tokio::test]
    async fn round_trips_style_payload_and_blobs() {
        let (_dir, db) = open_db();
        let mut r = record("m", 10);
        r.category = NotificationCategory::Message;
        r.content = StyleContent::Messaging {
            conversation_title: Some("Team".into()),
            is_group_conversation: true,
            messages: vec![MessageEntry {
                sender: Some("Ana".into()),
                text: Some("lunch?".into()),
                timestamp: 9,
            }],
        };
        r.progress = Some(Progress {
            current: 3,
            max: 10,
            indeterminate: false,
        });
        r.actions = vec![NotificationAction {
            title: Some("Reply".into()),
            icon: Some(Blob::new(vec![1, 2, 3])),
            allows_remote_input: true,
        }];
        r.number = Some(4);
        r.priority = -1;
        r.large_icon = Some(Blob::new(vec![9; 32]));

        db.upsert_notification(&r).await.unwrap();

        assert_eq!(db.get_notification("m").await.unwrap(), Some(r));
        assert_eq!(db.get_notification("missing").await.unwrap(), None);
    }

    #[tokio::test]
    async fn orders_newest_first_with_id_tie_break() {
        let (_dir, db) = open_db();
        db.upsert_notifications(vec![
            record("D", 80),
            record("B", 90),
            record("A", 100),
            record("C", 90),
        ])
        .await
        .unwrap();

        let filter = NotificationFilter::default();
        let first = db.query_notifications(&filter, None, Some(2)).await.unwrap();
        assert_eq!(ids(&first), vec!["A", "C"]);

        let second = db
            .query_notifications(&filter, first.next_cursor.as_ref(), Some(2))
            .await
            .unwrap();
        assert_eq!(ids(&second), vec!["B", "D"]);

        let third = db
            .query_notifications(&filter, second.next_cursor.as_ref(), Some(2))
            .await
            .unwrap();
        assert!(third.is_empty());
        assert!(third.next_cursor.is_none());
    }

    #[tokio::test]
    async fn timestamp_only_cursor_is_strictly_less_than() {
        let (_dir, db) = open_db();
        db.upsert_notifications(vec![record("A", 100), record("B", 90), record("C", 90), record("D", 80)])
            .await
            .unwrap();

        let page = db
            .query_notifications(&NotificationFilter::default(), Some(&PageCursor::before(90)), None)
            .await
            .unwrap();
        assert_eq!(ids(&page), vec!["D"]);
    }

    #[tokio::test]
    async fn pagination_visits_every_record_once() {
        let (_dir, db) = open_db();
        let records: Vec<_> = (0..57)
            .map(|i| record(&format!("n{i:02}"), 1_000 + (i / 3)))
            .collect();
        db.upsert_notifications(records).await.unwrap();

        let collected = drain(&db, &NotificationFilter::default(), 7).await;

        assert_eq!(collected.len(), 57);
        let mut seen: Vec<_> = collected.iter().map(|r| r.id.clone()).collect();
        seen.sort();
        seen.dedup();
        assert_eq!(seen.len(), 57);
        for pair in collected.windows(2) {
            let ordered = pair[0].posted_at > pair[1].posted_at
                || (pair[0].posted_at == pair[1].posted_at && pair[0].id > pair[1].id);
            assert!(ordered, "{} before {}", pair[0].id, pair[1].id);
        }
    }

    #[tokio::test]
    async fn filtered_page_matches_client_side_predicate() {
        let (_dir, db) = open_db();
        let mut batch = Vec::new();
        for i in 0..40 {
            let mut r = record(&format!("r{i:02}"), 500 + i);
            r.text = Some(if i % 2 == 0 { "Build PASSED".into() } else { "deploy failed".into() });
            r.is_ongoing = i % 3 == 0;
            r.category = if i % 4 == 0 {
                NotificationCategory::Email
            } else {
                NotificationCategory::Message
            };
            r.channel_id = Some(if i % 5 == 0 { "alerts" } else { "general" }.into());
            if i % 7 == 0 {
                r.display_name = Some("Mail".into());
            }
            batch.push(r);
        }
        db.upsert_notifications(batch).await.unwrap();

        let everything = drain(&db, &NotificationFilter::default(), 500).await;
        let filters = vec![
            NotificationFilter {
                text_contains_insensitive: Some("passed".into()),
                ..Default::default()
            },
            NotificationFilter {
                text_contains: Some("passed".into()),
                ..Default::default()
            },
            NotificationFilter {
                is_ongoing: Some(true),
                category: Some(NotificationCategory::Message),
                ..Default::default()
            },
            NotificationFilter {
                channel_id: Some("alerts".into()),
                after_timestamp: Some(505),
                before_timestamp: Some(530),
                ..Default::default()
            },
            NotificationFilter {
                app_names: Some(vec!["Mail".into()]),
                ..Default::default()
            },
            NotificationFilter {
                package_name: Some("com.example.chat".into()),
                style: Some(NotificationStyle::Default),
                is_group_summary: Some(false),
                ..Default::default()
            },
        ];

        for filter in filters {
            let expected: Vec<_> = everything.iter().filter(|r| filter.matches(r)).cloned().collect();
            let actual = drain(&db, &filter, 6).await;
            assert_eq!(actual, expected, "filter {filter:?}");
        }
    }

    #[tokio::test]
    async fn timestamp_bounds_are_exclusive() {
        let (_dir, db) = open_db();
        db.upsert_notifications(vec![record("a", 10), record("b", 20), record("c", 30)])
            .await
            .unwrap();

        let filter = NotificationFilter {
            after_timestamp: Some(10),
            before_timestamp: Some(30),
            ..Default::default()
        };
        let page = db.query_notifications(&filter, None, None).await.unwrap();
        assert_eq!(ids(&page), vec!["b"]);
    }

    #[tokio::test]
    async fn case_insensitive_title_match_handles_unicode() {
        let (_dir, db) = open_db();
        let mut r = record("u", 1);
        r.title = Some("ÉCOLE fermée".into());
        db.upsert_notification(&r).await.unwrap();

        let insensitive = NotificationFilter {
            title_contains_insensitive: Some("école".into()),
            ..Default::default()
        };
        let sensitive = NotificationFilter {
            title_contains: Some("école".into()),
            ..Default::default()
        };
        assert_eq!(db.query_notifications(&insensitive, None, None).await.unwrap().notifications.len(), 1);
        assert!(db.query_notifications(&sensitive, None, None).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn rejects_invalid_limit_and_cursor() {
        let (_dir, db) = open_db();
        let filter = NotificationFilter::default();

        let err = db.query_notifications(&filter, None, Some(0)).await.unwrap_err();
        assert_eq!(err.kind(), "validation");
        let err = db
            .query_notifications(&filter, Some(&PageCursor::before(-5)), None)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), "validation");
    }

    #[tokio::test]
    async fn oversized_limit_is_clamped() {
        let (_dir, db) = open_db();
        let records: Vec<_> = (0..600).map(|i| record(&format!("x{i:03}"), i)).collect();
        db.upsert_notifications(records).await.unwrap();

        let page = db
            .query_notifications(&NotificationFilter::default(), None, Some(10_000))
            .await
            .unwrap();
        assert_eq!(page.notifications.len(), 500);
    }

    #[tokio::test]
    async fn clear_empties_the_store() {
        let (_dir, db) = open_db();
        db.upsert_notifications(vec![record("a", 1), record("b", 2)])
            .await
            .unwrap();

        assert_eq!(db.delete_all_notifications().await.unwrap(), 2);
        assert_eq!(db.count_notifications().await.unwrap(), 0);
        let filter = NotificationFilter {
            title_contains: Some("title".into()),
            ..Default::default()
        };
        assert!(db.query_notifications(&filter, None, None).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn failed_chunk_reports_committed_records() {
        let (_dir, db) = open_db();
        let mut records: Vec<_> = (0..300).map(|i| record(&format!("p{i:03}"), i)).collect();
        // Empty ids violate the table CHECK constraint.
        records[260].id = String::new();

        let err = db.upsert_notifications(records).await.unwrap_err();
        match err {
            Error::PartialWrite {
                committed,
                failed_id,
                ..
            } => {
                assert_eq!(committed.len(), WRITE_CHUNK_SIZE);
                assert_eq!(committed[0], "p000");
                assert_eq!(failed_id, "");
            }
            other => panic!("unexpected error {other:?}"),
        }
        assert_eq!(db.count_notifications().await.unwrap(), WRITE_CHUNK_SIZE as u64);
    }

    #[tokio::test]
    async fn reports_size_on_disk() {
        let (_dir, db) = open_db();
        db.upsert_notification(&record("a", 1)).await.unwrap();
        assert!(db.size_on_disk().await.unwrap() > 0);
    }
}
