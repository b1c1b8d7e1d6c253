//! Translates a [`NotificationFilter`] plus cursor and limit into SQL.

use rusqlite::types::Value;

use crate::{
    db::{
        connection::FOLD_CONTAINS_FN,
        models::{NotificationFilter, PageCursor},
    },
    error::{Error, Result},
};

pub const DEFAULT_PAGE_SIZE: i64 = 10;
pub const MAX_PAGE_SIZE: i64 = 500;

/// Validates a requested page size: absent means the default, non-positive is
/// rejected, anything above the maximum is clamped.
pub fn resolve_limit(limit: Option<i64>) -> Result<i64> {
    match limit {
        None => Ok(DEFAULT_PAGE_SIZE),
        Some(limit) if limit <= 0 => Err(Error::validation(format!(
            "limit must be a positive integer, got {limit}"
        ))),
        Some(limit) => Ok(limit.min(MAX_PAGE_SIZE)),
    }
}

pub fn validate_cursor(cursor: Option<&PageCursor>) -> Result<()> {
    if let Some(cursor) = cursor {
        if cursor.posted_at < 0 {
            return Err(Error::validation(format!(
                "cursor must be a non-negative timestamp, got {}",
                cursor.posted_at
            )));
        }
    }
    Ok(())
}

/// WHERE clause (without the keyword) and its positional parameters.
#[derive(Debug, Default)]
pub struct QueryPlan {
    clauses: Vec<String>,
    params: Vec<Value>,
}

impl QueryPlan {
    pub fn new(filter: &NotificationFilter, cursor: Option<&PageCursor>) -> Self {
        let mut plan = Self::default();

        if let Some(cursor) = cursor {
            match &cursor.id {
                Some(id) => {
                    plan.push(
                        "(posted_at < ? OR (posted_at = ? AND id < ?))",
                        vec![
                            Value::Integer(cursor.posted_at),
                            Value::Integer(cursor.posted_at),
                            Value::Text(id.clone()),
                        ],
                    );
                }
                None => plan.push("posted_at < ?", vec![Value::Integer(cursor.posted_at)]),
            }
        }

        if let Some(needle) = &filter.text_contains {
            plan.push("instr(text, ?) > 0", vec![Value::Text(needle.clone())]);
        }
        if let Some(needle) = &filter.text_contains_insensitive {
            plan.push(
                &format!("{FOLD_CONTAINS_FN}(text, ?)"),
                vec![Value::Text(needle.clone())],
            );
        }
        if let Some(needle) = &filter.title_contains {
            plan.push("instr(title, ?) > 0", vec![Value::Text(needle.clone())]);
        }
        if let Some(needle) = &filter.title_contains_insensitive {
            plan.push(
                &format!("{FOLD_CONTAINS_FN}(title, ?)"),
                vec![Value::Text(needle.clone())],
            );
        }
        if let Some(names) = filter.app_names.as_deref().filter(|names| !names.is_empty()) {
            let placeholders = vec!["?"; names.len()].join(", ");
            plan.push(
                &format!("display_name IN ({placeholders})"),
                names.iter().cloned().map(Value::Text).collect(),
            );
        }
        if let Some(package) = &filter.package_name {
            plan.push("source_app = ?", vec![Value::Text(package.clone())]);
        }
        if let Some(category) = filter.category {
            plan.push("category = ?", vec![Value::Text(category.as_str().into())]);
        }
        if let Some(style) = filter.style {
            plan.push("style = ?", vec![Value::Text(style.as_str().into())]);
        }
        if let Some(is_ongoing) = filter.is_ongoing {
            plan.push("is_ongoing = ?", vec![Value::Integer(is_ongoing.into())]);
        }
        if let Some(is_group_summary) = filter.is_group_summary {
            plan.push(
                "is_group_summary = ?",
                vec![Value::Integer(is_group_summary.into())],
            );
        }
        if let Some(channel) = &filter.channel_id {
            plan.push("channel_id = ?", vec![Value::Text(channel.clone())]);
        }
        if let Some(after) = filter.after_timestamp {
            plan.push("posted_at > ?", vec![Value::Integer(after)]);
        }
        if let Some(before) = filter.before_timestamp {
            plan.push("posted_at < ?", vec![Value::Integer(before)]);
        }

        plan
    }

    fn push(&mut self, clause: &str, params: Vec<Value>) {
        self.clauses.push(clause.to_string());
        self.params.extend(params);
    }

    /// Full SELECT for one page; `columns` is the projected column list.
    pub fn select_sql(&self, columns: &str) -> String {
        let mut sql = format!("SELECT {columns} FROM notifications");
        if !self.clauses.is_empty() {
            sql.push_str(" WHERE ");
            sql.push_str(&self.clauses.join(" AND "));
        }
        sql.push_str(" ORDER BY posted_at DESC, id DESC LIMIT ?");
        sql
    }

    pub fn into_params(self, limit: i64) -> Vec<Value> {
        let mut params = self.params;
        params.push(Value::Integer(limit));
        params
    }
}
