use std::convert::TryFrom;

use anyhow::{anyhow, Context, Result};
use serde::{de::DeserializeOwned, Serialize};

pub fn to_u32(value: i64, field: &str) -> Result<u32> {
    u32::try_from(value).map_err(|_| anyhow!("{field} contains out-of-range value {value}"))
}

pub fn to_i32(value: i64, field: &str) -> Result<i32> {
    i32::try_from(value).map_err(|_| anyhow!("{field} contains out-of-range value {value}"))
}

pub fn to_json<T: Serialize>(value: &T, field: &str) -> Result<String> {
    serde_json::to_string(value).with_context(|| format!("failed to encode {field}"))
}

pub fn parse_json<T: DeserializeOwned>(value: &str, field: &str) -> Result<T> {
    serde_json::from_str(value).with_context(|| format!("failed to parse {field}"))
}

pub fn parse_optional_json<T: DeserializeOwned>(
    value: Option<String>,
    field: &str,
) -> Result<Option<T>> {
    match value {
        Some(raw) => parse_json(&raw, field).map(Some),
        None => Ok(None),
    }
}
