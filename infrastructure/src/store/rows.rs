//! Row encoding and decoding

use super::error::DecodeError;
use agent_tools_domain::{
    Invocation, InvocationId, InvocationStatus, Pricing, Provider, Tool, ToolSchema,
};
use chrono::{DateTime, Utc};
use rusqlite::Row;

pub(crate) const TOOL_COLUMNS: &str = "t.id, t.name, t.version, t.description, t.schema_json, \
     t.pricing, t.provider_id, t.endpoint, t.timeout_ms, t.tags, t.created_at, t.updated_at, t.is_active";

pub(crate) const PROVIDER_COLUMNS: &str =
    "id, name, endpoint, pubkey, stake_claw, reputation, created_at, last_seen";

pub(crate) const INVOCATION_COLUMNS: &str = "id, tool_id, consumer_id, input_hash, output_hash, \
     receipt_sig, status, cost_claw, escrow_id, started_at, completed_at, error";

pub(crate) fn to_millis(at: DateTime<Utc>) -> i64 {
    at.timestamp_millis()
}

fn from_millis(column: &'static str, idx: usize, ms: i64) -> rusqlite::Result<DateTime<Utc>> {
    DateTime::from_timestamp_millis(ms).ok_or_else(|| {
        DecodeError {
            column,
            reason: format!("timestamp {} out of range", ms),
        }
        .into_sqlite(idx)
    })
}

fn json_column<T: serde::de::DeserializeOwned>(
    row: &Row<'_>,
    column: &'static str,
    idx: usize,
) -> rusqlite::Result<T> {
    let text: String = row.get(idx)?;
    serde_json::from_str(&text).map_err(|e| {
        DecodeError {
            column,
            reason: e.to_string(),
        }
        .into_sqlite(idx)
    })
}

pub(crate) fn join_tags(tags: &[String]) -> String {
    tags.join(",")
}

fn split_tags(tags: &str) -> Vec<String> {
    tags.split(',')
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect()
}

/// Decode a row selected with [`TOOL_COLUMNS`]
pub(crate) fn tool_from_row(row: &Row<'_>) -> rusqlite::Result<Tool> {
    let schema: ToolSchema = json_column(row, "schema_json", 4)?;
    let pricing: Pricing = json_column(row, "pricing", 5)?;
    let tags: String = row.get(9)?;
    Ok(Tool {
        id: row.get(0)?,
        name: row.get(1)?,
        version: row.get(2)?,
        description: row.get(3)?,
        schema,
        pricing,
        provider_id: row.get(6)?,
        endpoint: row.get(7)?,
        timeout_ms: row.get(8)?,
        tags: split_tags(&tags),
        created_at: from_millis("created_at", 10, row.get(10)?)?,
        updated_at: from_millis("updated_at", 11, row.get(11)?)?,
        is_active: row.get::<_, i64>(12)? != 0,
    })
}

/// Decode a row selected with [`PROVIDER_COLUMNS`]
pub(crate) fn provider_from_row(row: &Row<'_>) -> rusqlite::Result<Provider> {
    Ok(Provider {
        id: row.get(0)?,
        name: row.get(1)?,
        endpoint: row.get(2)?,
        pubkey: row.get(3)?,
        stake_claw: row.get(4)?,
        reputation: row.get(5)?,
        created_at: from_millis("created_at", 6, row.get(6)?)?,
        last_seen: from_millis("last_seen", 7, row.get(7)?)?,
    })
}

/// Decode a row selected with [`INVOCATION_COLUMNS`]
pub(crate) fn invocation_from_row(row: &Row<'_>) -> rusqlite::Result<Invocation> {
    let status: String = row.get(6)?;
    let status = status
        .parse::<InvocationStatus>()
        .map_err(|e| {
            DecodeError {
                column: "status",
                reason: e.to_string(),
            }
            .into_sqlite(6)
        })?;
    let completed_at = row
        .get::<_, Option<i64>>(10)?
        .map(|ms| from_millis("completed_at", 10, ms))
        .transpose()?;

    Ok(Invocation {
        id: InvocationId::from(row.get::<_, String>(0)?),
        tool_id: row.get(1)?,
        consumer_id: row.get(2)?,
        input_hash: row.get(3)?,
        output_hash: row.get(4)?,
        receipt_sig: row.get(5)?,
        status,
        cost_claw: row.get(7)?,
        escrow_id: row.get(8)?,
        started_at: from_millis("started_at", 9, row.get(9)?)?,
        completed_at,
        error: row.get(11)?,
    })
}
