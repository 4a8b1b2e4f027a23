//! Raw statements, for inspecting the store from the outside.

use super::{CmdMessage, CmdResult};
use crate::error::Result;
use crate::store::{DocumentStore, QueryOptions, StorageBackend};
use serde_json::Value;

/// Reads a command-line parameter: JSON when it parses (`12`, `2.5`, `null`, `true`),
/// a plain string otherwise.
pub fn parse_param(raw: &str) -> Value {
    serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()))
}

pub fn run<B: StorageBackend>(
    store: &mut DocumentStore<B>,
    statement: &str,
    params: &[Value],
    strict: bool,
) -> Result<CmdResult> {
    let options = QueryOptions::default();
    let rows = if strict {
        store.query_checked(statement, params, options)?
    } else {
        store.query_with(statement, params, options)
    };

    let mut result = CmdResult::default();
    if rows.rows.is_empty() {
        result.add_message(CmdMessage::info(format!("{} ligne(s) affectée(s)", rows.row_count)));
    }
    result.rows = Some(rows);
    Ok(result)
}
