//! # Command Layer
//!
//! Business logic for each farm operation. Every command talks to storage the same
//! way an external caller would: by sending statement text and positional
//! parameters to [`DocumentStore::query`](crate::store::DocumentStore::query), then
//! turning the returned rows into typed views.
//!
//! Commands never print. They return a [`CmdResult`] and let the UI decide.
//!
//! ## Command Modules
//!
//! - [`tasks`]: task prediction across a user's active plots
//! - [`plots`]: list, create, update, delete plots
//! - [`stock`]: list stock, set or adjust quantities, add inputs
//! - [`alerts`]: list, report, acknowledge alerts
//! - [`dashboard`]: counters plus the most pressing tasks
//! - [`query`]: raw statements, for diagnostics

use crate::error::{FermeError, Result};
use crate::model::{Alert, Plot, StockEntry};
use crate::prediction::TaskItem;
use crate::store::{QueryResult, Row};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

pub mod alerts;
pub mod dashboard;
pub mod plots;
pub mod query;
pub mod stock;
pub mod tasks;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageLevel {
    Info,
    Success,
    Warning,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CmdMessage {
    pub level: MessageLevel,
    pub content: String,
}

impl CmdMessage {
    pub fn info(content: impl Into<String>) -> Self {
        Self {
            level: MessageLevel::Info,
            content: content.into(),
        }
    }

    pub fn success(content: impl Into<String>) -> Self {
        Self {
            level: MessageLevel::Success,
            content: content.into(),
        }
    }

    pub fn warning(content: impl Into<String>) -> Self {
        Self {
            level: MessageLevel::Warning,
            content: content.into(),
        }
    }
}

/// A plot row, with crop details when the statement joined them in.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlotView {
    #[serde(flatten)]
    pub plot: Plot,
    #[serde(default)]
    pub nom_culture: Option<String>,
    #[serde(default)]
    pub duree_cycle: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StockView {
    #[serde(flatten)]
    pub entry: StockEntry,
    #[serde(default)]
    pub nom_intrant: Option<String>,
    #[serde(default)]
    pub categorie: Option<String>,
    #[serde(default)]
    pub unite: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlertView {
    #[serde(flatten)]
    pub alert: Alert,
    #[serde(default)]
    pub nom_parcelle: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DashboardSummary {
    pub plot_count: i64,
    pub unread_alerts: i64,
    pub tasks: Vec<TaskItem>,
}

#[derive(Debug, Default)]
pub struct CmdResult {
    pub plots: Vec<PlotView>,
    pub stock: Vec<StockView>,
    pub alerts: Vec<AlertView>,
    pub tasks: Vec<TaskItem>,
    pub summary: Option<DashboardSummary>,
    /// Raw statement output, for the `query` command.
    pub rows: Option<QueryResult>,
    /// Id of the row a create command inserted.
    pub created_id: Option<i64>,
    pub messages: Vec<CmdMessage>,
}

impl CmdResult {
    pub fn add_message(&mut self, message: CmdMessage) {
        self.messages.push(message);
    }

    pub fn with_plots(mut self, plots: Vec<PlotView>) -> Self {
        self.plots = plots;
        self
    }

    pub fn with_stock(mut self, stock: Vec<StockView>) -> Self {
        self.stock = stock;
        self
    }

    pub fn with_alerts(mut self, alerts: Vec<AlertView>) -> Self {
        self.alerts = alerts;
        self
    }

    pub fn with_tasks(mut self, tasks: Vec<TaskItem>) -> Self {
        self.tasks = tasks;
        self
    }
}

/// Decodes every row of `result` into `T`.
pub(crate) fn decode_rows<T: DeserializeOwned>(result: QueryResult) -> Result<Vec<T>> {
    result
        .rows
        .into_iter()
        .map(|row| serde_json::from_value(Value::Object(row)).map_err(FermeError::from))
        .collect()
}

/// Reads an integer column from the first row, as returned by counts and inserts.
pub(crate) fn first_i64(result: &QueryResult, column: &str) -> Option<i64> {
    result
        .rows
        .first()
        .and_then(|row: &Row| row.get(column))
        .and_then(Value::as_i64)
}
