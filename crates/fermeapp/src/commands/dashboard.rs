use super::{alerts, first_i64, tasks, CmdResult, DashboardSummary};
use crate::error::Result;
use crate::store::{DocumentStore, StorageBackend};
use crate::weather::WeatherAdvisory;
use chrono::{DateTime, Utc};
use serde_json::json;

const COUNT_PLOTS: &str = "SELECT COUNT(*) AS count FROM parcelle WHERE id_utilisateur = $1";

/// How many tasks the dashboard shows.
pub const TOP_TASKS: usize = 5;

pub fn run<B: StorageBackend>(
    store: &mut DocumentStore<B>,
    user_id: i64,
    advisory: &dyn WeatherAdvisory,
) -> Result<CmdResult> {
    run_at(store, user_id, advisory, Utc::now())
}

pub fn run_at<B: StorageBackend>(
    store: &mut DocumentStore<B>,
    user_id: i64,
    advisory: &dyn WeatherAdvisory,
    now: DateTime<Utc>,
) -> Result<CmdResult> {
    let plot_count = first_i64(&store.query(COUNT_PLOTS, &[json!(user_id)]), "count").unwrap_or(0);
    let unread_alerts = alerts::unread_count(store, user_id);
    let mut top = tasks::run_at(store, user_id, advisory, now)?.tasks;
    top.truncate(TOP_TASKS);

    Ok(CmdResult {
        summary: Some(DashboardSummary {
            plot_count,
            unread_alerts,
            tasks: top,
        }),
        ..Default::default()
    })
}
