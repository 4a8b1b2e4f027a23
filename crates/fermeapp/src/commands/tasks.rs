//! Task list across a user's active plots.
//!
//! Each in-progress plot is run through the prediction engine on its own. A plot
//! whose sowing date is missing or unreadable contributes one error item instead
//! of failing the whole list. The merged list is stable-sorted by priority rank,
//! de-duplicated by id, and replaced by a single placeholder when empty.

use super::{decode_rows, CmdResult, PlotView};
use crate::error::Result;
use crate::model::PlotStatus;
use crate::prediction::{generate_tasks_at, PlotContext, TaskItem};
use crate::store::{DocumentStore, StorageBackend};
use crate::weather::{WeatherAdvisory, WeatherSnapshot};
use chrono::{DateTime, Utc};
use serde_json::json;
use std::collections::HashSet;

pub(crate) const SELECT_PLOTS_WITH_CROP: &str = "SELECT p.*, c.nom_culture, c.duree_cycle, c.couleur \
     FROM parcelle p JOIN culture c ON p.id_culture = c.id_culture \
     WHERE p.id_utilisateur = $1 ORDER BY p.date_semis DESC";

impl From<&PlotView> for PlotContext {
    fn from(view: &PlotView) -> Self {
        let sowing = view.plot.date_semis.trim();
        PlotContext {
            plot_id: view.plot.id_parcelle,
            plot_name: view.plot.nom_parcelle.clone(),
            crop_name: view.nom_culture.clone().unwrap_or_default(),
            sowing_date: (!sowing.is_empty()).then(|| sowing.to_string()),
        }
    }
}

/// Merges the tasks of every in-progress plot in `plots`.
pub fn aggregate(
    plots: &[PlotView],
    weather: Option<&WeatherSnapshot>,
    now: DateTime<Utc>,
) -> Vec<TaskItem> {
    let mut tasks: Vec<TaskItem> = Vec::new();
    for view in plots.iter().filter(|v| v.plot.statut == PlotStatus::InProgress) {
        let context = PlotContext::from(view);
        match generate_tasks_at(&context, weather, now) {
            Ok(items) => tasks.extend(items),
            Err(e) => {
                tracing::warn!(plot_id = context.plot_id, error = %e, "task prediction failed");
                tasks.push(TaskItem::degraded(context.plot_id, &context.plot_name, &e));
            }
        }
    }

    tasks.sort_by_key(|t| t.priority.rank());
    let mut seen = HashSet::new();
    tasks.retain(|t| seen.insert(t.id.clone()));

    if tasks.is_empty() {
        tasks.push(TaskItem::placeholder());
    }
    tasks
}

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
    let plots: Vec<PlotView> = decode_rows(store.query(SELECT_PLOTS_WITH_CROP, &[json!(user_id)]))?;
    let weather = advisory.current();
    let tasks = aggregate(&plots, weather.as_ref(), now);
    Ok(CmdResult::default().with_tasks(tasks))
}
