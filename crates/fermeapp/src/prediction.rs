//! # Prediction Engine
//!
//! Turns a plot and an optional weather snapshot into recommended tasks.
//!
//! ## Rules
//!
//! 1. **Phenology**: exactly one item for the phase active today (see [`crate::phases`]).
//!    Crucial phases give `High`, others `Medium`.
//! 2. **Rain or storm** in the weather description: a `Low` advice to postpone
//!    irrigation, plus a `High` fungal-risk warning once the plot is more than
//!    [`FUNGAL_RISK_AFTER_DAYS`] days old.
//! 3. **Heat** above [`HEAT_THRESHOLD_CELSIUS`]: an `Urgent` irrigation item.
//!    Only evaluated when rule 2 did not fire.
//!
//! ## Day Count
//!
//! The day count is elapsed milliseconds since sowing divided by one day and floored.
//! It is *not* a calendar-date difference: the result depends on the time of day of
//! both instants, so two calls on the same calendar date may differ by one. Date-only
//! sowing dates are read as UTC midnight.
//!
//! ## Identity
//!
//! Item ids are derived from the plot id plus the day count (phenology) or a weather
//! tag, so regenerating tasks for the same plot, day and weather yields the same ids.
//! The engine does not de-duplicate; callers do.

use crate::error::{FermeError, Result};
use crate::phases::current_phase;
use crate::weather::WeatherSnapshot;
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

pub const FUNGAL_RISK_AFTER_DAYS: i64 = 20;
pub const HEAT_THRESHOLD_CELSIUS: i64 = 30;

const MS_PER_DAY: i64 = 86_400_000;
const WET_KEYWORDS: &[&str] = &["pluie", "rain", "orage", "storm"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskPriority {
    Urgent,
    High,
    Medium,
    Low,
}

impl TaskPriority {
    /// Sort rank, lowest first.
    pub fn rank(&self) -> u8 {
        match self {
            TaskPriority::Urgent => 0,
            TaskPriority::High => 1,
            TaskPriority::Medium => 2,
            TaskPriority::Low => 3,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskCategory {
    Agronomic,
    Advice,
    Warning,
    Urgent,
    Info,
    Error,
}

/// An ephemeral recommended action for one plot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskItem {
    pub id: String,
    /// Display name of the plot.
    pub plot: String,
    pub text: String,
    pub priority: TaskPriority,
    pub icon: String,
    pub category: TaskCategory,
    pub personnel: bool,
}

impl TaskItem {
    /// Shown by callers when no plot produced any task.
    pub fn placeholder() -> Self {
        Self {
            id: "aucune-tache".to_string(),
            plot: String::new(),
            text: "Aucune tâche urgente pour le moment".to_string(),
            priority: TaskPriority::Low,
            icon: "✅".to_string(),
            category: TaskCategory::Info,
            personnel: false,
        }
    }

    /// Stand-in for a plot whose tasks could not be computed.
    pub fn degraded(plot_id: i64, plot_name: &str, error: &FermeError) -> Self {
        Self {
            id: format!("{}-erreur", plot_id),
            plot: plot_name.to_string(),
            text: format!("Analyse impossible : {}", error),
            priority: TaskPriority::Low,
            icon: "⚠️".to_string(),
            category: TaskCategory::Error,
            personnel: false,
        }
    }
}

/// What the engine needs to know about a plot.
#[derive(Debug, Clone, PartialEq)]
pub struct PlotContext {
    pub plot_id: i64,
    pub plot_name: String,
    pub crop_name: String,
    pub sowing_date: Option<String>,
}

/// Parses a sowing date. Date-only values are UTC midnight.
pub fn parse_sowing_date(plot_id: i64, value: Option<&str>) -> Result<DateTime<Utc>> {
    let raw = match value.map(str::trim) {
        Some(v) if !v.is_empty() => v,
        _ => return Err(FermeError::MissingSowingDate(plot_id)),
    };

    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Ok(dt.with_timezone(&Utc));
    }
    for fmt in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, fmt) {
            return Ok(naive.and_utc());
        }
    }
    if let Some(midnight) = NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
    {
        return Ok(midnight.and_utc());
    }

    Err(FermeError::InvalidSowingDate {
        plot_id,
        value: raw.to_string(),
    })
}

/// Whole days elapsed between `sown` and `now`, floored.
pub fn days_since(sown: DateTime<Utc>, now: DateTime<Utc>) -> i64 {
    (now - sown).num_milliseconds().div_euclid(MS_PER_DAY)
}

fn is_wet(description: &str) -> bool {
    let lowered = description.to_lowercase();
    WET_KEYWORDS.iter().any(|k| lowered.contains(k))
}

/// Generates the tasks for `plot` as of now.
pub fn generate_tasks(plot: &PlotContext, weather: Option<&WeatherSnapshot>) -> Result<Vec<TaskItem>> {
    generate_tasks_at(plot, weather, Utc::now())
}

/// Generates the tasks for `plot` as of `now`.
pub fn generate_tasks_at(
    plot: &PlotContext,
    weather: Option<&WeatherSnapshot>,
    now: DateTime<Utc>,
) -> Result<Vec<TaskItem>> {
    let sown = parse_sowing_date(plot.plot_id, plot.sowing_date.as_deref())?;
    let days = days_since(sown, now);
    let phase = current_phase(&plot.crop_name, days);

    let mut tasks = vec![TaskItem {
        id: format!("{}-{}", plot.plot_id, days),
        plot: plot.plot_name.clone(),
        text: format!("{}: {}", phase.name, phase.task),
        priority: if phase.crucial {
            TaskPriority::High
        } else {
            TaskPriority::Medium
        },
        icon: phase.icon.to_string(),
        category: TaskCategory::Agronomic,
        personnel: phase.personnel,
    }];

    let Some(weather) = weather else {
        return Ok(tasks);
    };

    if is_wet(&weather.description) {
        tasks.push(TaskItem {
            id: format!("{}-pluie", plot.plot_id),
            plot: plot.plot_name.clone(),
            text: "Reporter l'irrigation : pluie prévue".to_string(),
            priority: TaskPriority::Low,
            icon: "🌧️".to_string(),
            category: TaskCategory::Advice,
            personnel: false,
        });
        if days > FUNGAL_RISK_AFTER_DAYS {
            tasks.push(TaskItem {
                id: format!("{}-fongique", plot.plot_id),
                plot: plot.plot_name.clone(),
                text: "Inspecter les feuilles : risque fongique".to_string(),
                priority: TaskPriority::High,
                icon: "🍄".to_string(),
                category: TaskCategory::Warning,
                personnel: true,
            });
        }
    } else if weather
        .temperature_value()
        .is_some_and(|t| t > HEAT_THRESHOLD_CELSIUS)
    {
        tasks.push(TaskItem {
            id: format!("{}-chaleur", plot.plot_id),
            plot: plot.plot_name.clone(),
            text: "Irriguer ce soir : forte chaleur".to_string(),
            priority: TaskPriority::Urgent,
            icon: "🔥".to_string(),
            category: TaskCategory::Urgent,
            personnel: true,
        });
    }

    Ok(tasks)
}
