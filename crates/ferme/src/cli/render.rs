//! Plain-text rendering of command results.
//!
//! Every function returns a `String`; the caller prints it. Colors come from
//! `colored`, which turns itself off when `NO_COLOR` is set.

use colored::*;
use fermeapp::commands::{
    AlertView, CmdMessage, DashboardSummary, MessageLevel, PlotView, StockView,
};
use fermeapp::model::{AlertPriority, PlotStatus};
use fermeapp::prediction::{TaskItem, TaskPriority};
use fermeapp::store::QueryResult;
use std::fmt::Write;
use unicode_width::UnicodeWidthStr;

/// Left-aligns `text` to `width` terminal columns.
fn pad(text: &str, width: usize) -> String {
    let used = UnicodeWidthStr::width(text);
    format!("{}{}", text, " ".repeat(width.saturating_sub(used)))
}

fn column_width<'a>(values: impl Iterator<Item = &'a str>) -> usize {
    values.map(UnicodeWidthStr::width).max().unwrap_or(0)
}

pub fn messages(messages: &[CmdMessage]) -> String {
    let mut out = String::new();
    for m in messages {
        let line = match m.level {
            MessageLevel::Success => m.content.green().to_string(),
            MessageLevel::Warning => m.content.yellow().to_string(),
            MessageLevel::Error => m.content.red().to_string(),
            MessageLevel::Info => m.content.dimmed().to_string(),
        };
        let _ = writeln!(out, "{}", line);
    }
    out
}

fn priority_label(priority: TaskPriority) -> ColoredString {
    match priority {
        TaskPriority::Urgent => "URGENT".red().bold(),
        TaskPriority::High => "haute".yellow(),
        TaskPriority::Medium => "moyenne".normal(),
        TaskPriority::Low => "basse".dimmed(),
    }
}

pub fn tasks(tasks: &[TaskItem]) -> String {
    let name_width = column_width(tasks.iter().map(|t| t.plot.as_str()));
    let mut out = String::new();
    for task in tasks {
        let staff = if task.personnel { " 👥" } else { "" };
        let _ = writeln!(
            out,
            "{} {:<7} {}  {}{}",
            task.icon,
            priority_label(task.priority),
            pad(&task.plot, name_width),
            task.text,
            staff
        );
    }
    out
}

fn status_label(status: PlotStatus) -> ColoredString {
    match status {
        PlotStatus::InProgress => status.as_str().green(),
        PlotStatus::Harvesting => status.as_str().yellow(),
        PlotStatus::Finished => status.as_str().dimmed(),
    }
}

pub fn plots(plots: &[PlotView]) -> String {
    if plots.is_empty() {
        return "Aucune parcelle.\n".dimmed().to_string();
    }
    let name_width = column_width(plots.iter().map(|p| p.plot.nom_parcelle.as_str()));
    let crop_width = column_width(plots.iter().map(|p| p.nom_culture.as_deref().unwrap_or("?")));
    let mut out = String::new();
    for view in plots {
        let p = &view.plot;
        let _ = writeln!(
            out,
            "{:>14}  {}  {}  {:>7.2} ha  {}  {}",
            p.id_parcelle.to_string().dimmed(),
            pad(&p.nom_parcelle, name_width).bold(),
            pad(view.nom_culture.as_deref().unwrap_or("?"), crop_width),
            p.surface,
            p.date_semis,
            status_label(p.statut)
        );
    }
    out
}

pub fn stock(entries: &[StockView]) -> String {
    if entries.is_empty() {
        return "Stock vide.\n".dimmed().to_string();
    }
    let name_width = column_width(entries.iter().map(|s| s.nom_intrant.as_deref().unwrap_or("?")));
    let mut out = String::new();
    for s in entries {
        let quantity = format!("{:>10.2} {}", s.entry.quantite, s.unite.as_deref().unwrap_or(""));
        let quantity = if s.entry.quantite <= 0.0 {
            quantity.red().to_string()
        } else {
            quantity
        };
        let _ = writeln!(
            out,
            "{:>14}  {}  {}  {}",
            s.entry.id_stock.to_string().dimmed(),
            pad(s.nom_intrant.as_deref().unwrap_or("?"), name_width),
            quantity,
            s.categorie.as_deref().unwrap_or("").dimmed()
        );
    }
    out
}

pub fn alerts(alerts: &[AlertView]) -> String {
    if alerts.is_empty() {
        return "Aucune alerte.\n".dimmed().to_string();
    }
    let mut out = String::new();
    for view in alerts {
        let a = &view.alert;
        let marker = if a.lu { " " } else { "●" };
        let priority = match a.priorite {
            AlertPriority::High => a.priorite.as_str().red(),
            AlertPriority::Medium => a.priorite.as_str().yellow(),
            AlertPriority::Low => a.priorite.as_str().normal(),
        };
        let place = view
            .nom_parcelle
            .as_deref()
            .map(|p| format!(" [{}]", p))
            .unwrap_or_default();
        let _ = writeln!(
            out,
            "{} {:>14}  {:<8} {}{}  {}",
            marker.blue(),
            a.id_alerte.to_string().dimmed(),
            priority,
            a.titre.bold(),
            place,
            a.date_creation.format("%Y-%m-%d %H:%M").to_string().dimmed()
        );
        if !a.message.is_empty() {
            let _ = writeln!(out, "{:>17}{}", "", a.message);
        }
    }
    out
}

pub fn dashboard(summary: &DashboardSummary) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "{} parcelle(s)   {} alerte(s) non lue(s)",
        summary.plot_count.to_string().bold(),
        summary.unread_alerts.to_string().bold()
    );
    let _ = writeln!(out);
    out.push_str(&tasks(&summary.tasks));
    out
}

pub fn rows(result: &QueryResult) -> String {
    match serde_json::to_string_pretty(result) {
        Ok(json) => format!("{}\n", json),
        Err(e) => format!("{}\n", e),
    }
}
