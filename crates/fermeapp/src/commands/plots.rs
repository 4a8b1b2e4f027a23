use super::{decode_rows, first_i64, CmdMessage, CmdResult, PlotView};
use crate::error::{FermeError, Result};
use crate::model::{CropType, PlotStatus};
use crate::prediction::parse_sowing_date;
use crate::store::{DocumentStore, StorageBackend};
use serde_json::{json, Value};
use std::fmt;

use super::tasks::SELECT_PLOTS_WITH_CROP;

const SELECT_CROPS: &str = "SELECT * FROM culture ORDER BY nom_culture";
const INSERT_PLOT: &str = "INSERT INTO parcelle \
     (id_utilisateur, id_culture, nom_parcelle, surface, date_semis, statut) \
     VALUES ($1, $2, $3, $4, $5, $6) RETURNING id_parcelle";
const DELETE_PLOT: &str = "DELETE FROM parcelle WHERE id_parcelle = $1 AND id_utilisateur = $2";

/// A crop given by id or by name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CropRef {
    Id(i64),
    Name(String),
}

impl fmt::Display for CropRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CropRef::Id(id) => write!(f, "#{}", id),
            CropRef::Name(name) => f.write_str(name),
        }
    }
}

impl From<&str> for CropRef {
    fn from(value: &str) -> Self {
        match value.trim().parse::<i64>() {
            Ok(id) => CropRef::Id(id),
            Err(_) => CropRef::Name(value.trim().to_string()),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewPlot {
    pub name: String,
    pub crop: CropRef,
    pub surface: f64,
    pub sowing_date: String,
    pub status: PlotStatus,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct PlotUpdate {
    pub name: Option<String>,
    pub crop: Option<CropRef>,
    pub surface: Option<f64>,
    pub sowing_date: Option<String>,
    pub status: Option<PlotStatus>,
}

impl PlotUpdate {
    fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.crop.is_none()
            && self.surface.is_none()
            && self.sowing_date.is_none()
            && self.status.is_none()
    }
}

fn resolve_crop<B: StorageBackend>(store: &mut DocumentStore<B>, crop: &CropRef) -> Result<CropType> {
    let crops: Vec<CropType> = decode_rows(store.query(SELECT_CROPS, &[]))?;
    let found = match crop {
        CropRef::Id(id) => crops.into_iter().find(|c| c.id_culture == *id),
        CropRef::Name(name) => crops
            .into_iter()
            .find(|c| c.nom_culture.to_lowercase() == name.to_lowercase()),
    };
    found.ok_or_else(|| FermeError::NotFound(format!("crop {}", crop)))
}

fn check_surface(surface: f64) -> Result<()> {
    if surface.is_finite() && surface > 0.0 {
        Ok(())
    } else {
        Err(FermeError::Invalid(format!("surface must be positive, got {}", surface)))
    }
}

fn check_sowing_date(value: &str) -> Result<()> {
    parse_sowing_date(0, Some(value))
        .map(|_| ())
        .map_err(|_| FermeError::Invalid(format!("unreadable sowing date: {}", value)))
}

pub fn list<B: StorageBackend>(store: &mut DocumentStore<B>, user_id: i64) -> Result<CmdResult> {
    let plots: Vec<PlotView> = decode_rows(store.query(SELECT_PLOTS_WITH_CROP, &[json!(user_id)]))?;
    Ok(CmdResult::default().with_plots(plots))
}

pub fn create<B: StorageBackend>(
    store: &mut DocumentStore<B>,
    user_id: i64,
    plot: NewPlot,
) -> Result<CmdResult> {
    check_surface(plot.surface)?;
    check_sowing_date(&plot.sowing_date)?;
    let crop = resolve_crop(store, &plot.crop)?;

    let inserted = store.query(
        INSERT_PLOT,
        &[
            json!(user_id),
            json!(crop.id_culture),
            json!(plot.name),
            json!(plot.surface),
            json!(plot.sowing_date),
            json!(plot.status.as_str()),
        ],
    );
    let id = first_i64(&inserted, "id_parcelle")
        .ok_or_else(|| FermeError::Store("insert returned no id".to_string()))?;

    let mut result = CmdResult {
        created_id: Some(id),
        ..Default::default()
    };
    result.add_message(CmdMessage::success(format!(
        "Parcelle créée : {} ({})",
        plot.name, crop.nom_culture
    )));
    Ok(result)
}

/// Builds `UPDATE parcelle SET a = $1, b = $2 ... WHERE id_parcelle = $N AND id_utilisateur = $N+1`
/// with only the columns present in `update`.
fn update_statement(columns: &[&str]) -> String {
    let set = columns
        .iter()
        .enumerate()
        .map(|(i, col)| format!("{} = ${}", col, i + 1))
        .collect::<Vec<_>>()
        .join(", ");
    format!(
        "UPDATE parcelle SET {} WHERE id_parcelle = ${} AND id_utilisateur = ${}",
        set,
        columns.len() + 1,
        columns.len() + 2
    )
}

pub fn update<B: StorageBackend>(
    store: &mut DocumentStore<B>,
    user_id: i64,
    plot_id: i64,
    update: PlotUpdate,
) -> Result<CmdResult> {
    if update.is_empty() {
        return Err(FermeError::Invalid("nothing to update".to_string()));
    }

    let mut columns: Vec<&str> = Vec::new();
    let mut params: Vec<Value> = Vec::new();

    if let Some(name) = &update.name {
        columns.push("nom_parcelle");
        params.push(json!(name));
    }
    if let Some(surface) = update.surface {
        check_surface(surface)?;
        columns.push("surface");
        params.push(json!(surface));
    }
    if let Some(crop) = &update.crop {
        let crop = resolve_crop(store, crop)?;
        columns.push("id_culture");
        params.push(json!(crop.id_culture));
    }
    if let Some(date) = &update.sowing_date {
        check_sowing_date(date)?;
        columns.push("date_semis");
        params.push(json!(date));
    }
    if let Some(status) = update.status {
        columns.push("statut");
        params.push(json!(status.as_str()));
    }
    params.push(json!(plot_id));
    params.push(json!(user_id));

    let res = store.query(&update_statement(&columns), &params);
    if res.row_count == 0 {
        return Err(FermeError::NotFound(format!("plot {}", plot_id)));
    }

    let mut result = CmdResult::default();
    result.add_message(CmdMessage::success(format!("Parcelle {} mise à jour", plot_id)));
    Ok(result)
}

pub fn delete<B: StorageBackend>(
    store: &mut DocumentStore<B>,
    user_id: i64,
    plot_id: i64,
) -> Result<CmdResult> {
    let res = store.query(DELETE_PLOT, &[json!(plot_id), json!(user_id)]);
    if res.row_count == 0 {
        return Err(FermeError::NotFound(format!("plot {}", plot_id)));
    }
    let mut result = CmdResult::default();
    result.add_message(CmdMessage::success(format!("Parcelle {} supprimée", plot_id)));
    Ok(result)
}
