//! # Data Model
//!
//! Rows are stored with their relational column names (`id_parcelle`, `nom_culture`, ...)
//! because the same names appear in the statements callers send to the store and in
//! the on-disk JSON file. Rust field names therefore match the columns one to one.
//!
//! Every user-owned row carries `id_utilisateur`. The store filters on it when the
//! caller provides it; it never enforces ownership on its own.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id_utilisateur: i64,
    pub nom: String,
    pub email: String,
    #[serde(default)]
    pub ferme: String,
    pub date_inscription: DateTime<Utc>,
}

/// Reference data describing a cultivar.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CropType {
    pub id_culture: i64,
    pub nom_culture: String,
    /// Full lifecycle length in days.
    pub duree_cycle: i64,
    pub couleur: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum PlotStatus {
    #[default]
    #[serde(rename = "en_cours")]
    InProgress,
    #[serde(rename = "recolte")]
    Harvesting,
    #[serde(rename = "termine")]
    Finished,
}

impl PlotStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PlotStatus::InProgress => "en_cours",
            PlotStatus::Harvesting => "recolte",
            PlotStatus::Finished => "termine",
        }
    }
}

impl FromStr for PlotStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "en_cours" => Ok(PlotStatus::InProgress),
            "recolte" => Ok(PlotStatus::Harvesting),
            "termine" => Ok(PlotStatus::Finished),
            other => Err(format!("unknown plot status: {}", other)),
        }
    }
}

impl fmt::Display for PlotStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A cultivated parcel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Plot {
    pub id_parcelle: i64,
    pub id_utilisateur: i64,
    pub id_culture: i64,
    pub nom_parcelle: String,
    /// Sown area in hectares, always > 0.
    pub surface: f64,
    /// Sowing date as entered (`YYYY-MM-DD` or RFC 3339).
    pub date_semis: String,
    #[serde(default)]
    pub statut: PlotStatus,
    // Copied from the crop type for rendering; the crop type stays authoritative.
    #[serde(default)]
    pub couleur: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InputType {
    pub id_intrant: i64,
    pub nom_intrant: String,
    pub categorie: String,
    pub unite: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StockEntry {
    pub id_stock: i64,
    pub id_utilisateur: i64,
    pub id_intrant: i64,
    pub quantite: f64,
    pub date_maj: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum AlertPriority {
    #[serde(rename = "haute")]
    High,
    #[default]
    #[serde(rename = "moyenne")]
    Medium,
    #[serde(rename = "basse")]
    Low,
}

impl AlertPriority {
    pub fn as_str(&self) -> &'static str {
        match self {
            AlertPriority::High => "haute",
            AlertPriority::Medium => "moyenne",
            AlertPriority::Low => "basse",
        }
    }
}

impl FromStr for AlertPriority {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "haute" => Ok(AlertPriority::High),
            "moyenne" => Ok(AlertPriority::Medium),
            "basse" => Ok(AlertPriority::Low),
            other => Err(format!("unknown alert priority: {}", other)),
        }
    }
}

impl fmt::Display for AlertPriority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Maximum length of an alert's category tag.
pub const ALERT_TYPE_MAX_CHARS: usize = 50;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Alert {
    pub id_alerte: i64,
    pub id_utilisateur: i64,
    #[serde(default)]
    pub id_parcelle: Option<i64>,
    pub titre: String,
    pub message: String,
    pub type_alerte: String,
    #[serde(default)]
    pub priorite: AlertPriority,
    #[serde(default)]
    pub lu: bool,
    pub date_creation: DateTime<Utc>,
}

/// Truncates a category tag to [`ALERT_TYPE_MAX_CHARS`] characters.
pub fn truncate_alert_type(value: &str) -> String {
    value.chars().take(ALERT_TYPE_MAX_CHARS).collect()
}

/// The whole persisted state: one array per logical table.
///
/// This is exactly the shape of the backing JSON file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TableSet {
    #[serde(default)]
    pub utilisateur: Vec<User>,
    #[serde(default)]
    pub culture: Vec<CropType>,
    #[serde(default)]
    pub parcelle: Vec<Plot>,
    #[serde(default)]
    pub alerte: Vec<Alert>,
    #[serde(default)]
    pub intrant: Vec<InputType>,
    #[serde(default)]
    pub stock: Vec<StockEntry>,
}

impl TableSet {
    pub fn crop(&self, id: i64) -> Option<&CropType> {
        self.culture.iter().find(|c| c.id_culture == id)
    }

    pub fn crop_by_name(&self, name: &str) -> Option<&CropType> {
        self.culture.iter().find(|c| c.nom_culture == name)
    }

    pub fn plot(&self, id: i64) -> Option<&Plot> {
        self.parcelle.iter().find(|p| p.id_parcelle == id)
    }

    pub fn input(&self, id: i64) -> Option<&InputType> {
        self.intrant.iter().find(|i| i.id_intrant == id)
    }
}
