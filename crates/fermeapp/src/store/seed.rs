//! Built-in data written when no backing file exists, or used when it cannot be read.

use crate::model::{CropType, InputType, Plot, PlotStatus, StockEntry, TableSet, User};
use chrono::Utc;

/// Owner of the demo rows.
pub const DEMO_USER_ID: i64 = 1;

fn crop(id: i64, name: &str, cycle_days: i64, color: &str) -> CropType {
    CropType {
        id_culture: id,
        nom_culture: name.to_string(),
        duree_cycle: cycle_days,
        couleur: color.to_string(),
    }
}

fn input(id: i64, name: &str, category: &str, unit: &str) -> InputType {
    InputType {
        id_intrant: id,
        nom_intrant: name.to_string(),
        categorie: category.to_string(),
        unite: unit.to_string(),
    }
}

pub fn default_tables() -> TableSet {
    let now = Utc::now();

    let culture = vec![
        crop(1, "Maïs", 120, "#f4c430"),
        crop(2, "Blé", 130, "#d2b48c"),
        crop(3, "Tomate", 90, "#e53935"),
        crop(4, "Riz", 120, "#8bc34a"),
        crop(5, "Pomme de terre", 110, "#a1887f"),
        crop(6, "Arachide", 130, "#cd853f"),
    ];

    let intrant = vec![
        input(1, "NPK 15-15-15", "engrais", "kg"),
        input(2, "Urée 46%", "engrais", "kg"),
        input(3, "Glyphosate", "herbicide", "L"),
        input(4, "Semences de maïs", "semence", "kg"),
    ];

    let parcelle = vec![Plot {
        id_parcelle: 1,
        id_utilisateur: DEMO_USER_ID,
        id_culture: 1,
        nom_parcelle: "Parcelle de démonstration".to_string(),
        surface: 1.5,
        date_semis: (now - chrono::Duration::days(30)).format("%Y-%m-%d").to_string(),
        statut: PlotStatus::InProgress,
        couleur: culture[0].couleur.clone(),
    }];

    let stock = vec![
        StockEntry {
            id_stock: 1,
            id_utilisateur: DEMO_USER_ID,
            id_intrant: 1,
            quantite: 50.0,
            date_maj: now,
        },
        StockEntry {
            id_stock: 2,
            id_utilisateur: DEMO_USER_ID,
            id_intrant: 3,
            quantite: 10.0,
            date_maj: now,
        },
    ];

    TableSet {
        utilisateur: vec![User {
            id_utilisateur: DEMO_USER_ID,
            nom: "Agriculteur démo".to_string(),
            email: "demo@ferme.local".to_string(),
            ferme: "Ferme de démonstration".to_string(),
            date_inscription: now,
        }],
        culture,
        parcelle,
        alerte: Vec::new(),
        intrant,
        stock,
    }
}
