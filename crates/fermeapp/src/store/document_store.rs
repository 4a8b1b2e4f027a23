use super::backend::StorageBackend;
use super::placeholders::{
    as_bool, as_f64, as_i64, as_string, assignments, delta_index, mentions, param,
    placeholder_index, resolve, split_clauses, Clauses,
};
use super::seed::default_tables;
use super::shape::{classify, normalize, QueryShape, StockUpdateMode};
use crate::error::{FermeError, Result};
use crate::model::{
    truncate_alert_type, Alert, AlertPriority, InputType, Plot, PlotStatus, StockEntry, TableSet,
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::{json, Map, Value};

/// A result row: column name to value, enriched columns included.
pub type Row = Map<String, Value>;

const DEFAULT_PLOT_COLOR: &str = "#4caf50";
const PLOT_COLUMNS: &[&str] = &["nom_parcelle", "surface", "id_culture", "date_semis", "statut"];

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct QueryResult {
    pub rows: Vec<Row>,
    #[serde(rename = "rowCount")]
    pub row_count: usize,
}

impl QueryResult {
    fn rows(rows: Vec<Row>) -> Self {
        let row_count = rows.len();
        Self { rows, row_count }
    }

    fn affected(row_count: usize) -> Self {
        Self {
            rows: Vec::new(),
            row_count,
        }
    }

    fn single(row: Value) -> Self {
        Self::rows(vec![into_row(row)])
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct QueryOptions {
    /// When set, replaces the store's read-only simulation flag before the statement runs.
    pub emulate_read_only: Option<bool>,
}

impl QueryOptions {
    pub fn read_only(enabled: bool) -> Self {
        Self {
            emulate_read_only: Some(enabled),
        }
    }
}

/// Which rows a statement may see, according to its `id_utilisateur` parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Owner {
    Any,
    Only(i64),
    Nobody,
}

impl Owner {
    fn allows(&self, user: i64) -> bool {
        match self {
            Owner::Any => true,
            Owner::Only(id) => *id == user,
            Owner::Nobody => false,
        }
    }
}

fn owner_at(params: &[Value], index: usize) -> Owner {
    match param(params, index) {
        None => Owner::Any,
        Some(v) => as_i64(v).map(Owner::Only).unwrap_or(Owner::Nobody),
    }
}

fn into_row(value: Value) -> Row {
    match value {
        Value::Object(map) => map,
        _ => Row::new(),
    }
}

fn to_row<T: Serialize>(value: &T) -> Row {
    serde_json::to_value(value).map(into_row).unwrap_or_default()
}

fn param_i64(params: &[Value], index: usize) -> Option<i64> {
    param(params, index).and_then(as_i64)
}

fn param_f64(params: &[Value], index: usize) -> Option<f64> {
    param(params, index).and_then(as_f64)
}

fn param_string(params: &[Value], index: usize) -> Option<String> {
    param(params, index).and_then(as_string)
}

fn param_timestamp(params: &[Value], index: usize) -> Option<DateTime<Utc>> {
    param_string(params, index)
        .and_then(|s| DateTime::parse_from_rfc3339(&s).ok())
        .map(|dt| dt.with_timezone(&Utc))
}

/// Time-based identifier, strictly greater than every existing one.
///
/// `None` once an existing id sits at `i64::MAX`.
fn fresh_id(existing: impl Iterator<Item = i64>) -> Option<i64> {
    let now = Utc::now().timestamp_millis();
    match existing.max() {
        Some(max) => max.checked_add(1).map(|next| now.max(next)),
        None => Some(now),
    }
}

fn next_id(table: &str, existing: impl Iterator<Item = i64>) -> Option<i64> {
    let id = fresh_id(existing);
    if id.is_none() {
        tracing::warn!(table, "no identifier left above the current maximum, insert skipped");
    }
    id
}

/// Emulates a small relational database on top of an in-memory [`TableSet`].
///
/// See the [module docs](crate::store) for the recognized statement shapes.
pub struct DocumentStore<B: StorageBackend> {
    backend: B,
    tables: TableSet,
    read_only: bool,
}

impl<B: StorageBackend> DocumentStore<B> {
    /// Loads the persisted tables, or seeds defaults.
    ///
    /// - Nothing persisted: seed data is written out.
    /// - Unreadable data: logged, seed data is used in memory and the bad file is left
    ///   alone until the next mutation overwrites it.
    pub fn open(backend: B) -> Self {
        Self::open_with(backend, false)
    }

    /// Like [`open`](Self::open), with the read-only simulation flag applied up front:
    /// when set, missing data is seeded in memory and nothing is written.
    pub fn open_with(backend: B, read_only: bool) -> Self {
        let tables = Self::load_or_seed(&backend, read_only);
        Self {
            backend,
            tables,
            read_only,
        }
    }

    fn load_or_seed(backend: &B, read_only: bool) -> TableSet {
        match backend.load() {
            Ok(Some(tables)) => {
                tracing::debug!(location = %backend.location(), "loaded tables");
                tables
            }
            Ok(None) if read_only => {
                tracing::info!(location = %backend.location(), "no data file, seeding in memory only");
                default_tables()
            }
            Ok(None) => {
                tracing::info!(location = %backend.location(), "no data file, writing seed data");
                let tables = default_tables();
                if let Err(e) = backend.save(&tables) {
                    tracing::error!(location = %backend.location(), error = %e, "failed to write seed data");
                }
                tables
            }
            Err(e) => {
                tracing::warn!(
                    location = %backend.location(),
                    error = %e,
                    "data file unreadable, falling back to seed data"
                );
                default_tables()
            }
        }
    }

    pub fn set_read_only(&mut self, read_only: bool) {
        self.read_only = read_only;
    }

    /// Whether mutations are kept in memory only.
    pub fn is_read_only(&self) -> bool {
        self.read_only
    }

    pub fn tables(&self) -> &TableSet {
        &self.tables
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Discards in-memory state and reads the backend again.
    pub fn reload(&mut self) {
        self.tables = Self::load_or_seed(&self.backend, self.read_only);
    }

    /// Runs a statement with default options. Never fails: unrecognized statements
    /// return an empty result.
    pub fn query(&mut self, statement: &str, params: &[Value]) -> QueryResult {
        self.query_with(statement, params, QueryOptions::default())
    }

    pub fn query_with(
        &mut self,
        statement: &str,
        params: &[Value],
        options: QueryOptions,
    ) -> QueryResult {
        if let Some(read_only) = options.emulate_read_only {
            self.read_only = read_only;
        }
        let text = normalize(statement);
        let shape = classify(&text);
        tracing::debug!(?shape, params = params.len(), "query");
        if shape == QueryShape::Unrecognized {
            tracing::debug!(statement = %text, "unrecognized statement, returning empty result");
        }
        self.execute(&shape, &text, params)
    }

    /// Like [`query_with`](Self::query_with) but unrecognized statements are an error.
    pub fn query_checked(
        &mut self,
        statement: &str,
        params: &[Value],
        options: QueryOptions,
    ) -> Result<QueryResult> {
        if classify(statement) == QueryShape::Unrecognized {
            return Err(FermeError::UnrecognizedQuery(normalize(statement)));
        }
        Ok(self.query_with(statement, params, options))
    }

    fn execute(&mut self, shape: &QueryShape, text: &str, params: &[Value]) -> QueryResult {
        let clauses = split_clauses(text);
        let result = match shape {
            QueryShape::CountPlots => self.count_plots(clauses, params),
            QueryShape::CountAlerts { unread_only } => {
                self.count_alerts(clauses, params, *unread_only)
            }
            QueryShape::SelectPlotsWithCrop => self.select_plots(clauses, params, true),
            QueryShape::SelectPlots => self.select_plots(clauses, params, false),
            QueryShape::SelectStock => self.select_stock(clauses, params),
            QueryShape::SelectAlerts => self.select_alerts(clauses, params),
            QueryShape::SelectUser => self.select_user(clauses, params),
            QueryShape::SelectInputTypes => {
                QueryResult::rows(self.tables.intrant.iter().map(to_row).collect())
            }
            QueryShape::SelectCropTypes => {
                QueryResult::rows(self.tables.culture.iter().map(to_row).collect())
            }
            QueryShape::InsertPlot => self.insert_plot(params),
            QueryShape::InsertAlert => self.insert_alert(params),
            QueryShape::InsertInputType => self.insert_input_type(params),
            QueryShape::InsertStock => self.insert_stock(params),
            QueryShape::UpdatePlot => self.update_plot(clauses, params),
            QueryShape::UpdateStock(mode) => self.update_stock(clauses, params, *mode),
            QueryShape::UpdateAlertRead => self.mark_alert_read(clauses, params),
            QueryShape::DeletePlot => self.delete_plot(clauses, params),
            QueryShape::ShowColumns { column } => QueryResult::single(json!({ "Field": column })),
            QueryShape::Unrecognized => QueryResult::default(),
        };

        if shape.is_mutation() && result.row_count > 0 {
            self.persist();
        }
        result
    }

    /// Writes the full table set, unless read-only simulation is on. Failures are
    /// logged and swallowed: memory stays authoritative for this process.
    fn persist(&self) {
        if self.read_only {
            tracing::debug!("read-only simulation, skipping save");
            return;
        }
        if let Err(e) = self.backend.save(&self.tables) {
            tracing::error!(location = %self.backend.location(), error = %e, "failed to save tables");
        }
    }

    fn owner(clauses: Clauses<'_>, params: &[Value], fallback: usize) -> Owner {
        owner_at(params, resolve(clauses.filter, "id_utilisateur", fallback).index())
    }

    // --- Reads ---

    fn count_plots(&self, clauses: Clauses<'_>, params: &[Value]) -> QueryResult {
        let owner = Self::owner(clauses, params, 0);
        let count = self
            .tables
            .parcelle
            .iter()
            .filter(|p| owner.allows(p.id_utilisateur))
            .count();
        QueryResult::single(json!({ "count": count }))
    }

    /// `lu` is filtered by its `$N` parameter when bound, else by a literal unread test.
    fn count_alerts(&self, clauses: Clauses<'_>, params: &[Value], unread_only: bool) -> QueryResult {
        let owner = Self::owner(clauses, params, 0);
        let read = match placeholder_index(clauses.filter, "lu") {
            Some(i) => param(params, i).and_then(as_bool),
            None if unread_only => Some(false),
            None => None,
        };
        let count = self
            .tables
            .alerte
            .iter()
            .filter(|a| owner.allows(a.id_utilisateur) && read.map_or(true, |r| a.lu == r))
            .count();
        QueryResult::single(json!({ "count": count }))
    }

    fn select_plots(&self, clauses: Clauses<'_>, params: &[Value], with_crop: bool) -> QueryResult {
        let owner = Self::owner(clauses, params, 0);
        let only_plot = placeholder_index(clauses.filter, "id_parcelle")
            .map(|i| param_i64(params, i));

        let mut plots: Vec<&Plot> = self
            .tables
            .parcelle
            .iter()
            .filter(|p| owner.allows(p.id_utilisateur))
            .filter(|p| only_plot.map_or(true, |id| id == Some(p.id_parcelle)))
            .collect();

        if !with_crop {
            return QueryResult::rows(plots.into_iter().map(to_row).collect());
        }

        plots.sort_by(|a, b| b.date_semis.cmp(&a.date_semis));
        let rows = plots
            .into_iter()
            .map(|p| {
                let mut row = to_row(p);
                if let Some(crop) = self.tables.crop(p.id_culture) {
                    row.insert("nom_culture".into(), json!(crop.nom_culture));
                    row.insert("duree_cycle".into(), json!(crop.duree_cycle));
                    row.insert("couleur".into(), json!(crop.couleur));
                }
                row
            })
            .collect();
        QueryResult::rows(rows)
    }

    fn select_stock(&self, clauses: Clauses<'_>, params: &[Value]) -> QueryResult {
        let owner = Self::owner(clauses, params, 0);
        let rows = self
            .tables
            .stock
            .iter()
            .filter(|s| owner.allows(s.id_utilisateur))
            .map(|s| {
                let mut row = to_row(s);
                if let Some(input) = self.tables.input(s.id_intrant) {
                    row.insert("nom_intrant".into(), json!(input.nom_intrant));
                    row.insert("categorie".into(), json!(input.categorie));
                    row.insert("unite".into(), json!(input.unite));
                }
                row
            })
            .collect();
        QueryResult::rows(rows)
    }

    fn select_alerts(&self, clauses: Clauses<'_>, params: &[Value]) -> QueryResult {
        let owner = Self::owner(clauses, params, 0);
        let mut alerts: Vec<&Alert> = self
            .tables
            .alerte
            .iter()
            .filter(|a| owner.allows(a.id_utilisateur))
            .collect();
        alerts.sort_by(|a, b| b.date_creation.cmp(&a.date_creation));

        let rows = alerts
            .into_iter()
            .map(|a| {
                let mut row = to_row(a);
                let plot_name = a
                    .id_parcelle
                    .and_then(|id| self.tables.plot(id))
                    .map(|p| p.nom_parcelle.clone());
                row.insert("nom_parcelle".into(), json!(plot_name));
                row
            })
            .collect();
        QueryResult::rows(rows)
    }

    fn select_user(&self, clauses: Clauses<'_>, params: &[Value]) -> QueryResult {
        let index = resolve(clauses.filter, "id_utilisateur", 0).index();
        let Some(id) = param_i64(params, index) else {
            return QueryResult::default();
        };
        QueryResult::rows(
            self.tables
                .utilisateur
                .iter()
                .filter(|u| u.id_utilisateur == id)
                .take(1)
                .map(to_row)
                .collect(),
        )
    }

    // --- Inserts ---

    /// `[id_utilisateur, id_culture, nom_parcelle, surface, date_semis, statut?, couleur?]`
    fn insert_plot(&mut self, params: &[Value]) -> QueryResult {
        let Some(id) = next_id("parcelle", self.tables.parcelle.iter().map(|p| p.id_parcelle)) else {
            return QueryResult::default();
        };
        let id_culture = param_i64(params, 1).unwrap_or_default();
        let statut = param_string(params, 5)
            .and_then(|s| s.parse::<PlotStatus>().ok())
            .unwrap_or_default();
        let couleur = param_string(params, 6)
            .or_else(|| self.tables.crop(id_culture).map(|c| c.couleur.clone()))
            .unwrap_or_else(|| DEFAULT_PLOT_COLOR.to_string());

        self.tables.parcelle.push(Plot {
            id_parcelle: id,
            id_utilisateur: param_i64(params, 0).unwrap_or_default(),
            id_culture,
            nom_parcelle: param_string(params, 2).unwrap_or_default(),
            surface: param_f64(params, 3).unwrap_or_default(),
            date_semis: param_string(params, 4).unwrap_or_default(),
            statut,
            couleur,
        });
        QueryResult::single(json!({ "id_parcelle": id }))
    }

    /// Seven parameters: `[user, titre, message, type, priorite, lu, date_creation]`.
    /// Eight parameters add the plot reference after the user.
    fn insert_alert(&mut self, params: &[Value]) -> QueryResult {
        let (id_parcelle, rest) = if params.len() >= 8 {
            (param_i64(params, 1), &params[2..])
        } else {
            (None, params.get(1..).unwrap_or(&[]))
        };

        let priorite = match param_string(rest, 3) {
            Some(raw) => raw.parse::<AlertPriority>().unwrap_or_else(|e| {
                tracing::warn!(%e, "defaulting alert priority");
                AlertPriority::default()
            }),
            None => AlertPriority::default(),
        };

        let Some(id) = next_id("alerte", self.tables.alerte.iter().map(|a| a.id_alerte)) else {
            return QueryResult::default();
        };
        self.tables.alerte.push(Alert {
            id_alerte: id,
            id_utilisateur: param_i64(params, 0).unwrap_or_default(),
            id_parcelle,
            titre: param_string(rest, 0).unwrap_or_default(),
            message: param_string(rest, 1).unwrap_or_default(),
            type_alerte: truncate_alert_type(&param_string(rest, 2).unwrap_or_default()),
            priorite,
            lu: param(rest, 4).and_then(as_bool).unwrap_or(false),
            date_creation: param_timestamp(rest, 5).unwrap_or_else(Utc::now),
        });
        QueryResult::single(json!({ "id_alerte": id }))
    }

    /// `[nom_intrant, categorie, unite]`
    fn insert_input_type(&mut self, params: &[Value]) -> QueryResult {
        let Some(id) = next_id("intrant", self.tables.intrant.iter().map(|i| i.id_intrant)) else {
            return QueryResult::default();
        };
        self.tables.intrant.push(InputType {
            id_intrant: id,
            nom_intrant: param_string(params, 0).unwrap_or_default(),
            categorie: param_string(params, 1).unwrap_or_default(),
            unite: param_string(params, 2).unwrap_or_default(),
        });
        QueryResult::single(json!({ "id_intrant": id }))
    }

    /// `[id_utilisateur, id_intrant, quantite]`, a null quantity becomes 0.
    fn insert_stock(&mut self, params: &[Value]) -> QueryResult {
        let Some(id) = next_id("stock", self.tables.stock.iter().map(|s| s.id_stock)) else {
            return QueryResult::default();
        };
        self.tables.stock.push(StockEntry {
            id_stock: id,
            id_utilisateur: param_i64(params, 0).unwrap_or_default(),
            id_intrant: param_i64(params, 1).unwrap_or_default(),
            quantite: param_f64(params, 2).unwrap_or(0.0),
            date_maj: Utc::now(),
        });
        QueryResult::single(json!({ "id_stock": id }))
    }

    // --- Updates and deletes ---

    /// Target row: `id_parcelle = $N` and `id_utilisateur = $N`, else the last two
    /// parameters. Only columns assigned in the `SET` clause change.
    fn update_plot(&mut self, clauses: Clauses<'_>, params: &[Value]) -> QueryResult {
        let n = params.len();
        let plot_index = resolve(clauses.filter, "id_parcelle", n.saturating_sub(2)).index();
        let owner = Self::owner(clauses, params, n.saturating_sub(1));
        let Some(plot_id) = param_i64(params, plot_index) else {
            return QueryResult::affected(0);
        };

        let updates = assignments(clauses.set, PLOT_COLUMNS);
        let crop_colors: Vec<(i64, String)> = self
            .tables
            .culture
            .iter()
            .map(|c| (c.id_culture, c.couleur.clone()))
            .collect();

        let Some(plot) = self
            .tables
            .parcelle
            .iter_mut()
            .find(|p| p.id_parcelle == plot_id && owner.allows(p.id_utilisateur))
        else {
            return QueryResult::affected(0);
        };

        for update in updates {
            let value = param(params, update.position.index());
            match update.column {
                "nom_parcelle" => {
                    if let Some(name) = value.and_then(as_string) {
                        plot.nom_parcelle = name;
                    }
                }
                "surface" => match value.and_then(as_f64) {
                    Some(area) if area > 0.0 => plot.surface = area,
                    _ => tracing::warn!(plot_id, "ignoring non-positive or missing surface"),
                },
                "id_culture" => {
                    if let Some(crop_id) = value.and_then(as_i64) {
                        plot.id_culture = crop_id;
                        if let Some((_, color)) = crop_colors.iter().find(|(id, _)| *id == crop_id) {
                            plot.couleur = color.clone();
                        }
                    }
                }
                "date_semis" => {
                    if let Some(date) = value.and_then(as_string) {
                        plot.date_semis = date;
                    }
                }
                "statut" => match value.and_then(as_string).map(|s| s.parse::<PlotStatus>()) {
                    Some(Ok(status)) => plot.statut = status,
                    Some(Err(e)) => tracing::warn!(plot_id, %e, "ignoring status"),
                    None => {}
                },
                _ => {}
            }
        }
        QueryResult::affected(1)
    }

    /// Target rows: `id_stock` or `id_intrant` (whichever the `WHERE` names) plus owner.
    fn update_stock(
        &mut self,
        clauses: Clauses<'_>,
        params: &[Value],
        mode: StockUpdateMode,
    ) -> QueryResult {
        let by_input = !mentions(clauses.filter, "id_stock") && mentions(clauses.filter, "id_intrant");
        let key_column = if by_input { "id_intrant" } else { "id_stock" };
        let key_index = resolve(clauses.filter, key_column, 1).index();
        let owner = Self::owner(clauses, params, 2);
        let Some(key) = param_i64(params, key_index) else {
            return QueryResult::affected(0);
        };

        let value_index = match mode {
            StockUpdateMode::Set => resolve(clauses.set, "quantite", 0).index(),
            StockUpdateMode::Adjust => delta_index(clauses.set).unwrap_or(0),
        };
        let value = param_f64(params, value_index).unwrap_or(0.0);
        let now = Utc::now();

        let mut affected = 0;
        for entry in self.tables.stock.iter_mut() {
            let entry_key = if by_input { entry.id_intrant } else { entry.id_stock };
            if entry_key != key || !owner.allows(entry.id_utilisateur) {
                continue;
            }
            let quantite = match mode {
                StockUpdateMode::Set => value,
                StockUpdateMode::Adjust => (entry.quantite + value).max(0.0),
            };
            // JSON has no infinity: a non-finite quantity would not survive a reload.
            if !quantite.is_finite() {
                tracing::warn!(
                    id_stock = entry.id_stock,
                    current = entry.quantite,
                    value,
                    "quantity out of range, row left unchanged"
                );
                continue;
            }
            entry.quantite = quantite;
            entry.date_maj = now;
            affected += 1;
        }
        QueryResult::affected(affected)
    }

    fn mark_alert_read(&mut self, clauses: Clauses<'_>, params: &[Value]) -> QueryResult {
        let alert_index = resolve(clauses.filter, "id_alerte", 0).index();
        let owner = Self::owner(clauses, params, 1);
        let Some(alert_id) = param_i64(params, alert_index) else {
            return QueryResult::affected(0);
        };
        let read = match placeholder_index(clauses.set, "lu") {
            Some(i) => param(params, i).and_then(as_bool).unwrap_or(true),
            None => !clauses.set.contains("false"),
        };

        let mut affected = 0;
        for alert in self.tables.alerte.iter_mut() {
            if alert.id_alerte == alert_id && owner.allows(alert.id_utilisateur) {
                alert.lu = read;
                affected += 1;
            }
        }
        QueryResult::affected(affected)
    }

    fn delete_plot(&mut self, clauses: Clauses<'_>, params: &[Value]) -> QueryResult {
        let plot_index = resolve(clauses.filter, "id_parcelle", 0).index();
        let owner = if mentions(clauses.filter, "id_utilisateur") {
            Self::owner(clauses, params, 1)
        } else {
            Owner::Any
        };
        let Some(plot_id) = param_i64(params, plot_index) else {
            return QueryResult::affected(0);
        };

        let before = self.tables.parcelle.len();
        self.tables
            .parcelle
            .retain(|p| !(p.id_parcelle == plot_id && owner.allows(p.id_utilisateur)));
        QueryResult::affected(before - self.tables.parcelle.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::mem_backend::MemBackend;
    use crate::store::seed::DEMO_USER_ID;

    const SELECT_PLOTS: &str = "SELECT p.*, c.nom_culture, c.duree_cycle, c.couleur
        FROM parcelle p JOIN culture c ON p.id_culture = c.id_culture
        WHERE p.id_utilisateur = $1 ORDER BY p.date_semis DESC";
    const INSERT_PLOT: &str = "INSERT INTO parcelle
        (id_utilisateur, id_culture, nom_parcelle, surface, date_semis)
        VALUES ($1, $2, $3, $4, $5) RETURNING id_parcelle";

    fn store() -> DocumentStore<MemBackend> {
        DocumentStore::open(MemBackend::new())
    }

    fn insert_plot(store: &mut DocumentStore<MemBackend>, user: i64, name: &str, sown: &str) -> i64 {
        let res = store.query(INSERT_PLOT, &[json!(user), json!(2), json!(name), json!(3.5), json!(sown)]);
        res.rows[0]["id_parcelle"].as_i64().unwrap()
    }

    fn stock_quantity(store: &DocumentStore<MemBackend>, id: i64) -> f64 {
        store.tables().stock.iter().find(|s| s.id_stock == id).unwrap().quantite
    }

    #[test]
    fn open_seeds_and_persists_when_empty() {
        let store = store();
        assert!(!store.tables().culture.is_empty());
        assert_eq!(store.backend().saves(), 1);
        assert!(store.backend().raw().unwrap().contains("\"parcelle\""));
    }

    #[test]
    fn open_falls_back_to_seed_on_corrupt_data() {
        let store = DocumentStore::open(MemBackend::with_raw("{ not json"));
        assert_eq!(store.tables().culture.len(), default_tables().culture.len());
        // The unreadable data is left untouched until a mutation.
        assert_eq!(store.backend().raw().unwrap(), "{ not json");
        assert_eq!(store.backend().saves(), 0);
    }

    #[test]
    fn inserted_plot_is_listed_with_crop_details() {
        let mut store = store();
        let id = insert_plot(&mut store, 42, "Champ du bas", "2024-04-02");

        let res = store.query(SELECT_PLOTS, &[json!(42)]);
        assert_eq!(res.row_count, 1);
        let row = &res.rows[0];
        assert_eq!(row["id_parcelle"], json!(id));
        assert_eq!(row["nom_culture"], json!("Blé"));
        assert_eq!(row["duree_cycle"], json!(130));
        assert_eq!(row["couleur"], json!("#d2b48c"));
        assert_eq!(row["statut"], json!("en_cours"));
    }

    #[test]
    fn plots_sorted_by_sowing_date_descending() {
        let mut store = store();
        insert_plot(&mut store, 9, "Ancien", "2023-01-10");
        insert_plot(&mut store, 9, "Récent", "2024-06-01");
        insert_plot(&mut store, 9, "Milieu", "2023-09-15");

        let res = store.query(SELECT_PLOTS, &[json!(9)]);
        let names: Vec<_> = res.rows.iter().map(|r| r["nom_parcelle"].clone()).collect();
        assert_eq!(names, vec![json!("Récent"), json!("Milieu"), json!("Ancien")]);
    }

    #[test]
    fn user_filter_accepts_string_ids_and_is_optional() {
        let mut store = store();
        insert_plot(&mut store, 5, "A", "2024-01-01");
        insert_plot(&mut store, 6, "B", "2024-01-01");

        assert_eq!(store.query("SELECT * FROM parcelle WHERE id_utilisateur = $1", &[json!("5")]).row_count, 1);
        let all = store.query("SELECT * FROM parcelle", &[]).row_count;
        assert_eq!(all, store.tables().parcelle.len());
        assert_eq!(store.query("SELECT * FROM parcelle WHERE id_utilisateur = $1", &[json!("x")]).row_count, 0);
    }

    #[test]
    fn plain_plot_select_is_not_enriched() {
        let mut store = store();
        insert_plot(&mut store, 5, "A", "2024-01-01");
        let res = store.query("SELECT * FROM parcelle WHERE id_utilisateur = $1", &[json!(5)]);
        assert!(!res.rows[0].contains_key("nom_culture"));
    }

    #[test]
    fn counts_scoped_by_user() {
        let mut store = store();
        insert_plot(&mut store, 5, "A", "2024-01-01");
        insert_plot(&mut store, 5, "B", "2024-01-01");
        let res = store.query("SELECT COUNT(*) FROM parcelle WHERE id_utilisateur = $1", &[json!(5)]);
        assert_eq!(res.rows[0]["count"], json!(2));
        assert_eq!(res.row_count, 1);
    }

    #[test]
    fn update_plot_with_placeholder_positions() {
        let mut store = store();
        let id = insert_plot(&mut store, 5, "A", "2024-01-01");

        let res = store.query(
            "UPDATE parcelle SET nom_parcelle = $3, statut = $4 WHERE id_utilisateur = $2 AND id_parcelle = $1",
            &[json!(id), json!(5), json!("Renommée"), json!("recolte")],
        );
        assert_eq!(res.row_count, 1);
        let plot = store.tables().plot(id).unwrap();
        assert_eq!(plot.nom_parcelle, "Renommée");
        assert_eq!(plot.statut, PlotStatus::Harvesting);
        assert_eq!(plot.surface, 3.5);
    }

    #[test]
    fn update_plot_falls_back_to_last_two_params() {
        let mut store = store();
        let id = insert_plot(&mut store, 5, "A", "2024-01-01");

        let res = store.query(
            "UPDATE parcelle SET surface = ?, id_culture = ? WHERE id_parcelle = ? AND id_utilisateur = ?",
            &[json!(8.25), json!(3), json!(id), json!(5)],
        );
        assert_eq!(res.row_count, 1);
        let plot = store.tables().plot(id).unwrap();
        assert_eq!(plot.surface, 8.25);
        assert_eq!(plot.id_culture, 3);
        assert_eq!(plot.couleur, "#e53935");
    }

    #[test]
    fn update_plot_of_other_user_affects_nothing() {
        let mut store = store();
        let id = insert_plot(&mut store, 5, "A", "2024-01-01");
        let res = store.query(
            "UPDATE parcelle SET nom_parcelle = $1 WHERE id_parcelle = $2 AND id_utilisateur = $3",
            &[json!("Volée"), json!(id), json!(6)],
        );
        assert_eq!(res.row_count, 0);
        assert_eq!(store.tables().plot(id).unwrap().nom_parcelle, "A");
    }

    #[test]
    fn update_plot_rejects_non_positive_area() {
        let mut store = store();
        let id = insert_plot(&mut store, 5, "A", "2024-01-01");
        store.query(
            "UPDATE parcelle SET surface = $1 WHERE id_parcelle = $2 AND id_utilisateur = $3",
            &[json!(-1), json!(id), json!(5)],
        );
        assert_eq!(store.tables().plot(id).unwrap().surface, 3.5);
    }

    #[test]
    fn stock_adjust_clamps_at_zero() {
        let mut store = store();
        let id = store.query("INSERT INTO stock VALUES ($1, $2, $3)", &[json!(5), json!(1), json!(5)])
            .rows[0]["id_stock"]
            .as_i64()
            .unwrap();

        let res = store.query(
            "UPDATE stock SET quantite = GREATEST(0, quantite + $1) WHERE id_stock = $2 AND id_utilisateur = $3",
            &[json!(-20), json!(id), json!(5)],
        );
        assert_eq!(res.row_count, 1);
        assert_eq!(stock_quantity(&store, id), 0.0);
    }

    #[test]
    fn stock_set_then_adjust() {
        let mut store = store();
        let id = store.query("INSERT INTO stock VALUES ($1, $2, $3)", &[json!(5), json!(1), json!(5)])
            .rows[0]["id_stock"]
            .as_i64()
            .unwrap();

        store.query(
            "UPDATE stock SET quantite = $1 WHERE id_stock = $2 AND id_utilisateur = $3",
            &[json!(100), json!(id), json!(5)],
        );
        assert_eq!(stock_quantity(&store, id), 100.0);

        store.query(
            "UPDATE stock SET quantite = GREATEST(0, quantite + $1) WHERE id_stock = $2 AND id_utilisateur = $3",
            &[json!(-30), json!(id), json!(5)],
        );
        assert_eq!(stock_quantity(&store, id), 70.0);
    }

    #[test]
    fn stock_located_by_input_id() {
        let mut store = store();
        let id = store.query("INSERT INTO stock VALUES ($1, $2, $3)", &[json!(5), json!(3), json!(12)])
            .rows[0]["id_stock"]
            .as_i64()
            .unwrap();

        let res = store.query(
            "UPDATE stock SET quantite = GREATEST(0, quantite + $1) WHERE id_intrant = $2 AND id_utilisateur = $3",
            &[json!("2.5"), json!(3), json!(5)],
        );
        assert_eq!(res.row_count, 1);
        assert_eq!(stock_quantity(&store, id), 14.5);
    }

    #[test]
    fn stock_null_values_coerce_to_zero() {
        let mut store = store();
        let id = store.query("INSERT INTO stock VALUES ($1, $2, $3)", &[json!(5), json!(3), Value::Null])
            .rows[0]["id_stock"]
            .as_i64()
            .unwrap();
        assert_eq!(stock_quantity(&store, id), 0.0);

        store.query(
            "UPDATE stock SET quantite = $1 WHERE id_stock = $2 AND id_utilisateur = $3",
            &[json!(40), json!(id), json!(5)],
        );
        store.query(
            "UPDATE stock SET quantite = $1 WHERE id_stock = $2 AND id_utilisateur = $3",
            &[Value::Null, json!(id), json!(5)],
        );
        assert_eq!(stock_quantity(&store, id), 0.0);
    }

    #[test]
    fn stock_select_enriched_with_input() {
        let mut store = store();
        let res = store.query(
            "SELECT s.*, i.nom_intrant, i.unite FROM stock s JOIN intrant i ON s.id_intrant = i.id_intrant WHERE s.id_utilisateur = $1",
            &[json!(DEMO_USER_ID)],
        );
        assert_eq!(res.row_count, 2);
        assert_eq!(res.rows[0]["nom_intrant"], json!("NPK 15-15-15"));
        assert_eq!(res.rows[0]["unite"], json!("kg"));
    }

    #[test]
    fn alert_insert_short_and_long_forms() {
        let mut store = store();
        let plot = insert_plot(&mut store, 5, "Bas-fond", "2024-01-01");
        let long_type = "t".repeat(70);

        store.query(
            "INSERT INTO alerte (id_utilisateur, titre, message, type_alerte, priorite, lu, date_creation) VALUES ($1,$2,$3,$4,$5,$6,$7)",
            &[json!(5), json!("Sans parcelle"), json!("m"), json!(long_type), json!("basse"), json!(false), json!("2024-05-01T08:00:00Z")],
        );
        store.query(
            "INSERT INTO alerte (id_utilisateur, id_parcelle, titre, message, type_alerte, priorite, lu, date_creation) VALUES ($1,$2,$3,$4,$5,$6,$7,$8)",
            &[json!(5), json!(plot), json!("Avec parcelle"), json!("m"), json!("maladie"), json!("haute"), Value::Null, json!("2024-05-02T08:00:00Z")],
        );

        let res = store.query("SELECT a.*, p.nom_parcelle FROM alerte a LEFT JOIN parcelle p ON a.id_parcelle = p.id_parcelle WHERE a.id_utilisateur = $1", &[json!(5)]);
        assert_eq!(res.row_count, 2);
        // Newest first.
        assert_eq!(res.rows[0]["titre"], json!("Avec parcelle"));
        assert_eq!(res.rows[0]["nom_parcelle"], json!("Bas-fond"));
        assert_eq!(res.rows[0]["priorite"], json!("haute"));
        assert_eq!(res.rows[0]["lu"], json!(false));
        assert_eq!(res.rows[1]["nom_parcelle"], Value::Null);
        assert_eq!(res.rows[1]["type_alerte"].as_str().unwrap().chars().count(), 50);
    }

    #[test]
    fn alerts_marked_read_and_counted() {
        let mut store = store();
        let id = store
            .query("INSERT INTO alerte VALUES ($1,$2,$3,$4,$5)", &[json!(5), json!("t"), json!("m"), json!("x"), json!("moyenne")])
            .rows[0]["id_alerte"]
            .as_i64()
            .unwrap();

        let unread = "SELECT COUNT(*) FROM alerte WHERE id_utilisateur = $1 AND lu = false";
        assert_eq!(store.query(unread, &[json!(5)]).rows[0]["count"], json!(1));

        let res = store.query("UPDATE alerte SET lu = true WHERE id_alerte = $1 AND id_utilisateur = $2", &[json!(id), json!(5)]);
        assert_eq!(res.row_count, 1);
        assert_eq!(store.query(unread, &[json!(5)]).rows[0]["count"], json!(0));
    }

    #[test]
    fn delete_plot_scoped_by_user() {
        let mut store = store();
        let id = insert_plot(&mut store, 5, "A", "2024-01-01");

        let sql = "DELETE FROM parcelle WHERE id_parcelle = $1 AND id_utilisateur = $2";
        assert_eq!(store.query(sql, &[json!(id), json!(6)]).row_count, 0);
        assert_eq!(store.query(sql, &[json!(id), json!(5)]).row_count, 1);
        assert!(store.tables().plot(id).is_none());
        assert_eq!(store.query(sql, &[json!(id), json!(5)]).row_count, 0);
    }

    #[test]
    fn user_and_reference_selects() {
        let mut store = store();
        let res = store.query("SELECT * FROM utilisateur WHERE id_utilisateur = $1", &[json!(DEMO_USER_ID)]);
        assert_eq!(res.row_count, 1);
        assert_eq!(res.rows[0]["email"], json!("demo@ferme.local"));
        assert_eq!(store.query("SELECT * FROM utilisateur WHERE id_utilisateur = $1", &[json!(999)]).row_count, 0);

        let inputs = store.query("SELECT * FROM intrant", &[]).row_count;
        store.query("INSERT INTO intrant VALUES ($1, $2, $3)", &[json!("Compost"), json!("engrais"), json!("t")]);
        assert_eq!(store.query("SELECT * FROM intrant", &[]).row_count, inputs + 1);
        assert_eq!(store.query("SELECT * FROM culture", &[]).row_count, 6);
    }

    #[test]
    fn show_columns_is_synthetic() {
        let mut store = store();
        let res = store.query("SHOW COLUMNS FROM parcelle LIKE 'couleur'", &[]);
        assert_eq!(res.row_count, 1);
        assert_eq!(res.rows[0]["Field"], json!("couleur"));
    }

    #[test]
    fn unrecognized_statement_returns_empty() {
        let mut store = store();
        let saves = store.backend().saves();
        let res = store.query("DROP TABLE parcelle", &[json!(1)]);
        assert_eq!(res, QueryResult::default());
        assert!(res.rows.is_empty());
        assert_eq!(res.row_count, 0);
        assert_eq!(store.backend().saves(), saves);
    }

    #[test]
    fn checked_query_rejects_unrecognized() {
        let mut store = store();
        let err = store
            .query_checked("SELEKT * FROM parcelle", &[], QueryOptions::default())
            .unwrap_err();
        assert!(matches!(err, FermeError::UnrecognizedQuery(_)));
        assert!(store
            .query_checked("SELECT * FROM intrant", &[], QueryOptions::default())
            .is_ok());
    }

    #[test]
    fn read_only_simulation_keeps_memory_changes_only() {
        let mut store = store();
        let before = store.backend().raw();

        let res = store.query_with(
            INSERT_PLOT,
            &[json!(5), json!(1), json!("Simulée"), json!(1.0), json!("2024-02-02")],
            QueryOptions::read_only(true),
        );
        assert_eq!(res.row_count, 1);
        assert!(store.is_read_only());
        assert_eq!(store.query(SELECT_PLOTS, &[json!(5)]).row_count, 1);
        assert_eq!(store.backend().raw(), before);

        // Turning it off again resumes writes.
        store.query_with("SELECT * FROM intrant", &[], QueryOptions::read_only(false));
        insert_plot(&mut store, 5, "Réelle", "2024-02-03");
        assert!(store.backend().raw().unwrap().contains("Simulée"));
    }

    #[test]
    fn save_errors_are_swallowed() {
        let mut store = store();
        store.backend().set_simulate_write_error(true);
        let id = insert_plot(&mut store, 5, "A", "2024-01-01");
        assert!(store.tables().plot(id).is_some());
        assert!(!store.backend().raw().unwrap().contains(&id.to_string()));
    }

    #[test]
    fn reload_restores_persisted_state() {
        let mut store = store();
        let id = insert_plot(&mut store, 5, "Persistée", "2024-01-01");
        let before = store.tables().clone();
        store.reload();
        assert_eq!(store.tables(), &before);
        assert!(store.tables().plot(id).is_some());
    }

    #[test]
    fn fresh_ids_increase() {
        assert_eq!(fresh_id([i64::MAX - 1].into_iter()), Some(i64::MAX));
        assert_eq!(fresh_id([i64::MAX].into_iter()), None);
        let now = Utc::now().timestamp_millis();
        assert!(fresh_id([1, 2, 3].into_iter()).unwrap() >= now);
        assert!(fresh_id(std::iter::empty()).unwrap() >= now);
    }

    #[test]
    fn insert_at_id_ceiling_is_skipped() {
        let mut tables = default_tables();
        tables.intrant[0].id_intrant = i64::MAX;
        let backend = MemBackend::new();
        backend.save(&tables).unwrap();
        let mut store = DocumentStore::open(backend);
        let saves = store.backend().saves();

        let res = store.query(
            "INSERT INTO intrant (nom_intrant, categorie, unite) VALUES ($1, $2, $3) RETURNING id_intrant",
            &[json!("Chaux"), json!("amendement"), json!("kg")],
        );
        assert_eq!(res, QueryResult::default());
        assert_eq!(store.tables().intrant.len(), tables.intrant.len());
        assert_eq!(store.backend().saves(), saves);
    }

    #[test]
    fn stock_adjust_never_leaves_finite_range() {
        let mut store = store();
        let id = store.query("INSERT INTO stock VALUES ($1, $2, $3)", &[json!(5), json!(1), json!(5)])
            .rows[0]["id_stock"]
            .as_i64()
            .unwrap();
        let adjust = "UPDATE stock SET quantite = GREATEST(0, quantite + $1) WHERE id_stock = $2 AND id_utilisateur = $3";

        assert_eq!(store.query(adjust, &[json!(1.7e308), json!(id), json!(5)]).row_count, 1);
        assert_eq!(store.query(adjust, &[json!(1.7e308), json!(id), json!(5)]).row_count, 0);
        assert_eq!(stock_quantity(&store, id), 1.7e308 + 5.0);

        assert_eq!(store.query(adjust, &[json!(-f64::MAX), json!(id), json!(5)]).row_count, 1);
        assert_eq!(stock_quantity(&store, id), 0.0);

        let reloaded = store.tables().clone();
        store.reload();
        assert_eq!(store.tables(), &reloaded);
    }

    #[test]
    fn unread_count_bound_by_parameter() {
        let mut store = store();
        store.query(
            "INSERT INTO alerte VALUES ($1, $2, $3, $4, $5, $6, $7)",
            &[json!(5), json!("Grêle"), json!("m"), json!("meteo"), json!("haute"), json!(false), json!(null)],
        );
        store.query(
            "INSERT INTO alerte VALUES ($1, $2, $3, $4, $5, $6, $7)",
            &[json!(5), json!("Gel"), json!("m"), json!("meteo"), json!("basse"), json!(true), json!(null)],
        );
        let count = "SELECT COUNT(*) FROM alerte WHERE id_utilisateur = $1 AND lu = $2";

        assert_eq!(store.query(count, &[json!(5), json!(false)]).rows[0]["count"], json!(1));
        assert_eq!(store.query(count, &[json!(5), json!(true)]).rows[0]["count"], json!(1));
        assert_eq!(store.query(count, &[json!(5), json!(null)]).rows[0]["count"], json!(2));
    }

    #[test]
    fn read_only_open_seeds_without_writing() {
        let store = DocumentStore::open_with(MemBackend::new(), true);
        assert!(store.is_read_only());
        assert_eq!(store.tables(), &default_tables());
        assert_eq!(store.backend().saves(), 0);
        assert!(store.backend().raw().is_none());
    }
}
