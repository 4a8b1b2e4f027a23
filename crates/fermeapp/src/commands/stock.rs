use super::{decode_rows, first_i64, CmdMessage, CmdResult, StockView};
use crate::error::{FermeError, Result};
use crate::model::InputType;
use crate::store::{DocumentStore, StorageBackend};
use serde_json::json;

const SELECT_STOCK: &str = "SELECT s.*, i.nom_intrant, i.categorie, i.unite \
     FROM stock s JOIN intrant i ON s.id_intrant = i.id_intrant \
     WHERE s.id_utilisateur = $1";
const SELECT_INPUTS: &str = "SELECT * FROM intrant";
const SET_QUANTITY: &str =
    "UPDATE stock SET quantite = $1, date_maj = NOW() WHERE id_stock = $2 AND id_utilisateur = $3";
const ADJUST_QUANTITY: &str = "UPDATE stock SET quantite = GREATEST(0, quantite + $1), date_maj = NOW() \
     WHERE id_stock = $2 AND id_utilisateur = $3";
const ADJUST_BY_INPUT: &str = "UPDATE stock SET quantite = GREATEST(0, quantite + $1), date_maj = NOW() \
     WHERE id_intrant = $2 AND id_utilisateur = $3";
const INSERT_STOCK: &str =
    "INSERT INTO stock (id_utilisateur, id_intrant, quantite) VALUES ($1, $2, $3) RETURNING id_stock";
const INSERT_INPUT: &str =
    "INSERT INTO intrant (nom_intrant, categorie, unite) VALUES ($1, $2, $3) RETURNING id_intrant";

/// Category and unit used to register an input type that does not exist yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewInputType {
    pub category: String,
    pub unit: String,
}

pub fn list<B: StorageBackend>(store: &mut DocumentStore<B>, user_id: i64) -> Result<CmdResult> {
    let stock: Vec<StockView> = decode_rows(store.query(SELECT_STOCK, &[json!(user_id)]))?;
    Ok(CmdResult::default().with_stock(stock))
}

/// Overwrites the quantity of one stock entry.
pub fn set<B: StorageBackend>(
    store: &mut DocumentStore<B>,
    user_id: i64,
    stock_id: i64,
    quantity: f64,
) -> Result<CmdResult> {
    if !quantity.is_finite() || quantity < 0.0 {
        return Err(FermeError::Invalid(format!("quantity must be >= 0, got {}", quantity)));
    }
    let res = store.query(SET_QUANTITY, &[json!(quantity), json!(stock_id), json!(user_id)]);
    if res.row_count == 0 {
        return Err(FermeError::NotFound(format!("stock entry {}", stock_id)));
    }
    let mut result = CmdResult::default();
    result.add_message(CmdMessage::success(format!("Stock {} : {}", stock_id, quantity)));
    Ok(result)
}

/// After an adjustment touched nothing: an error when matching entries exist,
/// meaning the store refused the resulting quantity.
fn unchanged<B: StorageBackend>(
    store: &mut DocumentStore<B>,
    user_id: i64,
    matches: impl Fn(&StockView) -> bool,
    delta: f64,
) -> Option<FermeError> {
    let stock: Vec<StockView> = decode_rows(store.query(SELECT_STOCK, &[json!(user_id)])).ok()?;
    stock
        .iter()
        .any(matches)
        .then(|| FermeError::Invalid(format!("quantity out of range after adding {}", delta)))
}

/// Adds `delta` (possibly negative) to one stock entry. The quantity never goes below zero.
pub fn adjust<B: StorageBackend>(
    store: &mut DocumentStore<B>,
    user_id: i64,
    stock_id: i64,
    delta: f64,
) -> Result<CmdResult> {
    if !delta.is_finite() {
        return Err(FermeError::Invalid(format!("invalid quantity: {}", delta)));
    }
    let res = store.query(ADJUST_QUANTITY, &[json!(delta), json!(stock_id), json!(user_id)]);
    if res.row_count == 0 {
        return Err(unchanged(store, user_id, |s| s.entry.id_stock == stock_id, delta)
            .unwrap_or_else(|| FermeError::NotFound(format!("stock entry {}", stock_id))));
    }
    let mut result = CmdResult::default();
    result.add_message(CmdMessage::success(format!("Stock {} ajusté de {:+}", stock_id, delta)));
    Ok(result)
}

/// Receives `quantity` of an input, given by id or name.
///
/// Existing entries for that input are topped up; otherwise a new entry is created.
/// An unknown input name is registered when `new_input` is provided.
pub fn add<B: StorageBackend>(
    store: &mut DocumentStore<B>,
    user_id: i64,
    input: &str,
    quantity: f64,
    new_input: Option<NewInputType>,
) -> Result<CmdResult> {
    if !quantity.is_finite() || quantity <= 0.0 {
        return Err(FermeError::Invalid(format!("quantity must be positive, got {}", quantity)));
    }

    let inputs: Vec<InputType> = decode_rows(store.query(SELECT_INPUTS, &[]))?;
    let known = match input.trim().parse::<i64>() {
        Ok(id) => inputs.into_iter().find(|i| i.id_intrant == id),
        Err(_) => inputs
            .into_iter()
            .find(|i| i.nom_intrant.to_lowercase() == input.trim().to_lowercase()),
    };

    let mut result = CmdResult::default();
    let input_id = match (known, new_input) {
        (Some(existing), _) => existing.id_intrant,
        (None, Some(input_type)) => {
            let res = store.query(
                INSERT_INPUT,
                &[json!(input.trim()), json!(input_type.category), json!(input_type.unit)],
            );
            let id = first_i64(&res, "id_intrant")
                .ok_or_else(|| FermeError::Store("insert returned no id".to_string()))?;
            result.add_message(CmdMessage::info(format!("Nouvel intrant : {}", input.trim())));
            id
        }
        (None, None) => return Err(FermeError::NotFound(format!("input {}", input))),
    };

    let topped_up = store.query(ADJUST_BY_INPUT, &[json!(quantity), json!(input_id), json!(user_id)]);
    if topped_up.row_count == 0 {
        if let Some(err) = unchanged(store, user_id, |s| s.entry.id_intrant == input_id, quantity) {
            return Err(err);
        }
        let res = store.query(INSERT_STOCK, &[json!(user_id), json!(input_id), json!(quantity)]);
        result.created_id = first_i64(&res, "id_stock");
    }
    result.add_message(CmdMessage::success(format!("+{} en stock", quantity)));
    Ok(result)
}
