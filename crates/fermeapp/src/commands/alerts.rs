use super::{decode_rows, first_i64, AlertView, CmdMessage, CmdResult};
use crate::error::{FermeError, Result};
use crate::model::AlertPriority;
use crate::store::{DocumentStore, StorageBackend};
use chrono::Utc;
use serde_json::{json, Value};

const SELECT_ALERTS: &str = "SELECT a.*, p.nom_parcelle FROM alerte a \
     LEFT JOIN parcelle p ON a.id_parcelle = p.id_parcelle \
     WHERE a.id_utilisateur = $1 ORDER BY a.date_creation DESC";
const COUNT_UNREAD: &str =
    "SELECT COUNT(*) AS count FROM alerte WHERE id_utilisateur = $1 AND lu = false";
const INSERT_ALERT: &str = "INSERT INTO alerte \
     (id_utilisateur, titre, message, type_alerte, priorite, lu, date_creation) \
     VALUES ($1, $2, $3, $4, $5, $6, $7) RETURNING id_alerte";
const INSERT_PLOT_ALERT: &str = "INSERT INTO alerte \
     (id_utilisateur, id_parcelle, titre, message, type_alerte, priorite, lu, date_creation) \
     VALUES ($1, $2, $3, $4, $5, $6, $7, $8) RETURNING id_alerte";
const MARK_READ: &str = "UPDATE alerte SET lu = true WHERE id_alerte = $1 AND id_utilisateur = $2";
const SELECT_PLOTS: &str = "SELECT * FROM parcelle WHERE id_utilisateur = $1 AND id_parcelle = $2";

/// An incident reported from the field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewAlert {
    pub plot_id: Option<i64>,
    pub title: String,
    pub message: String,
    /// Free-form category tag, truncated by the store.
    pub kind: String,
    pub priority: AlertPriority,
}

pub fn list<B: StorageBackend>(store: &mut DocumentStore<B>, user_id: i64) -> Result<CmdResult> {
    let alerts: Vec<AlertView> = decode_rows(store.query(SELECT_ALERTS, &[json!(user_id)]))?;
    Ok(CmdResult::default().with_alerts(alerts))
}

pub fn unread_count<B: StorageBackend>(store: &mut DocumentStore<B>, user_id: i64) -> i64 {
    first_i64(&store.query(COUNT_UNREAD, &[json!(user_id)]), "count").unwrap_or(0)
}

pub fn report<B: StorageBackend>(
    store: &mut DocumentStore<B>,
    user_id: i64,
    alert: NewAlert,
) -> Result<CmdResult> {
    if alert.title.trim().is_empty() {
        return Err(FermeError::Invalid("alert title is empty".to_string()));
    }

    let mut params: Vec<Value> = vec![json!(user_id)];
    let statement = match alert.plot_id {
        Some(plot_id) => {
            let owned = store.query(SELECT_PLOTS, &[json!(user_id), json!(plot_id)]);
            if owned.row_count == 0 {
                return Err(FermeError::NotFound(format!("plot {}", plot_id)));
            }
            params.push(json!(plot_id));
            INSERT_PLOT_ALERT
        }
        None => INSERT_ALERT,
    };
    params.extend([
        json!(alert.title),
        json!(alert.message),
        json!(alert.kind),
        json!(alert.priority.as_str()),
        json!(false),
        json!(Utc::now().to_rfc3339()),
    ]);

    let res = store.query(statement, &params);
    let id = first_i64(&res, "id_alerte")
        .ok_or_else(|| FermeError::Store("insert returned no id".to_string()))?;

    let mut result = CmdResult {
        created_id: Some(id),
        ..Default::default()
    };
    result.add_message(CmdMessage::success(format!("Alerte enregistrée : {}", alert.title)));
    Ok(result)
}

pub fn mark_read<B: StorageBackend>(
    store: &mut DocumentStore<B>,
    user_id: i64,
    alert_id: i64,
) -> Result<CmdResult> {
    let res = store.query(MARK_READ, &[json!(alert_id), json!(user_id)]);
    if res.row_count == 0 {
        return Err(FermeError::NotFound(format!("alert {}", alert_id)));
    }
    let mut result = CmdResult::default();
    result.add_message(CmdMessage::success(format!("Alerte {} lue", alert_id)));
    Ok(result)
}
