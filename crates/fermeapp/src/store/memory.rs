use super::document_store::DocumentStore;
use super::mem_backend::MemBackend;

pub type InMemoryStore = DocumentStore<MemBackend>;

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryStore {
    /// A seeded store with nothing persisted beforehand.
    pub fn new() -> Self {
        DocumentStore::open(MemBackend::new())
    }
}

// --- Test Fixtures ---

#[cfg(any(test, feature = "test_utils"))]
pub mod fixtures {
    use super::*;
    use crate::model::PlotStatus;
    use serde_json::json;

    const INSERT_PLOT: &str = "INSERT INTO parcelle \
         (id_utilisateur, id_culture, nom_parcelle, surface, date_semis, statut) \
         VALUES ($1, $2, $3, $4, $5, $6)";
    const INSERT_ALERT: &str = "INSERT INTO alerte \
         (id_utilisateur, titre, message, type_alerte, priorite, lu, date_creation) \
         VALUES ($1, $2, $3, $4, $5, $6, $7)";

    /// Builds a seeded in-memory store with extra rows for one user.
    pub struct StoreFixture {
        pub store: InMemoryStore,
        pub user_id: i64,
        pub plot_ids: Vec<i64>,
    }

    impl StoreFixture {
        pub fn new(user_id: i64) -> Self {
            Self {
                store: InMemoryStore::new(),
                user_id,
                plot_ids: Vec::new(),
            }
        }

        /// Adds a plot of crop `crop_id` sown on `sown` (`YYYY-MM-DD`).
        pub fn with_plot(mut self, name: &str, crop_id: i64, sown: &str, status: PlotStatus) -> Self {
            let res = self.store.query(
                INSERT_PLOT,
                &[
                    json!(self.user_id),
                    json!(crop_id),
                    json!(name),
                    json!(1.0),
                    json!(sown),
                    json!(status.as_str()),
                ],
            );
            let id = res.rows[0]["id_parcelle"].as_i64().unwrap();
            self.plot_ids.push(id);
            self
        }

        pub fn with_alert(mut self, title: &str, read: bool) -> Self {
            self.store.query(
                INSERT_ALERT,
                &[
                    json!(self.user_id),
                    json!(title),
                    json!(""),
                    json!("divers"),
                    json!("moyenne"),
                    json!(read),
                    json!(chrono::Utc::now().to_rfc3339()),
                ],
            );
            self
        }

        pub fn with_stock(mut self, input_id: i64, quantity: f64) -> Self {
            self.store.query(
                "INSERT INTO stock VALUES ($1, $2, $3)",
                &[json!(self.user_id), json!(input_id), json!(quantity)],
            );
            self
        }
    }
}
