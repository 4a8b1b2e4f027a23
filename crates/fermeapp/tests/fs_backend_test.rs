use fermeapp::model::TableSet;
use fermeapp::store::backend::StorageBackend;
use fermeapp::store::fs_backend::FsBackend;
use fermeapp::store::seed::{default_tables, DEMO_USER_ID};
use fermeapp::store::{FileStore, QueryOptions};
use serde_json::json;
use std::fs;
use tempfile::TempDir;

const INSERT_PLOT: &str = "INSERT INTO parcelle (id_utilisateur, id_culture, nom_parcelle, surface, date_semis) \
     VALUES ($1, $2, $3, $4, $5) RETURNING id_parcelle";
const SELECT_PLOTS: &str = "SELECT p.*, c.nom_culture, c.duree_cycle, c.couleur \
     FROM parcelle p JOIN culture c ON p.id_culture = c.id_culture \
     WHERE p.id_utilisateur = $1 ORDER BY p.date_semis DESC";

fn setup() -> (TempDir, std::path::PathBuf) {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("db.json");
    (dir, path)
}

#[test]
fn test_fs_backend_missing_file_is_none() {
    let (_dir, path) = setup();
    let backend = FsBackend::new(&path);
    assert!(backend.load().unwrap().is_none());
}

#[test]
fn test_fs_backend_round_trip() {
    let (_dir, path) = setup();
    let backend = FsBackend::new(&path);
    let tables = default_tables();

    backend.save(&tables).unwrap();
    let loaded = backend.load().unwrap().unwrap();
    assert_eq!(loaded, tables);

    // Pretty-printed, one array per table.
    let raw = fs::read_to_string(&path).unwrap();
    for table in ["utilisateur", "culture", "parcelle", "alerte", "intrant", "stock"] {
        assert!(raw.contains(&format!("\"{}\"", table)), "missing {}", table);
    }
    assert!(raw.contains('\n'));
}

#[test]
fn test_fs_backend_creates_parent_dirs() {
    let (dir, _) = setup();
    let path = dir.path().join("a").join("b").join("db.json");
    FsBackend::new(&path).save(&TableSet::default()).unwrap();
    assert!(path.exists());
}

#[test]
fn test_fs_backend_corrupt_file_is_error() {
    let (_dir, path) = setup();
    fs::write(&path, "[1, 2").unwrap();
    assert!(FsBackend::new(&path).load().is_err());
}

#[test]
fn test_store_changes_survive_reopen() {
    let (_dir, path) = setup();
    let id = {
        let mut store = FileStore::open(FsBackend::new(&path));
        let res = store.query(
            INSERT_PLOT,
            &[json!(21), json!(5), json!("Butte"), json!(0.75), json!("2024-03-01")],
        );
        res.rows[0]["id_parcelle"].as_i64().unwrap()
    };

    let mut reopened = FileStore::open(FsBackend::new(&path));
    let res = reopened.query(SELECT_PLOTS, &[json!(21)]);
    assert_eq!(res.row_count, 1);
    assert_eq!(res.rows[0]["id_parcelle"], json!(id));
    assert_eq!(res.rows[0]["nom_culture"], json!("Pomme de terre"));
}

#[test]
fn test_reload_matches_memory() {
    let (_dir, path) = setup();
    let mut store = FileStore::open(FsBackend::new(&path));
    store.query(
        "UPDATE stock SET quantite = $1 WHERE id_stock = $2 AND id_utilisateur = $3",
        &[json!(100), json!(1), json!(DEMO_USER_ID)],
    );
    store.query(
        "UPDATE stock SET quantite = GREATEST(0, quantite + $1) WHERE id_stock = $2 AND id_utilisateur = $3",
        &[json!(-30), json!(1), json!(DEMO_USER_ID)],
    );

    let in_memory = store.tables().clone();
    store.reload();
    assert_eq!(store.tables(), &in_memory);
    assert_eq!(store.tables().stock[0].quantite, 70.0);
}

#[test]
fn test_read_only_simulation_keeps_file_byte_identical() {
    let (_dir, path) = setup();
    let mut store = FileStore::open(FsBackend::new(&path));
    let before = fs::read(&path).unwrap();

    let options = QueryOptions::read_only(true);
    store.query_with(
        INSERT_PLOT,
        &[json!(1), json!(1), json!("Fantôme"), json!(1.0), json!("2024-01-01")],
        options,
    );
    store.query_with("DELETE FROM parcelle WHERE id_parcelle = $1", &[json!(1)], options);
    store.query_with(
        "UPDATE stock SET quantite = $1 WHERE id_stock = $2 AND id_utilisateur = $3",
        &[json!(3), json!(2), json!(DEMO_USER_ID)],
        options,
    );

    assert_eq!(fs::read(&path).unwrap(), before);
    assert!(store.tables().plot(1).is_none());
}

#[test]
fn test_corrupt_file_falls_back_until_next_write() {
    let (_dir, path) = setup();
    fs::write(&path, "not json at all").unwrap();

    let mut store = FileStore::open(FsBackend::new(&path));
    assert_eq!(store.tables().culture.len(), 6);
    assert_eq!(fs::read_to_string(&path).unwrap(), "not json at all");

    store.query(
        "INSERT INTO intrant (nom_intrant, categorie, unite) VALUES ($1, $2, $3)",
        &[json!("Fumier"), json!("engrais"), json!("t")],
    );
    let repaired = FsBackend::new(&path).load().unwrap().unwrap();
    assert!(repaired.intrant.iter().any(|i| i.nom_intrant == "Fumier"));
}

#[test]
fn test_out_of_range_adjustment_keeps_file_loadable() {
    let (_dir, path) = setup();
    let adjust = "UPDATE stock SET quantite = GREATEST(0, quantite + $1) WHERE id_stock = $2 AND id_utilisateur = $3";
    let mut store = FileStore::open(FsBackend::new(&path));
    store.query(
        INSERT_PLOT,
        &[json!(DEMO_USER_ID), json!(2), json!("Mon champ"), json!(1.5), json!("2024-04-01")],
    );

    store.query(adjust, &[json!(1.7e308), json!(1), json!(DEMO_USER_ID)]);
    let refused = store.query(adjust, &[json!(1.7e308), json!(1), json!(DEMO_USER_ID)]);
    assert_eq!(refused.row_count, 0);
    assert!(store.tables().stock[0].quantite.is_finite());

    let loaded = FsBackend::new(&path).load().unwrap().unwrap();
    assert_eq!(&loaded, store.tables());

    let mut reopened = FileStore::open(FsBackend::new(&path));
    let rows = reopened.query(SELECT_PLOTS, &[json!(DEMO_USER_ID)]).rows;
    let names: Vec<_> = rows.iter().map(|row| row["nom_parcelle"].clone()).collect();
    assert!(names.contains(&json!("Mon champ")));
}

#[test]
fn test_read_only_open_does_not_create_file() {
    let (_dir, path) = setup();
    let mut store = FileStore::open_with(FsBackend::new(&path), true);
    store.query(
        INSERT_PLOT,
        &[json!(DEMO_USER_ID), json!(2), json!("Essai"), json!(1.0), json!("2024-04-01")],
    );
    assert!(!path.exists());
    assert_eq!(store.tables().parcelle.len(), 2);
}
