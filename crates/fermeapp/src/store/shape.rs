//! # Query Shapes
//!
//! The store is not a SQL engine. It recognizes a closed set of statement *shapes*:
//! the leading verb, the table named after `FROM` / `INTO` / `UPDATE`, and a few clause
//! fingerprints (`count(`, `join culture`, `greatest(`, `set lu`). Anything else is
//! [`QueryShape::Unrecognized`].
//!
//! Classification works on [`normalize`]d text: lowercased, whitespace collapsed.

use super::placeholders::{mentions, split_clauses};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StockUpdateMode {
    /// `quantite = $N`: overwrite.
    Set,
    /// `quantite = greatest(0, quantite + $N)`: relative, clamped at zero.
    Adjust,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryShape {
    CountPlots,
    /// `unread_only` reflects a literal unread test; a bound `lu = $N` is resolved when run.
    CountAlerts { unread_only: bool },
    SelectPlotsWithCrop,
    SelectPlots,
    SelectStock,
    SelectAlerts,
    SelectUser,
    SelectInputTypes,
    SelectCropTypes,
    InsertPlot,
    InsertAlert,
    InsertInputType,
    InsertStock,
    UpdatePlot,
    UpdateStock(StockUpdateMode),
    UpdateAlertRead,
    DeletePlot,
    ShowColumns { column: String },
    Unrecognized,
}

impl QueryShape {
    pub fn is_mutation(&self) -> bool {
        matches!(
            self,
            QueryShape::InsertPlot
                | QueryShape::InsertAlert
                | QueryShape::InsertInputType
                | QueryShape::InsertStock
                | QueryShape::UpdatePlot
                | QueryShape::UpdateStock(_)
                | QueryShape::UpdateAlertRead
                | QueryShape::DeletePlot
        )
    }
}

/// Lowercases and collapses runs of whitespace to single spaces.
pub fn normalize(statement: &str) -> String {
    statement
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

fn tokens(text: &str) -> Vec<&str> {
    text.split(|c: char| !(c.is_alphanumeric() || c == '_'))
        .filter(|t| !t.is_empty())
        .collect()
}

/// True when `keyword` is immediately followed by `table`.
fn names(tokens: &[&str], keyword: &str, table: &str) -> bool {
    tokens
        .windows(2)
        .any(|pair| pair[0] == keyword && pair[1] == table)
}

fn like_literal(text: &str) -> Option<String> {
    let after = &text[text.find(" like ")? + 6..];
    let quote = after.chars().next().filter(|c| *c == '\'' || *c == '"')?;
    let rest = &after[1..];
    let end = rest.find(quote)?;
    Some(rest[..end].to_string())
}

/// Default column reported by `SHOW COLUMNS` without a `LIKE` pattern.
pub const PROBED_COLUMN: &str = "couleur";

/// Classifies a statement. Accepts raw or normalized text.
pub fn classify(statement: &str) -> QueryShape {
    let text = normalize(statement);
    let toks = tokens(&text);
    let Some(verb) = toks.first().copied() else {
        return QueryShape::Unrecognized;
    };

    match verb {
        "select" => classify_select(&text, &toks),
        "insert" => {
            if names(&toks, "into", "parcelle") {
                QueryShape::InsertPlot
            } else if names(&toks, "into", "alerte") {
                QueryShape::InsertAlert
            } else if names(&toks, "into", "intrant") {
                QueryShape::InsertInputType
            } else if names(&toks, "into", "stock") {
                QueryShape::InsertStock
            } else {
                QueryShape::Unrecognized
            }
        }
        "update" => {
            if names(&toks, "update", "parcelle") {
                QueryShape::UpdatePlot
            } else if names(&toks, "update", "stock") {
                if text.contains("greatest(") {
                    QueryShape::UpdateStock(StockUpdateMode::Adjust)
                } else {
                    QueryShape::UpdateStock(StockUpdateMode::Set)
                }
            } else if names(&toks, "update", "alerte") && mentions(split_clauses(&text).set, "lu")
            {
                QueryShape::UpdateAlertRead
            } else {
                QueryShape::Unrecognized
            }
        }
        "delete" if names(&toks, "from", "parcelle") => QueryShape::DeletePlot,
        "show" if toks.get(1) == Some(&"columns") => QueryShape::ShowColumns {
            column: like_literal(&text).unwrap_or_else(|| PROBED_COLUMN.to_string()),
        },
        _ => QueryShape::Unrecognized,
    }
}

fn classify_select(text: &str, toks: &[&str]) -> QueryShape {
    if text.contains("count(") {
        return if names(toks, "from", "parcelle") {
            QueryShape::CountPlots
        } else if names(toks, "from", "alerte") {
            let filter = split_clauses(text).filter;
            let unread_only = filter.contains("lu = false")
                || filter.contains("lu=false")
                || filter.contains("not lu");
            QueryShape::CountAlerts { unread_only }
        } else {
            QueryShape::Unrecognized
        };
    }

    if names(toks, "from", "parcelle") {
        if names(toks, "join", "culture") {
            QueryShape::SelectPlotsWithCrop
        } else {
            QueryShape::SelectPlots
        }
    } else if names(toks, "from", "stock") {
        QueryShape::SelectStock
    } else if names(toks, "from", "alerte") {
        QueryShape::SelectAlerts
    } else if names(toks, "from", "utilisateur") {
        QueryShape::SelectUser
    } else if names(toks, "from", "intrant") {
        QueryShape::SelectInputTypes
    } else if names(toks, "from", "culture") {
        QueryShape::SelectCropTypes
    } else {
        QueryShape::Unrecognized
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalizes_whitespace_and_case() {
        assert_eq!(
            normalize("SELECT *\n   FROM\tParcelle  WHERE id = $1"),
            "select * from parcelle where id = $1"
        );
    }

    #[test]
    fn counts() {
        assert_eq!(
            classify("SELECT COUNT(*) FROM parcelle WHERE id_utilisateur = $1"),
            QueryShape::CountPlots
        );
        assert_eq!(
            classify("SELECT COUNT(*) AS total FROM alerte WHERE id_utilisateur = $1 AND lu = false"),
            QueryShape::CountAlerts { unread_only: true }
        );
        assert_eq!(
            classify("SELECT COUNT(*) FROM alerte"),
            QueryShape::CountAlerts { unread_only: false }
        );
        assert_eq!(classify("SELECT COUNT(*) FROM stock"), QueryShape::Unrecognized);
    }

    #[test]
    fn plot_selects_with_and_without_join() {
        let joined = "SELECT p.*, c.nom_culture, c.duree_cycle, c.couleur
                      FROM parcelle p JOIN culture c ON p.id_culture = c.id_culture
                      WHERE p.id_utilisateur = $1 ORDER BY p.date_semis DESC";
        assert_eq!(classify(joined), QueryShape::SelectPlotsWithCrop);
        assert_eq!(
            classify("SELECT * FROM parcelle WHERE id_utilisateur = $1"),
            QueryShape::SelectPlots
        );
    }

    #[test]
    fn other_selects() {
        assert_eq!(
            classify("SELECT s.*, i.nom_intrant FROM stock s JOIN intrant i ON s.id_intrant = i.id_intrant"),
            QueryShape::SelectStock
        );
        assert_eq!(
            classify("SELECT a.*, p.nom_parcelle FROM alerte a LEFT JOIN parcelle p ON a.id_parcelle = p.id_parcelle"),
            QueryShape::SelectAlerts
        );
        assert_eq!(
            classify("SELECT * FROM utilisateur WHERE id_utilisateur = $1"),
            QueryShape::SelectUser
        );
        assert_eq!(classify("SELECT * FROM intrant"), QueryShape::SelectInputTypes);
        assert_eq!(classify("SELECT * FROM culture ORDER BY nom_culture"), QueryShape::SelectCropTypes);
    }

    #[test]
    fn inserts() {
        assert_eq!(
            classify("INSERT INTO parcelle (id_utilisateur, id_culture) VALUES ($1, $2)"),
            QueryShape::InsertPlot
        );
        assert_eq!(classify("insert into alerte(titre) values ($1)"), QueryShape::InsertAlert);
        assert_eq!(classify("INSERT INTO intrant VALUES ($1, $2, $3)"), QueryShape::InsertInputType);
        assert_eq!(classify("INSERT INTO stock VALUES ($1, $2, $3)"), QueryShape::InsertStock);
        assert_eq!(classify("INSERT INTO recolte VALUES ($1)"), QueryShape::Unrecognized);
    }

    #[test]
    fn updates() {
        assert_eq!(
            classify("UPDATE parcelle SET statut = $1 WHERE id_parcelle = $2 AND id_utilisateur = $3"),
            QueryShape::UpdatePlot
        );
        assert_eq!(
            classify("UPDATE stock SET quantite = $1 WHERE id_stock = $2 AND id_utilisateur = $3"),
            QueryShape::UpdateStock(StockUpdateMode::Set)
        );
        assert_eq!(
            classify("UPDATE stock SET quantite = GREATEST(0, quantite + $1) WHERE id_intrant = $2"),
            QueryShape::UpdateStock(StockUpdateMode::Adjust)
        );
        assert_eq!(
            classify("UPDATE alerte SET lu = true WHERE id_alerte = $1"),
            QueryShape::UpdateAlertRead
        );
        assert_eq!(
            classify("UPDATE alerte SET titre = $1 WHERE id_alerte = $2"),
            QueryShape::Unrecognized
        );
    }

    #[test]
    fn deletes_and_probes() {
        assert_eq!(
            classify("DELETE FROM parcelle WHERE id_parcelle = $1"),
            QueryShape::DeletePlot
        );
        assert_eq!(classify("DELETE FROM alerte WHERE id_alerte = $1"), QueryShape::Unrecognized);
        assert_eq!(
            classify("SHOW COLUMNS FROM parcelle LIKE 'couleur'"),
            QueryShape::ShowColumns {
                column: "couleur".to_string()
            }
        );
        assert_eq!(
            classify("SHOW COLUMNS FROM alerte LIKE \"id_parcelle\""),
            QueryShape::ShowColumns {
                column: "id_parcelle".to_string()
            }
        );
    }

    #[test]
    fn garbage_is_unrecognized() {
        assert_eq!(classify(""), QueryShape::Unrecognized);
        assert_eq!(classify("   "), QueryShape::Unrecognized);
        assert_eq!(classify("SELEKT * FROM parcelle"), QueryShape::Unrecognized);
        assert_eq!(classify("DROP TABLE parcelle"), QueryShape::Unrecognized);
    }

    #[test]
    fn mutation_flag() {
        assert!(QueryShape::InsertPlot.is_mutation());
        assert!(QueryShape::UpdateStock(StockUpdateMode::Adjust).is_mutation());
        assert!(!QueryShape::SelectPlots.is_mutation());
        assert!(!QueryShape::Unrecognized.is_mutation());
    }
}
