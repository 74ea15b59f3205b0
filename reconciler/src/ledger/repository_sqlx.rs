use anyhow::{Context, anyhow};
use async_trait::async_trait;
use corelib::DocKind;
use serde_json::Value;
use sqlx::{AnyPool, Row};

use crate::commit::{CommitError, Mutation, apply_mutation};
use crate::ledger::DocRef;
use crate::ledger::repository::DocumentStore;

/// SQLx-backed implementation of DocumentStore.
///
/// Documents live as JSON text in one `documents` table; lookups use
/// `json_extract`. Each commit is one SQL transaction: rows are read, the
/// mutation is applied in memory and written back before the next one.
pub struct SqlxStore {
    pool: AnyPool,
}

impl SqlxStore {
    pub fn new(pool: AnyPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl DocumentStore for SqlxStore {
    async fn get(&self, doc: &DocRef) -> anyhow::Result<Option<Value>> {
        let row = sqlx::query(
            r#"
SELECT body FROM documents
WHERE collection = ? AND id = ?;
"#,
        )
        .bind(doc.kind.as_str())
        .bind(doc.uid.as_str())
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(r) => Ok(Some(row_to_body(&r).with_context(|| format!("decoding {doc}"))?)),
            None => Ok(None),
        }
    }

    async fn find(&self, kind: DocKind, field: &str, value: &Value) -> anyhow::Result<Vec<Value>> {
        let path = json_path(field);

        let rows = if value.is_null() {
            sqlx::query(
                r#"
SELECT body FROM documents
WHERE collection = ? AND json_extract(body, ?) IS NULL
ORDER BY id;
"#,
            )
            .bind(kind.as_str())
            .bind(path)
            .fetch_all(&self.pool)
            .await?
        } else {
            let q = sqlx::query(
                r#"
SELECT body FROM documents
WHERE collection = ? AND json_extract(body, ?) = ?
ORDER BY id;
"#,
            )
            .bind(kind.as_str())
            .bind(path);

            let q = match value {
                Value::String(s) => q.bind(s.clone()),
                // json_extract yields 1/0 for JSON booleans
                Value::Bool(b) => q.bind(i64::from(*b)),
                Value::Number(n) => match (n.as_i64(), n.as_f64()) {
                    (Some(i), _) => q.bind(i),
                    (None, Some(f)) => q.bind(f),
                    _ => return Err(anyhow!("unsupported number in lookup: {n}")),
                },
                other => return Err(anyhow!("cannot look up by composite value {other}")),
            };

            q.fetch_all(&self.pool).await?
        };

        let mut out = Vec::with_capacity(rows.len());
        for r in rows {
            match row_to_body(&r) {
                Ok(v) => out.push(v),
                Err(e) => {
                    // poison-row resilience: skip but don't fail the lookup
                    tracing::warn!(error = %e, kind = %kind, "skipping malformed document row");
                }
            }
        }
        Ok(out)
    }

    async fn commit(&self, mutations: &[Mutation]) -> Result<(), CommitError> {
        let mut tx = self.pool.begin().await.map_err(backend)?;

        for m in mutations {
            let row = sqlx::query(
                r#"
SELECT body FROM documents
WHERE collection = ? AND id = ?;
"#,
            )
            .bind(m.doc.kind.as_str())
            .bind(m.doc.uid.as_str())
            .fetch_optional(&mut *tx)
            .await
            .map_err(backend)?;

            let current = match row {
                Some(r) => Some(row_to_body(&r).map_err(|e| CommitError::InvalidBody {
                    doc: m.doc.clone(),
                    reason: e.to_string(),
                })?),
                None => None,
            };
            let existed = current.is_some();

            match apply_mutation(current, m)? {
                Some(body) => {
                    let text = body.to_string();
                    let res = if existed {
                        sqlx::query(
                            r#"
UPDATE documents SET body = ?
WHERE collection = ? AND id = ?;
"#,
                        )
                        .bind(text)
                        .bind(m.doc.kind.as_str())
                        .bind(m.doc.uid.as_str())
                        .execute(&mut *tx)
                        .await
                    } else {
                        sqlx::query(
                            r#"
INSERT INTO documents (collection, id, body)
VALUES (?, ?, ?);
"#,
                        )
                        .bind(m.doc.kind.as_str())
                        .bind(m.doc.uid.as_str())
                        .bind(text)
                        .execute(&mut *tx)
                        .await
                    };

                    if let Err(e) = res {
                        let duplicate = matches!(
                            &e,
                            sqlx::Error::Database(db) if db.is_unique_violation()
                        );
                        return Err(if duplicate {
                            CommitError::AlreadyExists(m.doc.clone())
                        } else {
                            backend(e)
                        });
                    }
                }
                None if existed => {
                    sqlx::query(
                        r#"
DELETE FROM documents
WHERE collection = ? AND id = ?;
"#,
                    )
                    .bind(m.doc.kind.as_str())
                    .bind(m.doc.uid.as_str())
                    .execute(&mut *tx)
                    .await
                    .map_err(backend)?;
                }
                None => {}
            }
        }

        tx.commit().await.map_err(backend)?;
        Ok(())
    }
}

// Row mapping + helpers

fn row_to_body(r: &sqlx::any::AnyRow) -> anyhow::Result<Value> {
    let text: String = r.try_get("body")?;
    serde_json::from_str(&text).context("document body is not valid JSON")
}

/// `minting.nft_id` -> `$.minting.nft_id`
fn json_path(field: &str) -> String {
    format!("$.{field}")
}

fn backend(e: sqlx::Error) -> CommitError {
    CommitError::Backend(anyhow::Error::new(e).context("sqlx commit"))
}
