use serde_json::{Map, Value};

use super::{Action, CommitError, Mutation};

/// Applies one mutation to the current state of its document and returns the
/// next state (`None` = document absent). Pure; stores call it inside their
/// own atomic section.
pub fn apply_mutation(current: Option<Value>, m: &Mutation) -> Result<Option<Value>, CommitError> {
    match &m.action {
        Action::Create => {
            if current.is_some() {
                return Err(CommitError::AlreadyExists(m.doc.clone()));
            }
            Ok(Some(Value::Object(expect_object(m)?.clone())))
        }

        Action::Set => Ok(Some(Value::Object(expect_object(m)?.clone()))),

        Action::Update { precondition } => {
            let Some(mut doc) = current else {
                return Err(CommitError::Missing(m.doc.clone()));
            };

            if let Some(pre) = precondition {
                let actual = lookup(&doc, &pre.field);
                if !same_state(actual, &pre.equals) {
                    return Err(CommitError::PreconditionFailed {
                        doc: m.doc.clone(),
                        field: pre.field.clone(),
                    });
                }
            }

            let patch = expect_object(m)?;
            let target = doc.as_object_mut().ok_or_else(|| CommitError::InvalidBody {
                doc: m.doc.clone(),
                reason: "stored document is not an object".into(),
            })?;
            for (k, v) in patch {
                target.insert(k.clone(), v.clone());
            }
            Ok(Some(doc))
        }

        Action::Increment { field, by } => {
            let Some(mut doc) = current else {
                return Err(CommitError::Missing(m.doc.clone()));
            };

            let not_numeric = || CommitError::NotNumeric {
                doc: m.doc.clone(),
                field: field.clone(),
            };

            let old = match lookup(&doc, field) {
                None | Some(Value::Null) => 0i128,
                Some(Value::Number(n)) => n
                    .as_i64()
                    .map(i128::from)
                    .or_else(|| n.as_u64().map(i128::from))
                    .ok_or_else(not_numeric)?,
                Some(_) => return Err(not_numeric()),
            };

            let next = old + i128::from(*by);
            let value = if next >= 0 {
                u64::try_from(next).map(Value::from).map_err(|_| not_numeric())?
            } else {
                i64::try_from(next).map(Value::from).map_err(|_| not_numeric())?
            };

            write_path(&mut doc, field, value).ok_or_else(not_numeric)?;
            Ok(Some(doc))
        }

        Action::Delete => Ok(None),
    }
}

fn expect_object(m: &Mutation) -> Result<&Map<String, Value>, CommitError> {
    m.data.as_object().ok_or_else(|| CommitError::InvalidBody {
        doc: m.doc.clone(),
        reason: "mutation data must be a JSON object".into(),
    })
}

/// Absent and `null` are the same state.
fn same_state(actual: Option<&Value>, expected: &Value) -> bool {
    match actual {
        None => expected.is_null(),
        Some(v) => v == expected,
    }
}

/// Resolves a dot path (`minting.nft_id`) inside a document.
pub fn lookup<'a>(doc: &'a Value, path: &str) -> Option<&'a Value> {
    path.split('.').try_fold(doc, |cur, key| cur.get(key))
}

fn write_path(doc: &mut Value, path: &str, value: Value) -> Option<()> {
    let mut cur = doc;
    let mut keys = path.split('.').peekable();
    while let Some(key) = keys.next() {
        let obj = cur.as_object_mut()?;
        if keys.peek().is_none() {
            obj.insert(key.to_string(), value);
            return Some(());
        }
        let next = obj
            .entry(key.to_string())
            .or_insert_with(|| Value::Object(Map::new()));
        if next.is_null() {
            *next = Value::Object(Map::new());
        }
        cur = next;
    }
    None
}
