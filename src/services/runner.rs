//! Sequential per-item execution with optional continue-on-fail.

use serde::Serialize;
use serde_json::{Value, json};
use std::fmt;
use std::future::Future;
use thiserror::Error;

/// A record produced for one input item.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ItemOutput {
    /// Index of the input item this record came from
    pub item_index: usize,
    pub json: Value,
}

impl ItemOutput {
    pub fn is_error(&self) -> bool {
        self.json.get("error").is_some()
    }
}

/// The first failing item when continue-on-fail is off.
#[derive(Debug, Error)]
#[error("item {item_index}: {error}")]
pub struct ItemError<E> {
    pub item_index: usize,
    pub error: E,
}

/// Run `op` for items `0..count` in order.
///
/// Each item may produce any number of records. On failure, with
/// `continue_on_fail` an `{"error": message}` record is emitted for the item
/// and processing moves on; otherwise the run stops with that error.
pub async fn run_items<F, Fut, E>(
    count: usize,
    continue_on_fail: bool,
    mut op: F,
) -> Result<Vec<ItemOutput>, ItemError<E>>
where
    F: FnMut(usize) -> Fut,
    Fut: Future<Output = Result<Vec<Value>, E>>,
    E: fmt::Display,
{
    let mut outputs = Vec::with_capacity(count);

    for item_index in 0..count {
        match op(item_index).await {
            Ok(records) => {
                outputs.extend(records.into_iter().map(|json| ItemOutput { item_index, json }));
            }
            Err(error) if continue_on_fail => {
                tracing::warn!(item_index, %error, "item failed, continuing");
                outputs.push(ItemOutput {
                    item_index,
                    json: json!({ "error": error.to_string() }),
                });
            }
            Err(error) => return Err(ItemError { item_index, error }),
        }
    }

    Ok(outputs)
}
