use crate::error::{Result, RiggingError};
use serde::Serialize;
use serde_json::{Map, Value};

/// Encode `value` to JSON and decode it back into a generic tree.
///
/// Going through bytes rather than `serde_json::to_value` keeps the tree
/// identical to what a backend would get from reading the serialized form.
pub fn encode_to_generic_tree<T: Serialize + ?Sized>(
    what: &'static str,
    value: &T,
) -> Result<Value> {
    let data =
        serde_json::to_vec(value).map_err(|source| RiggingError::Serialization { what, source })?;
    serde_json::from_slice(&data).map_err(|source| RiggingError::Serialization { what, source })
}

/// Like [`encode_to_generic_tree`], mapping `None` to `Value::Null`.
pub fn encode_optional<T: Serialize>(what: &'static str, value: Option<&T>) -> Result<Value> {
    match value {
        Some(v) => encode_to_generic_tree(what, v),
        None => Ok(Value::Null),
    }
}

/// Merge `b` into `a`; keys present in both take the value from `b`.
///
/// The merge is shallow: a nested map in `b` replaces the one in `a` whole,
/// so a later export executor owns every top-level key it emits.
pub fn merge_maps(mut a: Map<String, Value>, b: Map<String, Value>) -> Map<String, Value> {
    for (k, v) in b {
        a.insert(k, v);
    }
    a
}
