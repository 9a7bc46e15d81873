//! Common test helpers and utilities shared across test suite.

use marcmap::OrderedMultiMap;
use serde_json::json;

/// Builds the reference field used across the suite: repeated subfields
/// `a` and `b` interleaved with a singleton `c`.
pub fn interleaved_field() -> OrderedMultiMap {
    OrderedMultiMap::from_json(&json!({
        "__order__": ["a", "b", "c", "a", "b"],
        "a": ["x", 4],
        "b": [2, 5],
        "c": "y",
    }))
    .expect("reference field must construct")
}

/// Builds a small personal-name field in JSON form, the shape a per-tag
/// mapping rule would receive.
#[allow(dead_code)]
pub fn personal_name_field() -> OrderedMultiMap {
    OrderedMultiMap::from_json(&json!({
        "__order__": ["personal_name", "dates", "personal_name"],
        "personal_name": ["Fitzgerald, F. Scott", "variant form"],
        "dates": "1896-1940",
    }))
    .expect("personal name field must construct")
}
