//! Singleton-vs-list canonicalization helpers.
//!
//! MARC fields are repeatable or not depending on the tag, so rule handlers
//! constantly face values that are "one or many". [`force_list`] and
//! [`reverse_force_list`] move between the two canonical shapes:
//! `reverse_force_list(force_list(x)) == x` for any scalar `x`.

use crate::value::Value;

/// Wrap a non-list value in a one-element list.
///
/// Lists pass through unchanged, and so does [`Value::Null`] — an absent
/// value stays absent rather than becoming a list of nothing.
#[must_use]
pub fn force_list(value: Value) -> Value {
    match value {
        Value::Null => Value::Null,
        Value::List(items) => Value::List(items),
        single => Value::List(vec![single]),
    }
}

/// Unwrap a one-element list to its sole element.
///
/// Multi-element lists and non-lists pass through unchanged.
#[must_use]
pub fn reverse_force_list(value: Value) -> Value {
    match value {
        Value::List(mut items) if items.len() == 1 => items.pop().unwrap_or(Value::Null),
        other => other,
    }
}
