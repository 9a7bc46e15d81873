#![doc = include_str!("../README.md")]
#![warn(missing_docs)]

//! # marcmap: ordered record structures for MARC21 conversion
//!
//! Bibliographic conversion rules translate named JSON properties to
//! single-character MARC subfield codes and back. The data structure at the
//! center of that translation is [`OrderedMultiMap`]: an immutable,
//! insertion-ordered mapping whose keys may repeat, with a grouped view that
//! collapses singleton groups to their bare values on lookup.
//!
//! ## Quick Start
//!
//! ```
//! use marcmap::{OrderedMultiMap, Value};
//! use serde_json::json;
//!
//! let field = OrderedMultiMap::from_json(&json!({
//!     "__order__": ["a", "d", "a"],
//!     "a": ["Fitzgerald, F. Scott", "variant form"],
//!     "d": "1896-1940",
//! }))?;
//!
//! // Repeated subfield 'a' yields the full ordered group
//! assert_eq!(field.get("a"), Some(Value::List(vec![
//!     Value::from("Fitzgerald, F. Scott"),
//!     Value::from("variant form"),
//! ])));
//! // Singleton subfield 'd' collapses to the scalar
//! assert_eq!(field.get("d"), Some(Value::from("1896-1940")));
//! // The original emission order survives
//! assert_eq!(field.keys_repeated(), &["a", "d", "a"]);
//! # Ok::<(), marcmap::MarcMapError>(())
//! ```
//!
//! ## Modules
//!
//! - [`multimap`] — The core container ([`OrderedMultiMap`], [`Group`])
//! - [`value`] — The JSON-like value type flowing through records
//! - [`field_order`] — Subfield emission order for MARC serialization
//! - [`normalize`] — Singleton-vs-list canonicalization helpers
//! - [`registry`] — Explicit per-tag rule dispatch
//! - [`error`] — Error types and result type

pub mod error;
pub mod field_order;
pub mod multimap;
pub mod normalize;
pub mod registry;
pub mod value;

pub use error::{MarcMapError, Result};
pub use field_order::{liberal_map_order, map_order, FieldMap, IndicatorSlot, IND1, IND2};
pub use multimap::{Group, OrderedMultiMap, ValuesExpanded, ORDER_KEY};
pub use normalize::{force_list, reverse_force_list};
pub use registry::{
    filter_values, for_each_value, reverse_for_each_value, Handler, RuleRegistry,
    RuleRegistryBuilder,
};
pub use value::Value;
