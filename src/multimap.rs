//! The order-preserving, repeatable-key associative container.
//!
//! [`OrderedMultiMap`] represents a MARC record or field as a dict-like
//! structure while preserving the original subfield/field emission order,
//! including repeated keys. Lookup by key collapses: a key occurring exactly
//! once yields its bare value, a key occurring more than once yields the
//! full ordered group. Instances are immutable after construction; every
//! transformation builds a new one.
//!
//! # Examples
//!
//! ```
//! use marcmap::{OrderedMultiMap, Value};
//!
//! let record = OrderedMultiMap::from_pairs([
//!     ("a".to_string(), Value::from("Fitzgerald, F. Scott")),
//!     ("d".to_string(), Value::from("1896-1940")),
//!     ("a".to_string(), Value::from("variant form")),
//! ]);
//!
//! assert_eq!(record.keys_repeated(), &["a", "d", "a"]);
//! // 'd' occurs once and collapses to the scalar
//! assert_eq!(record.get("d"), Some(Value::from("1896-1940")));
//! ```

use crate::error::{MarcMapError, Result};
use crate::value::{lenient_eq, Value};
use indexmap::IndexMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use smallvec::SmallVec;
use std::collections::HashMap;
use std::ops::Index;
use std::slice;

/// The reserved key carrying the occurrence sequence inside a plain JSON
/// representation of a record or field. It never collides with a real field
/// key and is excluded from normal key/value iteration unless explicitly
/// requested.
pub const ORDER_KEY: &str = "__order__";

/// All values associated with one key, in occurrence order.
///
/// The single-value case is stored without a `Vec` allocation; lookup on the
/// parent map collapses a [`Group::One`] to its bare value.
#[derive(Debug, Clone, PartialEq)]
pub enum Group {
    /// Exactly one occurrence of the key.
    One(Value),
    /// Two or more occurrences, in the order they appeared.
    Many(Vec<Value>),
}

impl Group {
    /// Number of occurrences in this group (always at least one).
    #[must_use]
    pub fn len(&self) -> usize {
        match self {
            Group::One(_) => 1,
            Group::Many(values) => values.len(),
        }
    }

    /// A group always holds at least one value.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        false
    }

    /// View the group as a slice in occurrence order.
    #[must_use]
    pub fn as_slice(&self) -> &[Value] {
        match self {
            Group::One(value) => slice::from_ref(value),
            Group::Many(values) => values.as_slice(),
        }
    }

    /// The i-th occurrence, if any.
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&Value> {
        self.as_slice().get(index)
    }

    /// Collapse to the lookup form: the bare value for a singleton group,
    /// a list of the whole group otherwise.
    #[must_use]
    pub fn collapsed(&self) -> Value {
        match self {
            Group::One(value) => value.clone(),
            Group::Many(values) => Value::List(values.clone()),
        }
    }

    fn push(&mut self, value: Value) {
        let prev = std::mem::replace(self, Group::Many(Vec::new()));
        *self = match prev {
            Group::One(first) => Group::Many(vec![first, value]),
            Group::Many(mut values) => {
                values.push(value);
                Group::Many(values)
            }
        };
    }
}

/// An immutable, order-aware, key-groupable mapping.
///
/// Two parallel structures back the container: `grouped` holds the values
/// per unique key in first-occurrence order, and `order` records the
/// interleaved key occurrence sequence (repeats allowed), so the original
/// flat sequence of (key, value) pairs is always reconstructible. The i-th
/// occurrence of a key in `order` corresponds to the i-th element of that
/// key's group.
#[derive(Debug, Clone, Default)]
pub struct OrderedMultiMap {
    order: SmallVec<[String; 8]>,
    grouped: IndexMap<String, Group>,
}

impl OrderedMultiMap {
    /// Create an empty map.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from an explicit flat sequence of (key, value) occurrences.
    ///
    /// A [`Value::List`] directly under a key expands into one occurrence
    /// per element, matching the plain-mapping construction path. Nested
    /// [`Value::Map`] values stay as given.
    ///
    /// A pair carrying [`ORDER_KEY`] is metadata, never an occurrence: its
    /// sequence arranges the other pairs the way [`Self::from_mapping`]
    /// would, so feeding a map's own [`Self::iter`] output back in rebuilds
    /// the map exactly. Unlike `from_mapping`, this trusted path stays
    /// total: sequence entries with no value left to consume are skipped,
    /// and a malformed reserved value is treated as absent.
    pub fn from_pairs<I>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (String, Value)>,
    {
        let mut declared: Option<Vec<String>> = None;
        let mut fields: Vec<(String, Value)> = Vec::new();
        for (key, value) in pairs {
            if key == ORDER_KEY {
                declared = order_entries(&value).ok();
            } else {
                fields.push((key, value));
            }
        }

        let Some(declared) = declared else {
            let mut map = Self::new();
            for (key, value) in fields {
                match value {
                    Value::List(items) => {
                        for item in items {
                            map.push_occurrence(key.clone(), item);
                        }
                    }
                    single => map.push_occurrence(key, single),
                }
            }
            return map;
        };

        Self::arrange(declared, fields).0
    }

    /// Build from an ordered list of mapping entries, honoring an embedded
    /// reserved order entry if present.
    ///
    /// When one of the pairs carries [`ORDER_KEY`], its value must be a list
    /// of key names (with repeats). Each name consumes the next unconsumed
    /// element of that key's value: a list value yields successive elements,
    /// a scalar value satisfies exactly one occurrence. Entries never
    /// referenced by the order sequence are appended after it, in mapping
    /// order. Without the reserved entry this behaves like
    /// [`Self::from_pairs`].
    ///
    /// The caller supplies an explicit pair list rather than an unordered
    /// table so the relative order across keys is never left to a hash map's
    /// iteration whims.
    ///
    /// # Errors
    ///
    /// Returns [`MarcMapError::ArityMismatch`] when the order sequence
    /// references a key more times than values are available for it, and
    /// [`MarcMapError::InvalidInput`] when the reserved entry is not a list
    /// of key names.
    pub fn from_mapping(pairs: Vec<(String, Value)>) -> Result<Self> {
        let mut declared: Option<Vec<String>> = None;
        let mut fields: Vec<(String, Value)> = Vec::with_capacity(pairs.len());
        for (key, value) in pairs {
            if key == ORDER_KEY {
                declared = Some(order_entries(&value)?);
            } else {
                fields.push((key, value));
            }
        }

        let Some(declared) = declared else {
            return Ok(Self::from_pairs(fields));
        };

        let (map, overrun) = Self::arrange(declared, fields);
        match overrun {
            Some(key) => Err(MarcMapError::ArityMismatch(format!(
                "order sequence references '{key}' more times than values are available"
            ))),
            None => Ok(map),
        }
    }

    /// Arrange fields per a declared occurrence sequence.
    ///
    /// Returns the built map and the first over-consumed key, if any;
    /// sequence entries with nothing left to consume are skipped, and
    /// entries the sequence never named are appended in mapping order.
    fn arrange(declared: Vec<String>, fields: Vec<(String, Value)>) -> (Self, Option<String>) {
        // Per-key pools of still-unconsumed occurrences, in mapping order.
        let mut available: IndexMap<String, Vec<Option<Value>>> = IndexMap::new();
        for (key, value) in fields {
            let pool = available.entry(key).or_default();
            match value {
                Value::List(items) => pool.extend(items.into_iter().map(Some)),
                single => pool.push(Some(single)),
            }
        }

        let mut map = Self::new();
        let mut overrun: Option<String> = None;
        for key in declared {
            let taken = available
                .get_mut(&key)
                .and_then(|pool| pool.iter_mut().find_map(Option::take));
            match taken {
                Some(value) => map.push_occurrence(key, value),
                None => {
                    if overrun.is_none() {
                        overrun = Some(key);
                    }
                }
            }
        }

        // Leftovers the order sequence never named keep their mapping order.
        for (key, pool) in available {
            for value in pool.into_iter().flatten() {
                map.push_occurrence(key.clone(), value);
            }
        }

        (map, overrun)
    }

    /// Reconstruct a map from its plain JSON representation.
    ///
    /// This is the inverse of [`Self::to_json`]: nested objects recursively
    /// become nested maps, and an embedded [`ORDER_KEY`] entry drives the
    /// occurrence sequence.
    ///
    /// # Errors
    ///
    /// Returns [`MarcMapError::InvalidInput`] if `json` is not an object,
    /// plus the [`Self::from_mapping`] failure modes.
    pub fn from_json(json: &serde_json::Value) -> Result<Self> {
        let object = json.as_object().ok_or_else(|| {
            MarcMapError::InvalidInput(format!("expected a JSON object, got: {json}"))
        })?;
        let mut pairs = Vec::with_capacity(object.len());
        for (key, value) in object {
            pairs.push((key.clone(), Value::from_json(value)?));
        }
        Self::from_mapping(pairs)
    }

    /// Serialize to a plain JSON object of the shape
    /// `{"__order__": [keys...], key: value_or_list, ...}`.
    ///
    /// Singleton groups emit the bare value, repeated groups a list; the
    /// reserved entry leads and carries the full occurrence sequence, so
    /// [`Self::from_json`] reconstructs the map exactly.
    #[must_use]
    pub fn to_json(&self) -> serde_json::Value {
        let mut object = serde_json::Map::with_capacity(self.grouped.len() + 1);
        object.insert(
            ORDER_KEY.to_string(),
            serde_json::Value::Array(
                self.order
                    .iter()
                    .map(|key| serde_json::Value::String(key.clone()))
                    .collect(),
            ),
        );
        for (key, group) in &self.grouped {
            object.insert(key.clone(), group.collapsed().to_json());
        }
        serde_json::Value::Object(object)
    }

    /// Collapsed lookup.
    ///
    /// A key occurring exactly once yields its bare value; a key occurring
    /// more than once yields the full ordered group as a [`Value::List`].
    /// Looking up [`ORDER_KEY`] always yields the full occurrence sequence,
    /// never collapsed.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<Value> {
        if key == ORDER_KEY {
            return Some(self.order_value());
        }
        self.grouped.get(key).map(Group::collapsed)
    }

    /// Collapsed lookup that fails on an absent key.
    ///
    /// # Errors
    ///
    /// Returns [`MarcMapError::MissingKey`] if `key` is absent.
    pub fn fetch(&self, key: &str) -> Result<Value> {
        self.get(key)
            .ok_or_else(|| MarcMapError::MissingKey(key.to_string()))
    }

    /// Borrow the uncollapsed group for a key, if present.
    #[must_use]
    pub fn group(&self, key: &str) -> Option<&Group> {
        self.grouped.get(key)
    }

    /// Whether the key occurs at least once (the reserved order key counts
    /// as always present).
    #[must_use]
    pub fn contains_key(&self, key: &str) -> bool {
        key == ORDER_KEY || self.grouped.contains_key(key)
    }

    /// Number of unique keys, excluding the reserved order key.
    #[must_use]
    pub fn len(&self) -> usize {
        self.grouped.len()
    }

    /// Whether the map holds no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.grouped.is_empty()
    }

    /// Total number of (key, value) occurrences.
    #[must_use]
    pub fn occurrence_count(&self) -> usize {
        self.order.len()
    }

    /// Rejected mutation. The container is immutable after construction;
    /// build a new instance with [`Self::from_pairs`] instead.
    ///
    /// # Errors
    ///
    /// Always returns [`MarcMapError::Immutable`].
    pub fn insert(&self, key: &str, _value: Value) -> Result<()> {
        Err(MarcMapError::Immutable(format!(
            "cannot insert '{key}'; build a new map instead"
        )))
    }

    /// Rejected mutation. The container is immutable after construction;
    /// build a new instance without the key instead.
    ///
    /// # Errors
    ///
    /// Always returns [`MarcMapError::Immutable`].
    pub fn remove(&self, key: &str) -> Result<Value> {
        Err(MarcMapError::Immutable(format!(
            "cannot remove '{key}'; build a new map instead"
        )))
    }

    /// Unique keys in first-occurrence order, excluding the reserved order
    /// key.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.grouped.keys().map(String::as_str)
    }

    /// The raw occurrence sequence, verbatim, including repeats.
    #[must_use]
    pub fn keys_repeated(&self) -> &[String] {
        &self.order
    }

    /// Collapsed value per unique key, in first-occurrence order.
    pub fn values(&self) -> impl Iterator<Item = Value> + '_ {
        self.grouped.values().map(Group::collapsed)
    }

    /// Every individual value in emission order, parallel to the occurrence
    /// sequence.
    #[must_use]
    pub fn values_expanded(&self) -> ValuesExpanded<'_> {
        ValuesExpanded {
            map: self,
            pos: 0,
            cursors: HashMap::new(),
        }
    }

    /// Pair list per the view flags.
    ///
    /// With `with_order`, the reserved pair `("__order__", sequence)` leads.
    /// Without `repeated`, one pair per unique key with its collapsed value;
    /// with `repeated`, one pair per occurrence in emission order.
    #[must_use]
    pub fn items(&self, with_order: bool, repeated: bool) -> Vec<(String, Value)> {
        let mut out = Vec::new();
        if with_order {
            out.push((ORDER_KEY.to_string(), self.order_value()));
        }
        if repeated {
            let mut cursors: HashMap<&str, usize> = HashMap::new();
            for key in &self.order {
                let cursor = cursors.entry(key.as_str()).or_insert(0);
                let index = *cursor;
                *cursor += 1;
                if let Some(value) = self.grouped.get(key.as_str()).and_then(|g| g.get(index)) {
                    out.push((key.clone(), value.clone()));
                }
            }
        } else {
            for (key, group) in &self.grouped {
                out.push((key.clone(), group.collapsed()));
            }
        }
        out
    }

    /// Default iteration: the reserved order pair first, then one collapsed
    /// pair per unique key in first-occurrence order.
    #[must_use]
    pub fn iter(&self) -> std::vec::IntoIter<(String, Value)> {
        self.items(true, false).into_iter()
    }

    fn order_value(&self) -> Value {
        Value::List(
            self.order
                .iter()
                .map(|key| Value::Str(key.clone()))
                .collect(),
        )
    }

    fn push_occurrence(&mut self, key: String, value: Value) {
        self.order.push(key.clone());
        match self.grouped.entry(key) {
            indexmap::map::Entry::Occupied(mut entry) => entry.get_mut().push(value),
            indexmap::map::Entry::Vacant(entry) => {
                entry.insert(Group::One(value));
            }
        }
    }
}

fn order_entries(value: &Value) -> Result<Vec<String>> {
    let Value::List(items) = value else {
        return Err(MarcMapError::InvalidInput(
            "reserved order entry must hold a list of key names".to_string(),
        ));
    };
    items
        .iter()
        .map(|item| {
            item.as_str().map(ToString::to_string).ok_or_else(|| {
                MarcMapError::InvalidInput(
                    "reserved order entry must hold string key names".to_string(),
                )
            })
        })
        .collect()
}

/// Iterator over every value in emission order. See
/// [`OrderedMultiMap::values_expanded`].
#[derive(Debug)]
pub struct ValuesExpanded<'a> {
    map: &'a OrderedMultiMap,
    pos: usize,
    cursors: HashMap<&'a str, usize>,
}

impl<'a> Iterator for ValuesExpanded<'a> {
    type Item = &'a Value;

    fn next(&mut self) -> Option<&'a Value> {
        let key = self.map.order.get(self.pos)?;
        self.pos += 1;
        let cursor = self.cursors.entry(key.as_str()).or_insert(0);
        let index = *cursor;
        *cursor += 1;
        self.map.grouped.get(key.as_str()).and_then(|g| g.get(index))
    }
}

impl<'a> IntoIterator for &'a OrderedMultiMap {
    type Item = (String, Value);
    type IntoIter = std::vec::IntoIter<(String, Value)>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Lenient structural equality: for every non-reserved key on either side
/// the collapsed values must match, with a scalar comparing equal to its
/// one-element list. Divergence in the occurrence sequence alone does not
/// break equality, so records reconstructed via different code paths still
/// compare equal.
impl PartialEq for OrderedMultiMap {
    fn eq(&self, other: &Self) -> bool {
        if self.grouped.len() != other.grouped.len() {
            return false;
        }
        self.grouped.iter().all(|(key, group)| {
            other
                .grouped
                .get(key)
                .is_some_and(|theirs| lenient_eq(&group.collapsed(), &theirs.collapsed()))
        })
    }
}

/// Equality against a plain JSON object, under the same lenient rule. A
/// malformed right-hand side (non-object, inconsistent order entry) simply
/// compares unequal.
impl PartialEq<serde_json::Value> for OrderedMultiMap {
    fn eq(&self, other: &serde_json::Value) -> bool {
        OrderedMultiMap::from_json(other).is_ok_and(|converted| *self == converted)
    }
}

/// Dictionary-like access to a key's uncollapsed group.
///
/// Panics if the key is absent. For fallible collapsed access use
/// [`OrderedMultiMap::fetch`] instead.
impl Index<&str> for OrderedMultiMap {
    type Output = Group;

    fn index(&self, key: &str) -> &Self::Output {
        self.grouped.get(key).expect("key not found")
    }
}

impl Serialize for OrderedMultiMap {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        self.to_json().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for OrderedMultiMap {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let json = serde_json::Value::deserialize(deserializer)?;
        OrderedMultiMap::from_json(&json).map_err(serde::de::Error::custom)
    }
}
