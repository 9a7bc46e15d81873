//! Subfield emission order for MARC field serialization.
//!
//! A per-tag mapping rule knows its field names and the single-character
//! subfield codes they serialize to. [`map_order`] turns a value's declared
//! occurrence order into the sequence of codes a downstream MARC writer
//! should emit, appending the two indicator pseudo-codes at the end.

use crate::multimap::OrderedMultiMap;
use indexmap::IndexMap;

/// Field-name to subfield-code table for one MARC tag.
///
/// Codes are stored as strings so the indicator pseudo-codes live in the
/// same domain as real single-character subfield codes.
pub type FieldMap = IndexMap<String, String>;

/// Pseudo-code for the first indicator position.
pub const IND1: &str = "$ind1";

/// Pseudo-code for the second indicator position.
pub const IND2: &str = "$ind2";

/// One of the two indicator slots of a mapping rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IndicatorSlot {
    /// The tag defines no indicator at this position.
    None,
    /// The indicator is derived from the named field of the value.
    Field(String),
}

impl IndicatorSlot {
    /// Parse a slot declaration: the literal `"None"` marks a position with
    /// no indicator, anything else names the source field.
    #[must_use]
    pub fn parse(name: &str) -> Self {
        if name == "None" {
            IndicatorSlot::None
        } else {
            IndicatorSlot::Field(name.to_string())
        }
    }
}

/// Compute the emission code sequence for a field value.
///
/// Each entry of the value's occurrence order is mapped through `table`;
/// entries with no mapping are silently dropped (unrecognized or extension
/// keys). Codes keep the relative order they were declared in. The
/// [`IND1`]/[`IND2`] placeholders are appended for the two slots regardless
/// of subfield order; callers drop a placeholder during post-processing when
/// its source field is absent or carries the no-information sentinel.
#[must_use]
pub fn map_order(
    table: &FieldMap,
    value: &OrderedMultiMap,
    indicators: &[IndicatorSlot; 2],
) -> Vec<String> {
    let mut codes: Vec<String> = value
        .keys_repeated()
        .iter()
        .filter_map(|name| table.get(name).cloned())
        .collect();
    for (placeholder, _slot) in [IND1, IND2].iter().zip(indicators) {
        codes.push((*placeholder).to_string());
    }
    codes
}

/// [`map_order`] variant for liberally mapped tags.
///
/// A declared entry missing from the table passes through verbatim when it
/// already is a single-character code (locally defined subfields); longer
/// unmapped names are still dropped.
#[must_use]
pub fn liberal_map_order(
    table: &FieldMap,
    value: &OrderedMultiMap,
    indicators: &[IndicatorSlot; 2],
) -> Vec<String> {
    let mut codes: Vec<String> = value
        .keys_repeated()
        .iter()
        .filter_map(|name| {
            table
                .get(name)
                .cloned()
                .or_else(|| (name.chars().count() == 1).then(|| name.clone()))
        })
        .collect();
    for (placeholder, _slot) in [IND1, IND2].iter().zip(indicators) {
        codes.push((*placeholder).to_string());
    }
    codes
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::Value;

    fn table() -> FieldMap {
        let mut table = FieldMap::new();
        table.insert("x".to_string(), "a".to_string());
        table.insert("y".to_string(), "b".to_string());
        table
    }

    fn value_with_order(order: &[&str]) -> OrderedMultiMap {
        OrderedMultiMap::from_pairs(
            order
                .iter()
                .map(|key| ((*key).to_string(), Value::from("data"))),
        )
    }

    #[test]
    fn test_codes_follow_declared_order() {
        let value = value_with_order(&["x", "y", "x"]);
        let slots = [IndicatorSlot::parse("None"), IndicatorSlot::parse("None")];
        let codes = map_order(&table(), &value, &slots);
        assert_eq!(codes, vec!["a", "b", "a", IND1, IND2]);
    }

    #[test]
    fn test_unmapped_entries_dropped() {
        let value = value_with_order(&["x", "unrecognized", "y"]);
        let slots = [IndicatorSlot::parse("None"), IndicatorSlot::parse("None")];
        let codes = map_order(&table(), &value, &slots);
        assert_eq!(codes, vec!["a", "b", IND1, IND2]);
    }

    #[test]
    fn test_indicator_placeholders_trail_named_slots() {
        let value = value_with_order(&["y"]);
        let slots = [
            IndicatorSlot::parse("type_of_personal_name_entry_element"),
            IndicatorSlot::parse("None"),
        ];
        let codes = map_order(&table(), &value, &slots);
        assert_eq!(codes, vec!["b", IND1, IND2]);
    }

    #[test]
    fn test_liberal_passes_single_char_extensions() {
        let value = value_with_order(&["x", "9", "longname"]);
        let slots = [IndicatorSlot::parse("None"), IndicatorSlot::parse("None")];
        let codes = liberal_map_order(&table(), &value, &slots);
        assert_eq!(codes, vec!["a", "9", IND1, IND2]);
    }

    #[test]
    fn test_slot_parse() {
        assert_eq!(IndicatorSlot::parse("None"), IndicatorSlot::None);
        assert_eq!(
            IndicatorSlot::parse("type_of_name"),
            IndicatorSlot::Field("type_of_name".to_string())
        );
    }
}
