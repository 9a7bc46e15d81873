//! End-to-end translation through the rule registry: MARC-tagged input
//! records dispatched to per-tag handlers, producing ordered, grouped
//! output records.

use marcmap::{
    filter_values, for_each_value, map_order, FieldMap, IndicatorSlot, MarcMapError,
    OrderedMultiMap, RuleRegistry, Value, IND1, IND2,
};
use serde_json::json;

/// A registry resembling a small slice of a bibliographic conversion:
/// personal names, titles, and repeatable subject entries.
fn bibliographic_registry() -> RuleRegistry {
    RuleRegistry::builder()
        .rule("main_entry_personal_name", r"^100..", |_, value| {
            let Some(field) = value.as_map() else {
                return Ok(None);
            };
            Ok(field.get("a"))
        })
        .rule("title_statement", r"^245..", |_, value| {
            let Some(field) = value.as_map() else {
                return Ok(None);
            };
            Ok(field.get("a"))
        })
        .rule(
            "subject_added_entry_topical_term",
            r"^650..",
            for_each_value(|_, value| {
                let Some(field) = value.as_map() else {
                    return Ok(None);
                };
                Ok(field.get("a"))
            }),
        )
        .build()
        .expect("registry patterns must compile")
}

fn subfield(pairs: &[(&str, &str)]) -> Value {
    Value::Map(OrderedMultiMap::from_pairs(
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), Value::from(*v))),
    ))
}

#[test]
fn test_translate_bibliographic_record() {
    let registry = bibliographic_registry();
    let record = OrderedMultiMap::from_pairs([
        ("1001_".to_string(), subfield(&[("a", "Davis, Miles")])),
        ("24510".to_string(), subfield(&[("a", "Kind of Blue")])),
        ("650_0".to_string(), subfield(&[("a", "Jazz")])),
        ("650_0".to_string(), subfield(&[("a", "Trumpet music")])),
    ]);

    let converted = registry.translate(&record).unwrap();

    assert_eq!(
        converted.get("main_entry_personal_name"),
        Some(Value::from("Davis, Miles"))
    );
    assert_eq!(
        converted.get("title_statement"),
        Some(Value::from("Kind of Blue"))
    );
    // The repeated 650 collapses to the full ordered group.
    assert_eq!(
        converted.get("subject_added_entry_topical_term"),
        Some(Value::List(vec![
            Value::from("Jazz"),
            Value::from("Trumpet music"),
        ]))
    );
    assert_eq!(
        converted.keys_repeated(),
        &[
            "main_entry_personal_name",
            "title_statement",
            "subject_added_entry_topical_term",
            "subject_added_entry_topical_term",
        ]
    );
}

#[test]
fn test_unknown_tag_fails_without_ignore_missing() {
    let registry = bibliographic_registry();
    let record = OrderedMultiMap::from_pairs([(
        "902__".to_string(),
        subfield(&[("a", "local practice")]),
    )]);
    assert!(matches!(
        registry.translate(&record),
        Err(MarcMapError::NoRule(_))
    ));
}

#[test]
fn test_handler_error_propagates() {
    let registry = RuleRegistry::builder()
        .rule("strict", r"^020..", |key, _| {
            Err(MarcMapError::InvalidInput(format!("unparseable {key}")))
        })
        .build()
        .unwrap();
    let record = OrderedMultiMap::from_pairs([("020__".to_string(), Value::from("not-an-isbn"))]);
    assert!(matches!(
        registry.translate(&record),
        Err(MarcMapError::InvalidInput(_))
    ));
}

#[test]
fn test_filter_values_before_assembly() {
    // A reverse handler emits Null for subfields with nothing to say.
    let raw = OrderedMultiMap::from_pairs([
        ("a".to_string(), Value::from("Davis, Miles")),
        ("d".to_string(), Value::Null),
        ("$ind1".to_string(), Value::from("1")),
    ]);
    let assembled = filter_values(&raw);
    assert_eq!(assembled.keys().collect::<Vec<_>>(), vec!["a", "$ind1"]);
}

#[test]
fn test_map_order_for_reverse_field() {
    // The reverse side of a 100 field: names map to codes, indicators trail.
    let mut table = FieldMap::new();
    table.insert("personal_name".to_string(), "a".to_string());
    table.insert("dates_associated_with_a_name".to_string(), "d".to_string());

    let value = OrderedMultiMap::from_json(&json!({
        "__order__": ["personal_name", "dates_associated_with_a_name"],
        "personal_name": "Davis, Miles",
        "dates_associated_with_a_name": "1926-1991",
    }))
    .unwrap();

    let slots = [
        IndicatorSlot::parse("type_of_personal_name_entry_element"),
        IndicatorSlot::parse("None"),
    ];
    let codes = map_order(&table, &value, &slots);
    assert_eq!(codes, vec!["a", "d", IND1, IND2]);
}
