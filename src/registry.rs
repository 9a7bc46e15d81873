//! Explicit rule registry for per-tag mapping dispatch.
//!
//! Each conversion direction owns a registry of rules, one per MARC tag (or
//! tag pattern). The registry is built once at startup through
//! [`RuleRegistryBuilder`] and is read-only afterwards; rules are matched in
//! registration order, first match wins.
//!
//! # Examples
//!
//! ```
//! use marcmap::{OrderedMultiMap, RuleRegistry, Value};
//!
//! let registry = RuleRegistry::builder()
//!     .rule("main_entry_personal_name", r"^100..", |_tag, value| {
//!         Ok(Some(value.clone()))
//!     })
//!     .build()?;
//!
//! let record = OrderedMultiMap::from_pairs([
//!     ("1001_".to_string(), Value::from("Davis, Miles")),
//! ]);
//! let converted = registry.translate(&record)?;
//! assert_eq!(
//!     converted.get("main_entry_personal_name"),
//!     Some(Value::from("Davis, Miles"))
//! );
//! # Ok::<(), marcmap::MarcMapError>(())
//! ```

use crate::error::{MarcMapError, Result};
use crate::multimap::OrderedMultiMap;
use crate::normalize::force_list;
use crate::value::Value;
use regex::Regex;
use std::fmt;

/// A rule handler: receives the matched input key and one value, returns the
/// translated value, or `None` to drop the entry.
pub type Handler = Box<dyn Fn(&str, &Value) -> Result<Option<Value>> + Send + Sync>;

struct Rule {
    /// Key the translated value is emitted under.
    output: String,
    /// Pattern the input key must match.
    pattern: Regex,
    handler: Handler,
}

/// An immutable set of mapping rules for one conversion direction.
pub struct RuleRegistry {
    rules: Vec<Rule>,
    ignore_missing: bool,
}

impl fmt::Debug for RuleRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RuleRegistry")
            .field("rules", &self.rules.len())
            .field("ignore_missing", &self.ignore_missing)
            .finish()
    }
}

impl RuleRegistry {
    /// Start building a registry.
    #[must_use]
    pub fn builder() -> RuleRegistryBuilder {
        RuleRegistryBuilder {
            rules: Vec::new(),
            ignore_missing: false,
        }
    }

    /// Translate a record by dispatching every key occurrence to its first
    /// matching rule.
    ///
    /// The input's emission order is walked occurrence by occurrence, so the
    /// output record keeps the input's relative order. The reserved order
    /// key is never offered to rules. A handler returning `Ok(None)` drops
    /// the entry.
    ///
    /// # Errors
    ///
    /// Returns [`MarcMapError::NoRule`] for an input key no rule matches,
    /// unless the registry was built with
    /// [`RuleRegistryBuilder::ignore_missing`]. Handler errors propagate.
    pub fn translate(&self, input: &OrderedMultiMap) -> Result<OrderedMultiMap> {
        let mut output = Vec::new();
        for (key, value) in input.items(false, true) {
            let Some(rule) = self.rules.iter().find(|r| r.pattern.is_match(&key)) else {
                if self.ignore_missing {
                    continue;
                }
                return Err(MarcMapError::NoRule(key));
            };
            if let Some(translated) = (rule.handler)(&key, &value)? {
                output.push((rule.output.clone(), translated));
            }
        }
        Ok(OrderedMultiMap::from_pairs(output))
    }
}

/// Builder for a [`RuleRegistry`]. Registration order is match precedence.
pub struct RuleRegistryBuilder {
    rules: Vec<(String, String, Handler)>,
    ignore_missing: bool,
}

impl fmt::Debug for RuleRegistryBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RuleRegistryBuilder")
            .field("rules", &self.rules.len())
            .field("ignore_missing", &self.ignore_missing)
            .finish()
    }
}

impl RuleRegistryBuilder {
    /// Register a rule: input keys matching `pattern` are translated by
    /// `handler` and emitted under `output`.
    #[must_use]
    pub fn rule<F>(mut self, output: &str, pattern: &str, handler: F) -> Self
    where
        F: Fn(&str, &Value) -> Result<Option<Value>> + Send + Sync + 'static,
    {
        self.rules
            .push((output.to_string(), pattern.to_string(), Box::new(handler)));
        self
    }

    /// Skip input keys with no matching rule instead of failing.
    #[must_use]
    pub fn ignore_missing(mut self, ignore: bool) -> Self {
        self.ignore_missing = ignore;
        self
    }

    /// Compile all patterns and freeze the registry.
    ///
    /// # Errors
    ///
    /// Returns [`MarcMapError::InvalidInput`] for an uncompilable pattern;
    /// pattern problems surface here, not at match time.
    pub fn build(self) -> Result<RuleRegistry> {
        let mut rules = Vec::with_capacity(self.rules.len());
        for (output, pattern, handler) in self.rules {
            let pattern = Regex::new(&pattern).map_err(|e| {
                MarcMapError::InvalidInput(format!("bad rule pattern '{pattern}': {e}"))
            })?;
            rules.push(Rule {
                output,
                pattern,
                handler,
            });
        }
        Ok(RuleRegistry {
            rules,
            ignore_missing: self.ignore_missing,
        })
    }
}

/// Adapt a per-item handler to the single-or-list calling convention.
///
/// A list value applies the handler to each element; a failing element is
/// skipped and the rest still translate (the skip-and-continue policy for
/// repeatable fields). A single value applies the handler directly.
pub fn for_each_value<F>(handler: F) -> impl Fn(&str, &Value) -> Result<Option<Value>>
where
    F: Fn(&str, &Value) -> Result<Option<Value>>,
{
    move |key, value| match value {
        Value::List(items) => {
            let mut out = Vec::new();
            for item in items {
                if let Ok(Some(translated)) = handler(key, item) {
                    out.push(translated);
                }
            }
            if out.is_empty() {
                Ok(None)
            } else {
                Ok(Some(Value::List(out)))
            }
        }
        single => handler(key, single),
    }
}

/// Adapt a per-item builder to the reverse direction, where output is
/// always a list of raw field structures.
///
/// The value is list-normalized first, the builder applied to each element,
/// and failing elements skipped; a `Null` input yields no output at all.
pub fn reverse_for_each_value<F>(builder: F) -> impl Fn(&str, &Value) -> Result<Option<Value>>
where
    F: Fn(&str, &Value) -> Result<Option<Value>>,
{
    move |key, value| match force_list(value.clone()) {
        Value::List(items) => {
            let mut out = Vec::new();
            for item in &items {
                if let Ok(Some(built)) = builder(key, item) {
                    out.push(built);
                }
            }
            if out.is_empty() {
                Ok(None)
            } else {
                Ok(Some(Value::List(out)))
            }
        }
        _ => Ok(None),
    }
}

/// Strip `Null`-valued occurrences from a raw output structure.
///
/// Rule handlers emit `Null` for subfields with nothing to say; the caller
/// drops them before final assembly.
#[must_use]
pub fn filter_values(map: &OrderedMultiMap) -> OrderedMultiMap {
    OrderedMultiMap::from_pairs(
        map.items(false, true)
            .into_iter()
            .filter(|(_, value)| !value.is_null()),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(pairs: &[(&str, &str)]) -> OrderedMultiMap {
        OrderedMultiMap::from_pairs(
            pairs
                .iter()
                .map(|(k, v)| ((*k).to_string(), Value::from(*v))),
        )
    }

    #[test]
    fn test_translate_renames_keys() {
        let registry = RuleRegistry::builder()
            .rule("personal_name", r"^100..", |_, v| Ok(Some(v.clone())))
            .build()
            .unwrap();
        let input = record(&[("1001_", "Fitzgerald, F. Scott")]);
        let output = registry.translate(&input).unwrap();
        assert_eq!(
            output.get("personal_name"),
            Some(Value::from("Fitzgerald, F. Scott"))
        );
    }

    #[test]
    fn test_translate_preserves_emission_order() {
        let registry = RuleRegistry::builder()
            .rule("title", r"^245..", |_, v| Ok(Some(v.clone())))
            .rule("subject", r"^650..", |_, v| Ok(Some(v.clone())))
            .build()
            .unwrap();
        let input = record(&[
            ("650_0", "Jazz"),
            ("24510", "Kind of Blue"),
            ("650_0", "Trumpet"),
        ]);
        let output = registry.translate(&input).unwrap();
        assert_eq!(output.keys_repeated(), &["subject", "title", "subject"]);
    }

    #[test]
    fn test_translate_missing_rule_fails() {
        let registry = RuleRegistry::builder().build().unwrap();
        let input = record(&[("999__", "local")]);
        assert!(matches!(
            registry.translate(&input),
            Err(MarcMapError::NoRule(_))
        ));
    }

    #[test]
    fn test_translate_ignore_missing_skips() {
        let registry = RuleRegistry::builder()
            .ignore_missing(true)
            .build()
            .unwrap();
        let input = record(&[("999__", "local")]);
        let output = registry.translate(&input).unwrap();
        assert!(output.is_empty());
    }

    #[test]
    fn test_handler_none_drops_entry() {
        let registry = RuleRegistry::builder()
            .rule("kept", r"^a$", |_, v| Ok(Some(v.clone())))
            .rule("dropped", r"^b$", |_, _| Ok(None))
            .build()
            .unwrap();
        let input = record(&[("a", "1"), ("b", "2")]);
        let output = registry.translate(&input).unwrap();
        assert_eq!(output.keys().collect::<Vec<_>>(), vec!["kept"]);
    }

    #[test]
    fn test_bad_pattern_fails_at_build() {
        let result = RuleRegistry::builder()
            .rule("broken", r"([unclosed", |_, v| Ok(Some(v.clone())))
            .build();
        assert!(matches!(result, Err(MarcMapError::InvalidInput(_))));
    }

    #[test]
    fn test_for_each_value_skips_failures() {
        let handler = for_each_value(|_, v| match v {
            Value::Str(s) if s == "bad" => {
                Err(MarcMapError::InvalidInput("unparseable".to_string()))
            }
            other => Ok(Some(other.clone())),
        });
        let value = Value::List(vec![
            Value::from("good"),
            Value::from("bad"),
            Value::from("also good"),
        ]);
        let result = handler("650", &value).unwrap();
        assert_eq!(
            result,
            Some(Value::List(vec![
                Value::from("good"),
                Value::from("also good"),
            ]))
        );
    }

    #[test]
    fn test_for_each_value_single_passthrough() {
        let handler = for_each_value(|_, v| Ok(Some(v.clone())));
        assert_eq!(
            handler("245", &Value::from("solo")).unwrap(),
            Some(Value::from("solo"))
        );
    }

    #[test]
    fn test_reverse_for_each_value_always_lists() {
        let builder = reverse_for_each_value(|_, v| Ok(Some(v.clone())));
        assert_eq!(
            builder("100", &Value::from("solo")).unwrap(),
            Some(Value::List(vec![Value::from("solo")]))
        );
        assert_eq!(builder("100", &Value::Null).unwrap(), None);
    }

    #[test]
    fn test_filter_values_strips_nulls() {
        let map = OrderedMultiMap::from_pairs([
            ("a".to_string(), Value::from("kept")),
            ("b".to_string(), Value::Null),
            ("c".to_string(), Value::from("kept too")),
        ]);
        let filtered = filter_values(&map);
        assert_eq!(filtered.keys().collect::<Vec<_>>(), vec!["a", "c"]);
    }
}
