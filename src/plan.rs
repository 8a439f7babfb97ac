//! Schema-driven planning.
//!
//! A plan merges the configuration with what only the provider knows: schema
//! defaults and computed attributes carried over from prior state. Values are
//! compared in a canonical form so that unset, null and zero values are the
//! same thing and set-typed attributes ignore element order.

use serde_json::{Map, Value};

use crate::resources::data::{as_bool, is_zero};
use crate::schema::{Attribute, AttributeType, Block, BlockNestingMode, NestedBlock, Schema};
use crate::types::{AttributeChange, PlanResult};

/// Shown in place of sensitive values in plan output.
pub const SENSITIVE_PLACEHOLDER: &str = "(sensitive)";

/// Plan the transition from `prior` to `config`.
///
/// A `null` config plans deletion. Callers validate `config` first.
pub fn plan(schema: &Schema, prior: Option<&Value>, config: &Value) -> PlanResult {
    let prior_obj = prior.and_then(Value::as_object);

    let Some(config_obj) = config.as_object() else {
        let changes = prior_obj
            .map(|p| {
                let mut names: Vec<&String> = p.keys().collect();
                names.sort();
                names
                    .into_iter()
                    .filter(|name| !is_zero(&p[name.as_str()]))
                    .map(|name| {
                        AttributeChange::removed(
                            name.clone(),
                            mask(&schema.block, name, p[name.as_str()].clone()),
                        )
                    })
                    .collect()
            })
            .unwrap_or_default();
        return PlanResult::with_changes(Value::Null, changes, false);
    };

    let mut planned = config_obj.clone();
    for (name, attr) in &schema.block.attributes {
        let configured = planned.get(name).filter(|v| !v.is_null()).is_some();
        let carried = prior_obj.and_then(|p| p.get(name)).filter(|v| !v.is_null());

        if attr.flags.is_computed_only() {
            match carried {
                Some(value) => planned.insert(name.clone(), value.clone()),
                None => planned.remove(name),
            };
        } else if !configured {
            if let Some(default) = &attr.default {
                planned.insert(name.clone(), default.clone());
            } else if let (true, Some(value)) = (attr.flags.computed, carried) {
                planned.insert(name.clone(), value.clone());
            }
        }
    }

    let mut changes = Vec::new();
    let mut requires_replace = false;

    let mut names: Vec<&String> = schema
        .block
        .attributes
        .keys()
        .chain(schema.block.blocks.keys())
        .collect();
    names.sort();

    for name in names {
        if let Some(attr) = schema.block.attributes.get(name) {
            if attr.flags.is_computed_only() {
                continue;
            }
        }

        let before = prior_obj.and_then(|p| p.get(name));
        let after = planned.get(name);
        let (before_c, after_c) = match (
            schema.block.attributes.get(name),
            schema.block.blocks.get(name),
        ) {
            (Some(attr), _) => (
                canonical_attribute(attr, before),
                canonical_attribute(attr, after),
            ),
            (None, Some(nested)) => (canonical_block(nested, before), canonical_block(nested, after)),
            (None, None) => continue,
        };

        if before_c == after_c {
            continue;
        }

        let before_v = (!before_c.is_null()).then(|| mask(&schema.block, name, before_c));
        let after_v = (!after_c.is_null()).then(|| mask(&schema.block, name, after_c));

        if prior_obj.is_some()
            && schema
                .block
                .attributes
                .get(name)
                .is_some_and(|a| a.force_new)
        {
            requires_replace = true;
        }

        changes.push(AttributeChange::new(name.clone(), before_v, after_v));
    }

    PlanResult::with_changes(Value::Object(planned), changes, requires_replace)
}

fn mask(block: &Block, name: &str, value: Value) -> Value {
    match block.attributes.get(name) {
        Some(attr) if attr.flags.sensitive => Value::String(SENSITIVE_PLACEHOLDER.to_string()),
        _ => value,
    }
}

fn canonical_attribute(attr: &Attribute, value: Option<&Value>) -> Value {
    value.map_or(Value::Null, |v| canonical(&attr.attr_type, v))
}

/// Canonical form of a value of the given type; zero values become `null`.
///
/// Booleans stored as `"true"`/`"false"` strings read as booleans.
pub fn canonical(attr_type: &AttributeType, value: &Value) -> Value {
    if let (AttributeType::Bool, Value::String(_)) = (attr_type, value) {
        if let Some(b) = as_bool(value) {
            return canonical(attr_type, &Value::Bool(b));
        }
    }
    if is_zero(value) {
        return Value::Null;
    }

    match (attr_type, value) {
        (AttributeType::Set(element), Value::Array(items)) => {
            let mut items: Vec<Value> = items.iter().map(|v| canonical(element, v)).collect();
            items.sort_by_cached_key(Value::to_string);
            items.dedup();
            Value::Array(items)
        },
        (AttributeType::List(element), Value::Array(items)) => {
            Value::Array(items.iter().map(|v| canonical(element, v)).collect())
        },
        (AttributeType::Map(element), Value::Object(map)) => {
            let map: Map<String, Value> = map
                .iter()
                .map(|(k, v)| (k.clone(), canonical(element, v)))
                .collect();
            Value::Object(map)
        },
        _ => value.clone(),
    }
}

fn canonical_block(nested: &NestedBlock, value: Option<&Value>) -> Value {
    let items: Vec<&Value> = match value {
        Some(Value::Array(items)) => items.iter().collect(),
        Some(single) if single.is_object() => vec![single],
        _ => Vec::new(),
    };

    let mut items: Vec<Value> = items
        .into_iter()
        .filter_map(|item| item.as_object())
        .map(|obj| canonical_element(&nested.block, obj))
        .filter(|v| !is_zero(v))
        .collect();

    if items.is_empty() {
        return Value::Null;
    }

    match nested.nesting_mode {
        BlockNestingMode::Set => {
            items.sort_by_cached_key(Value::to_string);
            items.dedup();
            Value::Array(items)
        },
        BlockNestingMode::List => Value::Array(items),
        BlockNestingMode::Single => items.swap_remove(0),
    }
}

fn canonical_element(block: &Block, obj: &Map<String, Value>) -> Value {
    let mut out = Map::new();
    for (key, value) in obj {
        let value = match (block.attributes.get(key), block.blocks.get(key)) {
            (Some(attr), _) => canonical(&attr.attr_type, value),
            (None, Some(nested)) => canonical_block(nested, Some(value)),
            (None, None) => value.clone(),
        };
        if !value.is_null() {
            out.insert(key.clone(), value);
        }
    }
    Value::Object(out)
}
