//! Core type definitions for configuration merging.

use indexmap::IndexMap;
use serde::ser::{Serialize, SerializeMap, SerializeSeq, Serializer};
use strata_yaml::SourceInfo;

/// Which precedence tier a merge layer came from.
///
/// Recorded in provenance entries so a resolved value can be explained as
/// "set globally, overridden by an ancestor, finalized by the component".
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LayerKind {
    /// Assembly of imported documents into one stack view.
    Import,

    /// Stack-root global sections (`vars`, `settings`, `env`, ...).
    Global,

    /// Component-type-level defaults (the `terraform:` section and friends).
    TypeDefaults,

    /// A linearized ancestor's own configuration.
    Ancestor,

    /// The component's own inline sections.
    Component,

    /// The `overrides` layer (stack-scoped and component-scoped).
    Overrides,
}

impl LayerKind {
    /// Short name used in rendered provenance.
    pub fn as_str(&self) -> &'static str {
        match self {
            LayerKind::Import => "import",
            LayerKind::Global => "global",
            LayerKind::TypeDefaults => "type_defaults",
            LayerKind::Ancestor => "ancestor",
            LayerKind::Component => "component",
            LayerKind::Overrides => "overrides",
        }
    }
}

/// A configuration tree node.
///
/// The merge engine pattern-matches on this structurally instead of relying
/// on runtime type assertions. [`Value::Expression`] holds an embedded
/// template expression verbatim; it merges as an opaque leaf and is only
/// evaluated after all layers are combined.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),

    /// An unevaluated embedded expression, kept verbatim.
    Expression(String),

    List(Vec<ConfigValue>),
    Map(IndexMap<String, ConfigValue>),
}

impl Value {
    /// Structural kind name, used in merge-conflict messages.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "bool",
            Value::Int(_) => "int",
            Value::Float(_) => "float",
            Value::String(_) => "string",
            Value::Expression(_) => "expression",
            Value::List(_) => "list",
            Value::Map(_) => "map",
        }
    }

    /// Parse an evaluated expression result back into a typed scalar.
    ///
    /// Follows the same plain-scalar inference the YAML parser uses, so a
    /// deferred expression producing `"true"` behaves like the literal.
    pub fn from_scalar_str(s: &str) -> Value {
        if let Ok(i) = s.parse::<i64>() {
            return Value::Int(i);
        }
        if s.contains('.') {
            if let Ok(f) = s.parse::<f64>() {
                return Value::Float(f);
            }
        }
        match s {
            "true" => Value::Bool(true),
            "false" => Value::Bool(false),
            "null" | "~" | "" => Value::Null,
            _ => Value::String(s.to_string()),
        }
    }

    /// Get as a string slice if this is a string.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    /// Get as a bool if this is a bool.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Get as an i64 if this is an integer.
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(*i),
            _ => None,
        }
    }
}

/// A configuration value with its source location.
#[derive(Debug, Clone, PartialEq)]
pub struct ConfigValue {
    /// The underlying value.
    pub value: Value,

    /// Source location for this value.
    pub source: SourceInfo,
}

impl ConfigValue {
    /// Create a new ConfigValue.
    pub fn new(value: Value, source: SourceInfo) -> Self {
        Self { value, source }
    }

    /// Create a null ConfigValue.
    pub fn null(source: SourceInfo) -> Self {
        Self::new(Value::Null, source)
    }

    /// Create a string ConfigValue.
    pub fn string(s: impl Into<String>, source: SourceInfo) -> Self {
        Self::new(Value::String(s.into()), source)
    }

    /// Create an empty map ConfigValue.
    pub fn empty_map(source: SourceInfo) -> Self {
        Self::new(Value::Map(IndexMap::new()), source)
    }

    /// Create a map ConfigValue from entries.
    pub fn map(entries: IndexMap<String, ConfigValue>, source: SourceInfo) -> Self {
        Self::new(Value::Map(entries), source)
    }

    /// Create a list ConfigValue from items.
    pub fn list(items: Vec<ConfigValue>, source: SourceInfo) -> Self {
        Self::new(Value::List(items), source)
    }

    /// Check if this is a map.
    pub fn is_map(&self) -> bool {
        matches!(self.value, Value::Map(_))
    }

    /// Check if this is a list.
    pub fn is_list(&self) -> bool {
        matches!(self.value, Value::List(_))
    }

    /// Check if this is null.
    pub fn is_null(&self) -> bool {
        matches!(self.value, Value::Null)
    }

    /// Check if this is an unevaluated expression.
    pub fn is_expression(&self) -> bool {
        matches!(self.value, Value::Expression(_))
    }

    /// Get map entries if this is a map.
    pub fn as_map(&self) -> Option<&IndexMap<String, ConfigValue>> {
        match &self.value {
            Value::Map(entries) => Some(entries),
            _ => None,
        }
    }

    /// Get mutable map entries if this is a map.
    pub fn as_map_mut(&mut self) -> Option<&mut IndexMap<String, ConfigValue>> {
        match &mut self.value {
            Value::Map(entries) => Some(entries),
            _ => None,
        }
    }

    /// Get list items if this is a list.
    pub fn as_list(&self) -> Option<&[ConfigValue]> {
        match &self.value {
            Value::List(items) => Some(items),
            _ => None,
        }
    }

    /// Get a map value by key.
    pub fn get(&self, key: &str) -> Option<&ConfigValue> {
        self.as_map().and_then(|m| m.get(key))
    }

    /// Navigate a path of map keys.
    pub fn get_path(&self, path: &[&str]) -> Option<&ConfigValue> {
        let mut current = self;
        for key in path {
            current = current.get(key)?;
        }
        Some(current)
    }
}

// Serialization emits the plain value shape; source locations are carried
// separately by the provenance map.
impl Serialize for ConfigValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.value.serialize(serializer)
    }
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Value::Null => serializer.serialize_unit(),
            Value::Bool(b) => serializer.serialize_bool(*b),
            Value::Int(i) => serializer.serialize_i64(*i),
            Value::Float(f) => serializer.serialize_f64(*f),
            Value::String(s) | Value::Expression(s) => serializer.serialize_str(s),
            Value::List(items) => {
                let mut seq = serializer.serialize_seq(Some(items.len()))?;
                for item in items {
                    seq.serialize_element(item)?;
                }
                seq.end()
            }
            Value::Map(entries) => {
                let mut map = serializer.serialize_map(Some(entries.len()))?;
                for (key, value) in entries {
                    map.serialize_entry(key, value)?;
                }
                map.end()
            }
        }
    }
}
