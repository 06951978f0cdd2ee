//! Conversion from parsed YAML nodes into configuration values.

use crate::types::{ConfigValue, Value};
use indexmap::IndexMap;
use strata_yaml::YamlNode;
use yaml_rust2::Yaml;

/// Check whether a string scalar embeds template expression syntax.
///
/// Strings carrying `{{ ... }}` are kept as opaque [`Value::Expression`]
/// nodes through the merge and only evaluated once all layers are combined.
pub fn is_expression_str(s: &str) -> bool {
    s.contains("{{")
}

/// Convert a source-tracked YAML node into a [`ConfigValue`] tree.
///
/// Every node keeps its source location. Scalars tagged `!expr` and strings
/// containing `{{ ... }}` become unevaluated expressions.
pub fn config_value_from_yaml(node: &YamlNode) -> ConfigValue {
    if let Some(entries) = node.as_mapping() {
        let mut map = IndexMap::with_capacity(entries.len());
        for entry in entries {
            // Later duplicates of a key win, matching plain YAML loaders.
            map.insert(yaml_key_string(&entry.key.yaml), config_value_from_yaml(&entry.value));
        }
        return ConfigValue::map(map, node.source.clone());
    }

    if let Some(items) = node.as_sequence() {
        let list = items.iter().map(config_value_from_yaml).collect();
        return ConfigValue::list(list, node.source.clone());
    }

    let value = match &node.yaml {
        Yaml::String(s) => {
            let is_expr_tag = node.tag.as_ref().is_some_and(|(suffix, _)| suffix == "expr");
            if is_expr_tag || is_expression_str(s) {
                Value::Expression(s.clone())
            } else {
                Value::String(s.clone())
            }
        }
        Yaml::Integer(i) => Value::Int(*i),
        Yaml::Real(r) => match r.parse::<f64>() {
            Ok(f) => Value::Float(f),
            Err(_) => Value::String(r.clone()),
        },
        Yaml::Boolean(b) => Value::Bool(*b),
        Yaml::Null | Yaml::BadValue => Value::Null,
        // Aliases are resolved by the parser; arrays and hashes are handled
        // through the tracked children above.
        _ => Value::Null,
    };

    ConfigValue::new(value, node.source.clone())
}

/// Render a YAML mapping key as a string.
///
/// Stack manifests use string keys almost exclusively, but numeric and
/// boolean keys are valid YAML and must not be lost.
fn yaml_key_string(key: &Yaml) -> String {
    match key {
        Yaml::String(s) => s.clone(),
        Yaml::Integer(i) => i.to_string(),
        Yaml::Real(r) => r.clone(),
        Yaml::Boolean(b) => b.to_string(),
        Yaml::Null => "~".to_string(),
        other => format!("{:?}", other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strata_yaml::parse_file;

    fn convert(content: &str) -> ConfigValue {
        config_value_from_yaml(&parse_file(content, "stack.yaml").unwrap())
    }

    #[test]
    fn test_scalar_types() {
        let root = convert("enabled: true\nreplicas: 3\nratio: 0.5\nstage: prod\nempty: null");
        assert_eq!(root.get("enabled").unwrap().value, Value::Bool(true));
        assert_eq!(root.get("replicas").unwrap().value, Value::Int(3));
        assert_eq!(root.get("ratio").unwrap().value, Value::Float(0.5));
        assert_eq!(root.get("stage").unwrap().value.as_str(), Some("prod"));
        assert!(root.get("empty").unwrap().is_null());
    }

    #[test]
    fn test_expression_detection() {
        let root = convert("bucket: \"{{ .vars.stage }}-state\"");
        let bucket = root.get("bucket").unwrap();
        assert!(bucket.is_expression());
        assert_eq!(bucket.value, Value::Expression("{{ .vars.stage }}-state".into()));
    }

    #[test]
    fn test_expr_tag_detection() {
        let root = convert("name: !expr \"vpc\"");
        assert!(root.get("name").unwrap().is_expression());
    }

    #[test]
    fn test_nested_structures() {
        let root = convert("vars:\n  tags:\n    Team: Platform\n  zones:\n    - a\n    - b");
        let tags = root.get_path(&["vars", "tags"]).unwrap();
        assert!(tags.is_map());

        let zones = root.get_path(&["vars", "zones"]).unwrap();
        assert_eq!(zones.as_list().unwrap().len(), 2);
    }

    #[test]
    fn test_source_preserved() {
        let root = convert("vars:\n  stage: prod");
        let stage = root.get_path(&["vars", "stage"]).unwrap();
        assert_eq!(stage.source.file.as_deref(), Some("stack.yaml"));
    }

    #[test]
    fn test_non_string_keys() {
        let root = convert("80: http\n443: https");
        assert_eq!(root.get("80").unwrap().value.as_str(), Some("http"));
        assert_eq!(root.get("443").unwrap().value.as_str(), Some("https"));
    }
}
