//! YAML value with source location tracking.

use crate::SourceInfo;
use yaml_rust2::Yaml;

/// A YAML value with source location information.
///
/// Wraps an owned `yaml-rust2::Yaml` value with a parallel children structure
/// that carries a [`SourceInfo`] for every node. The `yaml` field is a
/// complete, independent tree for code that does not need source tracking;
/// the children mirror its structure with positions attached.
#[derive(Debug, Clone)]
pub struct YamlNode {
    /// The complete yaml-rust2 value (owned).
    pub yaml: Yaml,

    /// Source location for this node.
    pub source: SourceInfo,

    /// YAML tag suffix (e.g. `expr` for `!expr`) and the tag's own location.
    pub tag: Option<(String, SourceInfo)>,

    /// Source-tracked children (parallel structure).
    children: Children,
}

/// Source-tracked children of a YAML node.
#[derive(Debug, Clone)]
enum Children {
    /// No children (scalars, Null, BadValue).
    None,

    /// Sequence elements with source tracking.
    Sequence(Vec<YamlNode>),

    /// Mapping entries with source tracking.
    Mapping(Vec<MappingEntry>),
}

/// A key-value pair in a YAML mapping with source tracking.
#[derive(Debug, Clone)]
pub struct MappingEntry {
    /// The key with source tracking.
    pub key: YamlNode,

    /// The value with source tracking.
    pub value: YamlNode,
}

impl YamlNode {
    /// Create a node for a scalar or leaf value.
    pub fn scalar(yaml: Yaml, source: SourceInfo) -> Self {
        Self {
            yaml,
            source,
            tag: None,
            children: Children::None,
        }
    }

    /// Create a node for a scalar with tag information.
    pub fn scalar_with_tag(yaml: Yaml, source: SourceInfo, tag: Option<(String, SourceInfo)>) -> Self {
        Self {
            yaml,
            source,
            tag,
            children: Children::None,
        }
    }

    /// Create a node for a sequence.
    pub fn sequence(yaml: Yaml, source: SourceInfo, items: Vec<YamlNode>) -> Self {
        Self {
            yaml,
            source,
            tag: None,
            children: Children::Sequence(items),
        }
    }

    /// Create a node for a mapping.
    pub fn mapping(yaml: Yaml, source: SourceInfo, entries: Vec<MappingEntry>) -> Self {
        Self {
            yaml,
            source,
            tag: None,
            children: Children::Mapping(entries),
        }
    }

    /// Check if this is a scalar value (not sequence or mapping).
    pub fn is_scalar(&self) -> bool {
        matches!(self.children, Children::None)
    }

    /// Check if this is a sequence.
    pub fn is_sequence(&self) -> bool {
        matches!(self.children, Children::Sequence(_))
    }

    /// Check if this is a mapping.
    pub fn is_mapping(&self) -> bool {
        matches!(self.children, Children::Mapping(_))
    }

    /// Get sequence elements if this is a sequence.
    pub fn as_sequence(&self) -> Option<&[YamlNode]> {
        match &self.children {
            Children::Sequence(items) => Some(items),
            _ => None,
        }
    }

    /// Get mapping entries if this is a mapping.
    pub fn as_mapping(&self) -> Option<&[MappingEntry]> {
        match &self.children {
            Children::Mapping(entries) => Some(entries),
            _ => None,
        }
    }

    /// Get a mapping value by string key.
    ///
    /// Returns None if this is not a mapping or the key is not present.
    pub fn get(&self, key: &str) -> Option<&YamlNode> {
        match &self.children {
            Children::Mapping(entries) => entries.iter().find_map(|entry| {
                if entry.key.yaml.as_str() == Some(key) {
                    Some(&entry.value)
                } else {
                    None
                }
            }),
            _ => None,
        }
    }

    /// Get a sequence element by index.
    pub fn get_item(&self, index: usize) -> Option<&YamlNode> {
        match &self.children {
            Children::Sequence(items) => items.get(index),
            _ => None,
        }
    }

    /// Number of children (sequence length or mapping entry count).
    pub fn len(&self) -> usize {
        match &self.children {
            Children::None => 0,
            Children::Sequence(items) => items.len(),
            Children::Mapping(entries) => entries.len(),
        }
    }

    /// Check if this node has no children.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl MappingEntry {
    /// Create a new mapping entry.
    pub fn new(key: YamlNode, value: YamlNode) -> Self {
        Self { key, value }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scalar(s: &str) -> YamlNode {
        YamlNode::scalar(Yaml::String(s.into()), SourceInfo::default())
    }

    #[test]
    fn test_scalar_node() {
        let node = scalar("test");
        assert!(node.is_scalar());
        assert!(!node.is_sequence());
        assert!(!node.is_mapping());
        assert_eq!(node.len(), 0);
        assert!(node.is_empty());
    }

    #[test]
    fn test_sequence_node() {
        let yaml = Yaml::Array(vec![Yaml::String("a".into()), Yaml::String("b".into())]);
        let node = YamlNode::sequence(yaml, SourceInfo::default(), vec![scalar("a"), scalar("b")]);

        assert!(node.is_sequence());
        assert_eq!(node.len(), 2);
        assert_eq!(node.get_item(0).unwrap().yaml.as_str(), Some("a"));
        assert_eq!(node.get_item(1).unwrap().yaml.as_str(), Some("b"));
        assert!(node.get_item(2).is_none());
    }

    #[test]
    fn test_mapping_lookup() {
        let yaml = Yaml::Hash(
            vec![(Yaml::String("stage".into()), Yaml::String("prod".into()))]
                .into_iter()
                .collect(),
        );
        let entry = MappingEntry::new(scalar("stage"), scalar("prod"));
        let node = YamlNode::mapping(yaml, SourceInfo::default(), vec![entry]);

        assert!(node.is_mapping());
        assert_eq!(node.get("stage").unwrap().yaml.as_str(), Some("prod"));
        assert!(node.get("missing").is_none());
    }
}
