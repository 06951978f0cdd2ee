//! Event-driven YAML parser that builds source-tracked node trees.

use crate::{Error, MappingEntry, Result, SourceInfo, YamlNode};
use std::collections::HashMap;
use yaml_rust2::parser::{Event, MarkedEventReceiver, Parser};
use yaml_rust2::scanner::{Marker, TScalarStyle};
use yaml_rust2::Yaml;

/// Parse YAML from a string, producing a source-tracked [`YamlNode`] tree.
///
/// Parses a single YAML document; stack manifests are one document per file.
///
/// # Errors
///
/// Returns an error if the YAML is invalid, empty, or references an unknown
/// anchor.
pub fn parse(content: &str) -> Result<YamlNode> {
    parse_impl(content, None)
}

/// Parse YAML from a string with an associated filename.
///
/// The filename is attached to the [`SourceInfo`] of every node, so errors
/// and provenance entries downstream can point at the right manifest.
///
/// # Errors
///
/// Returns an error if the YAML is invalid, empty, or references an unknown
/// anchor.
pub fn parse_file(content: &str, filename: &str) -> Result<YamlNode> {
    parse_impl(content, Some(filename))
}

fn parse_impl(content: &str, filename: Option<&str>) -> Result<YamlNode> {
    let mut parser = Parser::new_from_str(content);
    let mut builder = NodeBuilder::new(filename);

    // false = single document only
    parser.load(&mut builder, false).map_err(Error::from)?;

    builder.finish()
}

/// Builder that implements MarkedEventReceiver to construct YamlNode trees.
struct NodeBuilder {
    /// Optional filename for source info.
    filename: Option<String>,

    /// Stack of container nodes being constructed.
    stack: Vec<BuildNode>,

    /// Completed nodes registered under an anchor id, for alias resolution.
    anchors: HashMap<usize, YamlNode>,

    /// First structural error encountered during the event walk.
    ///
    /// `on_event` cannot return errors, so they are stashed here and
    /// surfaced by `finish`.
    error: Option<Error>,

    /// The completed root node.
    root: Option<YamlNode>,
}

/// A container node being constructed during parsing.
enum BuildNode {
    Sequence {
        start_marker: Marker,
        anchor_id: usize,
        items: Vec<YamlNode>,
    },
    Mapping {
        start_marker: Marker,
        anchor_id: usize,
        entries: Vec<(YamlNode, Option<YamlNode>)>,
    },
}

impl NodeBuilder {
    fn new(filename: Option<&str>) -> Self {
        Self {
            filename: filename.map(|s| s.to_string()),
            stack: Vec::new(),
            anchors: HashMap::new(),
            error: None,
            root: None,
        }
    }

    fn finish(self) -> Result<YamlNode> {
        if let Some(error) = self.error {
            return Err(error);
        }
        self.root.ok_or(Error::EmptyDocument)
    }

    fn push_complete(&mut self, node: YamlNode, anchor_id: usize) {
        if anchor_id > 0 {
            self.anchors.insert(anchor_id, node.clone());
        }

        if self.stack.is_empty() {
            self.root = Some(node);
            return;
        }

        match self.stack.last_mut().expect("stack checked non-empty") {
            BuildNode::Sequence { items, .. } => {
                items.push(node);
            }
            BuildNode::Mapping { entries, .. } => {
                match entries.last_mut() {
                    Some((_, value @ None)) => *value = Some(node),
                    // Either the first entry or the previous one is complete:
                    // this node starts a new key.
                    _ => entries.push((node, None)),
                }
            }
        }
    }

    fn source_at(&self, marker: &Marker, len: usize) -> SourceInfo {
        let mut info = SourceInfo::from_marker(marker, len);
        if let Some(ref filename) = self.filename {
            info = info.with_file(filename.clone());
        }
        info
    }
}

impl MarkedEventReceiver for NodeBuilder {
    fn on_event(&mut self, ev: Event, marker: Marker) {
        match ev {
            Event::Nothing
            | Event::StreamStart
            | Event::StreamEnd
            | Event::DocumentStart
            | Event::DocumentEnd => {}

            Event::Scalar(value, style, anchor_id, tag) => {
                let source = self.source_at(&marker, value.len());

                // Local tags (`!expr` and friends) are preserved; global
                // `!!` tags are resolved away by type inference below.
                let tag = tag.and_then(|t| {
                    if t.handle == "!" {
                        Some((t.suffix.clone(), source.clone()))
                    } else {
                        None
                    }
                });

                let yaml = if tag.is_some() {
                    // Tagged scalars keep their literal text.
                    Yaml::String(value)
                } else {
                    parse_scalar_value(value, style)
                };

                let node = YamlNode::scalar_with_tag(yaml, source, tag);
                self.push_complete(node, anchor_id);
            }

            Event::SequenceStart(anchor_id, _tag) => {
                self.stack.push(BuildNode::Sequence {
                    start_marker: marker,
                    anchor_id,
                    items: Vec::new(),
                });
            }

            Event::SequenceEnd => {
                let build_node = self.stack.pop().expect("SequenceEnd without SequenceStart");

                let BuildNode::Sequence {
                    start_marker,
                    anchor_id,
                    items,
                } = build_node
                else {
                    unreachable!("expected sequence build node");
                };

                let len = marker.index().saturating_sub(start_marker.index());
                let source = self.source_at(&start_marker, len);

                let yaml_items: Vec<Yaml> = items.iter().map(|n| n.yaml.clone()).collect();
                let node = YamlNode::sequence(Yaml::Array(yaml_items), source, items);
                self.push_complete(node, anchor_id);
            }

            Event::MappingStart(anchor_id, _tag) => {
                self.stack.push(BuildNode::Mapping {
                    start_marker: marker,
                    anchor_id,
                    entries: Vec::new(),
                });
            }

            Event::MappingEnd => {
                let build_node = self.stack.pop().expect("MappingEnd without MappingStart");

                let BuildNode::Mapping {
                    start_marker,
                    anchor_id,
                    entries,
                } = build_node
                else {
                    unreachable!("expected mapping build node");
                };

                let len = marker.index().saturating_sub(start_marker.index());
                let source = self.source_at(&start_marker, len);

                let mut tracked_entries = Vec::with_capacity(entries.len());
                let mut yaml_pairs = Vec::with_capacity(entries.len());

                for (key, value) in entries {
                    let value = value.expect("mapping entry without value");
                    yaml_pairs.push((key.yaml.clone(), value.yaml.clone()));
                    tracked_entries.push(MappingEntry::new(key, value));
                }

                let yaml = Yaml::Hash(yaml_pairs.into_iter().collect());
                let node = YamlNode::mapping(yaml, source, tracked_entries);
                self.push_complete(node, anchor_id);
            }

            Event::Alias(anchor_id) => match self.anchors.get(&anchor_id) {
                Some(anchored) => {
                    // The alias re-uses the anchored subtree but is located
                    // where the alias itself appears.
                    let mut node = anchored.clone();
                    node.source = self.source_at(&marker, 0);
                    self.push_complete(node, 0);
                }
                None => {
                    if self.error.is_none() {
                        self.error = Some(Error::UnknownAnchor {
                            location: self.source_at(&marker, 0),
                        });
                    }
                    let node = YamlNode::scalar(Yaml::Null, self.source_at(&marker, 0));
                    self.push_complete(node, 0);
                }
            },
        }
    }
}

/// Parse a scalar string into the appropriate Yaml type.
///
/// Type inference applies only to plain scalars; quoted and block scalars
/// always stay strings, so `stage: "true"` is not misread as a boolean.
fn parse_scalar_value(value: String, style: TScalarStyle) -> Yaml {
    if style != TScalarStyle::Plain {
        return Yaml::String(value);
    }

    if let Ok(i) = value.parse::<i64>() {
        return Yaml::Integer(i);
    }

    if value.parse::<f64>().is_ok() && value.chars().any(|c| c == '.' || c == 'e' || c == 'E') {
        return Yaml::Real(value);
    }

    match value.as_str() {
        "true" | "True" | "TRUE" => return Yaml::Boolean(true),
        "false" | "False" | "FALSE" => return Yaml::Boolean(false),
        "null" | "Null" | "NULL" | "~" | "" => return Yaml::Null,
        _ => {}
    }

    Yaml::String(value)
}
