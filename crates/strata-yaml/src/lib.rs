//! # strata-yaml
//!
//! YAML parsing with source location tracking for stack manifests.
//!
//! This crate provides [`YamlNode`], which wraps `yaml-rust2::Yaml` with
//! source location information for every node in the tree. Downstream crates
//! rely on those positions for merge-conflict attribution and per-value
//! provenance, so the parser never discards them.
//!
//! ## Design
//!
//! Uses the **owned data approach**: wraps owned `Yaml` values with a parallel
//! children structure for source tracking. Trade-off: extra memory for
//! simplicity and the ability to move parsed trees across merge layers with
//! different lifetimes.
//!
//! Differences from a plain `yaml-rust2` load:
//!
//! - every scalar, sequence and mapping carries a [`SourceInfo`];
//! - anchors/aliases are resolved during the event walk (stack manifests use
//!   them heavily for shared defaults);
//! - scalar type inference respects the scalar style, so `"true"` stays a
//!   string while `true` becomes a boolean.
//!
//! ## Example
//!
//! ```rust
//! use strata_yaml::parse_file;
//!
//! let doc = parse_file("vars:\n  stage: prod\n", "catalog/vpc.yaml").unwrap();
//! let stage = doc.get("vars").and_then(|v| v.get("stage")).unwrap();
//! assert_eq!(stage.yaml.as_str(), Some("prod"));
//! assert_eq!(stage.source.file.as_deref(), Some("catalog/vpc.yaml"));
//! ```

mod error;
mod node;
mod parser;
mod source_info;

pub use error::{Error, Result};
pub use node::{MappingEntry, YamlNode};
pub use parser::{parse, parse_file};
pub use source_info::SourceInfo;
