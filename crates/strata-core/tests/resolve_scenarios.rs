/*
 * resolve_scenarios.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! End-to-end resolution scenarios over assembled stacks.

use std::fs;
use strata_core::{
    Cancellation, ConfigDocument, ResolveError, ResolveOptions, ResolveRequest, ResolvedComponent,
    Resolver, StackConfig, Value,
};
use strata_yaml::parse_file;
use tempfile::TempDir;

fn document(relative: &str, content: &str) -> ConfigDocument {
    ConfigDocument::new(
        std::path::PathBuf::from(relative),
        relative,
        parse_file(content, relative).unwrap(),
    )
}

fn stack(documents: &[(&str, &str)]) -> StackConfig {
    let documents: Vec<ConfigDocument> = documents
        .iter()
        .map(|(relative, content)| document(relative, content))
        .collect();
    StackConfig::from_documents("prod", &documents).unwrap()
}

fn resolve(stack: &StackConfig, component: &str) -> ResolvedComponent {
    Resolver::new()
        .resolve(stack, &ResolveRequest::new(component, "terraform"))
        .unwrap()
}

const CATALOG_VPC: &str = r#"
components:
  terraform:
    vpc-defaults:
      metadata:
        type: abstract
        custom:
          owner: teamA
      vars:
        nat_gateway_enabled: false
        availability_zones:
          - us-east-2a
          - us-east-2b
          - us-east-2c
        tags:
          Team: Platform
"#;

const STACK_VPC: &str = r#"
components:
  terraform:
    vpc:
      metadata:
        inherits:
          - vpc-defaults
      vars:
        nat_gateway_enabled: true
        availability_zones:
          - us-east-2a
          - us-east-2b
        tags:
          Environment: Prod
"#;

#[test]
fn derived_value_overrides_catalog_default() {
    let stack = stack(&[("catalog/vpc.yaml", CATALOG_VPC), ("prod.yaml", STACK_VPC)]);
    let vpc = resolve(&stack, "vpc");

    let nat = vpc.config.get_path(&["vars", "nat_gateway_enabled"]).unwrap();
    assert_eq!(nat.value, Value::Bool(true));
}

#[test]
fn lists_replace_wholly() {
    let stack = stack(&[("catalog/vpc.yaml", CATALOG_VPC), ("prod.yaml", STACK_VPC)]);
    let vpc = resolve(&stack, "vpc");

    let zones = vpc
        .config
        .get_path(&["vars", "availability_zones"])
        .unwrap()
        .as_list()
        .unwrap();
    let names: Vec<_> = zones.iter().filter_map(|z| z.value.as_str()).collect();
    assert_eq!(names, vec!["us-east-2a", "us-east-2b"]);
}

#[test]
fn maps_merge_deeply() {
    let stack = stack(&[("catalog/vpc.yaml", CATALOG_VPC), ("prod.yaml", STACK_VPC)]);
    let vpc = resolve(&stack, "vpc");

    let tags = vpc.config.get_path(&["vars", "tags"]).unwrap();
    assert_eq!(tags.get("Team").unwrap().value.as_str(), Some("Platform"));
    assert_eq!(tags.get("Environment").unwrap().value.as_str(), Some("Prod"));
}

#[test]
fn abstract_type_and_custom_do_not_propagate() {
    let stack = stack(&[("catalog/vpc.yaml", CATALOG_VPC), ("prod.yaml", STACK_VPC)]);
    let vpc = resolve(&stack, "vpc");

    assert!(!vpc.is_abstract());
    let metadata = vpc.metadata().unwrap();
    assert!(metadata.get("custom").is_none());

    // The abstract base itself still surfaces its type for consumers.
    let base = resolve(&stack, "vpc-defaults");
    assert!(base.is_abstract());
}

#[test]
fn inherits_order_decides_precedence() {
    let bases = r#"
components:
  terraform:
    a:
      vars:
        size: small
    b:
      vars:
        size: large
    ab:
      metadata:
        inherits: [a, b]
    ba:
      metadata:
        inherits: [b, a]
"#;
    let stack = stack(&[("prod.yaml", bases)]);

    let ab = resolve(&stack, "ab");
    let ba = resolve(&stack, "ba");

    // The later inherits entry wins.
    assert_eq!(ab.config.get_path(&["vars", "size"]).unwrap().value.as_str(), Some("large"));
    assert_eq!(ba.config.get_path(&["vars", "size"]).unwrap().value.as_str(), Some("small"));
}

#[test]
fn diamond_linearizes_once_and_stably() {
    let diamond = r#"
components:
  terraform:
    a:
      vars:
        from_a: true
    b:
      metadata:
        inherits: [a]
    c:
      metadata:
        inherits: [a]
    d:
      metadata:
        inherits: [b, c]
"#;
    let stack = stack(&[("prod.yaml", diamond)]);

    let first = resolve(&stack, "d");
    assert_eq!(
        first.inheritance,
        vec!["c".to_string(), "b".to_string(), "a".to_string()]
    );
    assert_eq!(
        first.config.get_path(&["vars", "from_a"]).unwrap().value,
        Value::Bool(true)
    );

    for _ in 0..5 {
        assert_eq!(resolve(&stack, "d").inheritance, first.inheritance);
    }
}

#[test]
fn unrelated_hooks_stay_isolated() {
    let hooks = r#"
components:
  terraform:
    vpc:
      hooks:
        store-outputs:
          command: store
          outputs:
            vpc_id: ".id"
    eks:
      hooks:
        store-outputs:
          command: store
          outputs:
            cluster_name: ".name"
"#;
    let stack = stack(&[("prod.yaml", hooks)]);

    let vpc_outputs = resolve(&stack, "vpc");
    let vpc_outputs = vpc_outputs
        .hooks()
        .unwrap()
        .get_path(&["store-outputs", "outputs"])
        .unwrap()
        .as_map()
        .unwrap();
    assert!(vpc_outputs.contains_key("vpc_id"));
    assert!(!vpc_outputs.contains_key("cluster_name"));

    let eks_outputs = resolve(&stack, "eks");
    let eks_outputs = eks_outputs
        .hooks()
        .unwrap()
        .get_path(&["store-outputs", "outputs"])
        .unwrap()
        .as_map()
        .unwrap();
    assert!(eks_outputs.contains_key("cluster_name"));
    assert!(!eks_outputs.contains_key("vpc_id"));
}

#[test]
fn global_and_type_layers_sit_under_component() {
    let layered = r#"
vars:
  region: us-east-2
  stage: dev
terraform:
  vars:
    stage: staging
  command: terraform
components:
  terraform:
    vpc:
      vars:
        stage: prod
      command: tofu
"#;
    let stack = stack(&[("prod.yaml", layered)]);
    let vpc = resolve(&stack, "vpc");

    assert_eq!(vpc.config.get_path(&["vars", "region"]).unwrap().value.as_str(), Some("us-east-2"));
    assert_eq!(vpc.config.get_path(&["vars", "stage"]).unwrap().value.as_str(), Some("prod"));
    assert_eq!(vpc.config.get("command").unwrap().value.as_str(), Some("tofu"));
}

#[test]
fn overrides_win_over_inline_sections() {
    let overridden = r#"
overrides:
  vars:
    audited: true
terraform:
  overrides:
    vars:
      team_forced: platform
components:
  terraform:
    vpc:
      vars:
        audited: false
        stage: prod
      overrides:
        vars:
          stage: frozen
"#;
    let stack = stack(&[("prod.yaml", overridden)]);
    let vpc = resolve(&stack, "vpc");

    assert_eq!(vpc.config.get_path(&["vars", "audited"]).unwrap().value, Value::Bool(true));
    assert_eq!(vpc.config.get_path(&["vars", "team_forced"]).unwrap().value.as_str(), Some("platform"));
    assert_eq!(vpc.config.get_path(&["vars", "stage"]).unwrap().value.as_str(), Some("frozen"));
}

#[test]
fn backend_resolution_and_s3_defaulting() {
    let backend = r#"
terraform:
  backend_type: s3
  backend:
    s3:
      bucket: acme-tfstate
      region: us-east-2
components:
  terraform:
    vpc:
      metadata:
        component: networking/vpc
"#;
    let stack = stack(&[("prod.yaml", backend)]);
    let vpc = resolve(&stack, "vpc");

    assert_eq!(vpc.backend_type(), Some("s3"));
    let backend = vpc.backend().unwrap();
    assert_eq!(backend.get("bucket").unwrap().value.as_str(), Some("acme-tfstate"));
    assert_eq!(
        backend.get("workspace_key_prefix").unwrap().value.as_str(),
        Some("networking-vpc")
    );

    assert_eq!(vpc.config.get("component").unwrap().value.as_str(), Some("networking/vpc"));
}

#[test]
fn deferred_expressions_evaluate_after_merging() {
    let expressions = r#"
components:
  terraform:
    base:
      metadata:
        type: abstract
      vars:
        bucket: "{{ .vars.stage }}-state"
    app:
      metadata:
        inherits: [base]
      vars:
        stage: prod
    pinned:
      metadata:
        inherits: [base]
      vars:
        stage: prod
        bucket: pinned-bucket
"#;
    let stack = stack(&[("prod.yaml", expressions)]);

    // The base's expression sees the derived component's merged vars.
    let app = resolve(&stack, "app");
    assert_eq!(app.config.get_path(&["vars", "bucket"]).unwrap().value.as_str(), Some("prod-state"));

    // A higher layer fully overrides a lower layer's expression.
    let pinned = resolve(&stack, "pinned");
    assert_eq!(
        pinned.config.get_path(&["vars", "bucket"]).unwrap().value.as_str(),
        Some("pinned-bucket")
    );
}

#[test]
fn metadata_toggle_disables_inheritance_but_chain_still_works() {
    let named = r#"
components:
  terraform:
    base:
      metadata:
        name: vpc
        workspace_pattern: "prod-vpc"
      vars:
        enabled: true
    derived:
      metadata:
        inherits: [base]
"#;
    let stack = stack(&[("prod.yaml", named)]);

    let with_inheritance = resolve(&stack, "derived");
    assert_eq!(
        with_inheritance.metadata().unwrap().get("name").unwrap().value.as_str(),
        Some("vpc")
    );

    let resolver = Resolver::with_options(ResolveOptions {
        inherit_metadata: false,
    });
    let without = resolver
        .resolve(&stack, &ResolveRequest::new("derived", "terraform"))
        .unwrap();

    // Metadata stays component-local, but the chain was still honored.
    assert!(without.metadata().unwrap().get("name").is_none());
    assert_eq!(without.inheritance, vec!["base".to_string()]);
    assert_eq!(
        without.config.get_path(&["vars", "enabled"]).unwrap().value,
        Value::Bool(true)
    );
}

#[test]
fn missing_inherits_target_fails() {
    let broken = r#"
components:
  terraform:
    vpc:
      metadata:
        inherits: [ghost]
"#;
    let stack = stack(&[("prod.yaml", broken)]);
    let err = Resolver::new()
        .resolve(&stack, &ResolveRequest::new("vpc", "terraform"))
        .unwrap_err();

    assert!(matches!(
        err,
        ResolveError::ComponentNotFound { component, .. } if component == "ghost"
    ));
}

fn leaf_paths(value: &strata_core::ConfigValue, prefix: String, out: &mut Vec<(String, Option<String>)>) {
    match &value.value {
        Value::Map(entries) => {
            for (key, child) in entries {
                let path = if prefix.is_empty() {
                    key.clone()
                } else {
                    format!("{prefix}.{key}")
                };
                leaf_paths(child, path, out);
            }
        }
        Value::List(items) => {
            for (index, item) in items.iter().enumerate() {
                leaf_paths(item, format!("{prefix}[{index}]"), out);
            }
        }
        _ => out.push((prefix, value.source.file.clone())),
    }
}

#[test]
fn provenance_covers_every_leaf() {
    let stack = stack(&[("catalog/vpc.yaml", CATALOG_VPC), ("prod.yaml", STACK_VPC)]);
    let resolver = Resolver::new();
    let vpc = resolver
        .resolve(&stack, &ResolveRequest::new("vpc", "terraform").with_provenance())
        .unwrap();

    let provenance = vpc.provenance.as_ref().unwrap();

    let mut leaves = Vec::new();
    leaf_paths(&vpc.config, String::new(), &mut leaves);
    assert!(!leaves.is_empty());

    for (path, file) in leaves {
        let chain = provenance
            .chain(&path)
            .unwrap_or_else(|| panic!("no provenance for '{path}'"));
        assert!(!chain.is_empty());

        let last = chain.last().unwrap();
        assert_eq!(last.file, file, "final provenance entry for '{path}' names the wrong file");
    }

    // Override chains record the base-most contribution first.
    let nat_chain = provenance.chain("vars.nat_gateway_enabled").unwrap();
    assert_eq!(nat_chain.len(), 2);
    assert_eq!(nat_chain[0].file.as_deref(), Some("catalog/vpc.yaml"));
    assert_eq!(nat_chain[1].file.as_deref(), Some("prod.yaml"));
}

#[test]
fn resolution_is_idempotent() {
    let stack = stack(&[("catalog/vpc.yaml", CATALOG_VPC), ("prod.yaml", STACK_VPC)]);
    let resolver = Resolver::new();
    let request = ResolveRequest::new("vpc", "terraform").with_provenance();

    let first = resolver.resolve(&stack, &request).unwrap();
    let second = resolver.resolve(&stack, &request).unwrap();

    assert_eq!(
        serde_json::to_string(&first.config).unwrap(),
        serde_json::to_string(&second.config).unwrap()
    );
    assert_eq!(
        serde_json::to_string(&first.provenance).unwrap(),
        serde_json::to_string(&second.provenance).unwrap()
    );
}

#[test]
fn cache_memoizes_ancestors_and_provenance_bypasses_it() {
    let stack = stack(&[("catalog/vpc.yaml", CATALOG_VPC), ("prod.yaml", STACK_VPC)]);

    let resolver = Resolver::new();
    resolver
        .resolve(&stack, &ResolveRequest::new("vpc", "terraform"))
        .unwrap();
    assert_eq!(resolver.cache().len(), 1);
    assert!(resolver.cache().get("prod:vpc:vpc-defaults").is_some());

    let tracked = Resolver::new();
    tracked
        .resolve(&stack, &ResolveRequest::new("vpc", "terraform").with_provenance())
        .unwrap();
    assert!(tracked.cache().is_empty());
}

#[test]
fn failure_does_not_corrupt_cache() {
    let manifests = r#"
components:
  terraform:
    base:
      metadata:
        type: abstract
      vars:
        bucket: "{{ .vars.prefix }}-state"
    broken:
      metadata:
        inherits: [base]
    working:
      metadata:
        inherits: [base]
      vars:
        prefix: acme
"#;
    let stack = stack(&[("prod.yaml", manifests)]);
    let resolver = Resolver::new();

    let err = resolver
        .resolve(&stack, &ResolveRequest::new("broken", "terraform"))
        .unwrap_err();
    assert!(matches!(err, ResolveError::Expression { .. }));

    // The failure left no broken state behind; a sibling sharing the same
    // base resolves through the same resolver and cache.
    let working = resolver
        .resolve(&stack, &ResolveRequest::new("working", "terraform"))
        .unwrap();
    assert_eq!(
        working.config.get_path(&["vars", "bucket"]).unwrap().value.as_str(),
        Some("acme-state")
    );
}

#[test]
fn resolve_all_is_ordered_and_cancellable() {
    let many = r#"
components:
  terraform:
    vpc: {}
    eks: {}
    rds: {}
"#;
    let stack = stack(&[("prod.yaml", many)]);
    let resolver = Resolver::new();

    let all = resolver
        .resolve_all(&stack, false, &Cancellation::new())
        .unwrap();
    let names: Vec<_> = all.iter().map(|r| r.component.as_str()).collect();
    assert_eq!(names, vec!["eks", "rds", "vpc"]);

    let cancelled = Cancellation::new();
    cancelled.cancel();
    assert!(matches!(
        resolver.resolve_all(&stack, false, &cancelled),
        Err(ResolveError::Cancelled)
    ));
}

#[test]
fn full_stack_load_from_disk() {
    let dir = TempDir::new().unwrap();

    let write = |relative: &str, content: &str| {
        let path = dir.path().join(relative);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    };

    write("catalog/vpc.yaml", CATALOG_VPC);
    write(
        "mixins/region/us-east-2.yaml",
        "vars:\n  region: us-east-2\n",
    );
    write(
        "orgs/acme/prod.yaml",
        r#"
import:
  - catalog/vpc
  - mixins/region/us-east-2
components:
  terraform:
    vpc:
      metadata:
        inherits:
          - vpc-defaults
      vars:
        nat_gateway_enabled: true
"#,
    );

    let stack = StackConfig::load(dir.path(), "orgs/acme/prod.yaml").unwrap();
    assert_eq!(stack.name(), "orgs/acme/prod");

    let vpc = Resolver::new()
        .resolve(&stack, &ResolveRequest::new("vpc", "terraform"))
        .unwrap();

    assert_eq!(vpc.config.get_path(&["vars", "region"]).unwrap().value.as_str(), Some("us-east-2"));
    assert_eq!(vpc.config.get_path(&["vars", "nat_gateway_enabled"]).unwrap().value, Value::Bool(true));
    assert_eq!(vpc.config.get_path(&["vars", "tags", "Team"]).unwrap().value.as_str(), Some("Platform"));
}
