//! Property-based tests for core domain logic.
//!
//! These tests use proptest to verify invariants hold across
//! randomly generated inputs.

use std::collections::{BTreeMap, BTreeSet};
use std::fs;

use proptest::prelude::*;

use multilock::core::dependency::{Dependency, ParsedLine, PinPolicy};
use multilock::core::graph::EnvGraph;
use multilock::core::types::EnvName;
use multilock::engine::environment::split_header;
use multilock::engine::staleness::fingerprint_tag;

fn package_name() -> impl Strategy<Value = String> {
    "[a-z][a-z0-9-]{0,20}"
}

fn version() -> impl Strategy<Value = String> {
    // Plain release with an optional post-release suffix.
    ("[0-9]{1,2}(\\.[0-9]{1,3}){0,3}", prop::option::of(0u8..20)).prop_map(|(release, post)| {
        match post {
            Some(n) => format!("{release}.post{n}"),
            None => release,
        }
    })
}

fn env_name() -> impl Strategy<Value = String> {
    "[a-z][a-z0-9-]{0,10}"
}

proptest! {
    #[test]
    fn drop_post_is_idempotent(package in package_name(), ver in version()) {
        let policy = PinPolicy::default();
        let env = EnvName::new("base").unwrap();
        let ParsedLine::Pin(mut dep) = Dependency::parse(&format!("{package}=={ver}")) else {
            panic!("generated pin failed to parse");
        };
        dep.drop_post(&policy, &env);
        let once = dep.version.clone();
        dep.drop_post(&policy, &env);
        prop_assert_eq!(&dep.version, &once);
        prop_assert!(!once.contains(".post"));
    }

    #[test]
    fn parse_serialize_identity(package in package_name(), ver in version(), internal in any::<bool>()) {
        let patterns = if internal { vec![package.clone()] } else { vec![] };
        let policy = PinPolicy::new(&patterns, []).unwrap();
        let dep = Dependency {
            package: package.clone(),
            version: ver.clone(),
            comment: "# via something".to_string(),
        };
        let ParsedLine::Pin(reparsed) = Dependency::parse(&dep.serialize(&policy)) else {
            panic!("serialized pin failed to parse");
        };
        prop_assert_eq!(reparsed.package, package);
        prop_assert_eq!(reparsed.version, ver);
    }

    #[test]
    fn fingerprint_is_deterministic_and_trim_insensitive(
        content in "[a-z0-9=.\\-\n ]{0,200}",
        pad in "[ \n\t]{0,10}",
    ) {
        let dir = tempfile::tempdir().unwrap();
        let a = dir.path().join("a.in");
        let b = dir.path().join("b.in");
        fs::write(&a, &content).unwrap();
        fs::write(&b, format!("{pad}{content}{pad}")).unwrap();
        prop_assert_eq!(fingerprint_tag(&a).unwrap(), fingerprint_tag(&a).unwrap());
        prop_assert_eq!(fingerprint_tag(&a).unwrap(), fingerprint_tag(&b).unwrap());
    }

    #[test]
    fn fingerprint_differs_for_different_content(
        a_content in "[a-z]{1,50}",
        b_content in "[a-z]{1,50}",
    ) {
        prop_assume!(a_content.trim() != b_content.trim());
        let dir = tempfile::tempdir().unwrap();
        let a = dir.path().join("a.in");
        let b = dir.path().join("b.in");
        fs::write(&a, &a_content).unwrap();
        fs::write(&b, &b_content).unwrap();
        prop_assert_ne!(fingerprint_tag(&a).unwrap(), fingerprint_tag(&b).unwrap());
    }

    #[test]
    fn split_header_round_trips(
        header_lines in prop::collection::vec("[a-zA-Z0-9 ]{0,30}", 0..5),
        body_first in "[a-z][a-z0-9=.]{0,20}",
        body_rest in prop::collection::vec("#?[a-z0-9=. ]{0,30}", 0..5),
    ) {
        let header: String = header_lines
            .iter()
            .map(|line| format!("# {line}\n"))
            .collect();
        let mut body = format!("{body_first}\n");
        for line in &body_rest {
            body.push_str(line);
            body.push('\n');
        }
        let text = format!("{header}{body}");
        let (split_head, split_body) = split_header(&text);
        prop_assert_eq!(split_head, header);
        prop_assert_eq!(split_body, body);
    }

    #[test]
    fn topological_order_respects_references(
        // Each environment may reference any earlier environment, which
        // makes the generated graph acyclic by construction.
        ref_picks in prop::collection::vec(prop::collection::vec(any::<prop::sample::Index>(), 0..3), 1..8),
        names in prop::collection::hash_set(env_name(), 8),
    ) {
        let names: Vec<EnvName> = names
            .into_iter()
            .map(|name| EnvName::new(name).unwrap())
            .collect();
        let mut graph = EnvGraph::new();
        let mut refs_by_env: BTreeMap<EnvName, BTreeSet<EnvName>> = BTreeMap::new();
        for (i, picks) in ref_picks.iter().enumerate() {
            let refs: BTreeSet<EnvName> = if i == 0 {
                BTreeSet::new()
            } else {
                picks.iter().map(|idx| names[idx.index(i)].clone()).collect()
            };
            refs_by_env.insert(names[i].clone(), refs.clone());
            graph.add_env(names[i].clone(), refs).unwrap();
        }

        let order = graph.topological_order().unwrap();
        prop_assert_eq!(order.len(), refs_by_env.len());
        for (env, refs) in &refs_by_env {
            let env_pos = order.iter().position(|n| n == env).unwrap();
            for reference in refs {
                let ref_pos = order.iter().position(|n| n == reference).unwrap();
                prop_assert!(
                    ref_pos < env_pos,
                    "{} must precede {}", reference, env
                );
            }
            // transitive closure also precedes the environment
            for reference in graph.recursive_refs(env).unwrap() {
                let ref_pos = order.iter().position(|n| n == &reference).unwrap();
                prop_assert!(ref_pos < env_pos);
            }
        }
    }
}
