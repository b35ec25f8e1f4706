// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use proptest::prelude::*;
use serde_json::json;
use std::collections::HashMap;

#[test]
fn sorts_nested_keys_without_whitespace() {
    let value = json!({"b": 1, "a": {"z": [{"y": 1, "x": 2}], "c": null}});
    let text = to_canonical_string(&value).unwrap();
    assert_eq!(text, r#"{"a":{"c":null,"z":[{"x":2,"y":1}]},"b":1}"#);
}

#[test]
fn sha256_matches_known_vector() {
    assert_eq!(
        sha256_hex(b"abc"),
        "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
    );
}

#[test]
fn canonical_digest_ignores_insertion_order() {
    let first = json!({"rules": ["os"], "values": {"os": "linux"}});
    let second = json!({"values": {"os": "linux"}, "rules": ["os"]});
    assert_eq!(
        canonical_sha256(&first).unwrap(),
        canonical_sha256(&second).unwrap()
    );
}

proptest! {
    #[test]
    fn hash_map_order_never_changes_encoding(entries in proptest::collection::vec(("[a-z]{1,6}", 0i64..100), 0..12)) {
        let forward: HashMap<String, i64> = entries.iter().cloned().collect();
        let reverse: HashMap<String, i64> = entries.iter().rev().cloned().collect();
        // Later duplicates win in each map, so compare only when keys are unique
        prop_assume!(forward.len() == entries.len());
        prop_assert_eq!(
            to_canonical_string(&forward).unwrap(),
            to_canonical_string(&reverse).unwrap()
        );
    }
}
