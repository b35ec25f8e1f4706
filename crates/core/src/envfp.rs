// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Environment fingerprint rules and digest
//!
//! Rule values are resolved by an external probe; this module owns the rule
//! vocabulary, the fixed rule order and the digest over resolved values.

use crate::canonical::canonical_sha256;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Rules applied when a jobspec declares none
pub const DEFAULT_RULES: [&str; 2] = ["arch", "os"];

/// Value recorded for a toolchain that is not installed
pub const UNAVAILABLE: &str = "unavailable";

/// A named environment probe
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Rule {
    Os,
    Arch,
    Hostname,
    Cwd,
    Env(String),
    RustVersion,
    GoVersion,
    Tool(String),
}

impl Rule {
    /// Parse a rule name; `None` for unknown rules
    pub fn parse(name: &str) -> Option<Rule> {
        let name = name.trim();
        match name {
            "os" => Some(Rule::Os),
            "arch" => Some(Rule::Arch),
            "hostname" => Some(Rule::Hostname),
            "cwd" => Some(Rule::Cwd),
            "rust_version" => Some(Rule::RustVersion),
            "go_version" => Some(Rule::GoVersion),
            _ => {
                if let Some(var) = name.strip_prefix("env:") {
                    return is_token(var).then(|| Rule::Env(var.to_string()));
                }
                if let Some(bin) = name.strip_prefix("tool:") {
                    return is_token(bin).then(|| Rule::Tool(bin.to_string()));
                }
                None
            }
        }
    }

    pub fn name(&self) -> String {
        match self {
            Rule::Os => "os".to_string(),
            Rule::Arch => "arch".to_string(),
            Rule::Hostname => "hostname".to_string(),
            Rule::Cwd => "cwd".to_string(),
            Rule::Env(var) => format!("env:{var}"),
            Rule::RustVersion => "rust_version".to_string(),
            Rule::GoVersion => "go_version".to_string(),
            Rule::Tool(bin) => format!("tool:{bin}"),
        }
    }
}

impl fmt::Display for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name())
    }
}

fn is_token(s: &str) -> bool {
    !s.is_empty()
        && s
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.'))
}

/// Trim, dedupe and sort rule names, applying defaults when empty.
///
/// Returns the first unknown rule name as the error.
pub fn normalize_rules<S: AsRef<str>>(rules: &[S]) -> Result<Vec<String>, String> {
    let mut names: Vec<String> = Vec::new();
    for raw in rules {
        let raw = raw.as_ref().trim();
        if raw.is_empty() {
            continue;
        }
        let rule = Rule::parse(raw).ok_or_else(|| raw.to_string())?;
        names.push(rule.name());
    }
    if names.is_empty() {
        names = DEFAULT_RULES.iter().map(|s| s.to_string()).collect();
    }
    names.sort();
    names.dedup();
    Ok(names)
}

/// A computed fingerprint stored with a job
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnvFingerprint {
    pub rules: Vec<String>,
    pub values: BTreeMap<String, String>,
    pub hash: String,
}

#[derive(Serialize)]
struct DigestInput<'a> {
    rules: &'a [String],
    values: &'a BTreeMap<String, String>,
}

impl EnvFingerprint {
    /// Build a fingerprint from normalized rules and their resolved values
    pub fn from_values(rules: Vec<String>, values: BTreeMap<String, String>) -> Self {
        let hash = digest(&rules, &values);
        Self {
            rules,
            values,
            hash,
        }
    }

    /// Recompute the digest and compare with the stored one
    pub fn is_consistent(&self) -> bool {
        digest(&self.rules, &self.values) == self.hash
    }
}

fn digest(rules: &[String], values: &BTreeMap<String, String>) -> String {
    // Serializing strings and string maps cannot fail
    canonical_sha256(&DigestInput { rules, values }).unwrap_or_default()
}

#[cfg(test)]
#[path = "envfp_tests.rs"]
mod tests;
