// Copyright 2022 VMware, Inc.
// SPDX-License-Identifier: MIT
use crate::kubernetes_api_objects::label_selector::CanonicalSelector;
use crate::kubernetes_api_objects::topology_spread_constraint::TopologySpreadConstraint;
use crate::Error;
use serde::Serialize;
use sha2::{Digest, Sha256};
use std::collections::BTreeSet;
use std::fmt;

/// Fingerprint identifies a topology spread constraint by content.
/// Two constraints share a fingerprint iff they describe the same spreading rule.
/// It is only meaningful as a grouping key within one namespace of one run.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct Fingerprint(String);

// Unset optional fields are hashed as the value the scheduler applies for them.
const DEFAULT_MIN_DOMAINS: i32 = 1;
const DEFAULT_NODE_AFFINITY_POLICY: &str = "Honor";
const DEFAULT_NODE_TAINTS_POLICY: &str = "Ignore";

// Field order is fixed by the struct declaration, and every collection in it is sorted,
// so the serialized bytes only depend on the constraint's meaning.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct CanonicalConstraint<'a> {
    max_skew: i32,
    topology_key: &'a str,
    when_unsatisfiable: String,
    label_selector: Option<CanonicalSelector>,
    min_domains: i32,
    node_affinity_policy: &'a str,
    node_taints_policy: &'a str,
    match_label_keys: BTreeSet<&'a str>,
}

impl<'a> CanonicalConstraint<'a> {
    fn of(tsc: &'a TopologySpreadConstraint) -> CanonicalConstraint<'a> {
        CanonicalConstraint {
            max_skew: tsc.max_skew(),
            topology_key: tsc.topology_key(),
            when_unsatisfiable: tsc.when_unsatisfiable().to_string(),
            label_selector: tsc.label_selector().map(|s| s.canonical()),
            min_domains: tsc.min_domains().unwrap_or(DEFAULT_MIN_DOMAINS),
            node_affinity_policy: tsc
                .node_affinity_policy()
                .unwrap_or(DEFAULT_NODE_AFFINITY_POLICY),
            node_taints_policy: tsc.node_taints_policy().unwrap_or(DEFAULT_NODE_TAINTS_POLICY),
            match_label_keys: tsc.match_label_keys().iter().map(String::as_str).collect(),
        }
    }
}

impl Fingerprint {
    pub fn of(tsc: &TopologySpreadConstraint) -> Result<Fingerprint, Error> {
        let bytes = serde_json::to_vec(&CanonicalConstraint::of(tsc))?;
        Ok(Fingerprint(hex::encode(Sha256::digest(&bytes))))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// First 12 hex digits, enough to tell groups apart in logs.
    pub fn short(&self) -> &str {
        &self.0[..12]
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
