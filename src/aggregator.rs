// Copyright 2022 VMware, Inc.
// SPDX-License-Identifier: MIT
use crate::fingerprint::Fingerprint;
use crate::kubernetes_api_objects::{pod::PodSummary, topology_spread_constraint::*};
use crate::policy::AuditPolicy;
use crate::Error;
use std::collections::{BTreeMap, BTreeSet};
use tracing::*;

/// ConstraintGroup collects every pod of one namespace that declared the same constraint.
#[derive(Clone, Debug, PartialEq)]
pub struct ConstraintGroup {
    /// The first declaration seen. Later pods with the same fingerprint never replace it.
    pub constraint: TopologySpreadConstraint,
    /// Names of the pods that declared the constraint.
    pub expected: BTreeSet<String>,
}

impl ConstraintGroup {
    fn new(constraint: TopologySpreadConstraint) -> ConstraintGroup {
        ConstraintGroup {
            constraint,
            expected: BTreeSet::new(),
        }
    }
}

/// Groups keyed by fingerprint. Iteration follows fingerprint order.
pub type ConstraintIndex = BTreeMap<Fingerprint, ConstraintGroup>;

/// Builds the constraint index of one namespace from its pods.
pub fn aggregate(pods: &[PodSummary], policy: &AuditPolicy) -> Result<ConstraintIndex, Error> {
    let mut index = ConstraintIndex::new();
    for pod in pods {
        for tsc in pod.constraints.iter().filter(|tsc| policy.admits(tsc)) {
            let fingerprint = Fingerprint::of(tsc)?;
            index
                .entry(fingerprint)
                .or_insert_with(|| ConstraintGroup::new(tsc.clone()))
                .expected
                .insert(pod.name.clone());
        }
    }
    debug!(
        "Aggregated {} pods into {} constraint groups",
        pods.len(),
        index.len()
    );
    Ok(index)
}
