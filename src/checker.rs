// Copyright 2022 VMware, Inc.
// SPDX-License-Identifier: MIT
use crate::aggregator::{ConstraintGroup, ConstraintIndex};
use crate::fingerprint::Fingerprint;
use crate::kubernetes_api_objects::label_selector::format_label_selector;
use crate::kubernetes_api_objects::topology_spread_constraint::WhenUnsatisfiable;
use crate::policy::AuditPolicy;
use crate::shim_layer::ClusterApi;
use serde::Serialize;
use std::collections::BTreeSet;
use tracing::*;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Classification {
    Consistent,
    /// The declaring pods and the selector-matched pods differ.
    Drifted,
    /// A consistent hard constraint matches more pods than the threshold.
    Concentrated,
}

/// Classifies one group from its two pod sets.
/// Drifted wins over Concentrated, so a drifted group is never reported twice.
pub fn classify(
    expected: &BTreeSet<String>,
    actual: &BTreeSet<String>,
    hard: bool,
    policy: &AuditPolicy,
) -> Classification {
    if policy.check_drift && expected != actual {
        return Classification::Drifted;
    }
    if policy.check_concentration && hard && actual.len() > policy.concentration_threshold {
        return Classification::Concentrated;
    }
    Classification::Consistent
}

/// Finding is one reportable group of one namespace.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Finding {
    pub namespace: String,
    pub fingerprint: Fingerprint,
    pub topology_key: String,
    pub max_skew: i32,
    pub when_unsatisfiable: WhenUnsatisfiable,
    pub selector: String,
    #[serde(flatten)]
    pub kind: FindingKind,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "classification", rename_all = "camelCase")]
pub enum FindingKind {
    Drifted {
        expected: BTreeSet<String>,
        actual: BTreeSet<String>,
        /// Declared the constraint but no longer matched by its selector.
        missing: BTreeSet<String>,
        /// Matched by the selector without declaring the constraint.
        unexpected: BTreeSet<String>,
    },
    Concentrated {
        pods: BTreeSet<String>,
        threshold: usize,
    },
    /// The selector could not be rendered or the cluster rejected the query.
    QueryFailed { error: String },
}

impl Finding {
    fn new(
        namespace: &str,
        fingerprint: &Fingerprint,
        group: &ConstraintGroup,
        selector: String,
        kind: FindingKind,
    ) -> Finding {
        let tsc = &group.constraint;
        Finding {
            namespace: namespace.to_string(),
            fingerprint: fingerprint.clone(),
            topology_key: tsc.topology_key().to_string(),
            max_skew: tsc.max_skew(),
            when_unsatisfiable: tsc.when_unsatisfiable(),
            selector,
            kind,
        }
    }
}

/// Resolves every group's selector against the cluster and returns the findings of the
/// namespace in fingerprint order. A failed selector query only affects its own group.
pub async fn check_namespace<C>(
    cluster: &C,
    namespace: &str,
    index: &ConstraintIndex,
    policy: &AuditPolicy,
) -> Vec<Finding>
where
    C: ClusterApi + ?Sized,
{
    let mut findings = Vec::new();
    if !policy.has_checks() {
        return findings;
    }
    for (fingerprint, group) in index {
        if let Some(finding) = check_group(cluster, namespace, fingerprint, group, policy).await {
            findings.push(finding);
        }
    }
    findings
}

async fn check_group<C>(
    cluster: &C,
    namespace: &str,
    fingerprint: &Fingerprint,
    group: &ConstraintGroup,
    policy: &AuditPolicy,
) -> Option<Finding>
where
    C: ClusterApi + ?Sized,
{
    let selector = group.constraint.label_selector();
    let rendered = format_label_selector(selector.as_ref());
    let query = match selector.as_ref().map(|s| s.to_query_string()) {
        Some(Ok(query)) => query,
        Some(Err(err)) => {
            warn!(
                "Invalid tsc.labelSelector: ns={}, selector={}, {}",
                namespace, rendered, err
            );
            let kind = FindingKind::QueryFailed { error: err.to_string() };
            return Some(Finding::new(namespace, fingerprint, group, rendered, kind));
        }
        None => {
            warn!(
                "Missing tsc.labelSelector: ns={}, fingerprint={}",
                namespace,
                fingerprint.short()
            );
            let kind = FindingKind::QueryFailed {
                error: "label selector is missing".to_string(),
            };
            return Some(Finding::new(namespace, fingerprint, group, rendered, kind));
        }
    };

    let actual: BTreeSet<String> = match cluster.list_pods_by_selector(namespace, &query).await {
        Ok(names) => names.into_iter().collect(),
        Err(err) => {
            warn!(
                "Failed to list pods from tsc.labelSelector: ns={}, selector={}, {}",
                namespace, query, err
            );
            let kind = FindingKind::QueryFailed { error: err.to_string() };
            return Some(Finding::new(namespace, fingerprint, group, query, kind));
        }
    };

    let expected = &group.expected;
    let kind = match classify(expected, &actual, group.constraint.is_hard(), policy) {
        Classification::Consistent => {
            debug!(
                "Consistent tsc: ns={}, selector={}, pods={}",
                namespace,
                query,
                actual.len()
            );
            return None;
        }
        Classification::Drifted => FindingKind::Drifted {
            missing: expected.difference(&actual).cloned().collect(),
            unexpected: actual.difference(expected).cloned().collect(),
            expected: expected.clone(),
            actual,
        },
        Classification::Concentrated => FindingKind::Concentrated {
            pods: actual,
            threshold: policy.concentration_threshold,
        },
    };
    Some(Finding::new(namespace, fingerprint, group, query, kind))
}
