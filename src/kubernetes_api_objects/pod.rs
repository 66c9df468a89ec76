// Copyright 2022 VMware, Inc.
// SPDX-License-Identifier: MIT
use crate::kubernetes_api_objects::resource::ResourceWrapper;
use crate::kubernetes_api_objects::topology_spread_constraint::*;
use k8s_openapi::api::core::v1 as corev1;

/// PodSummary is the part of a Pod the audit reads: its name and the topology spread
/// constraints declared in its spec.
#[derive(Clone, Debug, PartialEq)]
pub struct PodSummary {
    pub name: String,
    pub constraints: Vec<TopologySpreadConstraint>,
}

impl PodSummary {
    pub fn new(name: impl Into<String>, constraints: Vec<TopologySpreadConstraint>) -> PodSummary {
        PodSummary {
            name: name.into(),
            constraints,
        }
    }

    /// Returns None for a pod without `.metadata.name`.
    pub fn from_kube(pod: corev1::Pod) -> Option<PodSummary> {
        let name = pod.metadata.name?;
        let constraints = pod
            .spec
            .and_then(|spec| spec.topology_spread_constraints)
            .unwrap_or_default()
            .into_iter()
            .map(TopologySpreadConstraint::from_kube)
            .collect();
        Some(PodSummary { name, constraints })
    }
}
