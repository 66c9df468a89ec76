// Copyright 2022 VMware, Inc.
// SPDX-License-Identifier: MIT
use crate::kubernetes_api_objects::label_selector::*;
use crate::kubernetes_api_objects::resource::ResourceWrapper;
use k8s_openapi::api::core::v1 as corev1;
use serde::{Serialize, Serializer};
use std::fmt;

pub const DO_NOT_SCHEDULE: &str = "DoNotSchedule";
pub const SCHEDULE_ANYWAY: &str = "ScheduleAnyway";

// TopologySpreadConstraint specifies how to spread matching pods among the given topology.
//
// This definition is a wrapper of TopologySpreadConstraint defined at
// https://github.com/Arnavion/k8s-openapi/blob/v0.22.0/src/v1_30/api/core/v1/topology_spread_constraint.rs.
//
// More detailed information: https://kubernetes.io/docs/concepts/scheduling-eviction/topology-spread-constraints/.
#[derive(Clone, Debug, PartialEq)]
pub struct TopologySpreadConstraint {
    inner: corev1::TopologySpreadConstraint,
}

/// What the scheduler does with a pod that would violate the constraint.
/// Values the API server does not know are kept verbatim and treated as soft.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum WhenUnsatisfiable {
    DoNotSchedule,
    ScheduleAnyway,
    Other(String),
}

impl WhenUnsatisfiable {
    pub fn as_str(&self) -> &str {
        match self {
            WhenUnsatisfiable::DoNotSchedule => DO_NOT_SCHEDULE,
            WhenUnsatisfiable::ScheduleAnyway => SCHEDULE_ANYWAY,
            WhenUnsatisfiable::Other(s) => s,
        }
    }
}

impl From<&str> for WhenUnsatisfiable {
    fn from(s: &str) -> Self {
        match s {
            DO_NOT_SCHEDULE => WhenUnsatisfiable::DoNotSchedule,
            SCHEDULE_ANYWAY => WhenUnsatisfiable::ScheduleAnyway,
            other => WhenUnsatisfiable::Other(other.to_string()),
        }
    }
}

impl fmt::Display for WhenUnsatisfiable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for WhenUnsatisfiable {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl TopologySpreadConstraint {
    pub fn max_skew(&self) -> i32 {
        self.inner.max_skew
    }

    pub fn topology_key(&self) -> &str {
        &self.inner.topology_key
    }

    pub fn when_unsatisfiable(&self) -> WhenUnsatisfiable {
        WhenUnsatisfiable::from(self.inner.when_unsatisfiable.as_str())
    }

    /// A hard constraint keeps pods pending rather than violate the skew.
    pub fn is_hard(&self) -> bool {
        self.when_unsatisfiable() == WhenUnsatisfiable::DoNotSchedule
    }

    pub fn label_selector(&self) -> Option<LabelSelector> {
        self.inner
            .label_selector
            .clone()
            .map(LabelSelector::from_kube)
    }

    pub fn min_domains(&self) -> Option<i32> {
        self.inner.min_domains
    }

    pub fn node_affinity_policy(&self) -> Option<&str> {
        self.inner.node_affinity_policy.as_deref()
    }

    pub fn node_taints_policy(&self) -> Option<&str> {
        self.inner.node_taints_policy.as_deref()
    }

    pub fn match_label_keys(&self) -> &[String] {
        self.inner.match_label_keys.as_deref().unwrap_or_default()
    }
}

crate::implement_resource_wrapper_trait!(
    TopologySpreadConstraint,
    corev1::TopologySpreadConstraint
);
