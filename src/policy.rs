// Copyright 2022 VMware, Inc.
// SPDX-License-Identifier: MIT
use crate::kubernetes_api_objects::topology_spread_constraint::*;
use std::collections::BTreeSet;

pub const DEFAULT_CONCENTRATION_THRESHOLD: usize = 5;
pub const HOSTNAME_TOPOLOGY_KEY: &str = "kubernetes.io/hostname";

/// AuditPolicy holds every knob that decides which constraints are audited and how
/// their groups are classified.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AuditPolicy {
    /// A consistent hard constraint matching more pods than this is concentrated.
    pub concentration_threshold: usize,
    pub check_drift: bool,
    pub check_concentration: bool,
    /// Drop ScheduleAnyway constraints before aggregation.
    pub skip_schedule_anyway: bool,
    /// Drop constraints whose topology key is one of host_topology_keys.
    pub skip_host_topology: bool,
    pub host_topology_keys: BTreeSet<String>,
}

impl Default for AuditPolicy {
    fn default() -> AuditPolicy {
        AuditPolicy {
            concentration_threshold: DEFAULT_CONCENTRATION_THRESHOLD,
            check_drift: true,
            check_concentration: true,
            skip_schedule_anyway: false,
            skip_host_topology: false,
            host_topology_keys: BTreeSet::from([HOSTNAME_TOPOLOGY_KEY.to_string()]),
        }
    }
}

impl AuditPolicy {
    /// Whether the constraint takes part in aggregation at all.
    pub fn admits(&self, tsc: &TopologySpreadConstraint) -> bool {
        if self.skip_schedule_anyway
            && tsc.when_unsatisfiable() == WhenUnsatisfiable::ScheduleAnyway
        {
            return false;
        }
        if self.skip_host_topology && self.host_topology_keys.contains(tsc.topology_key()) {
            return false;
        }
        true
    }

    pub fn has_checks(&self) -> bool {
        self.check_drift || self.check_concentration
    }
}
