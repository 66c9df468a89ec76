// Copyright 2022 VMware, Inc.
// SPDX-License-Identifier: MIT
use crate::aggregator::*;
use crate::fingerprint::Fingerprint;
use crate::kubernetes_api_objects::label_selector::format_label_selector;
use crate::kubernetes_api_objects::pod::PodSummary;
use crate::policy::{AuditPolicy, HOSTNAME_TOPOLOGY_KEY};
use crate::unit_tests::fake_cluster::{expression, names, tsc, tsc_with_selector, zone_tsc};
use k8s_openapi::apimachinery::pkg::apis::meta::v1 as metav1;

fn expected_sets(index: &ConstraintIndex) -> Vec<Vec<String>> {
    index
        .values()
        .map(|group| group.expected.iter().cloned().collect())
        .collect()
}

#[test]
pub fn test_pods_without_constraints_contribute_nothing() {
    let pods = vec![PodSummary::new("a", vec![]), PodSummary::new("b", vec![])];
    let index = aggregate(&pods, &AuditPolicy::default()).unwrap();
    assert!(index.is_empty());
}

#[test]
pub fn test_identical_constraints_form_one_group() {
    let pods = vec![
        PodSummary::new("p1", vec![zone_tsc("foo")]),
        PodSummary::new("p2", vec![zone_tsc("foo")]),
        PodSummary::new("p3", vec![zone_tsc("foo")]),
        PodSummary::new("other", vec![]),
    ];
    let index = aggregate(&pods, &AuditPolicy::default()).unwrap();
    assert_eq!(index.len(), 1);
    let group = &index[&Fingerprint::of(&zone_tsc("foo")).unwrap()];
    assert_eq!(group.expected, names(&["p1", "p2", "p3"]));
    assert_eq!(group.constraint, zone_tsc("foo"));
}

#[test]
pub fn test_pod_with_two_constraints_joins_two_groups() {
    let hostname = tsc(1, HOSTNAME_TOPOLOGY_KEY, "ScheduleAnyway", &[("app", "foo")]);
    let pods = vec![
        PodSummary::new("p1", vec![zone_tsc("foo"), hostname.clone()]),
        PodSummary::new("p2", vec![zone_tsc("foo")]),
    ];
    let index = aggregate(&pods, &AuditPolicy::default()).unwrap();
    assert_eq!(index.len(), 2);
    assert_eq!(index[&Fingerprint::of(&zone_tsc("foo")).unwrap()].expected, names(&["p1", "p2"]));
    assert_eq!(index[&Fingerprint::of(&hostname).unwrap()].expected, names(&["p1"]));
}

#[test]
pub fn test_pod_order_does_not_matter() {
    let mut pods = vec![
        PodSummary::new("p1", vec![zone_tsc("foo")]),
        PodSummary::new("p2", vec![zone_tsc("bar"), zone_tsc("foo")]),
        PodSummary::new("p3", vec![zone_tsc("bar")]),
    ];
    let forward = aggregate(&pods, &AuditPolicy::default()).unwrap();
    pods.reverse();
    let backward = aggregate(&pods, &AuditPolicy::default()).unwrap();
    assert_eq!(expected_sets(&forward), expected_sets(&backward));
    assert_eq!(forward.keys().collect::<Vec<_>>(), backward.keys().collect::<Vec<_>>());
}

#[test]
pub fn test_repeated_declaration_counts_once() {
    let pods = vec![PodSummary::new("p1", vec![zone_tsc("foo"), zone_tsc("foo")])];
    let index = aggregate(&pods, &AuditPolicy::default()).unwrap();
    assert_eq!(expected_sets(&index), vec![vec!["p1".to_string()]]);
}

#[test]
pub fn test_first_declaration_is_kept() {
    let as_expression = tsc_with_selector(
        1,
        "topology.kubernetes.io/zone",
        "DoNotSchedule",
        Some(metav1::LabelSelector {
            match_labels: None,
            match_expressions: Some(vec![expression("app", "In", &["foo"])]),
        }),
    );
    let pods = vec![
        PodSummary::new("p1", vec![zone_tsc("foo")]),
        PodSummary::new("p2", vec![as_expression]),
    ];
    let index = aggregate(&pods, &AuditPolicy::default()).unwrap();
    assert_eq!(index.len(), 1);
    let group = index.values().next().unwrap();
    assert_eq!(group.expected, names(&["p1", "p2"]));
    assert_eq!(
        format_label_selector(group.constraint.label_selector().as_ref()),
        "app=foo"
    );
}

#[test]
pub fn test_policy_filters() {
    let soft = tsc(1, "topology.kubernetes.io/zone", "ScheduleAnyway", &[("app", "foo")]);
    let per_host = tsc(1, HOSTNAME_TOPOLOGY_KEY, "DoNotSchedule", &[("app", "foo")]);
    let pods = vec![PodSummary::new("p1", vec![zone_tsc("foo"), soft.clone(), per_host.clone()])];

    let index = aggregate(&pods, &AuditPolicy::default()).unwrap();
    assert_eq!(index.len(), 3);

    let policy = AuditPolicy {
        skip_schedule_anyway: true,
        ..AuditPolicy::default()
    };
    let index = aggregate(&pods, &policy).unwrap();
    assert_eq!(index.len(), 2);
    assert!(!index.contains_key(&Fingerprint::of(&soft).unwrap()));

    let policy = AuditPolicy {
        skip_host_topology: true,
        ..AuditPolicy::default()
    };
    let index = aggregate(&pods, &policy).unwrap();
    assert_eq!(index.len(), 2);
    assert!(!index.contains_key(&Fingerprint::of(&per_host).unwrap()));

    let policy = AuditPolicy {
        skip_schedule_anyway: true,
        skip_host_topology: true,
        ..AuditPolicy::default()
    };
    let index = aggregate(&pods, &policy).unwrap();
    assert_eq!(index.keys().collect::<Vec<_>>(), vec![&Fingerprint::of(&zone_tsc("foo")).unwrap()]);
}
