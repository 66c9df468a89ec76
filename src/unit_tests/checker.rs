// Copyright 2022 VMware, Inc.
// SPDX-License-Identifier: MIT
use crate::aggregator::aggregate;
use crate::checker::*;
use crate::fingerprint::Fingerprint;
use crate::kubernetes_api_objects::label_selector::{ERROR_SELECTOR, NONE_SELECTOR};
use crate::kubernetes_api_objects::resource::ResourceWrapper;
use crate::kubernetes_api_objects::topology_spread_constraint::{
    TopologySpreadConstraint, WhenUnsatisfiable,
};
use crate::policy::AuditPolicy;
use crate::shim_layer::ClusterApi;
use crate::unit_tests::fake_cluster::*;
use k8s_openapi::apimachinery::pkg::apis::meta::v1 as metav1;
use std::collections::BTreeSet;

fn set(items: Vec<&str>) -> BTreeSet<String> {
    items.into_iter().map(str::to_string).collect()
}

fn pod_names(count: usize) -> Vec<String> {
    (1..=count).map(|i| format!("p{}", i)).collect()
}

async fn check(cluster: &FakeCluster, namespace: &str, policy: &AuditPolicy) -> Vec<Finding> {
    let pods = cluster.list_pods(namespace).await.unwrap();
    let index = aggregate(&pods, policy).unwrap();
    check_namespace(cluster, namespace, &index, policy).await
}

#[test]
pub fn test_set_equality_not_sequence_equality() {
    let expected = set(vec!["p2", "p1", "p3"]);
    let actual = set(vec!["p3", "p1", "p2", "p1"]);
    assert_eq!(
        classify(&expected, &actual, true, &AuditPolicy::default()),
        Classification::Consistent
    );
}

#[test]
pub fn test_threshold_boundary() {
    let policy = AuditPolicy::default();
    let five: BTreeSet<String> = pod_names(5).into_iter().collect();
    let six: BTreeSet<String> = pod_names(6).into_iter().collect();
    assert_eq!(classify(&five, &five, true, &policy), Classification::Consistent);
    assert_eq!(classify(&six, &six, true, &policy), Classification::Concentrated);
    assert_eq!(classify(&six, &six, false, &policy), Classification::Consistent);

    let strict = AuditPolicy {
        concentration_threshold: 2,
        ..AuditPolicy::default()
    };
    let three: BTreeSet<String> = pod_names(3).into_iter().collect();
    assert_eq!(classify(&three, &three, true, &strict), Classification::Concentrated);
}

#[test]
pub fn test_drift_takes_precedence() {
    let expected: BTreeSet<String> = pod_names(6).into_iter().collect();
    let actual: BTreeSet<String> = pod_names(7).into_iter().collect();
    assert_eq!(
        classify(&expected, &actual, true, &AuditPolicy::default()),
        Classification::Drifted
    );
}

#[test]
pub fn test_check_toggles() {
    let expected: BTreeSet<String> = pod_names(6).into_iter().collect();
    let actual: BTreeSet<String> = pod_names(7).into_iter().collect();

    let concentration_only = AuditPolicy {
        check_drift: false,
        ..AuditPolicy::default()
    };
    assert_eq!(
        classify(&expected, &actual, true, &concentration_only),
        Classification::Concentrated
    );
    assert_eq!(
        classify(&set(vec!["p1"]), &set(vec!["p2"]), true, &concentration_only),
        Classification::Consistent
    );

    let drift_only = AuditPolicy {
        check_concentration: false,
        ..AuditPolicy::default()
    };
    assert_eq!(classify(&actual, &actual, true, &drift_only), Classification::Consistent);
    assert_eq!(classify(&expected, &actual, true, &drift_only), Classification::Drifted);
}

#[tokio::test]
pub async fn test_consistent_group_has_no_finding() {
    let cluster = FakeCluster::new().with_namespace(
        "ns1",
        vec![
            pod("p1", &[("app", "foo")], vec![zone_tsc("foo")]),
            pod("p2", &[("app", "foo")], vec![zone_tsc("foo")]),
            pod("p3", &[("app", "foo")], vec![zone_tsc("foo")]),
        ],
    );
    assert!(check(&cluster, "ns1", &AuditPolicy::default()).await.is_empty());
    assert_eq!(cluster.queries(), vec![("ns1".to_string(), "app=foo".to_string())]);
}

#[tokio::test]
pub async fn test_drifted_finding() {
    let cluster = FakeCluster::new().with_namespace(
        "ns1",
        vec![
            pod("p1", &[("app", "foo")], vec![zone_tsc("foo")]),
            pod("p2", &[("app", "foo")], vec![zone_tsc("foo")]),
            pod("p3", &[("app", "bar")], vec![zone_tsc("foo")]),
            pod("stray", &[("app", "foo")], vec![]),
        ],
    );
    let findings = check(&cluster, "ns1", &AuditPolicy::default()).await;
    assert_eq!(
        findings,
        vec![Finding {
            namespace: "ns1".to_string(),
            fingerprint: Fingerprint::of(&zone_tsc("foo")).unwrap(),
            topology_key: "topology.kubernetes.io/zone".to_string(),
            max_skew: 1,
            when_unsatisfiable: WhenUnsatisfiable::DoNotSchedule,
            selector: "app=foo".to_string(),
            kind: FindingKind::Drifted {
                expected: names(&["p1", "p2", "p3"]),
                actual: names(&["p1", "p2", "stray"]),
                missing: names(&["p3"]),
                unexpected: names(&["stray"]),
            },
        }]
    );
}

#[tokio::test]
pub async fn test_concentrated_finding() {
    let pods = pod_names(7)
        .iter()
        .map(|name| pod(name, &[("app", "db")], vec![zone_tsc("db")]))
        .collect();
    let cluster = FakeCluster::new().with_namespace("ns2", pods);
    let findings = check(&cluster, "ns2", &AuditPolicy::default()).await;
    assert_eq!(findings.len(), 1);
    assert_eq!(
        findings[0].kind,
        FindingKind::Concentrated {
            pods: pod_names(7).into_iter().collect(),
            threshold: 5,
        }
    );
}

#[tokio::test]
pub async fn test_query_failure_is_not_fatal() {
    let cluster = FakeCluster::new()
        .with_namespace(
            "ns1",
            vec![
                pod("p1", &[("app", "foo")], vec![zone_tsc("foo")]),
                pod("q1", &[("app", "bar")], vec![zone_tsc("bar")]),
            ],
        )
        .failing_selector("app=foo");
    let mut findings = check(&cluster, "ns1", &AuditPolicy::default()).await;
    assert_eq!(findings.len(), 1);
    let finding = findings.remove(0);
    assert_eq!(finding.selector, "app=foo");
    assert!(matches!(finding.kind, FindingKind::QueryFailed { .. }));
    // Both groups were still queried.
    assert_eq!(cluster.queries().len(), 2);
}

#[tokio::test]
pub async fn test_findings_follow_fingerprint_order() {
    let apps = ["a", "b", "c", "d", "e"];
    let pods = apps
        .iter()
        .map(|app| pod(&format!("{}-0", app), &[], vec![zone_tsc(app)]))
        .collect();
    let cluster = FakeCluster::new().with_namespace("ns1", pods);
    let findings = check(&cluster, "ns1", &AuditPolicy::default()).await;
    assert_eq!(findings.len(), apps.len());
    let fingerprints: Vec<&Fingerprint> = findings.iter().map(|f| &f.fingerprint).collect();
    let mut sorted = fingerprints.clone();
    sorted.sort();
    assert_eq!(fingerprints, sorted);
}

#[tokio::test]
pub async fn test_unresolvable_selectors_are_not_queried() {
    let malformed = tsc_with_selector(
        1,
        "zone",
        "DoNotSchedule",
        Some(metav1::LabelSelector {
            match_labels: None,
            match_expressions: Some(vec![expression("app", "Bogus", &["foo"])]),
        }),
    );
    let missing = tsc_with_selector(1, "zone", "DoNotSchedule", None);
    let cluster = FakeCluster::new().with_namespace(
        "ns1",
        vec![pod("p1", &[("app", "foo")], vec![malformed, missing])],
    );
    let findings = check(&cluster, "ns1", &AuditPolicy::default()).await;
    assert_eq!(findings.len(), 2);
    let selectors: BTreeSet<&str> = findings.iter().map(|f| f.selector.as_str()).collect();
    assert_eq!(selectors, BTreeSet::from([ERROR_SELECTOR, NONE_SELECTOR]));
    assert!(findings
        .iter()
        .all(|f| matches!(f.kind, FindingKind::QueryFailed { .. })));
    assert!(cluster.queries().is_empty());
}

#[tokio::test]
pub async fn test_no_checks_no_queries() {
    let cluster = FakeCluster::new().with_namespace(
        "ns1",
        vec![pod("p1", &[("app", "bar")], vec![zone_tsc("foo")])],
    );
    let policy = AuditPolicy {
        check_drift: false,
        check_concentration: false,
        ..AuditPolicy::default()
    };
    assert!(check(&cluster, "ns1", &policy).await.is_empty());
    assert!(cluster.queries().is_empty());
}

#[tokio::test]
pub async fn test_explicit_default_policies_do_not_split_groups() {
    let mut explicit = zone_tsc("foo").into_kube();
    explicit.node_affinity_policy = Some("Honor".to_string());
    explicit.node_taints_policy = Some("Ignore".to_string());
    let explicit = TopologySpreadConstraint::from_kube(explicit);
    let cluster = FakeCluster::new().with_namespace(
        "ns1",
        vec![
            pod("p1", &[("app", "foo")], vec![zone_tsc("foo")]),
            pod("p2", &[("app", "foo")], vec![explicit]),
        ],
    );
    assert!(check(&cluster, "ns1", &AuditPolicy::default()).await.is_empty());
    assert_eq!(cluster.queries().len(), 1);
}
