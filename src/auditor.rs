// Copyright 2022 VMware, Inc.
// SPDX-License-Identifier: MIT
use crate::aggregator::aggregate;
use crate::checker::{check_namespace, Finding, FindingKind};
use crate::policy::AuditPolicy;
use crate::report::Reporter;
use crate::shim_layer::ClusterApi;
use crate::Error;
use futures::{pin_mut, stream, StreamExt};
use std::collections::BTreeSet;
use tracing::*;

/// NamespaceReport is the complete result of auditing one namespace.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NamespaceReport {
    pub namespace: String,
    pub pods: usize,
    pub groups: usize,
    pub findings: Vec<Finding>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AuditSummary {
    pub namespaces: usize,
    pub groups: usize,
    pub drifted: usize,
    pub concentrated: usize,
    pub query_failed: usize,
}

impl AuditSummary {
    fn record(&mut self, report: &NamespaceReport) {
        self.namespaces += 1;
        self.groups += report.groups;
        for finding in &report.findings {
            match finding.kind {
                FindingKind::Drifted { .. } => self.drifted += 1,
                FindingKind::Concentrated { .. } => self.concentrated += 1,
                FindingKind::QueryFailed { .. } => self.query_failed += 1,
            }
        }
    }
}

/// Auditor runs the aggregator and the checker over the namespaces of a cluster.
pub struct Auditor<C> {
    cluster: C,
    policy: AuditPolicy,
    namespaces: Option<BTreeSet<String>>,
    concurrency: usize,
}

impl<C: ClusterApi> Auditor<C> {
    pub fn new(cluster: C, policy: AuditPolicy) -> Auditor<C> {
        Auditor {
            cluster,
            policy,
            namespaces: None,
            concurrency: 1,
        }
    }

    /// Restricts the audit to the given namespaces. An empty set means all namespaces.
    pub fn with_namespaces(mut self, namespaces: impl IntoIterator<Item = String>) -> Auditor<C> {
        let namespaces: BTreeSet<String> = namespaces.into_iter().collect();
        self.namespaces = if namespaces.is_empty() { None } else { Some(namespaces) };
        self
    }

    /// Number of namespaces audited at the same time. Output order is unaffected.
    pub fn with_concurrency(mut self, concurrency: usize) -> Auditor<C> {
        self.concurrency = concurrency.max(1);
        self
    }

    /// Sorted names of the namespaces to audit.
    pub async fn target_namespaces(&self) -> Result<Vec<String>, Error> {
        let listed: BTreeSet<String> = self.cluster.list_namespaces().await?.into_iter().collect();
        match &self.namespaces {
            None => Ok(listed.into_iter().collect()),
            Some(wanted) => {
                for missing in wanted.difference(&listed) {
                    warn!("Namespace {} does not exist, skipping", missing);
                }
                Ok(wanted.intersection(&listed).cloned().collect())
            }
        }
    }

    /// Audits one namespace. Failing to list its pods fails the whole namespace.
    pub async fn audit_namespace(&self, namespace: &str) -> Result<NamespaceReport, Error> {
        let pods = self.cluster.list_pods(namespace).await?;
        let index = aggregate(&pods, &self.policy)?;
        let findings = check_namespace(&self.cluster, namespace, &index, &self.policy).await;
        info!(
            "Audited namespace {}: {} pods, {} constraint groups, {} findings",
            namespace,
            pods.len(),
            index.len(),
            findings.len()
        );
        Ok(NamespaceReport {
            namespace: namespace.to_string(),
            pods: pods.len(),
            groups: index.len(),
            findings,
        })
    }

    /// Audits every target namespace and hands the findings to the reporter in
    /// namespace order. The first fatal error stops the run before anything of the
    /// failing namespace, or any later one, is reported.
    pub async fn run<R>(&self, reporter: &mut R) -> Result<AuditSummary, Error>
    where
        R: Reporter + ?Sized,
    {
        let namespaces = self.target_namespaces().await?;
        info!("Auditing {} namespaces", namespaces.len());

        let reports = stream::iter(namespaces)
            .map(|namespace| async move { self.audit_namespace(&namespace).await })
            .buffered(self.concurrency);
        pin_mut!(reports);

        let mut summary = AuditSummary::default();
        while let Some(report) = reports.next().await {
            let report = report?;
            for finding in &report.findings {
                reporter.report(finding)?;
            }
            summary.record(&report);
        }
        Ok(summary)
    }
}
