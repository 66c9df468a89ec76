// Copyright 2022 VMware, Inc.
// SPDX-License-Identifier: MIT
use crate::kubernetes_api_objects::pod::PodSummary;
use crate::Error;
use async_trait::async_trait;

pub mod kube_cluster;

pub use kube_cluster::KubeCluster;

/// The shim layer connects the audit to the Kubernetes API.
/// ClusterApi is the only way the aggregator and the checker observe the cluster:
/// every call is a read, issued once, with no retry.
#[async_trait]
pub trait ClusterApi: Send + Sync {
    /// Names of all namespaces, in whatever order the API server returns them.
    async fn list_namespaces(&self) -> Result<Vec<String>, Error>;

    /// Every pod of the namespace with its declared topology spread constraints.
    async fn list_pods(&self, namespace: &str) -> Result<Vec<PodSummary>, Error>;

    /// Names of the pods of the namespace whose labels match the rendered selector.
    async fn list_pods_by_selector(
        &self,
        namespace: &str,
        selector: &str,
    ) -> Result<Vec<String>, Error>;
}
