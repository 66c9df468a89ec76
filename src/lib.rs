// Copyright 2022 VMware, Inc.
// SPDX-License-Identifier: MIT
pub mod aggregator;
pub mod auditor;
pub mod checker;
pub mod cli;
pub mod fingerprint;
pub mod kubernetes_api_objects;
pub mod policy;
pub mod report;
#[path = "shim_layer/mod.rs"]
pub mod shim_layer;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Failed to read kubeconfig: {0}")]
    KubeconfigLoadFailed(#[source] kube::config::KubeconfigError),
    #[error("Failed to infer cluster config: {0}")]
    ConfigInferFailed(#[source] kube::config::InferConfigError),
    #[error("Failed to build kube client: {0}")]
    ClientBuildFailed(#[source] kube::Error),
    #[error("Failed to list namespaces: {0}")]
    ListNamespacesFailed(#[source] kube::Error),
    #[error("Failed to list pods in namespace {namespace}: {source}")]
    ListPodsFailed {
        namespace: String,
        #[source]
        source: kube::Error,
    },
    #[error("Failed to list pods in namespace {namespace} with selector {selector}: {source}")]
    ListPodsBySelectorFailed {
        namespace: String,
        selector: String,
        #[source]
        source: kube::Error,
    },
    #[error("Failed to serialize: {0}")]
    SerializeFailed(#[from] serde_json::Error),
    #[error("Failed to write report: {0}")]
    WriteReportFailed(#[from] std::io::Error),
}
