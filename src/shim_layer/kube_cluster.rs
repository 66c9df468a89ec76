// Copyright 2022 VMware, Inc.
// SPDX-License-Identifier: MIT
use crate::kubernetes_api_objects::pod::PodSummary;
use crate::shim_layer::ClusterApi;
use crate::Error;
use async_trait::async_trait;
use core::fmt::Debug;
use k8s_openapi::api::core::v1::{Namespace, Pod};
use kube::{
    api::{Api, ListParams, ResourceExt},
    config::{Config, KubeConfigOptions, Kubeconfig},
    Client,
};
use serde::de::DeserializeOwned;
use std::path::Path;
use tracing::*;

/// Number of objects requested per list call; larger lists are paged with continue tokens.
const LIST_PAGE_SIZE: u32 = 500;

/// KubeCluster implements ClusterApi on top of a kube-rs client.
pub struct KubeCluster {
    client: Client,
}

impl KubeCluster {
    pub fn new(client: Client) -> KubeCluster {
        KubeCluster { client }
    }

    /// Builds a client from an explicit kubeconfig file, or falls back to the standard
    /// inference (KUBECONFIG, ~/.kube/config, then in-cluster service account).
    pub async fn connect(
        kubeconfig: Option<&Path>,
        context: Option<&str>,
    ) -> Result<KubeCluster, Error> {
        let options = KubeConfigOptions {
            context: context.map(str::to_string),
            ..KubeConfigOptions::default()
        };
        let config = match kubeconfig {
            Some(path) => {
                info!("Loading kubeconfig from {}", path.display());
                let kubeconfig = Kubeconfig::read_from(path).map_err(Error::KubeconfigLoadFailed)?;
                Config::from_custom_kubeconfig(kubeconfig, &options)
                    .await
                    .map_err(Error::KubeconfigLoadFailed)?
            }
            None if context.is_some() => Config::from_kubeconfig(&options)
                .await
                .map_err(Error::KubeconfigLoadFailed)?,
            None => Config::infer().await.map_err(Error::ConfigInferFailed)?,
        };
        info!("Connecting to cluster at {}", config.cluster_url);
        let client = Client::try_from(config).map_err(Error::ClientBuildFailed)?;
        Ok(KubeCluster::new(client))
    }
}

async fn list_all<K>(api: &Api<K>, params: ListParams) -> Result<Vec<K>, kube::Error>
where
    K: Clone + DeserializeOwned + Debug,
{
    let mut items = Vec::new();
    let mut params = params.limit(LIST_PAGE_SIZE);
    loop {
        let page = api.list(&params).await?;
        items.extend(page.items);
        match page.metadata.continue_ {
            Some(token) if !token.is_empty() => params = params.continue_token(&token),
            _ => break,
        }
    }
    Ok(items)
}

#[async_trait]
impl ClusterApi for KubeCluster {
    async fn list_namespaces(&self) -> Result<Vec<String>, Error> {
        let ns_api = Api::<Namespace>::all(self.client.clone());
        let namespaces = list_all(&ns_api, ListParams::default())
            .await
            .map_err(Error::ListNamespacesFailed)?;
        Ok(namespaces.iter().map(|ns| ns.name_any()).collect())
    }

    async fn list_pods(&self, namespace: &str) -> Result<Vec<PodSummary>, Error> {
        let pod_api = Api::<Pod>::namespaced(self.client.clone(), namespace);
        let pods = list_all(&pod_api, ListParams::default())
            .await
            .map_err(|source| Error::ListPodsFailed {
                namespace: namespace.to_string(),
                source,
            })?;
        let mut summaries = Vec::with_capacity(pods.len());
        for pod in pods {
            match PodSummary::from_kube(pod) {
                Some(summary) => summaries.push(summary),
                None => warn!("Skipping pod without .metadata.name in namespace {}", namespace),
            }
        }
        Ok(summaries)
    }

    async fn list_pods_by_selector(
        &self,
        namespace: &str,
        selector: &str,
    ) -> Result<Vec<String>, Error> {
        let pod_api = Api::<Pod>::namespaced(self.client.clone(), namespace);
        let pods = list_all(&pod_api, ListParams::default().labels(selector))
            .await
            .map_err(|source| Error::ListPodsBySelectorFailed {
                namespace: namespace.to_string(),
                selector: selector.to_string(),
                source,
            })?;
        Ok(pods.iter().map(|pod| pod.name_any()).collect())
    }
}
