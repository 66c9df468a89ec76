// Copyright 2022 VMware, Inc.
// SPDX-License-Identifier: MIT
use anyhow::Result;
use clap::Parser;
use std::io;
use tracing::*;
use tracing_subscriber::EnvFilter;
use tsc_audit::auditor::Auditor;
use tsc_audit::cli::{Cli, OutputFormat};
use tsc_audit::report::{JsonReporter, TextReporter};
use tsc_audit::shim_layer::KubeCluster;

#[tokio::main]
async fn main() -> Result<()> {
    // Findings go to stdout, so logs go to stderr.
    tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .init();

    let cli = Cli::parse();
    let cluster = KubeCluster::connect(cli.kubeconfig.as_deref(), cli.context.as_deref()).await?;
    let auditor = Auditor::new(cluster, cli.policy())
        .with_namespaces(cli.namespaces.clone())
        .with_concurrency(cli.concurrency as usize);

    let stdout = io::stdout();
    let summary = match cli.output {
        OutputFormat::Text => auditor.run(&mut TextReporter::new(stdout.lock())).await?,
        OutputFormat::Json => auditor.run(&mut JsonReporter::new(stdout.lock())).await?,
    };
    info!(
        "Audit finished: {} namespaces, {} constraint groups, {} drifted, {} concentrated, \
         {} unresolvable",
        summary.namespaces,
        summary.groups,
        summary.drifted,
        summary.concentrated,
        summary.query_failed
    );
    Ok(())
}
