// Copyright 2022 VMware, Inc.
// SPDX-License-Identifier: MIT
use crate::policy::{AuditPolicy, DEFAULT_CONCENTRATION_THRESHOLD, HOSTNAME_TOPOLOGY_KEY};
use clap::{Parser, ValueEnum};
use std::path::PathBuf;

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

/// Audit pod placement against the topology spread constraints the pods declare.
#[derive(Debug, Parser)]
#[command(name = "tsc-audit", version)]
pub struct Cli {
    /// Path to the kubeconfig file. Defaults to $KUBECONFIG or ~/.kube/config.
    #[arg(long, value_name = "PATH")]
    pub kubeconfig: Option<PathBuf>,

    /// Kubeconfig context to use instead of the current one.
    #[arg(long)]
    pub context: Option<String>,

    /// Only audit these namespaces (repeatable).
    #[arg(short = 'n', long = "namespace", value_name = "NAMESPACE")]
    pub namespaces: Vec<String>,

    /// A consistent DoNotSchedule constraint matching more pods than this is reported.
    #[arg(long, default_value_t = DEFAULT_CONCENTRATION_THRESHOLD)]
    pub concentration_threshold: usize,

    /// Do not compare declaring pods against selector-matched pods.
    #[arg(long)]
    pub no_drift: bool,

    /// Do not report large hard constraints.
    #[arg(long)]
    pub no_concentration: bool,

    /// Ignore ScheduleAnyway constraints.
    #[arg(long)]
    pub skip_schedule_anyway: bool,

    /// Ignore constraints spreading over host-level topology keys.
    #[arg(long)]
    pub skip_host_topology: bool,

    /// Topology keys treated as host-level (repeatable).
    #[arg(
        long = "host-topology-key",
        value_name = "KEY",
        default_values_t = [HOSTNAME_TOPOLOGY_KEY.to_string()]
    )]
    pub host_topology_keys: Vec<String>,

    /// Number of namespaces audited concurrently.
    #[arg(long, default_value_t = 1, value_parser = clap::value_parser!(u16).range(1..))]
    pub concurrency: u16,

    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    pub output: OutputFormat,
}

impl Cli {
    pub fn policy(&self) -> AuditPolicy {
        AuditPolicy {
            concentration_threshold: self.concentration_threshold,
            check_drift: !self.no_drift,
            check_concentration: !self.no_concentration,
            skip_schedule_anyway: self.skip_schedule_anyway,
            skip_host_topology: self.skip_host_topology,
            host_topology_keys: self.host_topology_keys.iter().cloned().collect(),
        }
    }
}
