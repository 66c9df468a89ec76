// Copyright 2022 VMware, Inc.
// SPDX-License-Identifier: MIT
use crate::checker::{Finding, FindingKind};
use crate::Error;
use std::collections::BTreeSet;
use std::io::Write;

/// Reporter receives findings in the order they must be emitted.
pub trait Reporter {
    fn report(&mut self, finding: &Finding) -> Result<(), Error>;
}

/// TextReporter writes one human-readable block per finding, separated by a blank line.
pub struct TextReporter<W: Write> {
    out: W,
}

impl<W: Write> TextReporter<W> {
    pub fn new(out: W) -> TextReporter<W> {
        TextReporter { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> Reporter for TextReporter<W> {
    fn report(&mut self, finding: &Finding) -> Result<(), Error> {
        self.out.write_all(render_text(finding).as_bytes())?;
        self.out.flush()?;
        Ok(())
    }
}

/// JsonReporter writes one JSON object per finding per line.
pub struct JsonReporter<W: Write> {
    out: W,
}

impl<W: Write> JsonReporter<W> {
    pub fn new(out: W) -> JsonReporter<W> {
        JsonReporter { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> Reporter for JsonReporter<W> {
    fn report(&mut self, finding: &Finding) -> Result<(), Error> {
        serde_json::to_writer(&mut self.out, finding)?;
        self.out.write_all(b"\n")?;
        self.out.flush()?;
        Ok(())
    }
}

fn pod_list(pods: &BTreeSet<String>) -> String {
    format!("[{}]", pods.iter().cloned().collect::<Vec<_>>().join(" "))
}

pub fn label(kind: &FindingKind) -> &'static str {
    match kind {
        FindingKind::Drifted { .. } => "Drifted TSC",
        FindingKind::Concentrated { .. } => "Concentrated TSC",
        FindingKind::QueryFailed { .. } => "Unresolvable TSC selector",
    }
}

/// Renders a finding as its text block, trailing blank line included.
pub fn render_text(finding: &Finding) -> String {
    let mut lines = vec![
        label(&finding.kind).to_string(),
        format!(
            "- {}, {}, topologyKey={}, maxSkew={}, selector={}",
            finding.namespace,
            finding.when_unsatisfiable,
            finding.topology_key,
            finding.max_skew,
            finding.selector
        ),
    ];
    match &finding.kind {
        FindingKind::Drifted { expected, actual, .. } => {
            lines.push(format!("- expectedPods={}", pod_list(expected)));
            lines.push(format!("- actualPods  ={}", pod_list(actual)));
        }
        FindingKind::Concentrated { pods, .. } => {
            lines.push(format!("- pods={}", pod_list(pods)));
        }
        FindingKind::QueryFailed { error } => {
            lines.push(format!("- error={}", error));
        }
    }
    lines.push(String::new());
    lines.join("\n") + "\n"
}
