// SPDX-FileCopyrightText: 2026 GSI Helmholtzzentrum f. Schwerionenforschung GmbH, Darmstadt, Germany
// SPDX-License-Identifier: LGPL-3.0-or-later

//! Grid Engine CLI integration: raw snapshots via `qstat`.

use std::process::Command;

use anyhow::{anyhow, Context, Result};
use log::debug;

/// Source of the three raw snapshots a report is built from
pub trait SnapshotProvider {
    /// Tabular listing of all jobs (`qstat`)
    fn job_listing(&self) -> Result<String>;

    /// Detail document of one job (`qstat -xml -j <id>`)
    fn job_detail(&self, job_id: u64) -> Result<String>;

    /// Per-node queue instance status (`qstat -f`)
    fn node_status(&self) -> Result<String>;
}

/// Runs the `qstat` executable and captures its stdout
#[derive(Debug, Clone)]
pub struct QstatCommand {
    program: String,
}

impl QstatCommand {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }

    fn run(&self, args: &[&str]) -> Result<String> {
        debug!("running {} {}", self.program, args.join(" "));

        let output = Command::new(&self.program)
            .args(args)
            .output()
            .with_context(|| format!("Failed to execute {}", self.program))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(anyhow!(
                "{} {} failed ({}): {}",
                self.program,
                args.join(" "),
                output.status,
                stderr.trim()
            ));
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

impl Default for QstatCommand {
    fn default() -> Self {
        Self::new("qstat")
    }
}

impl SnapshotProvider for QstatCommand {
    fn job_listing(&self) -> Result<String> {
        self.run(&[])
    }

    fn job_detail(&self, job_id: u64) -> Result<String> {
        self.run(&["-xml", "-j", &job_id.to_string()])
    }

    fn node_status(&self) -> Result<String> {
        self.run(&["-f"])
    }
}

/// Check if the scheduler CLI is available
pub fn is_available(program: &str) -> bool {
    Command::new(program)
        .arg("-help")
        .output()
        .map(|o| o.status.success())
        .unwrap_or(false)
}
