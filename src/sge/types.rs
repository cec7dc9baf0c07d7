// SPDX-FileCopyrightText: 2026 GSI Helmholtzzentrum f. Schwerionenforschung GmbH, Darmstadt, Germany
// SPDX-License-Identifier: LGPL-3.0-or-later

//! Job entities as reported by Grid Engine's `qstat`.

use std::fmt;

use chrono::{DateTime, Utc};

/// Node index used when a host name carries no parsable numeric suffix
pub const UNKNOWN_NODE: i32 = -1;

/// Job state as reported in the `state` column of `qstat`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum JobStatus {
    Running,
    Pending,
    Held,
    Suspended,
    Error,
    Deleted,
    Unknown,
}

impl From<&str> for JobStatus {
    fn from(s: &str) -> Self {
        match s {
            "r" | "t" | "Rr" | "Rt" => JobStatus::Running,
            "qw" | "wq" => JobStatus::Pending,
            "hRqw" | "hqw" | "hRwq" | "hwq" => JobStatus::Held,
            "s" | "S" | "ts" | "tS" | "T" | "tT" => JobStatus::Suspended,
            "Eqw" | "Ehqw" | "EhRqw" => JobStatus::Error,
            "dr" | "dt" | "dRr" | "dRt" | "ds" | "dT" | "dRs" | "dRS" | "dRT" => JobStatus::Deleted,
            _ => JobStatus::Unknown,
        }
    }
}

impl JobStatus {
    /// Canonical display token. Several scheduler aliases collapse onto each one.
    pub fn as_token(&self) -> &'static str {
        match self {
            JobStatus::Running => "r",
            JobStatus::Pending => "qw",
            JobStatus::Held => "h",
            JobStatus::Suspended => "s",
            JobStatus::Deleted => "d",
            JobStatus::Error => "e",
            JobStatus::Unknown => "?",
        }
    }

    /// Running jobs are located by node placement, everything else by queue name
    pub fn is_running(&self) -> bool {
        matches!(self, JobStatus::Running)
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_token())
    }
}

/// Content-derived identity of a configured queue (hex digest)
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct QueueHash(pub String);

impl fmt::Display for QueueHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One scheduler-tracked job, built from a `qstat` listing line and
/// enriched in place with its `qstat -xml -j` detail.
#[derive(Debug, Clone, PartialEq)]
pub struct Job {
    /// Job number
    pub job_id: u64,
    /// Scheduling priority
    pub priority: f64,
    /// Job name (truncated in the listing, corrected from the detail document)
    pub name: String,
    /// Owning user
    pub user: String,
    /// Lifecycle state
    pub status: JobStatus,
    /// Submit or start time, in UTC
    pub time: Option<DateTime<Utc>>,
    /// Host part of the `queue@host` column
    pub host: String,
    /// Host name with the trailing node index stripped (e.g. `d12chas`)
    pub core_name: String,
    /// Trailing node index of the primary host, or [`UNKNOWN_NODE`]
    pub core_number: i32,
    /// Slot count from the detail document
    pub ncpu: u32,
    pub(super) queue_hashes: Vec<QueueHash>,
    pub(super) nodes: Vec<i32>,
}

impl Default for Job {
    fn default() -> Self {
        Self {
            job_id: 0,
            priority: 0.0,
            name: String::new(),
            user: String::new(),
            status: JobStatus::Unknown,
            time: None,
            host: String::new(),
            core_name: String::new(),
            core_number: UNKNOWN_NODE,
            ncpu: 0,
            queue_hashes: Vec::new(),
            nodes: Vec::new(),
        }
    }
}

impl Job {
    /// Record an occupied node index. Duplicates are ignored.
    pub fn add_node(&mut self, node: i32) {
        if !self.nodes.contains(&node) {
            self.nodes.push(node);
        }
    }

    /// Occupied node indices in discovery order
    pub fn nodes(&self) -> &[i32] {
        &self.nodes
    }

    /// Mark this job as using resources of the given queue. Duplicates are ignored.
    pub fn add_queue_hash(&mut self, hash: QueueHash) {
        if !self.queue_hashes.contains(&hash) {
            self.queue_hashes.push(hash);
        }
    }

    pub fn belongs_to(&self, hash: &QueueHash) -> bool {
        self.queue_hashes.contains(hash)
    }

    /// A job is of interest once it belongs to at least one configured queue
    pub fn is_on_queue(&self) -> bool {
        !self.queue_hashes.is_empty()
    }

    pub fn queue_hashes(&self) -> &[QueueHash] {
        &self.queue_hashes
    }
}
