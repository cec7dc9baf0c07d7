// SPDX-FileCopyrightText: 2026 GSI Helmholtzzentrum f. Schwerionenforschung GmbH, Darmstadt, Germany
// SPDX-License-Identifier: LGPL-3.0-or-later

//! Logical queues: configured partitions of a machine's node index space.

use std::fmt::Write as _;

use sha2::{Digest as _, Sha256};

use crate::sge::types::UNKNOWN_NODE;
use crate::sge::{Job, JobStatus, QueueHash};

/// Inclusive range of node indices
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NodeRange {
    pub start: i32,
    pub end: i32,
}

impl NodeRange {
    pub fn new(start: i32, end: i32) -> Self {
        Self { start, end }
    }

    pub fn contains(&self, node: i32) -> bool {
        node >= self.start && node <= self.end
    }

    /// Number of node indices covered
    pub fn node_count(&self) -> u32 {
        let count = (i64::from(self.end) - i64::from(self.start) + 1).max(0);
        u32::try_from(count).unwrap_or(u32::MAX)
    }
}

/// A configured subsystem: node prefix, one or two node ranges and the
/// per-node slot count. Immutable once built; identity is a digest over
/// every field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueueDefinition {
    machine: String,
    queue_name: String,
    node_prefix: String,
    first: NodeRange,
    second: Option<NodeRange>,
    core_size: u32,
    name_width: usize,
    hash: QueueHash,
}

impl QueueDefinition {
    /// Queue over one contiguous node range
    pub fn new(
        machine: &str,
        queue_name: &str,
        node_prefix: &str,
        range: NodeRange,
        core_size: u32,
        name_width: usize,
    ) -> Self {
        Self::build(machine, queue_name, node_prefix, range, None, core_size, name_width)
    }

    /// Queue whose nodes are numbered in two disjoint bands
    pub fn with_two_ranges(
        machine: &str,
        queue_name: &str,
        node_prefix: &str,
        first: NodeRange,
        second: NodeRange,
        core_size: u32,
        name_width: usize,
    ) -> Self {
        Self::build(machine, queue_name, node_prefix, first, Some(second), core_size, name_width)
    }

    fn build(
        machine: &str,
        queue_name: &str,
        node_prefix: &str,
        first: NodeRange,
        second: Option<NodeRange>,
        core_size: u32,
        name_width: usize,
    ) -> Self {
        let mut queue = Self {
            machine: machine.to_string(),
            queue_name: queue_name.to_string(),
            node_prefix: node_prefix.to_string(),
            first,
            second,
            core_size,
            name_width,
            hash: QueueHash(String::new()),
        };
        queue.hash = queue.compute_hash();
        queue
    }

    fn compute_hash(&self) -> QueueHash {
        let second = self.second.unwrap_or(NodeRange::new(-1, -1));
        let fields = [
            self.machine.clone(),
            self.queue_name.clone(),
            self.node_prefix.clone(),
            self.first.start.to_string(),
            self.first.end.to_string(),
            second.start.to_string(),
            second.end.to_string(),
            self.core_size.to_string(),
            self.name_width.to_string(),
        ];

        let mut hasher = Sha256::new();
        for field in &fields {
            hasher.update(field.as_bytes());
            hasher.update([0u8]);
        }

        let digest = hasher.finalize();
        let mut out = String::with_capacity(64);
        for b in digest {
            let _ = write!(&mut out, "{:02x}", b);
        }
        QueueHash(out)
    }

    pub fn machine(&self) -> &str {
        &self.machine
    }

    pub fn queue_name(&self) -> &str {
        &self.queue_name
    }

    pub fn node_prefix(&self) -> &str {
        &self.node_prefix
    }

    pub fn core_size(&self) -> u32 {
        self.core_size
    }

    /// Digits in the node index suffix of `qstat -f` host names
    pub fn name_width(&self) -> usize {
        self.name_width
    }

    pub fn hash(&self) -> &QueueHash {
        &self.hash
    }

    pub fn ranges(&self) -> impl Iterator<Item = NodeRange> + '_ {
        std::iter::once(self.first).chain(self.second)
    }

    pub fn contains_node(&self, node: i32) -> bool {
        self.ranges().any(|r| r.contains(node))
    }

    /// Configured slot capacity, independent of live node health
    pub fn capacity_cores(&self) -> u32 {
        self.ranges()
            .map(|r| r.node_count().saturating_mul(self.core_size))
            .fold(0, u32::saturating_add)
    }

    /// Cheap prefilter on the job's primary host only. Used to decide
    /// whether fetching the detail document is worth it for a running job.
    pub fn is_on_nodes(&self, job: &Job) -> bool {
        job.core_number != UNKNOWN_NODE
            && job.core_name == self.node_prefix
            && self.contains_node(job.core_number)
    }

    /// Membership test once the job's detail has been merged in.
    ///
    /// Running jobs match by placement: same node prefix and at least one
    /// occupied node inside a range, so a job spread over several queues
    /// belongs to each of them. Jobs without placement match by the queue
    /// name from their detail document. Unknown jobs never match.
    pub fn is_in_queue(&self, job: &Job, queue_name: &str) -> bool {
        match job.status {
            JobStatus::Running => {
                job.core_name == self.node_prefix
                    && job.nodes().iter().any(|&n| self.contains_node(n))
            }
            JobStatus::Pending
            | JobStatus::Held
            | JobStatus::Suspended
            | JobStatus::Error
            | JobStatus::Deleted => self.queue_name == queue_name,
            JobStatus::Unknown => false,
        }
    }
}
