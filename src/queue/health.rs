// SPDX-FileCopyrightText: 2026 GSI Helmholtzzentrum f. Schwerionenforschung GmbH, Darmstadt, Germany
// SPDX-License-Identifier: LGPL-3.0-or-later

//! Per-queue node and core health from a `qstat -f` snapshot.

use serde::Serialize;

use super::types::QueueDefinition;
use crate::sge::parser::{parse_index, split_trailing};

/// Field count of a queue instance line whose host is down or unreachable
/// (the trailing `states` column is only printed for such hosts)
const DOWN_NODE_FIELDS: usize = 6;

/// Live counters for one queue. Always computed from scratch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct QueueHealth {
    pub up_nodes: u32,
    pub down_nodes: u32,
    pub idle_nodes: u32,
    pub running_nodes: u32,
    pub idle_cores: u32,
    pub running_cores: u32,
    /// Slots per node, copied from the queue definition
    pub core_size: u32,
}

impl QueueHealth {
    pub fn total_nodes(&self) -> u32 {
        self.up_nodes.saturating_add(self.down_nodes)
    }

    /// Nominal slots on every reporting node, down ones included
    pub fn total_cores(&self) -> u32 {
        self.total_nodes().saturating_mul(self.core_size)
    }

    pub fn free_cores(&self) -> u32 {
        self.idle_cores
    }

    fn record(&mut self, state: NodeState) {
        match state {
            NodeState::Down => self.down_nodes = self.down_nodes.saturating_add(1),
            NodeState::Up { used: 0 } => {
                self.up_nodes = self.up_nodes.saturating_add(1);
                self.idle_nodes = self.idle_nodes.saturating_add(1);
                self.idle_cores = self.idle_cores.saturating_add(self.core_size);
            }
            NodeState::Up { used } => {
                self.up_nodes = self.up_nodes.saturating_add(1);
                self.running_nodes = self.running_nodes.saturating_add(1);
                self.running_cores = self.running_cores.saturating_add(used);
                self.idle_cores = self.idle_cores.saturating_add(self.core_size.saturating_sub(used));
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum NodeState {
    Down,
    Up { used: u32 },
}

/// Count up/down/idle/running nodes and cores of `queue`.
///
/// Lines whose host field lacks the queue's node prefix, whose node index
/// does not parse, or whose index falls outside the queue's ranges are skipped.
pub fn aggregate_health(queue: &QueueDefinition, node_status: &str) -> QueueHealth {
    let mut health = QueueHealth {
        core_size: queue.core_size(),
        ..QueueHealth::default()
    };

    for line in node_status.lines() {
        let Some((node, state)) = parse_node_line(line, queue.node_prefix(), queue.name_width()) else {
            continue;
        };
        if queue.contains_node(node) {
            health.record(state);
        }
    }

    health
}

/// `long@d12chas042.crc.nd.edu  BIP  0/24/24  24.03  lx-amd64  [states]`
///
/// The queue instance name may itself contain dots (`all.q@...`).
fn parse_node_line(line: &str, prefix: &str, width: usize) -> Option<(i32, NodeState)> {
    let fields: Vec<&str> = line.split_whitespace().collect();
    let host_field = fields.first()?;
    if !host_field.contains(prefix) {
        return None;
    }

    let host = host_field.rsplit_once('@').map_or(*host_field, |(_, host)| host);
    let host = host.split('.').next()?;
    let (_, suffix) = split_trailing(host, width)?;
    let node = parse_index(suffix)?;

    if fields.len() == DOWN_NODE_FIELDS {
        return Some((node, NodeState::Down));
    }

    // resv/used/tot
    let used = fields
        .get(2)
        .and_then(|load| load.split('/').nth(1))
        .and_then(|used| used.parse().ok())
        .unwrap_or(0);

    Some((node, NodeState::Up { used }))
}
