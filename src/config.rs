// SPDX-FileCopyrightText: 2026 GSI Helmholtzzentrum f. Schwerionenforschung GmbH, Darmstadt, Germany
// SPDX-License-Identifier: LGPL-3.0-or-later

//! Queue catalog: the subsystems a report can be requested for.
//!
//! The catalog is either the built-in list or a TOML file of the form
//!
//! ```toml
//! [[queue]]
//! machine = "Aegaeon"
//! queue = "@@westerink_d12chas_984"
//! node_prefix = "d12chas"
//! ranges = [[20, 40], [83, 102]]
//! core_size = 24
//! name_width = 3
//! ```

use std::fs;
use std::path::Path;

use anyhow::{bail, Context, Result};
use serde::Deserialize;

use crate::queue::{NodeRange, QueueDefinition};

/// One `[[queue]]` table of a catalog file
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct QueueEntry {
    pub machine: String,
    pub queue: String,
    pub node_prefix: String,
    /// One or two inclusive `[start, end]` node index ranges
    pub ranges: Vec<[i32; 2]>,
    pub core_size: u32,
    pub name_width: usize,
}

impl QueueEntry {
    fn to_definition(&self) -> Result<QueueDefinition> {
        if self.name_width == 0 {
            bail!("queue '{}': name_width must be at least 1", self.queue);
        }

        let mut ranges = Vec::with_capacity(self.ranges.len());
        for &[start, end] in &self.ranges {
            if start > end {
                bail!("queue '{}': range [{}, {}] is reversed", self.queue, start, end);
            }
            ranges.push(NodeRange::new(start, end));
        }

        let definition = match ranges.as_slice() {
            [only] => QueueDefinition::new(
                &self.machine,
                &self.queue,
                &self.node_prefix,
                *only,
                self.core_size,
                self.name_width,
            ),
            [first, second] => QueueDefinition::with_two_ranges(
                &self.machine,
                &self.queue,
                &self.node_prefix,
                *first,
                *second,
                self.core_size,
                self.name_width,
            ),
            _ => bail!(
                "queue '{}': expected one or two node ranges, got {}",
                self.queue,
                ranges.len()
            ),
        };
        Ok(definition)
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct CatalogFile {
    #[serde(default, rename = "queue")]
    queues: Vec<QueueEntry>,
}

/// Ordered list of configured queues. Order is the menu order.
#[derive(Debug, Clone)]
pub struct Catalog {
    queues: Vec<QueueDefinition>,
}

impl Catalog {
    pub fn new(queues: Vec<QueueDefinition>) -> Self {
        Self { queues }
    }

    /// The stock subsystems of the Aegaeon, Athos and Proteus machines
    pub fn builtin() -> Self {
        let d12chas = |queue: &str, start: i32, end: i32| {
            QueueDefinition::new("Aegaeon", queue, "d12chas", NodeRange::new(start, end), 24, 3)
        };

        Self::new(vec![
            d12chas("@@westerink_d12chas_1992", 20, 102),
            d12chas("@@westerink_d12chas_1488", 41, 102),
            d12chas("@@westerink_d12chas_1008", 41, 82),
            QueueDefinition::with_two_ranges(
                "Aegaeon",
                "@@westerink_d12chas_984",
                "d12chas",
                NodeRange::new(20, 40),
                NodeRange::new(83, 102),
                24,
                3,
            ),
            d12chas("@@westerink_d12chas_504", 20, 40),
            QueueDefinition::new("Athos", "@@westerink_d6cneh", "d6cneh", NodeRange::new(1, 83), 12, 3),
            QueueDefinition::new("Proteus", "@@westerink_graphics", "proteus", NodeRange::new(1, 2), 12, 1),
        ])
    }

    /// Load a catalog file
    pub fn load(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("failed to read catalog file {}", path.display()))?;
        Self::from_toml(&contents)
            .with_context(|| format!("failed to parse catalog file {}", path.display()))
    }

    pub fn from_toml(contents: &str) -> Result<Self> {
        let file: CatalogFile = toml::from_str(contents)?;
        if file.queues.is_empty() {
            bail!("catalog defines no queues");
        }

        let queues = file
            .queues
            .iter()
            .map(QueueEntry::to_definition)
            .collect::<Result<Vec<_>>>()?;
        Ok(Self::new(queues))
    }

    pub fn queues(&self) -> &[QueueDefinition] {
        &self.queues
    }

    pub fn into_queues(self) -> Vec<QueueDefinition> {
        self.queues
    }

    /// Find a queue by 1-based menu index or by exact queue name
    pub fn select(&self, selector: &str) -> Option<&QueueDefinition> {
        let selector = selector.trim();
        if let Ok(index) = selector.parse::<usize>() {
            return index.checked_sub(1).and_then(|i| self.queues.get(i));
        }
        self.queues.iter().find(|q| q.queue_name() == selector)
    }
}
