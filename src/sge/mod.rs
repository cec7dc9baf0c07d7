// SPDX-FileCopyrightText: 2026 GSI Helmholtzzentrum f. Schwerionenforschung GmbH, Darmstadt, Germany
// SPDX-License-Identifier: LGPL-3.0-or-later

//! Grid Engine integration: job entities, `qstat` parsers and the snapshot source.

pub mod parser;
pub mod qstat;
pub mod types;

pub use parser::{parse_job_detail, parse_job_listing};
pub use qstat::{QstatCommand, SnapshotProvider};
pub use types::{Job, JobStatus, QueueHash};
