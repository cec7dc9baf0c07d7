// SPDX-FileCopyrightText: 2026 GSI Helmholtzzentrum f. Schwerionenforschung GmbH, Darmstadt, Germany
// SPDX-License-Identifier: LGPL-3.0-or-later

//! Best-effort parsers for `qstat` output. None of these return errors:
//! truncated or garbled input yields entities with sentinel fields.

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use quick_xml::events::Event;
use quick_xml::Reader;

use super::types::{Job, JobStatus, UNKNOWN_NODE};

/// Width of the node index suffix in listing host names
const CORE_SUFFIX_WIDTH: usize = 3;

/// Number of header lines at the top of a `qstat` job listing
const LISTING_HEADER_LINES: usize = 2;

/// Parse the full `qstat` job listing, skipping the header and blank lines
pub fn parse_job_listing(output: &str) -> Vec<Job> {
    output
        .lines()
        .skip(LISTING_HEADER_LINES)
        .filter(|l| !l.trim().is_empty())
        .map(parse_job_line)
        .collect()
}

/// Parse one listing line:
/// `id priority name user state date time queue@host [slots]`
pub fn parse_job_line(line: &str) -> Job {
    let fields: Vec<&str> = line.split_whitespace().collect();
    let field = |i: usize| fields.get(i).copied().unwrap_or("");

    let host = field(7).split('@').nth(1).unwrap_or("");
    let core = host.split('.').next().unwrap_or("");
    let (core_name, core_number) = split_core(core);

    Job {
        job_id: field(0).parse().unwrap_or(0),
        priority: field(1).parse().unwrap_or(0.0),
        name: field(2).to_string(),
        user: field(3).to_string(),
        status: JobStatus::from(field(4)),
        time: parse_timestamp(field(5), field(6)),
        host: host.to_string(),
        core_name: core_name.to_string(),
        core_number,
        ..Job::default()
    }
}

/// Split a short host name into its node prefix and trailing node index.
///
/// The last three characters are always stripped from the prefix, even when
/// they do not form a number. Names shorter than three characters keep their
/// full text as prefix. Both failure modes give [`UNKNOWN_NODE`].
fn split_core(core: &str) -> (&str, i32) {
    match split_trailing(core, CORE_SUFFIX_WIDTH) {
        Some((prefix, suffix)) => (prefix, parse_index(suffix).unwrap_or(UNKNOWN_NODE)),
        None => (core, UNKNOWN_NODE),
    }
}

/// Split off the last `width` characters. `None` if the text is shorter.
pub(crate) fn split_trailing(s: &str, width: usize) -> Option<(&str, &str)> {
    if width == 0 {
        return Some((s, ""));
    }
    let (start, _) = s.char_indices().rev().nth(width - 1)?;
    Some((&s[..start], &s[start..]))
}

/// Parse a node index made only of ASCII digits
pub(crate) fn parse_index(s: &str) -> Option<i32> {
    if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    s.parse().ok()
}

/// `qstat` prints `mm/dd/yyyy HH:MM:SS`, interpreted as UTC.
/// A bad time falls back to midnight; a bad date gives `None`.
fn parse_timestamp(date: &str, time: &str) -> Option<DateTime<Utc>> {
    let date = NaiveDate::parse_from_str(date, "%m/%d/%Y").ok()?;
    let time = NaiveTime::parse_from_str(time, "%H:%M:%S").unwrap_or_default();
    Some(date.and_time(time).and_utc())
}

/// Fields extracted from a `qstat -xml -j <id>` document
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct JobDetail {
    /// Queue the scheduler reports for the job, without the `*` marker
    pub queue_name: String,
    /// Untruncated job name
    pub job_name: String,
    /// First `RN_max` seen. Later ranges are ignored.
    pub slots: Option<u32>,
    /// Node indices from `PET_id` and `JG_qhostname`, insertion-unique
    pub nodes: Vec<i32>,
}

enum DetailField {
    QueueName,
    SlotCount,
    JobName,
    TaskId,
    QueueHost,
}

impl JobDetail {
    fn apply(&mut self, field: DetailField, text: &str) {
        match field {
            DetailField::QueueName => {
                self.queue_name = text.strip_prefix('*').unwrap_or(text).to_string();
            }
            DetailField::SlotCount => {
                if self.slots.is_none() {
                    self.slots = Some(text.parse().unwrap_or(0));
                }
            }
            DetailField::JobName => {
                self.job_name = text.to_string();
            }
            // `1.d12chas041`: host follows the task number
            DetailField::TaskId => {
                self.add_node(text.split('.').nth(1).unwrap_or(""));
            }
            // `d12chas041.crc.nd.edu`
            DetailField::QueueHost => {
                self.add_node(text.split('.').next().unwrap_or(""));
            }
        }
    }

    fn add_node(&mut self, host: &str) {
        if let Some(node) = node_index(host) {
            if !self.nodes.contains(&node) {
                self.nodes.push(node);
            }
        }
    }

    /// Merge into a listing entry: slot count, corrected name, occupied nodes
    pub fn apply_to(&self, job: &mut Job) {
        job.ncpu = self.slots.unwrap_or(0);
        if !self.job_name.is_empty() {
            job.name = self.job_name.clone();
        }
        for &node in &self.nodes {
            job.add_node(node);
        }
    }
}

/// Trailing three characters as a node index, falling back to the last one
fn node_index(host: &str) -> Option<i32> {
    split_trailing(host, 3)
        .and_then(|(_, suffix)| parse_index(suffix))
        .or_else(|| split_trailing(host, 1).and_then(|(_, suffix)| parse_index(suffix)))
}

/// Parse a job detail document. Parsing stops at the first malformed
/// element; whatever was gathered up to that point is kept.
pub fn parse_job_detail(xml: &str) -> JobDetail {
    let mut detail = JobDetail::default();
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => {
                let field = match e.name().as_ref() {
                    b"QR_name" => DetailField::QueueName,
                    b"RN_max" => DetailField::SlotCount,
                    b"JB_job_name" => DetailField::JobName,
                    b"PET_id" => DetailField::TaskId,
                    b"JG_qhostname" => DetailField::QueueHost,
                    _ => continue,
                };
                let raw = match reader.read_text(e.name()) {
                    Ok(text) => text,
                    Err(_) => break,
                };
                let text = quick_xml::escape::unescape(&raw)
                    .map(|t| t.into_owned())
                    .unwrap_or_else(|_| raw.to_string());
                detail.apply(field, text.trim());
            }
            Ok(Event::Eof) | Err(_) => break,
            Ok(_) => {}
        }
    }

    detail
}
