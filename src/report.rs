// SPDX-FileCopyrightText: 2026 GSI Helmholtzzentrum f. Schwerionenforschung GmbH, Darmstadt, Germany
// SPDX-License-Identifier: LGPL-3.0-or-later

//! Status report: fetches the snapshots, resolves queue membership and
//! assembles the per-queue view handed to the renderer.
//!
//! Single-threaded and blocking: every `qstat` call completes before the
//! next one is issued. Jobs live in one arena per run; queue views are
//! computed by filtering it on the queue hash.

use std::collections::HashMap;

use anyhow::Result;
use chrono::{DateTime, Utc};
use log::{debug, info, warn};
use serde::{Serialize, Serializer};

use crate::config::Catalog;
use crate::queue::{aggregate_health, QueueDefinition, QueueHealth};
use crate::sge::{parse_job_detail, parse_job_listing, Job, JobStatus, QueueHash, SnapshotProvider};

/// One row of the job table
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct JobRow {
    pub job_id: u64,
    pub name: String,
    pub user: String,
    pub priority: f64,
    #[serde(serialize_with = "serialize_status")]
    pub status: JobStatus,
    pub cores: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time: Option<DateTime<Utc>>,
}

fn serialize_status<S: Serializer>(status: &JobStatus, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(status.as_token())
}

impl From<&Job> for JobRow {
    fn from(job: &Job) -> Self {
        Self {
            job_id: job.job_id,
            name: job.name.clone(),
            user: job.user.clone(),
            priority: job.priority,
            status: job.status,
            cores: job.ncpu,
            time: job.time,
        }
    }
}

/// Health counters together with the derived totals
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct HealthSummary {
    pub total_cores: u32,
    pub free_cores: u32,
    pub running_cores: u32,
    pub total_nodes: u32,
    pub up_nodes: u32,
    pub down_nodes: u32,
    pub idle_nodes: u32,
    pub running_nodes: u32,
}

impl From<QueueHealth> for HealthSummary {
    fn from(health: QueueHealth) -> Self {
        Self {
            total_cores: health.total_cores(),
            free_cores: health.free_cores(),
            running_cores: health.running_cores,
            total_nodes: health.total_nodes(),
            up_nodes: health.up_nodes,
            down_nodes: health.down_nodes,
            idle_nodes: health.idle_nodes,
            running_nodes: health.running_nodes,
        }
    }
}

/// Everything the renderer needs for one queue
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QueueReport {
    pub machine: String,
    pub queue: String,
    /// Configured slot capacity of the queue's node ranges
    pub capacity_cores: u32,
    /// Job records in the scheduler listing, interesting or not
    pub total_jobs: usize,
    pub jobs: Vec<JobRow>,
    pub health: HealthSummary,
}

/// Per-run state: the configured queues, a hash index over them and the
/// jobs found to use at least one of them.
pub struct StatusReport<P: SnapshotProvider> {
    provider: P,
    queues: Vec<QueueDefinition>,
    by_hash: HashMap<QueueHash, usize>,
    jobs: Vec<Job>,
    total_jobs: usize,
}

impl<P: SnapshotProvider> StatusReport<P> {
    pub fn new(catalog: Catalog, provider: P) -> Self {
        let queues = catalog.into_queues();
        let by_hash = queues
            .iter()
            .enumerate()
            .map(|(i, q)| (q.hash().clone(), i))
            .collect();

        Self {
            provider,
            queues,
            by_hash,
            jobs: Vec::new(),
            total_jobs: 0,
        }
    }

    #[cfg(test)]
    pub fn queues(&self) -> &[QueueDefinition] {
        &self.queues
    }

    pub fn queue(&self, hash: &QueueHash) -> Option<&QueueDefinition> {
        self.by_hash.get(hash).map(|&i| &self.queues[i])
    }

    /// Build the report for one queue. `None` if the hash names no
    /// configured queue; fetch failures only yield empty data.
    pub fn run(&mut self, hash: &QueueHash) -> Option<QueueReport> {
        let index = *self.by_hash.get(hash)?;

        let node_status = self.fetch("node status", |p| p.node_status());
        let health = aggregate_health(&self.queues[index], &node_status);

        self.collect_jobs();

        let queue = &self.queues[index];
        let jobs: Vec<JobRow> = self.jobs_in(hash).map(JobRow::from).collect();
        info!(
            "{} {}: {} of {} jobs, {}/{} nodes up",
            queue.machine(),
            queue.queue_name(),
            jobs.len(),
            self.total_jobs,
            health.up_nodes,
            health.total_nodes()
        );

        Some(QueueReport {
            machine: queue.machine().to_string(),
            queue: queue.queue_name().to_string(),
            capacity_cores: queue.capacity_cores(),
            total_jobs: self.total_jobs,
            jobs,
            health: health.into(),
        })
    }

    /// Jobs using resources of one queue
    pub fn jobs_in<'a>(&'a self, hash: &'a QueueHash) -> impl Iterator<Item = &'a Job> + 'a {
        self.jobs.iter().filter(move |job| job.belongs_to(hash))
    }

    /// Number of job records in the last listing, interesting or not
    pub fn total_jobs(&self) -> usize {
        self.total_jobs
    }

    fn fetch(&self, what: &str, f: impl FnOnce(&P) -> Result<String>) -> String {
        match f(&self.provider) {
            Ok(text) => text,
            Err(e) => {
                warn!("{} unavailable, treating as empty: {:#}", what, e);
                String::new()
            }
        }
    }

    fn collect_jobs(&mut self) {
        let listing = self.fetch("job listing", |p| p.job_listing());
        let candidates = parse_job_listing(&listing);
        self.total_jobs = candidates.len();

        let mut jobs = Vec::new();
        for mut job in candidates {
            // The detail fetch is one qstat call per job; skip running jobs
            // whose primary host lies outside every configured queue.
            if job.status.is_running() && !self.queues.iter().any(|q| q.is_on_nodes(&job)) {
                debug!("job {} on {} is outside all queues", job.job_id, job.host);
                continue;
            }

            self.resolve(&mut job);
            if job.is_on_queue() {
                jobs.push(job);
            }
        }

        self.jobs = jobs;
    }

    /// Merge the job's detail document and record every queue it belongs to
    fn resolve(&self, job: &mut Job) {
        let job_id = job.job_id;
        let xml = self.fetch(&format!("detail of job {}", job_id), |p| p.job_detail(job_id));
        let detail = parse_job_detail(&xml);
        detail.apply_to(job);

        for queue in &self.queues {
            if queue.is_in_queue(job, &detail.queue_name) {
                job.add_queue_hash(queue.hash().clone());
            }
        }
        debug!(
            "job {} ({}) in {} queue(s)",
            job_id,
            job.status,
            job.queue_hashes().len()
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    use anyhow::anyhow;

    const LISTING: &str = "\
job-ID  prior   name       user         state submit/start at     queue                          slots ja-task-ID
-----------------------------------------------------------------------------------------------------------------
 812345 5.00000 adcirc     zcobell      r     10/18/2026 10:15:02 long@d12chas042.crc.nd.edu         4
 812346 0.50000 swan       jdoe         qw    10/18/2026 10:20:11                                    8
 812347 0.50000 athos_job  jdoe         r     10/18/2026 10:20:11 long@d6cneh010.crc.nd.edu         12
 812348 0.50000 stray      jdoe         r     10/18/2026 10:20:11 long@d12chas005.crc.nd.edu        12
 812349 0.50000 weird      jdoe         zz    10/18/2026 10:20:11                                    1
";

    const NODE_STATUS: &str = "\
queuename                      qtype resv/used/tot. load_avg arch          states
---------------------------------------------------------------------------------
long@d12chas040.crc.nd.edu     BIP   0/24/24        24.00    lx-amd64
long@d12chas041.crc.nd.edu     BIP   0/24/24        24.00    lx-amd64
long@d12chas042.crc.nd.edu     BIP   0/4/24         4.00     lx-amd64
long@d12chas043.crc.nd.edu     BIP   0/0/24         -NA-     lx-amd64      au
long@d12chas044.crc.nd.edu     BIP   0/0/24         0.00     lx-amd64
";

    fn detail(queue: &str, name: &str, slots: u32, hosts: &[&str]) -> String {
        let mut xml = format!(
            "<detailed_job_info><djob_info><element><JB_job_name>{}</JB_job_name>\
             <QR_name>{}</QR_name><JB_pe_range><ranges><RN_max>{}</RN_max></ranges>\
             <ranges><RN_max>99</RN_max></ranges></JB_pe_range>",
            name, queue, slots
        );
        for (i, host) in hosts.iter().enumerate() {
            xml.push_str(&format!("<PET_id>{}.{}</PET_id>", i + 1, host));
        }
        xml.push_str("</element></djob_info></detailed_job_info>");
        xml
    }

    struct FakeQstat {
        listing: Option<String>,
        node_status: Option<String>,
        details: HashMap<u64, String>,
        detail_calls: RefCell<Vec<u64>>,
    }

    impl FakeQstat {
        fn new() -> Self {
            let mut details = HashMap::new();
            details.insert(
                812345,
                detail("*@@westerink_d12chas_1488", "adcirc_full_name", 4, &["d12chas041", "d12chas042"]),
            );
            details.insert(812346, detail("@@westerink_d12chas_984", "swan", 8, &[]));
            details.insert(812347, detail("*@@westerink_d6cneh", "athos_job", 12, &["d6cneh010"]));
            details.insert(812349, detail("@@westerink_d12chas_1992", "weird", 1, &[]));

            Self {
                listing: Some(LISTING.to_string()),
                node_status: Some(NODE_STATUS.to_string()),
                details,
                detail_calls: RefCell::new(Vec::new()),
            }
        }

        fn offline() -> Self {
            Self {
                listing: None,
                node_status: None,
                details: HashMap::new(),
                detail_calls: RefCell::new(Vec::new()),
            }
        }
    }

    impl SnapshotProvider for FakeQstat {
        fn job_listing(&self) -> Result<String> {
            self.listing.clone().ok_or_else(|| anyhow!("qstat: not found"))
        }

        fn job_detail(&self, job_id: u64) -> Result<String> {
            self.detail_calls.borrow_mut().push(job_id);
            self.details
                .get(&job_id)
                .cloned()
                .ok_or_else(|| anyhow!("job {} does not exist", job_id))
        }

        fn node_status(&self) -> Result<String> {
            self.node_status.clone().ok_or_else(|| anyhow!("qstat: not found"))
        }
    }

    fn hash_of(report: &StatusReport<FakeQstat>, queue: &str) -> QueueHash {
        report
            .queues()
            .iter()
            .find(|q| q.queue_name() == queue)
            .map(|q| q.hash().clone())
            .unwrap()
    }

    #[test]
    fn test_running_job_resolved_into_queue() {
        let mut report = StatusReport::new(Catalog::builtin(), FakeQstat::new());
        let hash = hash_of(&report, "@@westerink_d12chas_1488");

        let view = report.run(&hash).unwrap();
        assert_eq!(view.machine, "Aegaeon");
        assert_eq!(view.capacity_cores, 62 * 24);
        assert_eq!(view.queue, "@@westerink_d12chas_1488");
        assert_eq!(view.jobs.len(), 1);

        let job = &view.jobs[0];
        assert_eq!(job.job_id, 812345);
        assert_eq!(job.name, "adcirc_full_name");
        assert_eq!(job.user, "zcobell");
        assert_eq!(job.priority, 5.0);
        assert_eq!(job.status, JobStatus::Running);
        assert_eq!(job.cores, 4);
    }

    #[test]
    fn test_health_for_selected_queue() {
        let mut report = StatusReport::new(Catalog::builtin(), FakeQstat::new());
        let hash = hash_of(&report, "@@westerink_d12chas_1488");

        let health = report.run(&hash).unwrap().health;
        assert_eq!(health.total_nodes, 4);
        assert_eq!(health.up_nodes, 3);
        assert_eq!(health.down_nodes, 1);
        assert_eq!(health.idle_nodes, 1);
        assert_eq!(health.running_nodes, 2);
        assert_eq!(health.running_cores, 28);
        assert_eq!(health.free_cores, 20 + 24);
        assert_eq!(health.total_cores, 96);
    }

    #[test]
    fn test_job_spanning_queues_is_listed_in_each() {
        let mut report = StatusReport::new(Catalog::builtin(), FakeQstat::new());
        let wide = hash_of(&report, "@@westerink_d12chas_1992");
        let narrow = hash_of(&report, "@@westerink_d12chas_1008");
        let split = hash_of(&report, "@@westerink_d12chas_504");

        report.run(&wide).unwrap();
        assert_eq!(report.jobs_in(&wide).count(), 1);
        assert_eq!(report.jobs_in(&narrow).count(), 1);
        assert_eq!(report.jobs_in(&split).count(), 0);
    }

    #[test]
    fn test_pending_job_matched_by_name() {
        let mut report = StatusReport::new(Catalog::builtin(), FakeQstat::new());
        let hash = hash_of(&report, "@@westerink_d12chas_984");

        let view = report.run(&hash).unwrap();
        let ids: Vec<u64> = view.jobs.iter().map(|j| j.job_id).collect();
        assert_eq!(ids, vec![812346]);
        assert_eq!(view.jobs[0].status, JobStatus::Pending);
        assert_eq!(view.jobs[0].cores, 8);
    }

    #[test]
    fn test_prefilter_skips_detail_fetch() {
        let mut report = StatusReport::new(Catalog::builtin(), FakeQstat::new());
        let hash = hash_of(&report, "@@westerink_d6cneh");

        let view = report.run(&hash).unwrap();
        assert_eq!(view.jobs.len(), 1);
        assert_eq!(view.jobs[0].job_id, 812347);

        // 812348 runs on d12chas005, outside every range: never fetched.
        // Each other job is fetched exactly once.
        let calls = report.provider.detail_calls.borrow().clone();
        assert_eq!(calls, vec![812345, 812346, 812347, 812349]);
    }

    #[test]
    fn test_unknown_status_never_in_a_queue() {
        let mut report = StatusReport::new(Catalog::builtin(), FakeQstat::new());
        let hash = hash_of(&report, "@@westerink_d12chas_1992");

        report.run(&hash).unwrap();
        assert_eq!(report.total_jobs(), 5);
        assert_eq!(report.run(&hash).unwrap().total_jobs, 5);
        assert!(report.jobs.iter().all(|j| j.job_id != 812349));
        assert!(report.jobs.iter().all(|j| j.job_id != 812348));
        assert_eq!(report.jobs.len(), 3);
    }

    #[test]
    fn test_runs_do_not_accumulate() {
        let mut report = StatusReport::new(Catalog::builtin(), FakeQstat::new());
        let hash = hash_of(&report, "@@westerink_d12chas_1488");

        let first = report.run(&hash).unwrap();
        let second = report.run(&hash).unwrap();
        assert_eq!(first, second);
        assert_eq!(report.jobs.len(), 3);
    }

    #[test]
    fn test_offline_scheduler_yields_empty_report() {
        let mut report = StatusReport::new(Catalog::builtin(), FakeQstat::offline());
        let hash = hash_of(&report, "@@westerink_d12chas_1488");

        let view = report.run(&hash).unwrap();
        assert!(view.jobs.is_empty());
        assert_eq!(view.health.total_nodes, 0);
        assert_eq!(report.total_jobs(), 0);
    }

    #[test]
    fn test_unknown_queue_hash() {
        let mut report = StatusReport::new(Catalog::builtin(), FakeQstat::new());
        assert!(report.run(&QueueHash("0000".to_string())).is_none());
        assert!(report.queue(&QueueHash("0000".to_string())).is_none());
        assert!(report.provider.detail_calls.borrow().is_empty());
    }

    #[test]
    fn test_report_serializes_status_token() {
        let mut report = StatusReport::new(Catalog::builtin(), FakeQstat::new());
        let hash = hash_of(&report, "@@westerink_d12chas_984");

        let view = report.run(&hash).unwrap();
        let json = serde_json::to_string(&view).unwrap();
        assert!(json.contains("\"status\":\"qw\""));
        assert!(json.contains("\"queue\":\"@@westerink_d12chas_984\""));
        assert!(json.contains("\"total_nodes\":"));
    }
}
