// SPDX-FileCopyrightText: 2026 GSI Helmholtzzentrum f. Schwerionenforschung GmbH, Darmstadt, Germany
// SPDX-License-Identifier: LGPL-3.0-or-later

use std::io::{self, Write};

use crossterm::style::{Color, Stylize};

use crate::queue::QueueDefinition;
use crate::report::{JobRow, QueueReport};
use crate::sge::JobStatus;

/// Colors for the report
const BORDER_COLOR: Color = Color::Cyan;
const OWN_USER_COLOR: Color = Color::Red;

/// Column widths
const COL_JID: usize = 7;
const COL_NAME: usize = 30;
const COL_USER: usize = 10;
const COL_STATUS: usize = 9;
const COL_CORES: usize = 9;

/// Width between the outer `|` characters
const INNER_WIDTH: usize = COL_JID + COL_NAME + COL_USER + COL_STATUS + COL_CORES + 15;

#[derive(Debug, Clone, Default)]
pub struct RenderOptions {
    /// Emit ANSI colors
    pub color: bool,
    /// Rows owned by this user are highlighted
    pub current_user: Option<String>,
}

struct Painter {
    color: bool,
}

impl Painter {
    fn paint(&self, text: &str, color: Option<Color>) -> String {
        match color {
            Some(color) if self.color => text.with(color).to_string(),
            _ => text.to_string(),
        }
    }

    fn border(&self, text: &str) -> String {
        self.paint(text, Some(BORDER_COLOR))
    }
}

fn status_color(status: JobStatus) -> Option<Color> {
    match status {
        JobStatus::Running => Some(Color::Green),
        JobStatus::Pending => Some(Color::Yellow),
        JobStatus::Held => Some(Color::Magenta),
        JobStatus::Error => Some(Color::Red),
        JobStatus::Suspended | JobStatus::Deleted | JobStatus::Unknown => None,
    }
}

/// Numbered list of selectable queues, 1-based
pub fn render_menu(out: &mut impl Write, queues: &[QueueDefinition]) -> io::Result<()> {
    for (i, queue) in queues.iter().enumerate() {
        writeln!(out, "({}) {} - {}", i + 1, queue.machine(), queue.queue_name())?;
    }
    Ok(())
}

/// Job table followed by the queue health summary
pub fn render_report(out: &mut impl Write, report: &QueueReport, opts: &RenderOptions) -> io::Result<()> {
    let painter = Painter { color: opts.color };
    let rule = painter.border(&format!("|{}|", "-".repeat(INNER_WIDTH)));

    writeln!(out)?;
    writeln!(out, "{} {}", painter.border("Machine:"), report.machine)?;
    writeln!(out, "  {} {}", painter.border("Queue:"), report.queue)?;
    writeln!(out, "{}", rule)?;
    writeln!(
        out,
        "{}",
        painter.border(&format!(
            "| {:^jid$}  | {:^name$} | {:^user$} | {:^status$} | {:^cores$} |",
            "JID",
            "Job Name",
            "User",
            "Status",
            "Cores",
            jid = COL_JID,
            name = COL_NAME,
            user = COL_USER,
            status = COL_STATUS,
            cores = COL_CORES,
        ))
    )?;
    writeln!(out, "{}", rule)?;
    for job in &report.jobs {
        writeln!(out, "{}", render_row(&painter, job, opts.current_user.as_deref()))?;
    }
    writeln!(out, "{}", rule)?;

    let health = &report.health;
    writeln!(out)?;
    writeln!(out, "SYSTEM STATUS")?;
    writeln!(out, "{:>15}: {}", "RUNNING JOBS", report.jobs.len())?;
    writeln!(out)?;
    writeln!(out, "{:>15}: {}", "TOTAL CORES", health.total_cores)?;
    writeln!(out, "{:>15}: {}", "AVAIL CORES", health.free_cores)?;
    writeln!(out, "{:>15}: {}", "RUNNING CORES", health.running_cores)?;
    writeln!(out)?;
    writeln!(out, "{:>15}: {}", "TOTAL NODES", health.total_nodes)?;
    writeln!(out, "{:>15}: {}", "UP NODES", health.up_nodes)?;
    writeln!(out, "{:>15}: {}", "DOWN NODES", health.down_nodes)?;
    writeln!(out, "{:>15}: {}", "IDLE NODES", health.idle_nodes)?;
    writeln!(out)?;
    writeln!(out, "Note: Jobs that fall between multiple queues are shown")?;
    writeln!(out, "in each queue they use resources from.")?;
    Ok(())
}

fn render_row(painter: &Painter, job: &JobRow, current_user: Option<&str>) -> String {
    let user_color = (current_user == Some(job.user.as_str())).then_some(OWN_USER_COLOR);

    format!(
        "{} {:>jid$.jid$}{} {:>name$.name$}{} {}{} {}{} {:>cores$.cores$}{}",
        painter.border("|"),
        job.job_id.to_string(),
        painter.border("  |"),
        job.name,
        painter.border(" |"),
        painter.paint(&format!("{:>w$.w$}", job.user, w = COL_USER), user_color),
        painter.border(" |"),
        painter.paint(&format!("{:>w$.w$}", job.status.as_token(), w = COL_STATUS), status_color(job.status)),
        painter.border(" |"),
        job.cores.to_string(),
        painter.border(" |"),
        jid = COL_JID,
        name = COL_NAME,
        cores = COL_CORES,
    )
}
