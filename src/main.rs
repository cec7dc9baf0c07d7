// SPDX-FileCopyrightText: 2026 GSI Helmholtzzentrum f. Schwerionenforschung GmbH, Darmstadt, Germany
// SPDX-License-Identifier: LGPL-3.0-or-later

use std::io::{self, BufRead, Write};
use std::path::PathBuf;

use anyhow::{anyhow, Context, Result};
use clap::Parser;
use crossterm::tty::IsTty;
use env_logger::Builder;
use log::{info, warn, LevelFilter};

mod config;
mod queue;
mod report;
mod sge;
mod ui;

use config::Catalog;
use report::StatusReport;
use sge::QstatCommand;
use ui::{render_menu, render_report, RenderOptions};

#[derive(Parser, Debug)]
#[command(name = "qview")]
#[command(about = "Grid Engine subsystem health and job report")]
#[command(version)]
struct Args {
    /// Queue to report on: 1-based index from --list, or exact queue name
    #[arg(short, long)]
    queue: Option<String>,

    /// List the configured queues and exit
    #[arg(short, long)]
    list: bool,

    /// TOML queue catalog (defaults to the built-in catalog)
    #[arg(long)]
    catalog: Option<PathBuf>,

    /// qstat executable
    #[arg(long, env = "QVIEW_QSTAT", default_value = "qstat")]
    qstat: String,

    /// Print the report as JSON
    #[arg(long)]
    json: bool,

    /// Disable colored output
    #[arg(long)]
    no_color: bool,

    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(args.verbose);

    let catalog = match &args.catalog {
        Some(path) => Catalog::load(path)?,
        None => Catalog::builtin(),
    };

    let mut stdout = io::stdout().lock();

    if args.list {
        render_menu(&mut stdout, catalog.queues())?;
        return Ok(());
    }

    let selector = match args.queue.clone() {
        Some(selector) => selector,
        None => prompt_for_queue(&catalog)?,
    };
    let hash = catalog
        .select(&selector)
        .map(|q| q.hash().clone())
        .ok_or_else(|| anyhow!("no configured queue matches '{}'", selector.trim()))?;

    if !sge::qstat::is_available(&args.qstat) {
        warn!("{} is not available; the report will be empty", args.qstat);
    }

    let mut status = StatusReport::new(catalog, QstatCommand::new(&args.qstat));
    if let Some(queue) = status.queue(&hash) {
        info!("reporting on {} {} ({})", queue.machine(), queue.queue_name(), hash);
    }
    let report = status
        .run(&hash)
        .ok_or_else(|| anyhow!("queue disappeared from the catalog"))?;
    info!("{} jobs in the scheduler listing", status.total_jobs());

    if args.json {
        serde_json::to_writer_pretty(&mut stdout, &report).context("Failed to write report")?;
        writeln!(stdout)?;
    } else {
        let opts = RenderOptions {
            color: !args.no_color && stdout.is_tty(),
            current_user: std::env::var("USER").ok(),
        };
        render_report(&mut stdout, &report, &opts)?;
    }
    stdout.flush()?;

    Ok(())
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        _ => LevelFilter::Debug,
    };

    Builder::new()
        .filter_level(level)
        .parse_default_env()
        .target(env_logger::Target::Stderr)
        .try_init()
        .ok(); // Ignore error if logger is already initialized
}

/// Interactive selection: print the menu and read one answer from stdin
fn prompt_for_queue(catalog: &Catalog) -> Result<String> {
    let mut stderr = io::stderr().lock();
    writeln!(stderr, "Select subsystem:")?;
    render_menu(&mut stderr, catalog.queues())?;
    write!(stderr, "==> ")?;
    stderr.flush()?;

    let mut answer = String::new();
    io::stdin()
        .lock()
        .read_line(&mut answer)
        .context("Failed to read queue selection")?;
    Ok(answer.trim().to_string())
}
