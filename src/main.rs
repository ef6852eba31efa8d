use std::fs::File;
use std::path::PathBuf;
use std::sync::Arc;

use roster_scan::classifier::Classifier;
use roster_scan::config::{self, DEFAULT_CAP};
use roster_scan::directory::{MemberDirectory, RosterSnapshot};
use roster_scan::error::{RunError, ScanError};
use roster_scan::server::{self, AppState};
use roster_scan::telegram::TelegramDirectory;
use roster_scan::types::{Category, ScanReport};
use roster_scan::{resolver, scanner};

use anyhow::{bail, Context, Result};
use clap::Parser;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

/// roster-scan — estimate how many members of a group or channel look real, suspicious, fake, or automated.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "roster-scan",
    version,
    about = "Estimate how many members of a group or channel look real, suspicious, fake, or automated.",
    long_about = None
)]
struct Cli {
    /// Link (https://t.me/name, t.me/+invite), @handle, or numeric chat id to scan.
    input: Option<String>,

    /// Maximum number of members to enumerate.
    #[arg(long, default_value_t = DEFAULT_CAP, value_parser = parse_cap_arg)]
    cap: usize,

    /// Scan an exported roster snapshot (JSON) instead of the live Bot API.
    #[arg(long)]
    roster: Option<PathBuf>,

    /// Bot API token for live scans.
    #[arg(long, env = "TELOXIDE_TOKEN", hide_env_values = true)]
    token: Option<String>,

    /// JSON file with heuristic thresholds. Defaults are used for missing fields.
    #[arg(long)]
    heuristics: Option<PathBuf>,

    /// Write the report as pretty JSON to this path (optional).
    #[arg(long)]
    output: Option<PathBuf>,

    /// Serve the JSON API on this address (e.g. 127.0.0.1:8080) instead of scanning once.
    #[arg(long)]
    serve: Option<String>,
}

fn parse_cap_arg(s: &str) -> Result<usize, String> {
    config::parse_cap(s).map_err(|e| e.to_string())
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    println!("roster-scan configuration:");
    println!("  input        : {}", cli.input.as_deref().unwrap_or("<none>"));
    println!("  cap          : {}", cli.cap);
    println!(
        "  source       : {}",
        cli.roster
            .as_ref()
            .map(|p| format!("snapshot {}", p.display()))
            .unwrap_or_else(|| "Telegram Bot API".to_string())
    );
    println!(
        "  heuristics   : {}",
        cli.heuristics
            .as_ref()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| "<built-in>".to_string())
    );
    println!(
        "  output       : {}",
        cli.output
            .as_ref()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| "<none>".to_string())
    );
    println!("  serve        : {}", cli.serve.as_deref().unwrap_or("<off>"));

    let heuristics = match cli.heuristics.as_deref() {
        Some(path) => config::load_heuristics_from_path(path)?,
        None => Default::default(),
    };
    let classifier = Classifier::new(heuristics).context("invalid heuristics")?;
    let directory = build_directory(&cli)?;

    if let Some(bind) = cli.serve.as_deref() {
        let state = AppState::new(directory, classifier).with_default_cap(cli.cap);
        let server = server::spawn_server(bind, state);
        println!("API server starting at http://{} (Ctrl+C to stop)", bind);
        tokio::select! {
            res = server => res?,
            _ = tokio::signal::ctrl_c() => {}
        }
        return Ok(());
    }

    let Some(input) = cli.input.as_deref() else {
        bail!("nothing to do: pass a link/@handle to scan, or --serve <addr>");
    };

    // Ctrl-C stops enumeration; the report covers what was seen so far.
    let cancel = CancellationToken::new();
    let cancel_ctrlc = cancel.clone();
    tokio::spawn(async move {
        let _ = tokio::signal::ctrl_c().await;
        cancel_ctrlc.cancel();
    });

    println!("\nScanning {input} (up to {} members)...", cli.cap);
    let report = match scan_once(directory.as_ref(), &classifier, input, cli.cap, cancel).await {
        Ok(r) => r,
        Err(e) => {
            eprintln!("Scan failed: {}", explain(&e));
            return Err(e.into());
        }
    };
    print_report_table(&report, cli.roster.is_none());

    if let Some(path) = cli.output.as_deref() {
        if let Err(e) = write_report_json(path, &report) {
            eprintln!("Failed to write JSON to {}: {}", path.display(), e);
        } else {
            println!("Wrote JSON report to {}", path.display());
        }
    }

    Ok(())
}

fn build_directory(cli: &Cli) -> Result<Arc<dyn MemberDirectory>> {
    if let Some(path) = cli.roster.as_deref() {
        return Ok(Arc::new(RosterSnapshot::load_from_path(path)?));
    }
    match cli.token.as_deref() {
        Some(token) if !token.trim().is_empty() => {
            Ok(Arc::new(TelegramDirectory::from_token(token.trim())))
        }
        _ => bail!("no roster source: pass --roster <file> or set TELOXIDE_TOKEN"),
    }
}

async fn scan_once(
    directory: &dyn MemberDirectory,
    classifier: &Classifier,
    input: &str,
    cap: usize,
    cancel: CancellationToken,
) -> Result<ScanReport, RunError> {
    let reference = resolver::resolve(input)?;
    Ok(scanner::scan_entity_with_cancel(directory, classifier, &reference, cap, cancel).await?)
}

fn explain(err: &RunError) -> String {
    match err {
        RunError::Resolution(_) => {
            format!("{err}. Send a link like https://t.me/name, t.me/+invite, or @name.")
        }
        RunError::Scan(ScanError::NotFound(_)) => {
            format!("{err}. Check the link; invite links only work for snapshot scans.")
        }
        RunError::Scan(ScanError::AccessDenied(_)) => {
            format!("{err}. Add the bot to the group/channel as an admin first.")
        }
        RunError::Scan(ScanError::EmptyRoster) => format!("{err}. The roster appears empty."),
        RunError::Scan(ScanError::Platform(_)) => format!("{err}. Try again later."),
    }
}

fn print_report_table(report: &ScanReport, live_source: bool) {
    println!(
        "\n{} (id {}): scanned {} of {} reported members{}",
        report.display_name,
        report.entity_id,
        report.scanned,
        report.reported_total,
        if report.capped { " (cap reached)" } else { "" }
    );

    let rows = [
        ("real", Category::Real),
        ("bot", Category::Bot),
        ("suspicious", Category::Suspicious),
        ("fake", Category::Fake),
    ];
    let name_w = rows.iter().map(|(n, _)| n.len()).max().unwrap_or(8).max("category".len());
    let count_w = report.scanned.to_string().len().max("count".len());
    let pct_w = "percent".len();

    println!(
        "{:<name_w$}  {:>count_w$}  {:>pct_w$}",
        "category",
        "count",
        "percent",
        name_w = name_w,
        count_w = count_w,
        pct_w = pct_w
    );
    println!(
        "{:-<name_w$}  {:-<count_w$}  {:-<pct_w$}",
        "",
        "",
        "",
        name_w = name_w,
        count_w = count_w,
        pct_w = pct_w
    );
    for (name, category) in rows {
        let share = report.share(category);
        println!(
            "{:<name_w$}  {:>count_w$}  {:>pct_w$.1}",
            name,
            share.count,
            share.percent,
            name_w = name_w,
            count_w = count_w,
            pct_w = pct_w
        );
    }

    let s = &report.signals;
    println!(
        "\nsignals: no photo {}, odd username {}, odd first name {}, no last name {}",
        s.no_photo, s.suspicious_username, s.suspicious_name, s.no_last_name
    );
    for line in report_notes(live_source) {
        println!("{line}");
    }
}

fn report_notes(live_source: bool) -> Vec<&'static str> {
    let mut notes = vec!["Heuristic estimate; not an authoritative verdict."];
    if live_source {
        notes.push(
            "Bot API scans cover administrators only; the rest of the roster is not visible to bots.",
        );
    }
    notes
}

fn write_report_json(path: &std::path::Path, report: &ScanReport) -> anyhow::Result<()> {
    let file = File::create(path)?;
    serde_json::to_writer_pretty(file, report)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn live_reports_mention_admin_only_coverage() {
        let live = report_notes(true);
        assert!(live.iter().any(|n| n.contains("administrators only")));
        let snapshot = report_notes(false);
        assert!(!snapshot.iter().any(|n| n.contains("administrators")));
        assert_eq!(snapshot.len(), 1);
    }
}
