use std::io::Write;
use std::sync::Arc;

use anyhow::{Result, bail};
use chrono::{SecondsFormat, Utc};
use tokio::io::{AsyncBufReadExt, BufReader};

use crate::core::classify::{Classifier, HttpClassifier};
use crate::core::config::Config;
use crate::core::dedup::DedupStatus;
use crate::core::error::PipelineError;
use crate::core::notify::{Notifier, WebhookNotifier};
use crate::core::pipeline::{IncidentPipeline, SubmitReport};
use crate::core::store::{WorkOrder, WorkOrderStore};
use crate::core::terminal::{
    print_banner, print_error, print_info, print_status, print_success, print_warn,
};
use crate::core::timeline::{self, TimelineView};

fn open_store(config: &Config) -> Result<Arc<WorkOrderStore>> {
    Ok(Arc::new(WorkOrderStore::open(&config.db_path)?))
}

fn build_pipeline(config: &Config) -> Result<(Arc<WorkOrderStore>, IncidentPipeline)> {
    let store = open_store(config)?;

    let Some(classifier_url) = config.classifier.url.as_deref() else {
        bail!("classifier.url is not configured; set it in fieldwork.toml");
    };
    let classifier: Arc<dyn Classifier> =
        Arc::new(HttpClassifier::new(classifier_url, &config.classifier)?);

    let notifier: Option<Arc<dyn Notifier>> = match config.notifier.url.as_deref() {
        Some(url) => Some(Arc::new(WebhookNotifier::new(url, &config.notifier)?)),
        None => None,
    };

    let pipeline = IncidentPipeline::new(store.clone(), classifier, notifier, config);
    Ok((store, pipeline))
}

fn print_report(report: &SubmitReport) {
    match report.status {
        DedupStatus::New => print_success("Work order recorded (new)."),
        DedupStatus::Duplicate => print_warn(&format!(
            "Known issue, occurrence #{} recorded.",
            report.work_order.occurrence_count
        )),
    }
    let wo = &report.work_order;
    print_status("Category", &wo.category);
    print_status("Severity", wo.severity.label());
    if !wo.summary.is_empty() {
        print_status("Summary", &wo.summary);
    }
    print_status(
        "Notified",
        if wo.notified { "yes" } else { "not yet" },
    );
}

fn print_orders(orders: &[WorkOrder]) {
    for wo in orders {
        println!(
            "- [{}] {} | {} | x{}{}",
            wo.created_at.to_rfc3339_opts(SecondsFormat::Secs, true),
            wo.severity,
            wo.category,
            wo.occurrence_count,
            wo.source
                .as_deref()
                .map(|s| format!(" | {s}"))
                .unwrap_or_default()
        );
        if !wo.summary.is_empty() {
            println!("  {}", wo.summary);
        }
    }
}

pub async fn run_submit(config: &Config, text: &str, source: Option<&str>) -> Result<()> {
    let (_store, pipeline) = build_pipeline(config)?;
    match pipeline.submit(text, source, Utc::now()).await {
        Ok(report) => {
            print_report(&report);
            Ok(())
        }
        Err(PipelineError::EmptyInput) => {
            print_warn("Nothing to submit: the report is empty.");
            Ok(())
        }
        Err(err) => Err(err.into()),
    }
}

pub async fn run_timeline(config: &Config, view: TimelineView) -> Result<()> {
    let store = open_store(config)?;
    let points = timeline::build_timeline(&store, view).await?;
    if points.is_empty() {
        print_info("No work orders yet to chart.");
        return Ok(());
    }
    for point in &points {
        println!(
            "{}  {}",
            point.at.to_rfc3339_opts(SecondsFormat::Secs, true),
            point.severity
        );
    }
    Ok(())
}

pub async fn run_recent(config: &Config, limit: u32) -> Result<()> {
    let store = open_store(config)?;
    let orders = store.recent(limit).await?;
    if orders.is_empty() {
        print_info("No work orders on file.");
        return Ok(());
    }
    print_orders(&orders);
    Ok(())
}

/// Interactive loop. A blank line (or EOF) ends the session; a failed
/// classification drops only that report and the loop continues.
pub async fn run_interactive(config: &Config) -> Result<()> {
    let (store, pipeline) = build_pipeline(config)?;
    print_banner();

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        print!("incident > ");
        std::io::stdout().flush()?;

        let Some(line) = lines.next_line().await? else {
            break;
        };

        match pipeline.submit(&line, Some("human"), Utc::now()).await {
            Ok(report) => {
                print_report(&report);

                println!("\nRecent work orders:");
                print_orders(&store.recent(10).await?);

                let points =
                    timeline::build_timeline(&store, TimelineView::FirstOccurrence).await?;
                println!("\nSeverity over time ({} points):", points.len());
                for point in &points {
                    println!(
                        "  {}  {}",
                        point.at.to_rfc3339_opts(SecondsFormat::Secs, true),
                        point.severity
                    );
                }
                println!();
            }
            Err(PipelineError::EmptyInput) => {
                print_info("Exiting.");
                break;
            }
            Err(err @ PipelineError::ClassificationUnavailable { .. }) => {
                print_error(&err.to_string());
                continue;
            }
            // Storage failures are not masked; losing them risks the audit trail.
            Err(err) => return Err(err.into()),
        }
    }
    Ok(())
}
