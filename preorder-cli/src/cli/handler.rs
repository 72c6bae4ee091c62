//! Sync command handler: load, reconcile, report

use anyhow::{Context, Result};
use chrono::Local;
use colored::*;
use std::path::Path;
use std::time::{Duration, Instant};

use super::Cli;
use crate::api::{ResilienceConfig, SupabaseStore};
use crate::config::StoreConfig;
use crate::reconcile::{
    Classification, Progress, ReconcileOptions, Reconciler, RowStatus, UpdateStrategy,
};
use crate::report::Reporter;
use crate::sheet::{self, ColumnSchema};

const FINISHED_LINE: &str = "Program finished. Logging report.";

/// Run one reconciliation pass as described by the command line
pub async fn handle_sync_command(args: Cli) -> Result<()> {
    let started_at = Local::now();
    let start = Instant::now();

    if args.no_color {
        colored::control::set_override(false);
    }

    let store_config = StoreConfig::new(&args.url, &args.key)
        .context("Invalid product store settings")?
        .with_table(&args.table)
        .with_schema(args.schema.clone())
        .with_columns(&args.remote_id_column, &args.remote_sku_column);

    let resilience = ResilienceConfig::builder()
        .max_attempts(args.max_attempts)
        .base_delay(Duration::from_millis(args.retry_delay_ms))
        .jitter(args.jitter)
        .timeout(Duration::from_secs(args.timeout))
        .build();

    let schema = ColumnSchema {
        id_column: args.id_column.clone(),
        sku_column: args.sku_column.clone(),
    };

    // Validate the sheet before touching the network
    let rows = sheet::load_rows(&args.file, &schema)
        .with_context(|| format!("Failed to load rows from {}", args.file.display()))?;
    log::info!("Loaded {} rows from {}", rows.len(), args.file.display());

    let store = SupabaseStore::new(store_config, resilience)?;

    let options = ReconcileOptions {
        sku_match: args.sku_match.into(),
        update_strategy: args.update.into(),
        dry_run: args.dry_run,
        fields: args.preorder_fields(),
        ..Default::default()
    };

    if args.dry_run {
        println!("{}", "Dry run: no products will be modified".yellow());
    }

    let strategy = options.update_strategy;
    let dry_run = options.dry_run;
    let classification = Reconciler::new(&store, options)
        .on_progress(|event| print_progress(event, strategy, dry_run))
        .run(&rows)
        .await
        .context("Reconciliation aborted")?;

    let reporter = Reporter::new(&args.reports_dir, started_at);
    let written = reporter.write(&classification).is_some();

    println!("{}", FINISHED_LINE);
    print_summary(&classification, reporter.path(), written, start.elapsed());

    Ok(())
}

/// Console line for one progress event, without color
fn progress_line(event: Progress<'_>, strategy: UpdateStrategy, dry_run: bool) -> String {
    match event {
        Progress::Row { row, status } => match status {
            RowStatus::Found => {
                let verb = match (dry_run, strategy) {
                    (true, _) => "Would update",
                    (false, UpdateStrategy::PerRow) => "Updated",
                    (false, UpdateStrategy::Bulk) => "Matched",
                };
                format!("{} ID: {}, SKU: {}", verb, row.identifier, row.sku)
            }
            RowStatus::SkuMismatch => {
                format!("SKU mismatch for ID: {}, SKU: {}", row.identifier, row.sku)
            }
            RowStatus::NotFound => format!("ID not found: {}", row.identifier),
        },
        Progress::BulkUpdated { count } => format!("Updated {} product(s)", count),
    }
}

fn print_progress(event: Progress<'_>, strategy: UpdateStrategy, dry_run: bool) {
    let line = progress_line(event, strategy, dry_run);
    let line = match event {
        Progress::Row {
            status: RowStatus::SkuMismatch,
            ..
        } => line.yellow(),
        Progress::Row {
            status: RowStatus::NotFound,
            ..
        } => line.red(),
        _ => line.green(),
    };
    println!("{}", line);
}

fn print_summary(
    classification: &Classification,
    report_path: &Path,
    written: bool,
    elapsed: Duration,
) {
    println!();
    println!(
        "{} {}  {} {}  {} {}",
        "Found:".bold(),
        classification.found.len().to_string().green(),
        "Not found:".bold(),
        classification.not_found.len().to_string().red(),
        "SKU mismatches:".bold(),
        classification.sku_mismatch.len().to_string().yellow(),
    );
    println!(
        "Rows: {}  Write requests: {}  Time: {:.2}s",
        classification.total(),
        classification.updates_issued,
        elapsed.as_secs_f64()
    );
    if written {
        println!("Report: {}", report_path.display().to_string().cyan());
    } else {
        println!(
            "{} {} (see log)",
            "Report could not be written to".red(),
            report_path.display()
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::models::Row;
    use clap::Parser;
    use httpmock::prelude::*;
    use serde_json::json;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_progress_lines_for_found_rows() {
        let row = Row::new(1, "A");
        let event = Progress::Row {
            row: &row,
            status: RowStatus::Found,
        };

        assert_eq!(
            progress_line(event, UpdateStrategy::PerRow, false),
            "Updated ID: 1, SKU: A"
        );
        assert_eq!(
            progress_line(event, UpdateStrategy::Bulk, false),
            "Matched ID: 1, SKU: A"
        );
        for strategy in [UpdateStrategy::Bulk, UpdateStrategy::PerRow] {
            assert_eq!(
                progress_line(event, strategy, true),
                "Would update ID: 1, SKU: A"
            );
        }
    }

    #[test]
    fn test_progress_lines_ignore_strategy_for_unmatched_rows() {
        let mismatched = Row::new(2, "B");
        let missing = Row::new("p-9", "Z");

        for strategy in [UpdateStrategy::Bulk, UpdateStrategy::PerRow] {
            for dry_run in [false, true] {
                let event = Progress::Row {
                    row: &mismatched,
                    status: RowStatus::SkuMismatch,
                };
                assert_eq!(
                    progress_line(event, strategy, dry_run),
                    "SKU mismatch for ID: 2, SKU: B"
                );

                let event = Progress::Row {
                    row: &missing,
                    status: RowStatus::NotFound,
                };
                assert_eq!(progress_line(event, strategy, dry_run), "ID not found: p-9");
            }
        }
    }

    #[test]
    fn test_progress_line_for_bulk_write() {
        let event = Progress::BulkUpdated { count: 3 };
        assert_eq!(
            progress_line(event, UpdateStrategy::Bulk, false),
            "Updated 3 product(s)"
        );
    }

    #[tokio::test]
    async fn test_sync_command_updates_matches_and_writes_report() {
        let server = MockServer::start_async().await;
        let select = server
            .mock_async(|when, then| {
                when.method(GET)
                    .path("/rest/v1/Products")
                    .query_param("select", "id,sku")
                    .query_param("id", "in.(1,2,3)");
                then.status(200).json_body(json!([
                    {"id": 1, "sku": "A"},
                    {"id": 2, "sku": "X"}
                ]));
            })
            .await;
        let update = server
            .mock_async(|when, then| {
                when.method(PATCH)
                    .path("/rest/v1/Products")
                    .query_param("id", "eq.1")
                    .json_body(json!({
                        "preorder": false,
                        "preorder_discount": null,
                        "preorder_date": null
                    }));
                then.status(204);
            })
            .await;

        let dir = tempdir().unwrap();
        let sheet_path = dir.path().join("products.csv");
        fs::write(&sheet_path, "id,sku\n1,A\n2,B\n3,C\n").unwrap();
        let reports = dir.path().join("reports");

        let url = server.base_url();
        let cli = Cli::try_parse_from([
            "preorder-sync",
            sheet_path.to_str().unwrap(),
            "--url",
            url.as_str(),
            "--key",
            "test-key",
            "--reports-dir",
            reports.to_str().unwrap(),
            "--max-attempts",
            "1",
            "--no-color",
        ])
        .unwrap();

        handle_sync_command(cli).await.unwrap();

        select.assert_async().await;
        update.assert_hits_async(1).await;

        let entries: Vec<_> = fs::read_dir(&reports).unwrap().collect();
        assert_eq!(entries.len(), 1);
        let report = entries[0].as_ref().unwrap().path();
        let name = report.file_name().unwrap().to_string_lossy().to_string();
        assert!(name.starts_with("update_products_log_"));

        let content = fs::read_to_string(&report).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].ends_with(" - Found IDs: [1]"));
        assert!(lines[1].ends_with(" - Not Found IDs: [3]"));
        assert!(lines[2].ends_with(" - SKU Mismatches: ['B']"));
    }

    #[tokio::test]
    async fn test_sync_command_rejects_missing_sheet_before_any_request() {
        let server = MockServer::start_async().await;
        let any = server
            .mock_async(|when, then| {
                when.method(GET);
                then.status(200).json_body(json!([]));
            })
            .await;

        let dir = tempdir().unwrap();
        let missing = dir.path().join("absent.xlsx");
        let url = server.base_url();
        let cli = Cli::try_parse_from([
            "preorder-sync",
            missing.to_str().unwrap(),
            "--url",
            url.as_str(),
            "--key",
            "test-key",
        ])
        .unwrap();

        assert!(handle_sync_command(cli).await.is_err());
        any.assert_hits_async(0).await;
    }
}
