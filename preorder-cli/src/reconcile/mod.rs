//! Reconciliation of sheet rows against the product store
//!
//! One bulk read of the listed products, a classification of every row into
//! found / SKU-mismatched / not-found, then preorder-clearing writes for the
//! found rows. A failed write aborts the run; earlier writes are not undone.

pub mod classify;

pub use classify::{RemoteIndex, RowStatus, SkuMatchMode, distinct_identifiers};

use log::info;

use crate::api::models::{Identifier, PreorderFields, Row};
use crate::api::store::{MAX_IDS_PER_REQUEST, ProductStore};
use crate::error::Result;

/// How clearing writes are issued for found rows
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UpdateStrategy {
    /// Writes covering every found identifier after classification, at most
    /// `write_chunk` identifiers each
    #[default]
    Bulk,
    /// One write per found row, as the row is classified
    PerRow,
}

#[derive(Debug, Clone)]
pub struct ReconcileOptions {
    pub sku_match: SkuMatchMode,
    pub update_strategy: UpdateStrategy,
    /// Classify and report without writing
    pub dry_run: bool,
    pub fields: PreorderFields,
    /// Maximum identifiers per bulk write
    pub write_chunk: usize,
}

impl Default for ReconcileOptions {
    fn default() -> Self {
        Self {
            sku_match: SkuMatchMode::default(),
            update_strategy: UpdateStrategy::default(),
            dry_run: false,
            fields: PreorderFields::default(),
            write_chunk: MAX_IDS_PER_REQUEST,
        }
    }
}

/// The three disjoint buckets, each in sheet order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Classification {
    pub found: Vec<Identifier>,
    pub not_found: Vec<Identifier>,
    /// Sheet SKUs of rows whose SKU did not match
    pub sku_mismatch: Vec<String>,
    /// Number of write requests issued
    pub updates_issued: usize,
}

impl Classification {
    /// Rows accounted for across all buckets
    pub fn total(&self) -> usize {
        self.found.len() + self.not_found.len() + self.sku_mismatch.len()
    }
}

/// Progress notifications, delivered in processing order
#[derive(Debug, Clone, Copy)]
pub enum Progress<'r> {
    /// A row was classified (and, for per-row writes, updated)
    Row { row: &'r Row, status: RowStatus },
    /// One bulk write request finished
    BulkUpdated { count: usize },
}

type ProgressHook<'a> = Box<dyn for<'r> FnMut(Progress<'r>) + 'a>;

pub struct Reconciler<'a> {
    store: &'a dyn ProductStore,
    options: ReconcileOptions,
    progress: Option<ProgressHook<'a>>,
}

impl<'a> Reconciler<'a> {
    pub fn new(store: &'a dyn ProductStore, options: ReconcileOptions) -> Self {
        Self {
            store,
            options,
            progress: None,
        }
    }

    /// Receive a callback for every classified row and for the bulk write
    pub fn on_progress(mut self, hook: impl for<'r> FnMut(Progress<'r>) + 'a) -> Self {
        self.progress = Some(Box::new(hook));
        self
    }

    fn emit(&mut self, event: Progress<'_>) {
        if let Some(hook) = self.progress.as_mut() {
            hook(event);
        }
    }

    pub async fn run(&mut self, rows: &[Row]) -> Result<Classification> {
        let mut outcome = Classification::default();
        if rows.is_empty() {
            info!("No rows to reconcile");
            return Ok(outcome);
        }

        let ids = distinct_identifiers(rows.iter().map(|r| &r.identifier));
        let records = self.store.fetch_products(&ids).await?;
        let index = RemoteIndex::new(&records);
        info!(
            "{} rows, {} distinct identifiers, {} present remotely",
            rows.len(),
            ids.len(),
            index.len()
        );

        let write = !self.options.dry_run;
        let mut pending = Vec::new();

        for row in rows {
            let status = index.classify(row, self.options.sku_match);
            match status {
                RowStatus::Found => {
                    if write {
                        match self.options.update_strategy {
                            UpdateStrategy::PerRow => {
                                self.store
                                    .clear_preorder(
                                        std::slice::from_ref(&row.identifier),
                                        &self.options.fields,
                                    )
                                    .await?;
                                outcome.updates_issued += 1;
                            }
                            UpdateStrategy::Bulk => pending.push(row.identifier.clone()),
                        }
                    }
                    outcome.found.push(row.identifier.clone());
                }
                RowStatus::SkuMismatch => outcome.sku_mismatch.push(row.sku.clone()),
                RowStatus::NotFound => outcome.not_found.push(row.identifier.clone()),
            }
            self.emit(Progress::Row { row, status });
        }

        let ids = distinct_identifiers(pending.iter());
        for chunk in ids.chunks(self.options.write_chunk.max(1)) {
            self.store.clear_preorder(chunk, &self.options.fields).await?;
            outcome.updates_issued += 1;
            self.emit(Progress::BulkUpdated { count: chunk.len() });
        }

        info!(
            "Reconciled: {} found, {} not found, {} SKU mismatches, {} write(s)",
            outcome.found.len(),
            outcome.not_found.len(),
            outcome.sku_mismatch.len(),
            outcome.updates_issued
        );
        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::models::RemoteRecord;
    use crate::error::SyncError;
    use async_trait::async_trait;
    use std::sync::Mutex;

    /// In-memory store that records every call
    #[derive(Default)]
    struct FakeStore {
        records: Vec<RemoteRecord>,
        fail_update_for: Option<Identifier>,
        reads: Mutex<Vec<Vec<Identifier>>>,
        updates: Mutex<Vec<(Vec<Identifier>, PreorderFields)>>,
    }

    impl FakeStore {
        fn with(records: Vec<RemoteRecord>) -> Self {
            Self {
                records,
                ..Default::default()
            }
        }

        fn reads(&self) -> Vec<Vec<Identifier>> {
            self.reads.lock().unwrap().clone()
        }

        fn updated_ids(&self) -> Vec<Vec<Identifier>> {
            self.updates
                .lock()
                .unwrap()
                .iter()
                .map(|(ids, _)| ids.clone())
                .collect()
        }
    }

    #[async_trait]
    impl ProductStore for FakeStore {
        async fn fetch_products(&self, ids: &[Identifier]) -> Result<Vec<RemoteRecord>> {
            self.reads.lock().unwrap().push(ids.to_vec());
            Ok(self
                .records
                .iter()
                .filter(|r| ids.contains(&r.identifier))
                .cloned()
                .collect())
        }

        async fn clear_preorder(&self, ids: &[Identifier], fields: &PreorderFields) -> Result<()> {
            if let Some(bad) = &self.fail_update_for {
                if ids.contains(bad) {
                    return Err(SyncError::from_status("update Products", 500, "boom"));
                }
            }
            self.updates
                .lock()
                .unwrap()
                .push((ids.to_vec(), fields.clone()));
            Ok(())
        }
    }

    fn options(strategy: UpdateStrategy, sku_match: SkuMatchMode) -> ReconcileOptions {
        ReconcileOptions {
            sku_match,
            update_strategy: strategy,
            ..Default::default()
        }
    }

    fn id(n: i64) -> Identifier {
        Identifier::Int(n)
    }

    #[tokio::test]
    async fn test_found_and_mismatch_example() {
        for mode in [SkuMatchMode::PerIdentifier, SkuMatchMode::AnyRemote] {
            let store = FakeStore::with(vec![
                RemoteRecord::new(1, Some("A")),
                RemoteRecord::new(2, Some("X")),
            ]);
            let rows = vec![Row::new(1, "A"), Row::new(2, "B")];

            let result = Reconciler::new(&store, options(UpdateStrategy::Bulk, mode))
                .run(&rows)
                .await
                .unwrap();

            assert_eq!(result.found, vec![id(1)]);
            assert_eq!(result.sku_mismatch, vec!["B".to_string()]);
            assert!(result.not_found.is_empty());
            assert_eq!(store.reads(), vec![vec![id(1), id(2)]]);
            assert_eq!(store.updated_ids(), vec![vec![id(1)]]);
        }
    }

    #[tokio::test]
    async fn test_no_remote_records_means_all_not_found() {
        let store = FakeStore::default();
        let rows = vec![Row::new(1, "A"), Row::new(2, "B"), Row::new(3, "C")];

        for strategy in [UpdateStrategy::Bulk, UpdateStrategy::PerRow] {
            let result = Reconciler::new(&store, options(strategy, SkuMatchMode::PerIdentifier))
                .run(&rows)
                .await
                .unwrap();

            assert_eq!(result.not_found, vec![id(1), id(2), id(3)]);
            assert!(result.found.is_empty());
            assert_eq!(result.updates_issued, 0);
        }
        assert!(store.updated_ids().is_empty());
    }

    #[tokio::test]
    async fn test_per_row_issues_one_update_per_found_row() {
        let store = FakeStore::with(vec![
            RemoteRecord::new(1, Some("A")),
            RemoteRecord::new(2, Some("B")),
            RemoteRecord::new(3, Some("C")),
        ]);
        let rows = vec![Row::new(1, "A"), Row::new(9, "Z"), Row::new(3, "C"), Row::new(2, "nope")];

        let result = Reconciler::new(
            &store,
            options(UpdateStrategy::PerRow, SkuMatchMode::PerIdentifier),
        )
        .run(&rows)
        .await
        .unwrap();

        assert_eq!(result.found, vec![id(1), id(3)]);
        assert_eq!(result.updates_issued, 2);
        assert_eq!(store.updated_ids(), vec![vec![id(1)], vec![id(3)]]);
        for (_, fields) in store.updates.lock().unwrap().iter() {
            assert_eq!(*fields, PreorderFields::default());
        }
    }

    #[tokio::test]
    async fn test_bulk_writes_found_ids_once() {
        let store = FakeStore::with(vec![
            RemoteRecord::new(1, Some("A")),
            RemoteRecord::new(2, Some("B")),
        ]);
        let rows = vec![Row::new(2, "B"), Row::new(1, "A"), Row::new(2, "B")];

        let result = Reconciler::new(&store, ReconcileOptions::default())
            .run(&rows)
            .await
            .unwrap();

        assert_eq!(result.found, vec![id(2), id(1), id(2)]);
        assert_eq!(result.updates_issued, 1);
        assert_eq!(store.updated_ids(), vec![vec![id(2), id(1)]]);
    }

    #[tokio::test]
    async fn test_bulk_writes_are_split_into_chunks() {
        let store = FakeStore::with((1i64..=5).map(|n| RemoteRecord::new(n, Some("S"))).collect());
        let rows: Vec<Row> = (1i64..=5).map(|n| Row::new(n, "S")).collect();

        let mut written = Vec::new();
        let opts = ReconcileOptions {
            write_chunk: 2,
            ..Default::default()
        };
        let result = Reconciler::new(&store, opts)
            .on_progress(|event| {
                if let Progress::BulkUpdated { count } = event {
                    written.push(count);
                }
            })
            .run(&rows)
            .await
            .unwrap();

        assert_eq!(result.updates_issued, 3);
        assert_eq!(written, vec![2, 2, 1]);
        assert_eq!(
            store.updated_ids(),
            vec![vec![id(1), id(2)], vec![id(3), id(4)], vec![id(5)]]
        );
    }

    #[tokio::test]
    async fn test_large_sheet_stays_under_request_limit() {
        let store = FakeStore::with(
            (100_000i64..102_500)
                .map(|n| RemoteRecord::new(n, Some("S")))
                .collect(),
        );
        let rows: Vec<Row> = (100_000i64..102_500).map(|n| Row::new(n, "S")).collect();

        let result = Reconciler::new(&store, ReconcileOptions::default())
            .run(&rows)
            .await
            .unwrap();

        let sizes: Vec<usize> = store.updated_ids().iter().map(Vec::len).collect();
        assert_eq!(sizes, vec![1000, 1000, 500]);
        assert_eq!(result.updates_issued, 3);
        assert_eq!(result.found.len(), 2500);
    }

    #[tokio::test]
    async fn test_dry_run_never_writes() {
        let store = FakeStore::with(vec![RemoteRecord::new(1, Some("A"))]);
        let rows = vec![Row::new(1, "A")];

        for strategy in [UpdateStrategy::Bulk, UpdateStrategy::PerRow] {
            let opts = ReconcileOptions {
                dry_run: true,
                update_strategy: strategy,
                ..Default::default()
            };
            let result = Reconciler::new(&store, opts).run(&rows).await.unwrap();
            assert_eq!(result.found, vec![id(1)]);
            assert_eq!(result.updates_issued, 0);
        }
        assert!(store.updated_ids().is_empty());
    }

    #[tokio::test]
    async fn test_buckets_partition_input() {
        let store = FakeStore::with(vec![
            RemoteRecord::new(1, Some("A")),
            RemoteRecord::new(2, Some("B")),
            RemoteRecord::new("x-1", None),
        ]);
        let rows = vec![
            Row::new(1, "A"),
            Row::new(2, "wrong"),
            Row::new(3, "C"),
            Row::new("x-1", "X"),
            Row::new(1, "A"),
            Row::new("missing", "M"),
        ];

        let result = Reconciler::new(&store, ReconcileOptions::default())
            .run(&rows)
            .await
            .unwrap();

        assert_eq!(result.total(), rows.len());
        assert_eq!(result.found, vec![id(1), id(1)]);
        assert_eq!(result.sku_mismatch, vec!["wrong".to_string(), "X".to_string()]);
        assert_eq!(
            result.not_found,
            vec![id(3), Identifier::Text("missing".into())]
        );
    }

    #[tokio::test]
    async fn test_rerun_is_stable() {
        let store = FakeStore::with(vec![
            RemoteRecord::new(1, Some("A")),
            RemoteRecord::new(2, Some("X")),
        ]);
        let rows = vec![Row::new(1, "A"), Row::new(2, "B"), Row::new(5, "E")];

        let first = Reconciler::new(&store, ReconcileOptions::default())
            .run(&rows)
            .await
            .unwrap();
        let second = Reconciler::new(&store, ReconcileOptions::default())
            .run(&rows)
            .await
            .unwrap();

        assert_eq!(first, second);
        assert_eq!(store.updated_ids(), vec![vec![id(1)], vec![id(1)]]);
    }

    #[tokio::test]
    async fn test_failed_write_aborts_run() {
        let store = FakeStore {
            fail_update_for: Some(id(2)),
            ..FakeStore::with(vec![
                RemoteRecord::new(1, Some("A")),
                RemoteRecord::new(2, Some("B")),
                RemoteRecord::new(3, Some("C")),
            ])
        };
        let rows = vec![Row::new(1, "A"), Row::new(2, "B"), Row::new(3, "C")];

        let mut seen = Vec::new();
        let result = Reconciler::new(
            &store,
            options(UpdateStrategy::PerRow, SkuMatchMode::PerIdentifier),
        )
        .on_progress(|event| {
            if let Progress::Row { row, .. } = event {
                seen.push(row.identifier.clone());
            }
        })
        .run(&rows)
        .await;

        assert!(matches!(result, Err(SyncError::RemoteOperation { .. })));
        // Row 1 was written and reported; nothing after the failure ran
        assert_eq!(store.updated_ids(), vec![vec![id(1)]]);
        assert_eq!(seen, vec![id(1)]);
    }

    #[tokio::test]
    async fn test_empty_input_skips_remote_calls() {
        let store = FakeStore::default();
        let result = Reconciler::new(&store, ReconcileOptions::default())
            .run(&[])
            .await
            .unwrap();

        assert_eq!(result, Classification::default());
        assert!(store.reads().is_empty());
    }

    #[tokio::test]
    async fn test_progress_events_follow_input_order() {
        let store = FakeStore::with(vec![RemoteRecord::new(1, Some("A"))]);
        let rows = vec![Row::new(2, "B"), Row::new(1, "A")];

        let mut events = Vec::new();
        Reconciler::new(&store, ReconcileOptions::default())
            .on_progress(|event| match event {
                Progress::Row { row, status } => events.push(format!("{}:{:?}", row.identifier, status)),
                Progress::BulkUpdated { count } => events.push(format!("bulk:{}", count)),
            })
            .run(&rows)
            .await
            .unwrap();

        assert_eq!(events, vec!["2:NotFound", "1:Found", "bulk:1"]);
    }
}
