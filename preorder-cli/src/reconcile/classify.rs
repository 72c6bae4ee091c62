//! Pure row classification against a remote snapshot

use std::collections::{HashMap, HashSet};

use crate::api::models::{Identifier, RemoteRecord, Row};

/// How a sheet SKU is compared with remote data
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SkuMatchMode {
    /// The row's SKU must equal the remote SKU of the same identifier
    #[default]
    PerIdentifier,
    /// The row's SKU must appear somewhere in the fetched remote SKUs
    AnyRemote,
}

/// Outcome for one sheet row
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowStatus {
    Found,
    SkuMismatch,
    NotFound,
}

/// Remote snapshot indexed for lookups
#[derive(Debug, Default)]
pub struct RemoteIndex {
    by_id: HashMap<Identifier, Option<String>>,
    all_skus: HashSet<String>,
}

impl RemoteIndex {
    pub fn new(records: &[RemoteRecord]) -> Self {
        let mut index = Self::default();
        for record in records {
            if let Some(sku) = &record.sku {
                index.all_skus.insert(sku.clone());
            }
            // The table is keyed by identifier; first occurrence wins if a
            // misbehaving endpoint repeats one
            index
                .by_id
                .entry(record.identifier.clone())
                .or_insert_with(|| record.sku.clone());
        }
        index
    }

    pub fn len(&self) -> usize {
        self.by_id.len()
    }

    pub fn classify(&self, row: &Row, mode: SkuMatchMode) -> RowStatus {
        let Some(remote_sku) = self.by_id.get(&row.identifier) else {
            return RowStatus::NotFound;
        };

        let matches = match mode {
            SkuMatchMode::PerIdentifier => remote_sku.as_deref() == Some(row.sku.as_str()),
            SkuMatchMode::AnyRemote => self.all_skus.contains(&row.sku),
        };

        if matches {
            RowStatus::Found
        } else {
            RowStatus::SkuMismatch
        }
    }
}

/// Identifiers in first-seen order, without duplicates
pub fn distinct_identifiers<'a, I>(ids: I) -> Vec<Identifier>
where
    I: IntoIterator<Item = &'a Identifier>,
{
    let mut seen = HashSet::new();
    ids.into_iter()
        .filter(|id| seen.insert(*id))
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn remote() -> RemoteIndex {
        RemoteIndex::new(&[
            RemoteRecord::new(1, Some("A")),
            RemoteRecord::new(2, Some("X")),
            RemoteRecord::new(3, None),
        ])
    }

    #[test]
    fn test_per_identifier() {
        let index = remote();
        let mode = SkuMatchMode::PerIdentifier;

        assert_eq!(index.classify(&Row::new(1, "A"), mode), RowStatus::Found);
        assert_eq!(index.classify(&Row::new(2, "B"), mode), RowStatus::SkuMismatch);
        // SKU exists remotely, but on another product
        assert_eq!(index.classify(&Row::new(2, "A"), mode), RowStatus::SkuMismatch);
        assert_eq!(index.classify(&Row::new(3, ""), mode), RowStatus::SkuMismatch);
        assert_eq!(index.classify(&Row::new(4, "A"), mode), RowStatus::NotFound);
    }

    #[test]
    fn test_any_remote() {
        let index = remote();
        let mode = SkuMatchMode::AnyRemote;

        assert_eq!(index.classify(&Row::new(1, "A"), mode), RowStatus::Found);
        assert_eq!(index.classify(&Row::new(2, "A"), mode), RowStatus::Found);
        assert_eq!(index.classify(&Row::new(2, "B"), mode), RowStatus::SkuMismatch);
        assert_eq!(index.classify(&Row::new(4, "A"), mode), RowStatus::NotFound);
    }

    #[test]
    fn test_distinct_identifiers_keeps_first_seen_order() {
        let ids = [
            Identifier::Int(3),
            Identifier::Int(1),
            Identifier::Int(3),
            Identifier::Text("x".into()),
            Identifier::Int(1),
        ];
        assert_eq!(
            distinct_identifiers(ids.iter()),
            vec![Identifier::Int(3), Identifier::Int(1), Identifier::Text("x".into())]
        );
    }

    #[test]
    fn test_duplicate_remote_rows_first_wins() {
        let index = RemoteIndex::new(&[
            RemoteRecord::new(1, Some("A")),
            RemoteRecord::new(1, Some("Z")),
        ]);
        assert_eq!(index.len(), 1);
        assert_eq!(
            index.classify(&Row::new(1, "A"), SkuMatchMode::PerIdentifier),
            RowStatus::Found
        );
    }

    #[test]
    fn test_padded_and_numeric_remote_skus_match_sheet_values() {
        let records = [
            RemoteRecord::from_json(&serde_json::json!({"id": 1, "sku": "A "}), "id", "sku").unwrap(),
            RemoteRecord::from_json(&serde_json::json!({"id": 2, "sku": 10.0}), "id", "sku").unwrap(),
        ];
        let index = RemoteIndex::new(&records);
        let mode = SkuMatchMode::PerIdentifier;

        assert_eq!(index.classify(&Row::new(1, "A"), mode), RowStatus::Found);
        assert_eq!(index.classify(&Row::new(2, "10"), mode), RowStatus::Found);
    }
}
