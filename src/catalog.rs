//! Two-tier snippet cache behind an atomic snapshot swap.
//!
//! The catalog is process-wide mutable state read from arbitrary contexts and
//! written only by background refreshes. Instead of locking, each refresh
//! builds a complete [`CatalogSnapshot`] and publishes it with a single
//! `ArcSwap` store: readers always observe a consistent (possibly stale)
//! snapshot and never a half-replaced tier. Refreshes are tagged with a
//! monotonic sequence number; a refresh that finishes after a newer one has
//! already published is discarded rather than allowed to roll the cache back.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

use arc_swap::ArcSwap;
use parking_lot::Mutex;

use crate::protocol::SnippetRecord;

/// Immutable view of both tiers as of one completed refresh.
#[derive(Debug, Default, Clone)]
pub struct CatalogSnapshot {
    pub local: Vec<SnippetRecord>,
    pub remote: Vec<SnippetRecord>,
    /// Sequence number of the refresh that produced this snapshot.
    pub seq: u64,
}

impl CatalogSnapshot {
    /// Local tier in original order, then every remote record whose slug is
    /// not shadowed by a local one, in original order.
    pub fn merged_view(&self) -> Vec<SnippetRecord> {
        merge_tiers(&self.local, &self.remote)
    }
}

/// See [`CatalogSnapshot::merged_view`].
pub fn merge_tiers(local: &[SnippetRecord], remote: &[SnippetRecord]) -> Vec<SnippetRecord> {
    let local_slugs: std::collections::HashSet<&str> =
        local.iter().map(|record| record.slug.as_str()).collect();
    let mut merged: Vec<SnippetRecord> = local.to_vec();
    merged.extend(
        remote
            .iter()
            .filter(|record| !local_slugs.contains(record.slug.as_str()))
            .cloned(),
    );
    merged
}

/// Collapses duplicate slugs within one tier, last fetched wins. The record
/// keeps the position of its first occurrence so tier order stays stable.
fn dedupe_tier(records: Vec<SnippetRecord>) -> Vec<SnippetRecord> {
    let mut by_slug: HashMap<String, usize> = HashMap::with_capacity(records.len());
    let mut deduped: Vec<SnippetRecord> = Vec::with_capacity(records.len());
    for record in records {
        match by_slug.get(&record.slug) {
            Some(&index) => deduped[index] = record,
            None => {
                by_slug.insert(record.slug.clone(), deduped.len());
                deduped.push(record);
            }
        }
    }
    deduped
}

pub struct Catalog {
    snap: ArcSwap<CatalogSnapshot>,
    /// Serializes the compare-and-publish step of finishing refreshes.
    publish: Mutex<()>,
    next_seq: AtomicU64,
    in_flight: AtomicUsize,
}

impl Catalog {
    pub fn new() -> Self {
        Self {
            snap: ArcSwap::from_pointee(CatalogSnapshot::default()),
            publish: Mutex::new(()),
            next_seq: AtomicU64::new(1),
            in_flight: AtomicUsize::new(0),
        }
    }

    /// Current snapshot; cheap, never blocks on writers.
    pub fn snapshot(&self) -> Arc<CatalogSnapshot> {
        self.snap.load_full()
    }

    pub fn merged_view(&self) -> Vec<SnippetRecord> {
        self.snapshot().merged_view()
    }

    /// True while at least one refresh is in flight.
    pub fn is_refreshing(&self) -> bool {
        self.in_flight.load(Ordering::SeqCst) > 0
    }

    /// Marks a refresh as started and hands back its sequence tag.
    pub fn begin_refresh(&self) -> u64 {
        self.in_flight.fetch_add(1, Ordering::SeqCst);
        self.next_seq.fetch_add(1, Ordering::SeqCst)
    }

    /// Publishes the fetched tiers, unless a newer refresh already has.
    /// `remote: None` carries the previous snapshot's remote tier forward
    /// (refreshes that skip the gallery fetch). Returns whether the snapshot
    /// was applied.
    pub fn finish_refresh(
        &self,
        seq: u64,
        local: Vec<SnippetRecord>,
        remote: Option<Vec<SnippetRecord>>,
    ) -> bool {
        let applied = {
            let _gate = self.publish.lock();
            let previous = self.snap.load_full();
            if previous.seq > seq {
                log::debug!("discarding refresh {seq}; {} already published", previous.seq);
                false
            } else {
                let remote = remote
                    .map(dedupe_tier)
                    .unwrap_or_else(|| previous.remote.clone());
                self.snap.store(Arc::new(CatalogSnapshot {
                    local: dedupe_tier(local),
                    remote,
                    seq,
                }));
                true
            }
        };
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        applied
    }

    /// Abandons a refresh that never ran (for example a full worker queue).
    pub fn cancel_refresh(&self, seq: u64) {
        log::debug!("refresh {seq} cancelled before running");
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
    }
}

impl Default for Catalog {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::Origin;

    fn record(slug: &str, origin: Origin) -> SnippetRecord {
        SnippetRecord {
            slug: slug.to_string(),
            title: slug.to_uppercase(),
            description: String::new(),
            languages: vec!["javascript".to_string()],
            origin,
        }
    }

    fn slugs(records: &[SnippetRecord]) -> Vec<&str> {
        records.iter().map(|r| r.slug.as_str()).collect()
    }

    #[test]
    fn merge_keeps_local_precedence_and_order() {
        let local = vec![record("b", Origin::Local), record("a", Origin::Local)];
        let remote = vec![
            record("c", Origin::Remote),
            record("a", Origin::Remote),
            record("d", Origin::Remote),
        ];
        let merged = merge_tiers(&local, &remote);
        assert_eq!(slugs(&merged), vec!["b", "a", "c", "d"]);
        // The shadowed "a" is the local one.
        assert_eq!(merged[1].origin, Origin::Local);
    }

    #[test]
    fn merge_with_an_empty_tier_is_identity() {
        let local = vec![record("x", Origin::Local), record("y", Origin::Local)];
        let remote = vec![record("p", Origin::Remote)];
        assert_eq!(slugs(&merge_tiers(&local, &[])), vec!["x", "y"]);
        assert_eq!(slugs(&merge_tiers(&[], &remote)), vec!["p"]);
    }

    #[test]
    fn duplicate_slugs_within_a_tier_keep_the_last_record() {
        let mut first = record("dup", Origin::Local);
        first.description = "old".to_string();
        let mut second = record("dup", Origin::Local);
        second.description = "new".to_string();
        let deduped = dedupe_tier(vec![first, record("other", Origin::Local), second]);
        assert_eq!(slugs(&deduped), vec!["dup", "other"]);
        assert_eq!(deduped[0].description, "new");
    }

    #[test]
    fn stale_refresh_does_not_roll_back_a_newer_snapshot() {
        let catalog = Catalog::new();
        let older = catalog.begin_refresh();
        let newer = catalog.begin_refresh();

        assert!(catalog.finish_refresh(newer, vec![record("new", Origin::Local)], Some(vec![])));
        assert!(!catalog.finish_refresh(older, vec![record("old", Origin::Local)], Some(vec![])));

        assert_eq!(slugs(&catalog.merged_view()), vec!["new"]);
        assert!(!catalog.is_refreshing());
    }

    #[test]
    fn skipped_remote_fetch_carries_the_previous_tier_forward() {
        let catalog = Catalog::new();
        let seq = catalog.begin_refresh();
        catalog.finish_refresh(
            seq,
            vec![record("l1", Origin::Local)],
            Some(vec![record("r1", Origin::Remote)]),
        );

        let seq = catalog.begin_refresh();
        catalog.finish_refresh(seq, vec![record("l2", Origin::Local)], None);

        assert_eq!(slugs(&catalog.merged_view()), vec!["l2", "r1"]);
    }

    #[test]
    fn refreshing_flag_tracks_in_flight_work() {
        let catalog = Catalog::new();
        assert!(!catalog.is_refreshing());
        let a = catalog.begin_refresh();
        let b = catalog.begin_refresh();
        assert!(catalog.is_refreshing());
        catalog.finish_refresh(a, vec![], Some(vec![]));
        assert!(catalog.is_refreshing());
        catalog.cancel_refresh(b);
        assert!(!catalog.is_refreshing());
    }
}
