//! Background catalog refresh.
//!
//! A refresh always fetches the local tier (cheap) and optionally the remote
//! gallery (network-bound), entirely on the refresh worker lane. A failed
//! sub-fetch degrades that tier to empty rather than failing the refresh;
//! spawn faults are additionally surfaced once through a blocking
//! notification because they mean the tool itself is misconfigured.
//! Completion is reported by queueing the no-argument `on_complete` callback
//! onto the UI-affine context. Overlapping refreshes are neither coalesced
//! nor cancelled; the catalog's sequence tags keep a slow stale refresh from
//! overwriting a newer snapshot.

use std::sync::Arc;

use parking_lot::Mutex;

use crate::catalog::Catalog;
use crate::invoker::InvokeError;
use crate::tool::SnippetTool;
use crate::ui::{EditorUi, UiCallback};
use crate::worker::{OpKind, Workers};

pub struct Refresher {
    catalog: Arc<Catalog>,
    tool: Arc<dyn SnippetTool>,
    workers: Arc<Workers>,
    ui: Arc<dyn EditorUi>,
}

impl Refresher {
    pub fn new(
        catalog: Arc<Catalog>,
        tool: Arc<dyn SnippetTool>,
        workers: Arc<Workers>,
        ui: Arc<dyn EditorUi>,
    ) -> Self {
        Self {
            catalog,
            tool,
            workers,
            ui,
        }
    }

    /// Kicks off a refresh; returns before any fetching happens. The catalog
    /// is only guaranteed up to date once `on_complete` runs on the UI-affine
    /// context. When the refresh lane is saturated the job is dropped, a busy
    /// status is shown, and `on_complete` still runs against the stale cache
    /// so callers never hang.
    pub fn refresh(&self, language: Option<String>, include_remote: bool, on_complete: UiCallback) {
        let seq = self.catalog.begin_refresh();
        let catalog = Arc::clone(&self.catalog);
        let tool = Arc::clone(&self.tool);
        let ui = Arc::clone(&self.ui);
        // Shared so the rejection path below can still fire the callback
        // after the job closure (which owns the other handle) was dropped.
        let on_complete = Arc::new(Mutex::new(Some(on_complete)));
        let job_complete = Arc::clone(&on_complete);

        let submitted = self.workers.submit(OpKind::Refresh, move || {
            let mut fault: Option<InvokeError> = None;
            let local = match tool.list(language.as_deref()) {
                Ok(records) => records,
                Err(err) => {
                    fault.get_or_insert(err);
                    Vec::new()
                }
            };
            let remote = if include_remote {
                Some(match tool.search(None, language.as_deref()) {
                    Ok(records) => records,
                    Err(err) => {
                        fault.get_or_insert(err);
                        Vec::new()
                    }
                })
            } else {
                None
            };

            catalog.finish_refresh(seq, local, remote);

            if let Some(err) = fault {
                let notify_ui = Arc::clone(&ui);
                let text = err.to_string();
                ui.run_on_ui(Box::new(move || notify_ui.blocking_notify(&text)));
            }
            if let Some(callback) = job_complete.lock().take() {
                ui.run_on_ui(callback);
            }
        });

        if submitted.is_err() {
            self.catalog.cancel_refresh(seq);
            self.ui.show_status("Snippets: refresh already queued, try again");
            if let Some(callback) = on_complete.lock().take() {
                self.ui.run_on_ui(callback);
            }
        }
    }

    /// Manual cache refresh: repopulates both tiers and reports the tier
    /// counts in the status line. The counts are only reported when a new
    /// snapshot was actually published; a dropped refresh leaves the busy
    /// status standing instead of claiming stale counts were loaded.
    pub fn refresh_and_report(&self) {
        let catalog = Arc::clone(&self.catalog);
        let ui = Arc::clone(&self.ui);
        let seq_before = self.catalog.snapshot().seq;
        self.ui.show_status("Snippets: refreshing cache...");
        self.refresh(
            None,
            true,
            Box::new(move || {
                let snapshot = catalog.snapshot();
                if snapshot.seq == seq_before {
                    return;
                }
                ui.show_status(&format!(
                    "Loaded {} local + {} remote snippets",
                    snapshot.local.len(),
                    snapshot.remote.len()
                ));
            }),
        );
    }
}
