#![allow(dead_code)]

// Scripted collaborators for driving sessions deterministically: a fake
// snippet tool with recorded calls, and a fake editor whose UI-affine context
// is an explicit callback queue the test pumps.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::mpsc::{Receiver, Sender, channel};
use std::time::Duration;

use anyhow::{Context, Result};
use parking_lot::Mutex;
use sniprunner::ui::{HighlightCallback, SelectCallback, UiCallback};
use sniprunner::{
    Catalog, Core, EditorUi, InvokeError, ListItem, Origin, RunOutcome, Selection, SnippetDetail,
    SnippetRecord, SnippetTool, TextRange, ToolConfigInfo, Workers,
};

pub fn record(slug: &str, languages: &[&str], origin: Origin) -> SnippetRecord {
    SnippetRecord {
        slug: slug.to_string(),
        title: slug.to_uppercase(),
        description: format!("{slug} description"),
        languages: languages.iter().map(|l| l.to_string()).collect(),
        origin,
    }
}

#[derive(Default)]
pub struct FakeTool {
    pub local: Mutex<Vec<SnippetRecord>>,
    pub remote: Mutex<Vec<SnippetRecord>>,
    /// Detail bodies keyed by (slug, requested language).
    pub details: Mutex<HashMap<(String, Option<String>), SnippetDetail>>,
    pub run_outcomes: Mutex<HashMap<String, RunOutcome>>,
    pub snippets_dir: Mutex<String>,
    /// When set, list/search fail with a NotFound spawn fault.
    pub unavailable: Mutex<bool>,
    pub info_calls: Mutex<Vec<(String, Option<String>)>>,
    pub run_calls: Mutex<Vec<(String, Option<String>)>>,
}

impl FakeTool {
    pub fn with_tiers(local: Vec<SnippetRecord>, remote: Vec<SnippetRecord>) -> Arc<Self> {
        let tool = Self::default();
        *tool.local.lock() = local;
        *tool.remote.lock() = remote;
        Arc::new(tool)
    }

    pub fn set_detail(&self, slug: &str, language: Option<&str>, code: &str) {
        self.details.lock().insert(
            (slug.to_string(), language.map(str::to_string)),
            SnippetDetail {
                slug: slug.to_string(),
                title: slug.to_uppercase(),
                code: code.to_string(),
                languages: Vec::new(),
            },
        );
    }

    pub fn set_run_outcome(&self, slug: &str, outcome: RunOutcome) {
        self.run_outcomes.lock().insert(slug.to_string(), outcome);
    }

    fn not_found(&self) -> InvokeError {
        InvokeError::NotFound {
            program: "snipkit".to_string(),
        }
    }
}

impl SnippetTool for FakeTool {
    fn list(&self, _language: Option<&str>) -> Result<Vec<SnippetRecord>, InvokeError> {
        if *self.unavailable.lock() {
            return Err(self.not_found());
        }
        Ok(self.local.lock().clone())
    }

    fn search(
        &self,
        _query: Option<&str>,
        _language: Option<&str>,
    ) -> Result<Vec<SnippetRecord>, InvokeError> {
        if *self.unavailable.lock() {
            return Err(self.not_found());
        }
        Ok(self.remote.lock().clone())
    }

    fn info(
        &self,
        slug: &str,
        language: Option<&str>,
    ) -> Result<Option<SnippetDetail>, InvokeError> {
        self.info_calls
            .lock()
            .push((slug.to_string(), language.map(str::to_string)));
        Ok(self
            .details
            .lock()
            .get(&(slug.to_string(), language.map(str::to_string)))
            .cloned())
    }

    fn run(&self, slug: &str, input: Option<&str>) -> Result<RunOutcome, InvokeError> {
        self.run_calls
            .lock()
            .push((slug.to_string(), input.map(str::to_string)));
        Ok(self
            .run_outcomes
            .lock()
            .get(slug)
            .cloned()
            .unwrap_or_else(|| RunOutcome {
                success: false,
                output: String::new(),
                error: format!("no scripted outcome for {slug}"),
            }))
    }

    fn config(&self) -> Result<Option<ToolConfigInfo>, InvokeError> {
        let dir = self.snippets_dir.lock().clone();
        if dir.is_empty() {
            return Ok(None);
        }
        Ok(Some(ToolConfigInfo { snippets_dir: dir }))
    }

    fn name(&self) -> String {
        "snipkit".to_string()
    }
}

/// Fake editor: a plain string buffer plus recorded UI effects. `run_on_ui`
/// queues callbacks on a channel; tests play the UI loop by pumping it.
pub struct FakeUi {
    pub buffer: Mutex<String>,
    pub selection: Mutex<Option<Selection>>,
    pub statuses: Mutex<Vec<String>>,
    pub notifications: Mutex<Vec<String>>,
    pub output_surfaces: Mutex<Vec<(String, String)>>,
    pub shown_items: Mutex<Vec<Vec<ListItem>>>,
    pub pending_select: Mutex<Option<SelectCallback>>,
    pub pending_highlight: Mutex<Option<HighlightCallback>>,
    ui_tx: Sender<UiCallback>,
}

impl FakeUi {
    pub fn new() -> (Arc<Self>, Receiver<UiCallback>) {
        let (ui_tx, ui_rx) = channel();
        let ui = Arc::new(Self {
            buffer: Mutex::new(String::new()),
            selection: Mutex::new(None),
            statuses: Mutex::new(Vec::new()),
            notifications: Mutex::new(Vec::new()),
            output_surfaces: Mutex::new(Vec::new()),
            shown_items: Mutex::new(Vec::new()),
            pending_select: Mutex::new(None),
            pending_highlight: Mutex::new(None),
            ui_tx,
        });
        (ui, ui_rx)
    }

    pub fn with_buffer(buffer: &str, selection: Option<(usize, usize)>) -> (Arc<Self>, Receiver<UiCallback>) {
        let (ui, rx) = Self::new();
        *ui.buffer.lock() = buffer.to_string();
        if let Some((start, end)) = selection {
            *ui.selection.lock() = Some(Selection {
                range: TextRange { start, end },
                text: buffer[start..end].to_string(),
            });
        }
        (ui, rx)
    }

    pub fn last_status(&self) -> String {
        self.statuses.lock().last().cloned().unwrap_or_default()
    }

    pub fn take_select(&self) -> SelectCallback {
        self.pending_select
            .lock()
            .take()
            .expect("a selectable list should be showing")
    }
}

impl EditorUi for FakeUi {
    fn show_selectable_list(
        &self,
        items: Vec<ListItem>,
        on_select: SelectCallback,
        on_highlight: HighlightCallback,
    ) {
        self.shown_items.lock().push(items);
        *self.pending_select.lock() = Some(on_select);
        *self.pending_highlight.lock() = Some(on_highlight);
    }

    fn show_status(&self, text: &str) {
        self.statuses.lock().push(text.to_string());
    }

    fn read_selection(&self) -> Option<Selection> {
        self.selection.lock().clone()
    }

    fn replace_range(&self, range: TextRange, text: &str) {
        let mut buffer = self.buffer.lock();
        buffer.replace_range(range.start..range.end, text);
    }

    fn insert_at(&self, position: usize, text: &str) {
        self.buffer.lock().insert_str(position, text);
    }

    fn line_end(&self, position: usize) -> usize {
        let buffer = self.buffer.lock();
        buffer[position..]
            .find('\n')
            .map(|offset| position + offset)
            .unwrap_or(buffer.len())
    }

    fn show_output_surface(&self, name: &str, text: &str) {
        self.output_surfaces
            .lock()
            .push((name.to_string(), text.to_string()));
    }

    fn run_on_ui(&self, callback: UiCallback) {
        // Tests drain the queue; a send after the test finished is moot.
        let _ = self.ui_tx.send(callback);
    }

    fn blocking_notify(&self, text: &str) {
        self.notifications.lock().push(text.to_string());
    }
}

/// Runs the next queued UI callback, waiting for background work to post it.
pub fn pump_one(ui_rx: &Receiver<UiCallback>) -> Result<()> {
    let callback = ui_rx
        .recv_timeout(Duration::from_secs(5))
        .context("timed out waiting for a UI callback")?;
    callback();
    Ok(())
}

pub fn core(tool: Arc<FakeTool>, ui: Arc<FakeUi>) -> Arc<Core> {
    Arc::new(Core {
        catalog: Arc::new(Catalog::new()),
        tool,
        workers: Arc::new(Workers::start().expect("workers start")),
        ui,
    })
}
