//! Command sessions: one user-triggered interaction cycle, end to end.
//!
//! A session is an explicit state machine
//! (`Idle -> Loading -> Presenting -> Dispatching -> Applying -> Done`)
//! driven by events: refresh completion, list selection, background
//! completion. Every event is validated against the current state, so a
//! stray callback arriving after cancellation no-ops instead of resurrecting
//! a dead session. Tool invocations happen on worker lanes; all user-visible
//! effects run on the UI-affine context. Sessions are discarded after one
//! cycle, never pooled.

use std::path::Path;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::catalog::Catalog;
use crate::language::{DEFAULT_LANGUAGE, language_for_syntax};
use crate::protocol::{Origin, RunOutcome, SnippetRecord};
use crate::refresh::Refresher;
use crate::tool::{SnippetTool, slug_from_path, snippets_dir};
use crate::ui::{EditorUi, HighlightCallback, ListItem, SelectCallback, Selection};
use crate::worker::{OpKind, Workers};

/// Name of the output surface runs are written to.
pub const OUTPUT_SURFACE: &str = "snippets";

/// Shared collaborators a session operates against.
pub struct Core {
    pub catalog: Arc<Catalog>,
    pub tool: Arc<dyn SnippetTool>,
    pub workers: Arc<Workers>,
    pub ui: Arc<dyn EditorUi>,
}

impl Core {
    pub fn refresher(&self) -> Refresher {
        Refresher::new(
            Arc::clone(&self.catalog),
            Arc::clone(&self.tool),
            Arc::clone(&self.workers),
            Arc::clone(&self.ui),
        )
    }
}

/// How a successful run's output is applied to the editor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApplyMode {
    /// Substitute the captured selection with the output.
    Replace,
    /// Insert a newline plus the output after the line containing the end of
    /// the captured selection.
    InsertBelow,
    /// Write `Snippet: <slug>\n---\n<output>` to the output surface.
    ShowOutput,
}

enum SessionKind {
    /// Pick a snippet and insert its body at the cursor.
    Insert,
    /// Pick a snippet, run it with the selection as stdin, apply per mode.
    Run(ApplyMode),
    /// Run the active snippet file directly; always shows output, and routes
    /// failures to the output surface too so multi-line diagnostics survive.
    RunCurrentFile { slug: String },
}

enum State {
    Idle,
    Loading,
    Presenting(Vec<SnippetRecord>),
    Dispatching { slug: String },
    Applying,
    Done,
}

impl State {
    fn name(&self) -> &'static str {
        match self {
            State::Idle => "idle",
            State::Loading => "loading",
            State::Presenting(_) => "presenting",
            State::Dispatching { .. } => "dispatching",
            State::Applying => "applying",
            State::Done => "done",
        }
    }
}

pub struct Session {
    core: Arc<Core>,
    kind: SessionKind,
    /// Session language, captured once from the editing context. Only
    /// insert sessions filter or fetch by language.
    language: Option<&'static str>,
    selection: Mutex<Option<Selection>>,
    state: Mutex<State>,
}

impl Session {
    /// Starts a snippet-insertion session. `syntax` is the editor-reported
    /// syntax identifier of the active buffer.
    pub fn start_insert(core: Arc<Core>, syntax: &str) -> Arc<Session> {
        let session = Arc::new(Session {
            core,
            kind: SessionKind::Insert,
            language: language_for_syntax(syntax),
            selection: Mutex::new(None),
            state: Mutex::new(State::Idle),
        });
        Arc::clone(&session).begin();
        session
    }

    /// Starts a snippet-run session applying output per `mode`.
    pub fn start_run(core: Arc<Core>, mode: ApplyMode) -> Arc<Session> {
        let session = Arc::new(Session {
            core,
            kind: SessionKind::Run(mode),
            language: None,
            selection: Mutex::new(None),
            state: Mutex::new(State::Idle),
        });
        Arc::clone(&session).begin();
        session
    }

    /// Starts a run-current-file session for the active file. Callers should
    /// gate on [`run_current_file_available`] first.
    pub fn start_run_current_file(core: Arc<Core>, file_path: &Path) -> Arc<Session> {
        // An empty slug is reported and terminated by begin().
        let slug = slug_from_path(file_path).unwrap_or_default();
        let session = Arc::new(Session {
            core,
            kind: SessionKind::RunCurrentFile { slug },
            language: None,
            selection: Mutex::new(None),
            state: Mutex::new(State::Idle),
        });
        Arc::clone(&session).begin();
        session
    }

    // Idle -> Loading (or straight to Dispatching for run-current-file).
    fn begin(self: Arc<Self>) {
        {
            let mut state = self.state.lock();
            if !matches!(*state, State::Idle) {
                log::debug!("ignoring begin in state {}", state.name());
                return;
            }
            *state = State::Loading;
        }

        let selection = self.core.ui.read_selection();
        let selection_required = matches!(
            self.kind,
            SessionKind::Run(ApplyMode::Replace) | SessionKind::Run(ApplyMode::InsertBelow)
        );
        let have_text = selection
            .as_ref()
            .map(|sel| !sel.text.is_empty())
            .unwrap_or(false);
        if selection_required && !have_text {
            self.core.ui.show_status("No text selected");
            self.finish();
            return;
        }
        if matches!(self.kind, SessionKind::Insert) && selection.is_none() {
            self.core.ui.show_status("Snippets: no active buffer");
            self.finish();
            return;
        }
        *self.selection.lock() = selection;

        if let SessionKind::RunCurrentFile { slug } = &self.kind {
            if slug.is_empty() {
                self.core.ui.show_status("Snippets: no file open");
                self.finish();
                return;
            }
            let slug = slug.clone();
            self.core
                .ui
                .show_status(&format!("Snippets: running {slug}..."));
            self.dispatch(slug);
            return;
        }

        self.core.ui.show_status("Snippets: loading...");
        let session = Arc::clone(&self);
        self.core
            .refresher()
            .refresh(None, true, Box::new(move || session.on_refresh_done()));
    }

    // Loading -> Presenting. Runs on the UI-affine context.
    fn on_refresh_done(self: Arc<Self>) {
        {
            let state = self.state.lock();
            if !matches!(*state, State::Loading) {
                log::debug!("ignoring refresh completion in state {}", state.name());
                return;
            }
        }

        let results = self.choose_results();
        if results.is_empty() {
            self.core.ui.show_status("No snippets available");
            self.finish();
            return;
        }

        let items: Vec<ListItem> = results.iter().map(format_list_item).collect();
        let slugs: Vec<String> = results.iter().map(|r| r.slug.clone()).collect();
        *self.state.lock() = State::Presenting(results);

        let session = Arc::clone(&self);
        let on_select: SelectCallback = Box::new(move |choice| session.on_select(choice));
        let highlight_ui = Arc::clone(&self.core.ui);
        let on_highlight: HighlightCallback = Box::new(move |index| {
            if let Some(slug) = slugs.get(index) {
                highlight_ui.show_status(&format!("Snippet: {slug}"));
            }
        });
        self.core
            .ui
            .show_selectable_list(items, on_select, on_highlight);
        self.core.ui.show_status("");
    }

    /// Merged view, language-filtered for insert sessions. Filtering that
    /// empties the list degrades to the unfiltered view.
    fn choose_results(&self) -> Vec<SnippetRecord> {
        let merged = self.core.catalog.merged_view();
        let language = match (&self.kind, self.language) {
            (SessionKind::Insert, Some(language)) => language,
            _ => return merged,
        };
        let filtered: Vec<SnippetRecord> = merged
            .iter()
            .filter(|record| record.languages.iter().any(|l| l == language))
            .cloned()
            .collect();
        if filtered.is_empty() { merged } else { filtered }
    }

    // Presenting -> Cancelled | Dispatching.
    fn on_select(self: Arc<Self>, choice: Option<usize>) {
        let record = {
            let mut state = self.state.lock();
            let results = match std::mem::replace(&mut *state, State::Done) {
                State::Presenting(results) => results,
                other => {
                    log::debug!("ignoring selection in state {}", other.name());
                    *state = other;
                    return;
                }
            };
            match choice.and_then(|index| results.into_iter().nth(index)) {
                Some(record) => record,
                None => {
                    // Dismissed, or an index the list never contained.
                    drop(state);
                    self.core.ui.show_status("");
                    return;
                }
            }
        };
        self.dispatch(record.slug);
    }

    // -> Dispatching: spawn the background invocation for this session kind.
    fn dispatch(self: Arc<Self>, slug: String) {
        *self.state.lock() = State::Dispatching { slug: slug.clone() };

        let op = match self.kind {
            SessionKind::Insert => OpKind::Fetch,
            SessionKind::Run(_) | SessionKind::RunCurrentFile { .. } => OpKind::Run,
        };
        let session = Arc::clone(&self);
        let submitted = self.core.workers.submit(op, move || match op {
            OpKind::Fetch => session.fetch_detail(&slug),
            _ => session.run_snippet(&slug),
        });
        if submitted.is_err() {
            self.core.ui.show_status("Snippets: busy, try again");
            self.finish();
        }
    }

    // Worker lane: detail fetch with the <=2-step language fallback chain.
    fn fetch_detail(self: Arc<Self>, slug: &str) {
        let mut detail = match self.core.tool.info(slug, self.language) {
            Ok(detail) => detail,
            Err(err) => {
                self.notify_and_finish(err.to_string());
                return;
            }
        };
        if detail.is_none() {
            if let Some(language) = self.language {
                if language != DEFAULT_LANGUAGE {
                    detail = match self.core.tool.info(slug, Some(DEFAULT_LANGUAGE)) {
                        Ok(detail) => detail,
                        Err(err) => {
                            self.notify_and_finish(err.to_string());
                            return;
                        }
                    };
                }
            }
        }

        let slug = slug.to_string();
        let session = Arc::clone(&self);
        self.core.ui.run_on_ui(Box::new(move || {
            session.on_detail_done(&slug, detail.map(|d| d.code));
        }));
    }

    // Worker lane: run invocation with the captured selection as stdin.
    fn run_snippet(self: Arc<Self>, slug: &str) {
        let input = {
            let selection = self.selection.lock();
            selection
                .as_ref()
                .map(|sel| sel.text.clone())
                .filter(|text| !text.is_empty())
        };
        let outcome = match self.core.tool.run(slug, input.as_deref()) {
            Ok(outcome) => outcome,
            Err(err) => {
                self.notify_and_finish(err.to_string());
                return;
            }
        };
        let slug = slug.to_string();
        let session = Arc::clone(&self);
        self.core
            .ui
            .run_on_ui(Box::new(move || session.on_run_done(&slug, outcome)));
    }

    // Dispatching -> Applying -> Done. Runs on the UI-affine context.
    fn on_detail_done(self: Arc<Self>, slug: &str, code: Option<String>) {
        if !self.enter_applying() {
            return;
        }
        match code {
            None => {
                self.core
                    .ui
                    .show_status(&format!("Failed to fetch snippet: {slug}"));
            }
            Some(code) => {
                let position = self
                    .selection
                    .lock()
                    .as_ref()
                    .map(|sel| sel.range.start)
                    .unwrap_or(0);
                self.core.ui.insert_at(position, &code);
                self.core
                    .ui
                    .show_status(&format!("Snippets: inserted {slug}"));
            }
        }
        self.finish();
    }

    // Dispatching -> Applying -> Done. Runs on the UI-affine context.
    fn on_run_done(self: Arc<Self>, slug: &str, outcome: RunOutcome) {
        if !self.enter_applying() {
            return;
        }
        if !outcome.success {
            let error = if outcome.error.is_empty() {
                "Unknown error".to_string()
            } else {
                outcome.error
            };
            self.core.ui.show_status(&format!("Error: {error}"));
            if matches!(self.kind, SessionKind::RunCurrentFile { .. }) {
                self.show_output(slug, &format!("Error: {error}"));
            }
            self.finish();
            return;
        }

        let mode = match &self.kind {
            SessionKind::Run(mode) => *mode,
            SessionKind::RunCurrentFile { .. } => ApplyMode::ShowOutput,
            // Insert sessions complete through on_detail_done.
            SessionKind::Insert => {
                log::debug!("run completion for an insert session");
                self.finish();
                return;
            }
        };
        match mode {
            ApplyMode::Replace => {
                if let Some(range) = self.selection.lock().as_ref().map(|sel| sel.range) {
                    self.core.ui.replace_range(range, &outcome.output);
                }
                self.core
                    .ui
                    .show_status(&format!("Snippets: replaced with {slug} output"));
            }
            ApplyMode::InsertBelow => {
                if let Some(range) = self.selection.lock().as_ref().map(|sel| sel.range) {
                    let line_end = self.core.ui.line_end(range.end);
                    self.core
                        .ui
                        .insert_at(line_end, &format!("\n{}", outcome.output));
                }
                self.core
                    .ui
                    .show_status(&format!("Snippets: inserted {slug} output below"));
            }
            ApplyMode::ShowOutput => {
                self.show_output(slug, &outcome.output);
                self.core
                    .ui
                    .show_status(&format!("Snippets: output from {slug}"));
            }
        }
        self.finish();
    }

    fn show_output(&self, slug: &str, body: &str) {
        self.core
            .ui
            .show_output_surface(OUTPUT_SURFACE, &format!("Snippet: {slug}\n---\n{body}"));
    }

    fn enter_applying(&self) -> bool {
        let mut state = self.state.lock();
        match *state {
            State::Dispatching { .. } => {
                *state = State::Applying;
                true
            }
            ref other => {
                log::debug!("ignoring completion in state {}", other.name());
                false
            }
        }
    }

    /// Schedules a blocking notification for a spawn/configuration fault and
    /// terminates the session. Called from worker lanes.
    fn notify_and_finish(self: Arc<Self>, text: String) {
        let ui = Arc::clone(&self.core.ui);
        ui.run_on_ui(Box::new(move || {
            self.core.ui.blocking_notify(&text);
            self.finish();
        }));
    }

    fn finish(&self) {
        *self.state.lock() = State::Done;
    }
}

fn format_list_item(record: &SnippetRecord) -> ListItem {
    let primary = match record.origin {
        Origin::Local => format!("{}  [local]", record.display_title()),
        Origin::Remote => record.display_title().to_string(),
    };
    ListItem {
        primary,
        secondary: record.description.clone(),
    }
}

/// Gating predicate for the run-current-file action: only files inside the
/// tool's snippets directory qualify.
pub fn run_current_file_available(tool: &dyn SnippetTool, file_path: Option<&Path>) -> bool {
    match file_path {
        Some(path) => path.starts_with(snippets_dir(tool)),
        None => false,
    }
}
