//! Snippet cache and run coordination for the `snipkit` CLI.
//!
//! This crate is the editor-agnostic core of a snippet integration: it keeps a
//! two-tier cache of snippets (fast local store, slower public gallery) merged
//! under a stable precedence rule, and drives asynchronous invocations of the
//! `snipkit` tool from background workers while a single-threaded, UI-affine
//! host stays responsive. The host editor plugs in through the
//! [`ui::EditorUi`] trait; everything user-visible is funnelled back onto the
//! UI-affine context via queued callbacks, never by blocking.
//!
//! Layering, leaf first:
//! - [`invoker`] spawns the tool and captures its output.
//! - [`protocol`] decodes tool payloads into typed records, degrading instead
//!   of failing on malformed input.
//! - [`catalog`] holds immutable snapshots of both tiers behind an atomic
//!   swap so readers never block and never see a half-written cache.
//! - [`worker`] provides one bounded background lane per operation kind.
//! - [`refresh`] repopulates the catalog off-thread and reports completion on
//!   the UI-affine context.
//! - [`session`] sequences one user command end to end as an explicit state
//!   machine.

pub mod catalog;
pub mod invoker;
pub mod language;
pub mod protocol;
pub mod refresh;
pub mod session;
pub mod settings;
pub mod tool;
pub mod ui;
pub mod worker;

pub use catalog::{Catalog, CatalogSnapshot, merge_tiers};
pub use invoker::{InvokeError, Invoker};
pub use language::{DEFAULT_LANGUAGE, language_for_syntax};
pub use protocol::{Origin, RunOutcome, SnippetDetail, SnippetRecord, ToolConfigInfo};
pub use refresh::Refresher;
pub use session::{ApplyMode, Core, Session, run_current_file_available};
pub use settings::Settings;
pub use tool::{CliTool, SnippetTool, slug_from_path, snippets_dir};
pub use ui::{EditorUi, ListItem, Selection, TextRange};
pub use worker::{OpKind, SubmitError, Workers};
