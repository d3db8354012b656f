//! The editor collaborator surface consumed by the core.
//!
//! Everything a host editor must provide: a selectable list, a status line,
//! text read/write at a cursor or range, an output surface, a way to queue a
//! zero-delay callback on the UI-affine context, and a blocking notification
//! reserved for configuration errors. The core never blocks the UI-affine
//! context and performs all user-visible mutation through this trait from
//! callbacks scheduled via [`EditorUi::run_on_ui`].

/// Callback queued onto the UI-affine context.
pub type UiCallback = Box<dyn FnOnce() + Send + 'static>;

/// Invoked with the chosen index, or `None` when the user dismisses the list.
pub type SelectCallback = Box<dyn FnOnce(Option<usize>) + Send + 'static>;

/// Invoked as the user moves through the list.
pub type HighlightCallback = Box<dyn Fn(usize) + Send + 'static>;

/// Half-open byte range in the active buffer. Offsets index the buffer's
/// UTF-8 bytes, not characters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextRange {
    pub start: usize,
    pub end: usize,
}

impl TextRange {
    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }
}

/// Captured selection; an empty `text` means a bare caret.
#[derive(Debug, Clone)]
pub struct Selection {
    pub range: TextRange,
    pub text: String,
}

/// One row of the selectable list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListItem {
    pub primary: String,
    pub secondary: String,
}

pub trait EditorUi: Send + Sync {
    fn show_selectable_list(
        &self,
        items: Vec<ListItem>,
        on_select: SelectCallback,
        on_highlight: HighlightCallback,
    );

    fn show_status(&self, text: &str);

    /// Active selection, or `None` when no buffer has focus.
    fn read_selection(&self) -> Option<Selection>;

    fn replace_range(&self, range: TextRange, text: &str);

    fn insert_at(&self, position: usize, text: &str);

    /// Byte offset just past the last character of the line containing
    /// `position`, excluding the line terminator.
    fn line_end(&self, position: usize) -> usize;

    fn show_output_surface(&self, name: &str, text: &str);

    /// Queues `callback` to run on the UI-affine context with zero delay.
    fn run_on_ui(&self, callback: UiCallback);

    /// Blocking notification; reserved for configuration and spawn errors
    /// that need user action rather than a transient status line.
    fn blocking_notify(&self, text: &str);
}
