//! The snippet tool interface and its CLI-backed implementation.
//!
//! [`SnippetTool`] is the seam between the coordinator and the external
//! `snipkit` process: sessions and refreshes talk to the trait, tests swap in
//! scripted fakes. [`CliTool`] maps each operation onto the tool's argv
//! protocol and runs decode-or-degrade over the captured output, so the only
//! errors that escape are spawn faults from the invoker.

use std::path::{Path, PathBuf};

use crate::invoker::{InvokeError, Invoker};
use crate::protocol::{
    Origin, RunOutcome, SnippetDetail, SnippetRecord, ToolConfigInfo, parse_config, parse_detail,
    parse_list, parse_run,
};
use crate::settings::Settings;

pub trait SnippetTool: Send + Sync {
    /// `list --json [-l L]`: local snippet store.
    fn list(&self, language: Option<&str>) -> Result<Vec<SnippetRecord>, InvokeError>;

    /// `search [Q] --json [-l L]`: public gallery; no query lists everything.
    fn search(
        &self,
        query: Option<&str>,
        language: Option<&str>,
    ) -> Result<Vec<SnippetRecord>, InvokeError>;

    /// `info <slug> --json [-l L]`: full snippet body, if the tool has one.
    fn info(&self, slug: &str, language: Option<&str>)
    -> Result<Option<SnippetDetail>, InvokeError>;

    /// `run <slug> --json` with `input` piped to stdin.
    fn run(&self, slug: &str, input: Option<&str>) -> Result<RunOutcome, InvokeError>;

    /// `config --json`.
    fn config(&self) -> Result<Option<ToolConfigInfo>, InvokeError>;

    /// Short name for status and synthetic-error text.
    fn name(&self) -> String;
}

pub struct CliTool {
    invoker: Invoker,
    name: String,
}

impl CliTool {
    pub fn new(settings: &Settings) -> Self {
        Self {
            invoker: Invoker::new(settings.tool_path().clone()),
            name: settings.tool_name(),
        }
    }
}

impl SnippetTool for CliTool {
    fn list(&self, language: Option<&str>) -> Result<Vec<SnippetRecord>, InvokeError> {
        let mut args = vec!["list", "--json"];
        if let Some(language) = language {
            args.extend(["-l", language]);
        }
        let raw = self.invoker.invoke(args, None)?;
        Ok(parse_list(&raw, Origin::Local))
    }

    fn search(
        &self,
        query: Option<&str>,
        language: Option<&str>,
    ) -> Result<Vec<SnippetRecord>, InvokeError> {
        let mut args = vec!["search"];
        if let Some(query) = query {
            args.push(query);
        }
        args.push("--json");
        if let Some(language) = language {
            args.extend(["-l", language]);
        }
        let raw = self.invoker.invoke(args, None)?;
        Ok(parse_list(&raw, Origin::Remote))
    }

    fn info(
        &self,
        slug: &str,
        language: Option<&str>,
    ) -> Result<Option<SnippetDetail>, InvokeError> {
        let mut args = vec!["info", slug, "--json"];
        if let Some(language) = language {
            args.extend(["-l", language]);
        }
        let raw = self.invoker.invoke(args, None)?;
        Ok(parse_detail(&raw))
    }

    fn run(&self, slug: &str, input: Option<&str>) -> Result<RunOutcome, InvokeError> {
        let raw = self.invoker.invoke(["run", slug, "--json"], input)?;
        Ok(parse_run(&raw, &self.name))
    }

    fn config(&self) -> Result<Option<ToolConfigInfo>, InvokeError> {
        let raw = self.invoker.invoke(["config", "--json"], None)?;
        Ok(parse_config(&raw))
    }

    fn name(&self) -> String {
        self.name.clone()
    }
}

/// Snippets directory from the tool's config, falling back to `~/Snippets`
/// when the tool is unreachable or reports nothing.
pub fn snippets_dir(tool: &dyn SnippetTool) -> PathBuf {
    if let Ok(Some(config)) = tool.config() {
        if !config.snippets_dir.is_empty() {
            return PathBuf::from(config.snippets_dir);
        }
    }
    dirs::home_dir().unwrap_or_default().join("Snippets")
}

/// Slug for a snippet file: the base name without its extension.
pub fn slug_from_path(path: &Path) -> Option<String> {
    path.file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .filter(|slug| !slug.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slug_strips_directory_and_extension() {
        assert_eq!(
            slug_from_path(Path::new("/home/u/Snippets/my-helper.js")),
            Some("my-helper".to_string())
        );
        assert_eq!(
            slug_from_path(Path::new("plain-name")),
            Some("plain-name".to_string())
        );
        assert_eq!(slug_from_path(Path::new("")), None);
    }
}
