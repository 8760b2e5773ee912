//! Message formatting for execution results.
//!
//! Every completion and diagnostic message is produced from a key and
//! positional arguments so the embedding application can swap in its own
//! catalog (translations, rebranded wording) without touching the engine.

use std::collections::HashMap;

use crate::utils::template;

/// Formats user-facing text from a message key and positional arguments.
///
/// The engine treats the output as opaque; it is stored on execution
/// results and never parsed.
pub trait MessageProvider {
    fn get(&self, key: &str) -> String {
        self.get_with_args(key, &[])
    }

    fn get_with_args(&self, key: &str, args: &[&str]) -> String;
}

/// Key-to-template message provider backed by an in-memory table.
///
/// Templates use positional `{{0}}`, `{{1}}`, ... placeholders. Unknown
/// keys render as the key itself so reporting never loses a message.
pub struct TableMessageProvider {
    templates: HashMap<String, String>,
}

/// Default message catalog for the engine and the bundled process backend.
const DEFAULT_MESSAGES: &[(&str, &str)] = &[
    ("cr.completed", "Command completed successfully."),
    ("cr.error", "Command failed with error: {{0}}"),
    ("sh.connect_info", "Connecting session to resource [{{0}}]."),
    ("sh.connected_info", "Session connected successfully."),
    (
        "sh.retry_info",
        "Session connect attempt {{0}} of {{1}} failed, retrying in {{2}} ms.",
    ),
    (
        "sh.disconnect_info",
        "Disconnecting session from resource [{{0}}].",
    ),
    ("sh.disconnected_info", "Session disconnected successfully."),
    (
        "sh.disconnect_error",
        "Session disconnect failed with error: {{0}}",
    ),
    ("do.completed", "Operation completed successfully."),
    (
        "do.failed",
        "Operation failed with {{0}} failed and {{1}} erroneous steps.",
    ),
    ("do.error", "Operation failed with error: {{0}}"),
    ("do.run_info", "Execute process [{{0}}]."),
    (
        "do.assert_info",
        "Assert output of process [{{0}}] contains [{{1}}].",
    ),
    (
        "do.continuation_enforced",
        "Remaining steps skipped due to enforcement of the continuation policy.",
    ),
    ("pe.completed", "Process completed successfully."),
    ("pe.exitvalue_failed", "Process failed with exit value {{0}}."),
    (
        "pe.timeout_error",
        "Process [{{0}}] was killed after exceeding the {{1}} ms timeout.",
    ),
    (
        "pe.assert_failed",
        "Process output didn't contain expected value [{{0}}].",
    ),
    ("pe.timeout_info", "Default timeout of {{0}} ms used."),
];

impl TableMessageProvider {
    /// Create a provider seeded with the engine's default catalog.
    pub fn new() -> Self {
        Self::with_messages(DEFAULT_MESSAGES)
    }

    /// Create a provider from an explicit key/template table.
    pub fn with_messages(entries: &[(&str, &str)]) -> Self {
        let templates = entries
            .iter()
            .map(|(key, template)| (key.to_string(), template.to_string()))
            .collect();
        Self { templates }
    }

    /// Add or replace a single template.
    pub fn insert(&mut self, key: &str, template: &str) {
        self.templates.insert(key.to_string(), template.to_string());
    }
}

impl Default for TableMessageProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl MessageProvider for TableMessageProvider {
    fn get_with_args(&self, key: &str, args: &[&str]) -> String {
        match self.templates.get(key) {
            Some(template) => template::render_positional(template, args),
            None => key.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn get_renders_template_without_args() {
        let provider = TableMessageProvider::new();
        assert_eq!(provider.get("pe.completed"), "Process completed successfully.");
    }

    #[test]
    fn get_with_args_renders_positional_args() {
        let provider = TableMessageProvider::new();
        let message = provider.get_with_args("pe.exitvalue_failed", &["3"]);
        assert_eq!(message, "Process failed with exit value 3.");
    }

    #[test]
    fn unknown_key_renders_as_key() {
        let provider = TableMessageProvider::new();
        assert_eq!(provider.get("no.such_key"), "no.such_key");
    }

    #[test]
    fn insert_replaces_template() {
        let mut provider = TableMessageProvider::new();
        provider.insert("pe.completed", "Done in {{0}} ms.");
        assert_eq!(provider.get_with_args("pe.completed", &["12"]), "Done in 12 ms.");
    }

    #[test]
    fn with_messages_builds_custom_catalog() {
        let provider = TableMessageProvider::with_messages(&[("greet", "Hello {{0}}!")]);
        assert_eq!(provider.get_with_args("greet", &["world"]), "Hello world!");
    }
}
