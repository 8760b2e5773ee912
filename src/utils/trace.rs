//! Error chain rendering for diagnostic messages.

/// Render an error and its full source chain, one cause per line.
///
/// The result is attached to execution results under the stack-trace
/// message header so a report shows how a failure propagated.
pub fn render_chain(error: &(dyn std::error::Error + 'static)) -> String {
    let mut rendered = error.to_string();

    let mut current = error.source();
    while let Some(cause) = current {
        rendered.push_str("\nCaused by: ");
        rendered.push_str(&cause.to_string());
        current = cause.source();
    }

    rendered
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;

    #[test]
    fn render_single_error_has_no_cause_lines() {
        let err = Error::InvalidArgument("content is undefined".to_string());
        let rendered = render_chain(&err);

        assert!(rendered.contains("content is undefined"));
        assert!(!rendered.contains("Caused by:"));
    }

    #[test]
    fn render_walks_source_chain() {
        let err = Error::plugin_execution_failed_with_source(
            "operation aborted",
            Error::session_connect("connection refused"),
        );
        let rendered = render_chain(&err);

        assert!(rendered.contains("operation aborted"));
        assert!(rendered.contains("Caused by: Session connect failed: connection refused"));
    }
}
