//! String template rendering utilities.

/// Render a template with positional `{{0}}`, `{{1}}`, ... placeholders.
///
/// Placeholders without a matching argument are left in place so a
/// half-configured message is still recognizable in a report.
pub fn render_positional(template: &str, args: &[&str]) -> String {
    let mut result = template.to_string();

    for (index, value) in args.iter().enumerate() {
        let placeholder = format!("{{{{{}}}}}", index);
        result = result.replace(&placeholder, value);
    }

    result
}
