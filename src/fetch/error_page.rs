//! Diagnostic pages served in place of a page that could not be fetched.

/// Escapes text for use inside HTML element content and attribute values.
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// Renders a standalone HTML document describing a failed fetch.
///
/// `title` and `message` are plain text; `url` is shown below the message.
/// Every line of the result ends with `\n`.
pub fn render(title: &str, message: &str, url: &str) -> String {
    let title = escape_html(title);
    let message = escape_html(message);
    let url = escape_html(url);

    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="UTF-8">
<meta name="viewport" content="width=device-width, initial-scale=1.0">
<title>Error - {title}</title>
<style>
body {{ font-family: Arial, sans-serif; max-width: 800px; margin: 0 auto; padding: 20px; background-color: #f5f5f5; }}
.error-container {{ background: white; padding: 30px; border-radius: 8px; text-align: center; }}
.error-title {{ color: #333; font-size: 24px; }}
.error-message {{ color: #666; line-height: 1.6; }}
.error-url {{ color: #999; font-family: monospace; word-break: break-all; }}
</style>
</head>
<body>
<div class="error-container">
<h1 class="error-title">{title}</h1>
<p class="error-message">{message}</p>
<p class="error-url">{url}</p>
<p class="error-footer">Delivered by the relay. Check that the relay host has internet access.</p>
</div>
</body>
</html>
"#
    )
}
