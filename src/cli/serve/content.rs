//! Live reload script injection.

use crate::embed::serve::reload_tag;

/// Inject the reload script when the response is HTML and reload is on.
pub fn maybe_inject_reload(body: Vec<u8>, content_type: &str, generation: Option<u64>) -> Vec<u8> {
    match (crate::utils::mime::is_html(content_type), generation) {
        (true, Some(generation)) => inject_reload_script(&body, generation),
        _ => body,
    }
}

/// Inject the reload script before `</head>`, or append it.
fn inject_reload_script(content: &[u8], generation: u64) -> Vec<u8> {
    let script = reload_tag(generation);
    let script_bytes = script.as_bytes();

    const PATTERN: &[u8] = b"</head>";

    let pos = content
        .windows(PATTERN.len())
        .position(|w| w.eq_ignore_ascii_case(PATTERN))
        .unwrap_or(content.len());

    let mut result = Vec::with_capacity(content.len() + script_bytes.len());
    result.extend_from_slice(&content[..pos]);
    result.extend_from_slice(script_bytes);
    result.extend_from_slice(&content[pos..]);
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::mime::types::{CSS, HTML};

    fn inject(html: &str) -> String {
        String::from_utf8(maybe_inject_reload(html.as_bytes().to_vec(), HTML, Some(3))).unwrap()
    }

    #[test]
    fn test_injects_before_head_close() {
        let out = inject("<html><head><title>t</title></HEAD><body></body></html>");
        let script = out.find("<script>").unwrap();
        assert!(script < out.find("</HEAD>").unwrap());
        assert!(out.contains("let since = 3;"));
    }

    #[test]
    fn test_appends_without_head() {
        let out = inject("<p>fragment</p>\n");
        assert!(out.starts_with("<p>fragment</p>\n<script>"));
        assert!(out.ends_with("</script>"));
    }

    #[test]
    fn test_untouched_when_disabled_or_not_html() {
        let body = b"<head></head>".to_vec();
        assert_eq!(maybe_inject_reload(body.clone(), HTML, None), body);
        assert_eq!(maybe_inject_reload(body.clone(), CSS, Some(1)), body);
    }
}
