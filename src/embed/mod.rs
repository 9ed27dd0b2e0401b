//! Embedded static resources.
//!
//! - `template` - Template types for typed variable injection
//! - `serve` - Dev server assets (live reload script)

mod template;

pub use template::{Template, TemplateVars};

pub mod serve {
    use super::{Template, TemplateVars};

    /// Path of the reload probe endpoint.
    pub const PROBE_PATH: &str = "/__tinyssg/change";

    /// Milliseconds between two probes.
    pub const POLL_INTERVAL_MS: u32 = 1000;

    /// Variables for reload.js.
    pub struct ReloadVars {
        /// Generation the page was served at
        pub generation: u64,
    }

    impl TemplateVars for ReloadVars {
        fn apply(&self, content: &str) -> String {
            content
                .replace("__TINYSSG_PROBE__", PROBE_PATH)
                .replace("__TINYSSG_GENERATION__", &self.generation.to_string())
                .replace("__TINYSSG_INTERVAL__", &POLL_INTERVAL_MS.to_string())
        }
    }

    /// Live reload script, polls the probe once per second.
    pub const RELOAD_JS: Template<ReloadVars> = Template::new(include_str!("serve/reload.js"));

    /// Inline `<script>` tag carrying the reload script.
    pub fn reload_tag(generation: u64) -> String {
        format!(
            "<script>{}</script>",
            RELOAD_JS.render(&ReloadVars { generation })
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reload_js_with_vars() {
        let rendered = serve::RELOAD_JS.render(&serve::ReloadVars { generation: 7 });
        assert!(rendered.contains("let since = 7;"));
        assert!(rendered.contains(serve::PROBE_PATH));
        assert!(rendered.contains("setInterval(poll, 1000)"));
        assert!(!rendered.contains("__TINYSSG_"));
    }

    #[test]
    fn test_reload_tag() {
        let tag = serve::reload_tag(0);
        assert!(tag.starts_with("<script>"));
        assert!(tag.ends_with("</script>"));
    }
}
