//! Page shell rendering.
//!
//! The rewritten upstream content is placed inside `templates/container.html`.
//! `headers` and `body_content` are inserted unescaped; everything else is
//! escaped by the template engine.

use askama::Template;

use crate::error::ProxyError;

/// Everything the page shell needs for one rendered page.
#[derive(Debug, Clone, Template)]
#[template(path = "container.html")]
pub struct RenderContext {
    /// Upstream base URL.
    pub base_clone_url: String,
    /// Proxy-visible base URL.
    pub base_url: String,
    /// Proxy-visible URL of this page.
    pub page_url: String,
    pub page_title: String,
    /// `og:title` from the upstream page.
    pub meta_title: Option<String>,
    /// `og:description` from the upstream page.
    pub meta_description: Option<String>,
    /// Upstream URL this page was fetched from.
    pub clone_url: String,
    /// Rewritten `<link>`/`<style>` markup, newline separated.
    pub headers: String,
    pub body_content: String,
}

impl RenderContext {
    /// Title for the shell: the page title, else `og:title`, else the page URL.
    pub fn display_title(&self) -> &str {
        if !self.page_title.trim().is_empty() {
            &self.page_title
        } else {
            self.meta_title
                .as_deref()
                .filter(|t| !t.trim().is_empty())
                .unwrap_or(self.page_url.as_str())
        }
    }
}

pub fn render_page(context: &RenderContext) -> Result<String, ProxyError> {
    Ok(context.render()?)
}
