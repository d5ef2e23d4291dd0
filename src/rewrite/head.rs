//! Document rewriting for HTML pages.
//!
//! # Responsibilities
//! - Extract `<title>` and `<meta>` values from `<head>`
//! - Collect `<link href>` and `<style>` from `<head>` with upstream-absolute URLs
//! - Strip every `<script>` under `<body>`
//! - Serialize the remaining body content
//!
//! # Design Decisions
//! - Resource URLs resolve against the upstream base, never the proxy
//! - Only direct children of `<head>` are inspected
//! - Missing `<head>`/`<body>` yield empty values, not errors
//! - Parsed with scripting disabled so `<noscript>` fallbacks stay markup
//! - Script removal walks the whole tree, `<template>` contents included

use std::collections::HashMap;
use std::fmt::Write as _;
use std::sync::LazyLock;

use html5ever::driver::{self, ParseOpts};
use html5ever::tendril::TendrilSink;
use html5ever::tree_builder::TreeBuilderOpts;
use scraper::node::Element;
use scraper::{Html, HtmlTreeSink, Node, Selector};

use crate::rewrite::{css, url::resolve};

static HEAD_META: LazyLock<Selector> = LazyLock::new(|| selector("head > meta"));
static HEAD_TITLE: LazyLock<Selector> = LazyLock::new(|| selector("head > title"));
static HEAD_RESOURCES: LazyLock<Selector> =
    LazyLock::new(|| selector("head > link[href], head > style"));
static BODY: LazyLock<Selector> = LazyLock::new(|| selector("body"));

fn selector(css: &str) -> Selector {
    Selector::parse(css).expect("static selector is valid")
}

/// Output of rewriting one upstream page.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageRewriteResult {
    /// Rewritten `<link>` and `<style>` markup, in source order.
    pub head_lines: Vec<String>,
    pub title: String,
    /// `name` (or `property`) → `content`.
    pub meta: HashMap<String, String>,
    /// Inner HTML of `<body>` with scripts removed.
    pub body_html: String,
}

impl PageRewriteResult {
    /// Head lines joined for insertion into the page shell.
    pub fn headers(&self) -> String {
        self.head_lines.join("\n")
    }

    pub fn meta_value(&self, key: &str) -> Option<&str> {
        self.meta.get(key).map(String::as_str)
    }

    /// Owned meta value, `None` when absent or blank.
    pub fn non_empty_meta(&self, key: &str) -> Option<String> {
        self.meta_value(key)
            .filter(|value| !value.trim().is_empty())
            .map(str::to_string)
    }
}

/// Rewrite `document_html` fetched from the upstream rooted at `upstream_base`.
pub fn rewrite_head(document_html: &str, upstream_base: &str) -> PageRewriteResult {
    let mut document = parse_document(document_html);

    let meta = collect_meta(&document);
    let title = document
        .select(&HEAD_TITLE)
        .flat_map(|title| title.text())
        .collect::<String>();

    let head_lines = document
        .select(&HEAD_RESOURCES)
        .map(|element| match element.value().name() {
            "style" => css::rewrite(&element.html(), upstream_base),
            _ => serialize_link(element.value(), upstream_base),
        })
        .collect();

    strip_body_scripts(&mut document);
    let body_html = document
        .select(&BODY)
        .next()
        .map(|body| body.inner_html())
        .unwrap_or_default();

    PageRewriteResult {
        head_lines,
        title,
        meta,
        body_html,
    }
}

fn parse_document(document_html: &str) -> Html {
    let opts = ParseOpts {
        tree_builder: TreeBuilderOpts {
            scripting_enabled: false,
            ..Default::default()
        },
        ..Default::default()
    };
    driver::parse_document(HtmlTreeSink::new(Html::new_document()), opts).one(document_html)
}

fn collect_meta(document: &Html) -> HashMap<String, String> {
    let mut meta = HashMap::new();
    for element in document.select(&HEAD_META) {
        let element = element.value();
        let key = element.attr("name").or_else(|| element.attr("property"));
        if let Some(key) = key {
            let content = element.attr("content").unwrap_or_default();
            meta.insert(key.to_string(), content.to_string());
        }
    }
    meta
}

/// Serialize a `<link>` start tag with its `href` made absolute.
///
/// Attributes are written in source order with html5ever's attribute escaping.
fn serialize_link(link: &Element, upstream_base: &str) -> String {
    let mut out = format!("<{}", link.name());
    for (name, value) in link.attrs() {
        let value = if name == "href" {
            resolve(value, upstream_base)
        } else {
            value.to_string()
        };
        let _ = write!(out, " {}=\"{}\"", name, escape_attr(&value));
    }
    out.push('>');
    out
}

fn escape_attr(value: &str) -> String {
    value
        .replace('&', "&amp;")
        .replace('\u{a0}', "&nbsp;")
        .replace('"', "&quot;")
}

fn strip_body_scripts(document: &mut Html) {
    let scripts: Vec<_> = document
        .tree
        .nodes()
        .filter(|node| is_element(node.value(), "script"))
        .filter(|node| node.ancestors().any(|a| is_element(a.value(), "body")))
        .map(|node| node.id())
        .collect();

    for id in scripts {
        if let Some(mut node) = document.tree.get_mut(id) {
            node.detach();
        }
    }
}

fn is_element(node: &Node, name: &str) -> bool {
    node.as_element().is_some_and(|el| el.name() == name)
}
