//! Visible-text rendering of DOM subtrees.
//!
//! Approximates what a browser reports as an element's inner text: source
//! whitespace collapses to single spaces, `<br>` and block-level children
//! start a new line, and the result is trimmed.

use scraper::{ElementRef, Node};

/// Elements whose content never contributes visible text.
const INVISIBLE: &[&str] = &["script", "style", "template", "noscript", "head"];

/// Elements that start a new line of inner text.
const BLOCKS: &[&str] = &[
    "p", "div", "li", "ul", "ol", "h1", "h2", "h3", "h4", "h5", "h6", "table", "tr", "section",
    "article", "blockquote", "pre", "dl", "dt", "dd",
];

/// Trimmed inner text of `element`.
pub fn inner_text(element: ElementRef<'_>) -> String {
    render(element, false)
}

/// Trimmed inner text of `element`, leaving out any nested `<ul>`/`<ol>`.
///
/// Used for list items whose sub-lists are emitted as their own fragments.
pub fn own_text(element: ElementRef<'_>) -> String {
    render(element, true)
}

fn render(element: ElementRef<'_>, skip_lists: bool) -> String {
    let mut raw = String::new();
    collect(element, skip_lists, &mut raw);
    normalize(&raw)
}

fn collect(element: ElementRef<'_>, skip_lists: bool, out: &mut String) {
    for child in element.children() {
        match child.value() {
            Node::Text(text) => {
                // Source line breaks are layout, not content.
                for ch in text.chars() {
                    out.push(if ch.is_whitespace() { ' ' } else { ch });
                }
            }
            Node::Element(el) => {
                let name = el.name();
                if INVISIBLE.contains(&name) {
                    continue;
                }
                if skip_lists && (name == "ul" || name == "ol") {
                    continue;
                }
                if name == "br" {
                    out.push('\n');
                    continue;
                }
                let Some(child_el) = ElementRef::wrap(child) else {
                    continue;
                };
                let block = BLOCKS.contains(&name);
                if block {
                    out.push('\n');
                }
                collect(child_el, skip_lists, out);
                if block {
                    out.push('\n');
                }
            }
            _ => {}
        }
    }
}

/// Collapse runs of spaces per line, drop blank lines, trim.
pub fn normalize(raw: &str) -> String {
    raw.split('\n')
        .map(|line| line.split_whitespace().collect::<Vec<_>>().join(" "))
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}
