//! Keyword filter over the text of a search-results page.
//!
//! This is a heuristic: a page may yield no matches or irrelevant ones.

use ego_tree::iter::Edge;
use scraper::{Html, Node};

pub const MAX_SNIPPETS: usize = 10;

pub const KEYWORDS: [&str; 7] =
    ["temperature", "humidity", "air quality", "°", "feels like", "wind", "condition"];

const BLOCK_TAGS: [&str; 13] =
    ["p", "div", "span", "li", "td", "th", "a", "h1", "h2", "h3", "h4", "h5", "h6"];

const SKIPPED_TAGS: [&str; 4] = ["script", "style", "noscript", "template"];

/// Returns up to [`MAX_SNIPPETS`] text fragments that mention a weather
/// keyword, in document order.
///
/// A block's text includes its inline children. A nested block that matches
/// is reported on its own and left out of the enclosing block's text.
pub fn extract_snippets(html: &str) -> Vec<String> {
    let document = Html::parse_document(html);

    // One slot per block, ordered by opening tag.
    let mut slots: Vec<Option<String>> = Vec::new();
    let mut open: Vec<(usize, String)> = Vec::new();
    let mut skipped = 0usize;

    for edge in document.tree.root().traverse() {
        match edge {
            Edge::Open(node) => match node.value() {
                Node::Element(el) if SKIPPED_TAGS.contains(&el.name()) => skipped += 1,
                Node::Element(el) if skipped == 0 && BLOCK_TAGS.contains(&el.name()) => {
                    open.push((slots.len(), String::new()));
                    slots.push(None);
                }
                Node::Text(text) if skipped == 0 => {
                    if let Some((_, buf)) = open.last_mut() {
                        buf.push_str(text);
                        buf.push(' ');
                    }
                }
                _ => {}
            },
            Edge::Close(node) => {
                let Node::Element(el) = node.value() else {
                    continue;
                };
                if SKIPPED_TAGS.contains(&el.name()) {
                    skipped = skipped.saturating_sub(1);
                } else if skipped == 0 && BLOCK_TAGS.contains(&el.name()) {
                    let Some((slot, buf)) = open.pop() else {
                        continue;
                    };
                    let text = collapse_whitespace(&buf);
                    if is_weather_related(&text) {
                        slots[slot] = Some(text);
                    } else if let Some((_, parent)) = open.last_mut() {
                        parent.push_str(&text);
                        parent.push(' ');
                    }
                }
            }
        }
    }

    slots.into_iter().flatten().take(MAX_SNIPPETS).collect()
}

/// Snippets joined by newlines; empty when nothing matched.
pub fn clean_html(html: &str) -> String {
    extract_snippets(html).join("\n")
}

pub fn is_weather_related(text: &str) -> bool {
    let lower = text.to_lowercase();
    KEYWORDS.iter().any(|k| lower.contains(k))
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
