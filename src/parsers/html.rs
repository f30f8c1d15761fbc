use crate::parsers::text;
use scraper::{ElementRef, Html, Node, Selector};
use url::Url;

/// Elements whose text never counts as page content
const NON_CONTENT: [&str; 4] = ["script", "style", "noscript", "template"];

/// Converts an HTML fragment to plain text, skipping scripts and styles.
///
/// Entities are decoded by the parser, so `&lt;` stays a literal `<` in the output.
pub fn fragment_text(html: &str) -> String {
    let fragment = Html::parse_fragment(html);

    let pieces = fragment
        .tree
        .root()
        .descendants()
        .filter_map(|node| match node.value() {
            Node::Text(t) => {
                let hidden = node.ancestors().any(|a| {
                    a.value()
                        .as_element()
                        .is_some_and(|e| NON_CONTENT.contains(&e.name()))
                });
                (!hidden).then_some(&**t)
            }
            _ => None,
        })
        .collect::<Vec<_>>();

    text::tidy_text(&pieces.join(" "))
}

/// Visible text of an element with whitespace collapsed
pub fn element_text(element: ElementRef<'_>) -> String {
    text::normalize_whitespace(&element.text().collect::<Vec<_>>().join(" "))
}

/// Extracts raw `href` values of every anchor in the document
pub fn parse_links(html: &str) -> Vec<String> {
    let doc = Html::parse_document(html);
    let Ok(link_selector) = Selector::parse("a[href]") else {
        return Vec::new();
    };

    let links = doc
        .select(&link_selector)
        .filter_map(|e| e.value().attr("href"))
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect::<Vec<String>>();

    ::log::debug!("HTML parser found {} links", links.len());
    links
}

/// Extracts anchors and resolves them against `base`, dropping unparseable ones
pub fn resolve_links(html: &str, base: &Url) -> Vec<Url> {
    parse_links(html)
        .iter()
        .filter(|href| !href.starts_with("javascript:") && !href.starts_with('#'))
        .filter_map(|href| base.join(href).ok())
        .collect()
}
