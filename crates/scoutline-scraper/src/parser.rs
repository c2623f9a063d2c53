//! Helpers for pulling text, attributes and site IDs out of parsed HTML.

use scraper::{ElementRef, Html, Selector};

/// Parse a selector written into the source.
#[must_use]
pub fn selector(css: &str) -> Selector {
    Selector::parse(css).expect("static selector is valid")
}

/// Parse a selector that came from configuration.
pub fn parse_selector(css: &str) -> Result<Selector, String> {
    Selector::parse(css).map_err(|e| format!("invalid selector '{css}': {e}"))
}

/// Visible text of an element with whitespace collapsed.
#[must_use]
pub fn text_of(element: ElementRef<'_>) -> String {
    element
        .text()
        .collect::<Vec<_>>()
        .join(" ")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Text of the first descendant matching `selector`, if any and non-empty.
#[must_use]
pub fn select_text(element: ElementRef<'_>, selector: &Selector) -> Option<String> {
    element
        .select(selector)
        .next()
        .map(text_of)
        .filter(|text| !text.is_empty())
}

/// Attribute of the first descendant matching `selector`.
#[must_use]
pub fn select_attr(element: ElementRef<'_>, selector: &Selector, attr: &str) -> Option<String> {
    element
        .select(selector)
        .next()
        .and_then(|el| el.value().attr(attr))
        .map(str::to_string)
}

/// Direct `td` children of a table row.
#[must_use]
pub fn cells(row: ElementRef<'_>) -> Vec<ElementRef<'_>> {
    row.children()
        .filter_map(ElementRef::wrap)
        .filter(|el| el.value().name() == "td")
        .collect()
}

/// Body rows of a table, excluding rows of tables nested inside its cells.
#[must_use]
pub fn body_rows(table: ElementRef<'_>) -> Vec<ElementRef<'_>> {
    table
        .children()
        .filter_map(ElementRef::wrap)
        .filter(|el| el.value().name() == "tbody")
        .flat_map(|tbody| tbody.children().filter_map(ElementRef::wrap))
        .filter(|el| el.value().name() == "tr")
        .collect()
}

/// Whether an element has no child elements and no visible text.
#[must_use]
pub fn is_empty_cell(element: ElementRef<'_>) -> bool {
    element.children().filter_map(ElementRef::wrap).next().is_none()
        && element.text().all(|t| t.trim().is_empty())
}

/// Last path segment of a link, ignoring query string and fragment.
#[must_use]
pub fn trailing_segment(link: &str) -> Option<&str> {
    let path = link.split(['?', '#']).next().unwrap_or_default();
    path.trim_end_matches('/')
        .rsplit('/')
        .next()
        .filter(|segment| !segment.is_empty())
}

/// Path segment that follows `marker`: `id_after("/x/startseite/verein/281", "verein")`
/// is `"281"`.
#[must_use]
pub fn id_after<'a>(link: &'a str, marker: &str) -> Option<&'a str> {
    let path = link.split(['?', '#']).next().unwrap_or_default();
    let mut segments = path.split('/');
    segments.find(|segment| *segment == marker)?;
    segments.next().filter(|segment| !segment.is_empty())
}

/// File stem of an image URL: `".../flagge/tiny/189.png?lm=1"` is `"189"`.
#[must_use]
pub fn file_stem(src: &str) -> Option<&str> {
    let name = trailing_segment(src)?;
    name.split('.').next().filter(|stem| !stem.is_empty())
}

/// Parse a whole document.
#[must_use]
pub fn document(html: &str) -> Html {
    Html::parse_document(html)
}
