use std::collections::BTreeSet;

use scraper::ElementRef;

use crate::{static_regex, static_selector};

/// Collapses every whitespace run (including non-breaking spaces) to a single space and trims.
pub fn normalize_whitespace(s: &str) -> String {
    static_regex!(WHITESPACE <- r"\s+");
    WHITESPACE.replace_all(s, " ").trim().to_owned()
}

pub fn element_text(element: ElementRef<'_>) -> String {
    normalize_whitespace(&element.text().collect::<String>())
}

/// Name of a menu row: the first link's text when it has any, otherwise the whole row.
pub fn item_name(row: ElementRef<'_>) -> String {
    static_selector!(LINK <- "a");
    row.select(&LINK)
        .next()
        .map(element_text)
        .filter(|name| !name.is_empty())
        .unwrap_or_else(|| element_text(row))
}

/// Dietary tags from `img` icons, reading `title` before `alt`.
pub fn image_tags(row: ElementRef<'_>) -> BTreeSet<String> {
    static_selector!(IMAGE <- "img");
    labels(row.select(&IMAGE), &["title", "alt"])
}

/// Dietary tags from any icon markup the generic layouts use.
pub fn icon_tags(row: ElementRef<'_>) -> BTreeSet<String> {
    static_selector!(ICON <- "img, svg[aria-label], i[title]");
    labels(row.select(&ICON), &["alt", "title", "aria-label"])
}

fn labels<'a>(
    icons: impl Iterator<Item = ElementRef<'a>>,
    attributes: &[&str],
) -> BTreeSet<String> {
    icons
        .filter_map(|icon| {
            attributes
                .iter()
                .filter_map(|name| icon.value().attr(name))
                .map(str::trim)
                .find(|label| !label.is_empty())
                .map(str::to_owned)
        })
        .collect()
}

/// Direct element children of `element` whose tag is one of `names`.
pub fn child_elements<'a, 'n>(
    element: ElementRef<'a>,
    names: &'n [&'n str],
) -> impl Iterator<Item = ElementRef<'a>> + 'n
where
    'a: 'n,
{
    element
        .children()
        .filter_map(ElementRef::wrap)
        .filter(move |child| names.contains(&child.value().name()))
}
