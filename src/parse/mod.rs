//! Turns a food-services page into a [`MenuSnapshot`].
//!
//! Three parsers share one contract and are tried in order; the first one that finds any
//! residence wins and the rest never run:
//! 1. [`structured`], the site's own daily-menu markup, scoped to the requested date;
//! 2. [`nested_list`], one section per cafeteria with nested station/dish lists;
//! 3. [`scanning`], a heuristic walk over headings, lists and paragraphs.
mod nested_list;
mod scanning;
pub(crate) mod static_pattern;
mod structured;
mod text;

use chrono::NaiveDate;
use scraper::{ElementRef, Html};

use crate::menu::{MenuSnapshot, Residence};
use crate::static_selector;

pub use scanning::ScanRules;
pub use text::normalize_whitespace;

/// Input shared by every parser.
pub struct Page<'a> {
    document: &'a Html,
    /// The page-level content container, or the whole document when there is none.
    scope: ElementRef<'a>,
    date: Option<NaiveDate>,
    rules: &'a ScanRules,
}

impl<'a> Page<'a> {
    pub fn new(document: &'a Html, date: Option<NaiveDate>, rules: &'a ScanRules) -> Self {
        static_selector!(MAIN_CONTENT <- "#main-content, main, #content, article, .region-content, .node__content, .layout-content");
        let scope = document
            .select(&MAIN_CONTENT)
            .next()
            .unwrap_or_else(|| document.root_element());
        Self {
            document,
            scope,
            date,
            rules,
        }
    }
}

type Parser = for<'p, 'a> fn(&'p Page<'a>) -> Vec<Residence>;

const PARSERS: [(&str, Parser); 3] = [
    ("structured", structured::parse),
    ("nested list", nested_list::parse),
    ("scanning", scanning::parse),
];

pub fn parse_residences(page: &Page<'_>) -> Vec<Residence> {
    for (name, parser) in PARSERS {
        let residences = parser(page);
        if !residences.is_empty() {
            log::debug!("{name} parser found {} residences", residences.len());
            return residences;
        }
    }
    log::debug!("no parser found any residences");
    Vec::new()
}

pub fn parse_menus_from_html(html: &str, date: NaiveDate) -> MenuSnapshot {
    parse_menus_with_rules(html, date, ScanRules::standard())
}

pub fn parse_menus_with_rules(html: &str, date: NaiveDate, rules: &ScanRules) -> MenuSnapshot {
    let document = Html::parse_document(html);
    let page = Page::new(&document, Some(date), rules);
    MenuSnapshot::from_residences(date, parse_residences(&page))
}
