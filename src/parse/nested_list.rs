//! Fallback for pages that wrap each cafeteria in its own section and list stations as
//! top-level list entries with the dishes in a nested list.
use scraper::ElementRef;

use super::text::{child_elements, element_text, icon_tags, item_name};
use super::Page;
use crate::menu::{match_residence, MenuItem, Residence, Station};
use crate::static_selector;

const LISTS: &[&str] = &["ul", "ol"];

pub fn parse(page: &Page<'_>) -> Vec<Residence> {
    static_selector!(SECTION <- ".views-row, .node, .block, section, article");
    static_selector!(HEADING <- "h1, h2, h3, h4, h5, strong, b");
    static_selector!(LIST <- "ul, ol");

    page.scope
        .select(&SECTION)
        .filter_map(|section| {
            let heading = section.select(&HEADING).next()?;
            let cafeteria = match_residence(&element_text(heading))?;
            let list = section.select(&LIST).next()?;
            let stations = child_elements(list, &["li"])
                .filter_map(station_from_entry)
                .collect();
            Residence::new(cafeteria, stations)
        })
        .collect()
}

fn station_from_entry(entry: ElementRef<'_>) -> Option<Station> {
    let dishes = child_elements(entry, LISTS).next()?;
    let items = child_elements(dishes, &["li"])
        .filter_map(|row| MenuItem::new(item_name(row), icon_tags(row)))
        .collect();
    Station::new(station_label(entry), items)
}

/// Bold text directly under the entry, else the text node the entry starts with.
fn station_label(entry: ElementRef<'_>) -> String {
    if let Some(bold) = child_elements(entry, &["strong", "b"]).next() {
        let label = element_text(bold);
        if !label.is_empty() {
            return label;
        }
    }
    entry
        .first_child()
        .and_then(|node| node.value().as_text())
        .map(|text| text.trim().to_owned())
        .unwrap_or_default()
}
