//! Parser for the food-services site's own markup: a daily-menu node per date, holding one
//! paragraph block per residence, which in turn holds one "outlet" block per station.
use chrono::NaiveDate;
use scraper::ElementRef;

use super::text::{element_text, image_tags, item_name};
use super::Page;
use crate::menu::{match_residence, MenuItem, Residence, Station};
use crate::static_selector;

static_selector!(DATE_BLOCK <- ".node-uw-ct-daily-menu");

pub fn parse(page: &Page<'_>) -> Vec<Residence> {
    let scopes = match page.date {
        Some(date) => {
            let Some(block) = date_block(page, date) else {
                // never substitute another day's menu
                log::debug!("no daily menu block for {date}");
                return Vec::new();
            };
            static_selector!(CONTENT_NODE <- ".content_node");
            let inner: Vec<_> = block.select(&CONTENT_NODE).collect();
            if inner.is_empty() {
                vec![block]
            } else {
                inner
            }
        }
        None => vec![page.scope],
    };

    static_selector!(RESIDENCE_BLOCK <- ".paragraphs-item-uw-fs-para-daily-menu");
    scopes
        .into_iter()
        .flat_map(|scope| scope.select(&RESIDENCE_BLOCK))
        .filter_map(residence_from_block)
        .collect()
}

fn date_block<'a>(page: &Page<'a>, date: NaiveDate) -> Option<ElementRef<'a>> {
    let key = format!("daily-menu-{date}");
    let title = date.to_string();
    if let Some(block) = page
        .scope
        .select(&DATE_BLOCK)
        .find(|block| is_block_for(*block, &key, &title))
    {
        return Some(block);
    }

    // date pages only carry the date in the page title
    static_selector!(PAGE_TITLE <- "h1");
    let page_title: String = page
        .document
        .select(&PAGE_TITLE)
        .next()
        .map(|h1| h1.text().collect())
        .unwrap_or_default();
    if page_title.contains(&title) {
        page.scope.select(&DATE_BLOCK).next()
    } else {
        None
    }
}

fn is_block_for(block: ElementRef<'_>, key: &str, title: &str) -> bool {
    static_selector!(TITLE <- "h2");
    static_selector!(TITLE_LINK <- "h2 a");
    let about = block.value().attr("about").unwrap_or_default();
    let href = block
        .select(&TITLE_LINK)
        .next()
        .and_then(|link| link.value().attr("href"))
        .unwrap_or_default();
    let heading: String = block.select(&TITLE).flat_map(|h2| h2.text()).collect();
    about.contains(key) || href.contains(key) || heading.contains(title)
}

fn residence_from_block(block: ElementRef<'_>) -> Option<Residence> {
    static_selector!(LOCATION <- ".dm-location");
    static_selector!(OUTLET <- ".paragraphs-item-uw-fs-dm-daily-outlet-menu");
    let location = element_text(block.select(&LOCATION).next()?);
    let cafeteria = match_residence(&location)?;
    let stations = block.select(&OUTLET).filter_map(station_from_outlet).collect();
    Residence::new(cafeteria, stations)
}

fn station_from_outlet(outlet: ElementRef<'_>) -> Option<Station> {
    static_selector!(MENU_TYPE <- ".dm-menu-type .field-item");
    static_selector!(MENU_ITEM <- ".dm-menus .dm-menu-item");
    let name = outlet
        .select(&MENU_TYPE)
        .next()
        .map(element_text)
        .unwrap_or_default();
    let items = outlet
        .select(&MENU_ITEM)
        .filter_map(|row| MenuItem::new(item_name(row), image_tags(row)))
        .collect();
    Station::new(name, items)
}
