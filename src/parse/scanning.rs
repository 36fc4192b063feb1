//! Last-resort parser: a depth-first walk over every element that guesses where residences,
//! stations and dishes start from heading text and list/paragraph structure.
//!
//! Which tags count as headings, lists or paragraphs, and which heading texts open a
//! station, are data held in [`ScanRules`] rather than baked into the walk.
use std::collections::{BTreeSet, HashMap};
use std::mem;
use std::sync::OnceLock;

use regex::{RegexSet, RegexSetBuilder};
use scraper::{ElementRef, Node};

use super::text::{child_elements, element_text, icon_tags, item_name, normalize_whitespace};
use super::Page;
use crate::error::{Error, Result};
use crate::menu::{match_residence, CafeteriaSpec, MenuItem, Residence, Station};

/// What an element means to the scanning walk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    /// May open a residence (via the cafeteria matcher) or a station (via the keywords).
    Heading,
    /// Each direct `li` child is a dish.
    List,
    /// Split on line breaks and bullets into dishes.
    Paragraph,
}

#[derive(Debug)]
pub struct ScanRules {
    roles: HashMap<String, Role>,
    station_keywords: RegexSet,
}

impl ScanRules {
    pub const HEADINGS: &'static [&'static str] = &["h1", "h2", "h3", "h4", "h5", "strong", "b"];
    pub const LISTS: &'static [&'static str] = &["ul", "ol"];
    pub const PARAGRAPHS: &'static [&'static str] = &["p"];
    pub const STATION_KEYWORDS: &'static [&'static str] = &[
        "grill",
        "pizza",
        "pasta",
        r"stir\s*fry",
        "deli",
        "soup",
        "breakfast",
        "lunch",
        "dinner",
        "entree",
        "station",
        "chef",
    ];

    /// Station keywords are case-insensitive regular expressions.
    pub fn new<'r>(
        roles: impl IntoIterator<Item = (&'r str, Role)>,
        station_keywords: &[&str],
    ) -> Result<Self> {
        let station_keywords = RegexSetBuilder::new(station_keywords)
            .case_insensitive(true)
            .build()
            .map_err(|e| Error::configuration_error(format!("invalid station keyword: {e}")))?;
        let roles = roles
            .into_iter()
            .map(|(tag, role)| (tag.to_ascii_lowercase(), role))
            .collect();
        Ok(Self {
            roles,
            station_keywords,
        })
    }

    /// The rules the food-services pages have needed so far.
    pub fn standard() -> &'static Self {
        static STANDARD: OnceLock<ScanRules> = OnceLock::new();
        STANDARD.get_or_init(|| {
            let roles = Self::HEADINGS
                .iter()
                .map(|tag| (*tag, Role::Heading))
                .chain(Self::LISTS.iter().map(|tag| (*tag, Role::List)))
                .chain(Self::PARAGRAPHS.iter().map(|tag| (*tag, Role::Paragraph)));
            Self::new(roles, Self::STATION_KEYWORDS).expect("standard scan rules should be valid")
        })
    }

    fn role(&self, tag: &str) -> Option<Role> {
        self.roles.get(tag).copied()
    }

    fn opens_station(&self, heading: &str) -> bool {
        self.station_keywords.is_match(heading)
    }
}

struct StationDraft {
    name: String,
    items: Vec<MenuItem>,
}

struct ResidenceDraft {
    cafeteria: &'static CafeteriaSpec,
    stations: Vec<StationDraft>,
}

impl ResidenceDraft {
    fn finish(self) -> Option<Residence> {
        let stations = self
            .stations
            .into_iter()
            .filter_map(|draft| Station::new(draft.name, draft.items))
            .collect();
        Residence::new(self.cafeteria, stations)
    }
}

/// Cursor state of the walk. The open station is always the last one of the open residence.
#[derive(Default)]
struct Scan {
    residences: Vec<ResidenceDraft>,
    station_open: bool,
}

impl Scan {
    fn open_residence(&mut self, cafeteria: &'static CafeteriaSpec) {
        self.residences.push(ResidenceDraft {
            cafeteria,
            stations: Vec::new(),
        });
        self.station_open = false;
    }

    fn residence_open(&self) -> bool {
        !self.residences.is_empty()
    }

    fn open_station(&mut self, name: String) {
        if let Some(residence) = self.residences.last_mut() {
            residence.stations.push(StationDraft {
                name,
                items: Vec::new(),
            });
            self.station_open = true;
        }
    }

    fn add_item(&mut self, raw_name: &str, tags: BTreeSet<String>) {
        let name = raw_name.trim_start_matches(|c: char| c == '-' || c == '•' || c.is_whitespace());
        let Some(item) = MenuItem::new(name.to_owned(), tags) else {
            return;
        };
        if !self.station_open {
            self.open_station(Station::DEFAULT_NAME.to_owned());
        }
        if let Some(station) = self
            .residences
            .last_mut()
            .and_then(|residence| residence.stations.last_mut())
        {
            station.items.push(item);
        }
    }

    fn finish(self) -> Vec<Residence> {
        self.residences
            .into_iter()
            .filter_map(ResidenceDraft::finish)
            .collect()
    }
}

pub fn parse(page: &Page<'_>) -> Vec<Residence> {
    let rules = page.rules;
    let mut scan = Scan::default();

    // skip(1): the scope itself is not part of the walk
    for element in page.scope.descendants().skip(1).filter_map(ElementRef::wrap) {
        let text = element_text(element);
        if text.is_empty() {
            continue;
        }
        match rules.role(element.value().name()) {
            Some(Role::Heading) => {
                if let Some(cafeteria) = match_residence(&text) {
                    scan.open_residence(cafeteria);
                } else if scan.residence_open() && rules.opens_station(&text) {
                    scan.open_station(text);
                }
            }
            // anything before the first residence heading belongs to nobody
            _ if !scan.residence_open() => {}
            Some(Role::List) => {
                for row in child_elements(element, &["li"]) {
                    scan.add_item(&item_name(row), icon_tags(row));
                }
            }
            Some(Role::Paragraph) => {
                for piece in paragraph_pieces(element) {
                    scan.add_item(&piece, BTreeSet::new());
                }
            }
            None => {}
        }
    }

    scan.finish()
}

/// Splits a paragraph on `<br>`, bullets and newlines, keeping pieces that look like words.
fn paragraph_pieces(paragraph: ElementRef<'_>) -> Vec<String> {
    let mut pieces = Vec::new();
    let mut current = String::new();
    for node in paragraph.descendants().skip(1) {
        match node.value() {
            Node::Text(text) => {
                for c in text.chars() {
                    if c == '•' || c == '\n' {
                        pieces.push(mem::take(&mut current));
                    } else {
                        current.push(c);
                    }
                }
            }
            Node::Element(element) if element.name() == "br" => {
                pieces.push(mem::take(&mut current));
            }
            _ => {}
        }
    }
    pieces.push(current);

    pieces
        .iter()
        .map(|piece| normalize_whitespace(piece))
        .filter(|piece| piece.chars().count() > 1 && piece.chars().any(|c| c.is_ascii_alphabetic()))
        .collect()
}
