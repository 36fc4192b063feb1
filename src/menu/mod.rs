//! The output schema: snapshots of residences, their stations and the dishes served there.
//!
//! Everything here is built bottom-up by the parsers and never mutated afterwards. The
//! constructors enforce the shape invariants: an item always has a name, a station always
//! has items, and a residence always has at least one station.
mod cafeteria;

use std::collections::{BTreeMap, BTreeSet};

use chrono::NaiveDate;
use serde::ser::SerializeStruct;
use serde::Serialize;

pub use cafeteria::{is_known_slug, match_residence, CafeteriaSpec, CAFETERIAS};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MenuItem {
    name: String,
    tags: BTreeSet<String>,
}

impl MenuItem {
    pub fn new(name: String, tags: BTreeSet<String>) -> Option<Self> {
        (!name.is_empty()).then_some(Self { name, tags })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub const fn tags(&self) -> &BTreeSet<String> {
        &self.tags
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Station {
    #[serde(rename = "station")]
    name: String,
    items: Vec<MenuItem>,
}

impl Station {
    pub const DEFAULT_NAME: &'static str = "Menu";

    /// `None` when there is nothing to serve. A blank name falls back to [`Self::DEFAULT_NAME`].
    pub fn new(name: String, items: Vec<MenuItem>) -> Option<Self> {
        if items.is_empty() {
            return None;
        }
        let name = if name.is_empty() {
            Self::DEFAULT_NAME.to_owned()
        } else {
            name
        };
        Some(Self { name, items })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn items(&self) -> &[MenuItem] {
        &self.items
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Residence {
    slug: &'static str,
    name: &'static str,
    stations: Vec<Station>,
}

impl Residence {
    /// `None` when no station survived parsing.
    pub fn new(cafeteria: &'static CafeteriaSpec, stations: Vec<Station>) -> Option<Self> {
        if stations.is_empty() {
            return None;
        }
        Some(Self {
            slug: cafeteria.slug(),
            name: cafeteria.name(),
            stations,
        })
    }

    pub const fn slug(&self) -> &'static str {
        self.slug
    }

    pub const fn name(&self) -> &'static str {
        self.name
    }

    pub fn stations(&self) -> &[Station] {
        &self.stations
    }

    /// Re-runs the matcher over the residence name and takes the canonical identity it yields.
    fn canonicalize(self) -> Option<Self> {
        let cafeteria = match_residence(self.name)?;
        Self::new(cafeteria, self.stations)
    }
}

/// Everything parsed for one calendar date.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MenuSnapshot {
    date: NaiveDate,
    residences: Vec<Residence>,
    cafeterias: BTreeMap<&'static str, Residence>,
    available_cafeterias: Vec<&'static str>,
}

impl MenuSnapshot {
    pub const fn empty(date: NaiveDate) -> Self {
        Self {
            date,
            residences: Vec::new(),
            cafeterias: BTreeMap::new(),
            available_cafeterias: Vec::new(),
        }
    }

    pub fn from_residences(date: NaiveDate, parsed: Vec<Residence>) -> Self {
        let residences: Vec<Residence> = parsed
            .into_iter()
            .filter_map(Residence::canonicalize)
            .collect();
        let mut cafeterias = BTreeMap::new();
        for residence in &residences {
            // last one wins when a page lists the same hall twice
            cafeterias.insert(residence.slug, residence.clone());
        }
        let available_cafeterias = cafeterias
            .keys()
            .copied()
            .filter(|slug| is_known_slug(slug))
            .collect();
        Self {
            date,
            residences,
            cafeterias,
            available_cafeterias,
        }
    }

    pub const fn date(&self) -> NaiveDate {
        self.date
    }

    pub fn residences(&self) -> &[Residence] {
        &self.residences
    }

    pub fn cafeteria(&self, slug: &str) -> Option<&Residence> {
        self.cafeterias.get(slug)
    }

    pub fn available_cafeterias(&self) -> &[&'static str] {
        &self.available_cafeterias
    }

    pub fn is_empty(&self) -> bool {
        self.cafeterias.is_empty()
    }
}

/// `residences` entries omit the slug; only the `cafeterias` map carries it.
struct ResidenceSummary<'a>(&'a Residence);

impl Serialize for ResidenceSummary<'_> {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("Residence", 2)?;
        state.serialize_field("name", self.0.name)?;
        state.serialize_field("stations", &self.0.stations)?;
        state.end()
    }
}

impl Serialize for MenuSnapshot {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let residences: Vec<_> = self.residences.iter().map(ResidenceSummary).collect();
        let mut state = serializer.serialize_struct("MenuSnapshot", 4)?;
        state.serialize_field("date", &self.date)?;
        state.serialize_field("residences", &residences)?;
        state.serialize_field("cafeterias", &self.cafeterias)?;
        state.serialize_field("availableCafeterias", &self.available_cafeterias)?;
        state.end()
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn item(name: &str, tags: &[&str]) -> MenuItem {
        MenuItem::new(name.into(), tags.iter().map(|t| (*t).to_owned()).collect()).unwrap()
    }

    fn residence(slug: &str, station: &str, items: Vec<MenuItem>) -> Residence {
        let cafeteria = CAFETERIAS.iter().find(|c| c.slug() == slug).unwrap();
        Residence::new(cafeteria, vec![Station::new(station.into(), items).unwrap()]).unwrap()
    }

    #[test]
    fn test_constructors_reject_empty_values() {
        assert!(MenuItem::new(String::new(), BTreeSet::new()).is_none());
        assert!(Station::new("Grill".into(), vec![]).is_none());
        assert!(Residence::new(&CAFETERIAS[0], vec![]).is_none());
        let station = Station::new(String::new(), vec![item("Soup", &[])]).unwrap();
        assert_eq!(station.name(), Station::DEFAULT_NAME);
    }

    #[test]
    fn test_snapshot_serialization() {
        let date = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
        let snapshot = MenuSnapshot::from_residences(
            date,
            vec![residence(
                "cmh",
                "Grill",
                vec![item("Chicken Burger", &["contains gluten"]), item("Veggie Wrap", &[])],
            )],
        );
        assert_eq!(
            serde_json::to_value(&snapshot).unwrap(),
            json!({
                "date": "2024-03-01",
                "residences": [{
                    "name": "The Market (CMH)",
                    "stations": [{
                        "station": "Grill",
                        "items": [
                            {"name": "Chicken Burger", "tags": ["contains gluten"]},
                            {"name": "Veggie Wrap", "tags": []}
                        ]
                    }]
                }],
                "cafeterias": {
                    "cmh": {
                        "slug": "cmh",
                        "name": "The Market (CMH)",
                        "stations": [{
                            "station": "Grill",
                            "items": [
                                {"name": "Chicken Burger", "tags": ["contains gluten"]},
                                {"name": "Veggie Wrap", "tags": []}
                            ]
                        }]
                    }
                },
                "availableCafeterias": ["cmh"]
            })
        );
    }

    #[test]
    fn test_duplicate_slugs_last_write_wins() {
        let date = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
        let snapshot = MenuSnapshot::from_residences(
            date,
            vec![
                residence("v1", "Deli", vec![item("Turkey Club", &[])]),
                residence("rev", "Soup", vec![item("Minestrone", &["vegan"])]),
                residence("v1", "Pizza", vec![item("Margherita", &[])]),
            ],
        );
        assert_eq!(snapshot.residences().len(), 3);
        assert_eq!(snapshot.available_cafeterias(), ["rev", "v1"]);
        let v1 = snapshot.cafeteria("v1").unwrap();
        assert_eq!(v1.stations()[0].name(), "Pizza");
        assert!(snapshot.cafeteria("cmh").is_none());
    }

    #[test]
    fn test_empty_snapshot_shape() {
        let date = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
        let snapshot = MenuSnapshot::empty(date);
        assert!(snapshot.is_empty());
        assert_eq!(
            serde_json::to_value(&snapshot).unwrap(),
            json!({
                "date": "2024-03-01",
                "residences": [],
                "cafeterias": {},
                "availableCafeterias": []
            })
        );
    }
}
