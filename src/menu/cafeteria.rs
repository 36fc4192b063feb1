use std::sync::OnceLock;

use regex::{RegexSet, RegexSetBuilder};

use crate::parse::normalize_whitespace;

/// One of the dining halls surfaced to clients.
#[derive(Debug, PartialEq, Eq)]
pub struct CafeteriaSpec {
    slug: &'static str,
    name: &'static str,
    patterns: &'static [&'static str],
}

impl CafeteriaSpec {
    pub const fn slug(&self) -> &'static str {
        self.slug
    }

    pub const fn name(&self) -> &'static str {
        self.name
    }
}

pub static CAFETERIAS: [CafeteriaSpec; 3] = [
    CafeteriaSpec {
        slug: "cmh",
        name: "The Market (CMH)",
        patterns: &[r"\bcmh\b", r"claudette\s*millar", r"the\s*market"],
    },
    CafeteriaSpec {
        slug: "v1",
        name: "Mudie's (Village 1)",
        patterns: &[r"\bv1\b", r"village\s*1", r"mudie"],
    },
    CafeteriaSpec {
        slug: "rev",
        name: "REVelation (Ron Eydt Village)",
        patterns: &[r"\brev\b", r"ron\s*eydt", r"revelation"],
    },
];

fn matchers() -> &'static [RegexSet] {
    static MATCHERS: OnceLock<Vec<RegexSet>> = OnceLock::new();
    MATCHERS.get_or_init(|| {
        CAFETERIAS
            .iter()
            .map(|spec| {
                RegexSetBuilder::new(spec.patterns)
                    .case_insensitive(true)
                    .build()
                    .expect("cafeteria patterns should be valid")
            })
            .collect()
    })
}

/// Classifies a free-text heading. Anything that is not one of the known cafeterias is `None`.
pub fn match_residence(heading: &str) -> Option<&'static CafeteriaSpec> {
    let heading = normalize_whitespace(heading);
    if heading.is_empty() {
        return None;
    }
    CAFETERIAS
        .iter()
        .zip(matchers())
        .find(|(_, set)| set.is_match(&heading))
        .map(|(spec, _)| spec)
}

pub fn is_known_slug(slug: &str) -> bool {
    CAFETERIAS.iter().any(|spec| spec.slug == slug)
}
