use std::sync::OnceLock;

use regex::Regex;
use scraper::Selector;

/// Something that can be built once from a hardcoded source string.
pub(crate) trait Pattern: Sized {
    fn compile(source: &str) -> Result<Self, String>;
}

impl Pattern for Selector {
    fn compile(source: &str) -> Result<Self, String> {
        Self::parse(source).map_err(|e| format!("{e:?}"))
    }
}

impl Pattern for Regex {
    fn compile(source: &str) -> Result<Self, String> {
        Self::new(source).map_err(|e| e.to_string())
    }
}

#[derive(Debug)]
pub(crate) struct StaticPattern<T> {
    cell: OnceLock<T>,
    source: &'static str,
}

impl<T> StaticPattern<T> {
    pub(crate) const fn new(source: &'static str) -> Self {
        Self {
            cell: OnceLock::new(),
            source,
        }
    }
}

impl<T: Pattern> core::ops::Deref for StaticPattern<T> {
    type Target = T;

    fn deref(&self) -> &Self::Target {
        // all sources are literals, so a failure here is a programming error
        self.cell.get_or_init(|| match T::compile(self.source) {
            Ok(pattern) => pattern,
            Err(e) => panic!("Error compiling static pattern {}: {e}", self.source),
        })
    }
}

#[macro_export]
macro_rules! static_selector {
    ($x: ident <- $sel: literal) => {
        static $x: $crate::parse::static_pattern::StaticPattern<::scraper::Selector> =
            $crate::parse::static_pattern::StaticPattern::new($sel);
    };
}

#[macro_export]
macro_rules! static_regex {
    ($x: ident <- $re: literal) => {
        static $x: $crate::parse::static_pattern::StaticPattern<::regex::Regex> =
            $crate::parse::static_pattern::StaticPattern::new($re);
    };
}
