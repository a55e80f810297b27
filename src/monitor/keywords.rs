//! Keyword scanning of fetched entries
//!
//! Operators list keywords (`session`, `auth`, `token` by default) whose
//! appearance in a captured request is worth a closer look. Matching is
//! ASCII case-insensitive over header and cookie names and values, trace
//! messages and the request URL.

use crate::extract::FullEntry;
use std::fmt;

/// Part of an entry where a keyword was found
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HitLocation {
    Header,
    Cookie,
    TraceInfo,
    Url,
}

impl fmt::Display for HitLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Header => "header",
            Self::Cookie => "cookie",
            Self::TraceInfo => "trace info",
            Self::Url => "url",
        };
        f.write_str(name)
    }
}

/// A keyword found in one field of an entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeywordHit {
    pub id: u64,
    pub keyword: String,
    pub location: HitLocation,
    /// Header/cookie name or trace column the keyword appeared in
    pub field: String,
}

/// Case-insensitive keyword matcher
#[derive(Debug, Clone, Default)]
pub struct KeywordScanner {
    keywords: Vec<String>,
}

impl KeywordScanner {
    pub fn new(keywords: &[String]) -> Self {
        Self {
            keywords: keywords
                .iter()
                .map(|k| k.trim().to_ascii_lowercase())
                .filter(|k| !k.is_empty())
                .collect(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.keywords.is_empty()
    }

    /// Lists every (keyword, field) match in `entry`
    ///
    /// A keyword is reported at most once per field.
    pub fn scan(&self, entry: &FullEntry) -> Vec<KeywordHit> {
        let mut hits = Vec::new();

        for (name, value) in &entry.headers {
            self.collect(&mut hits, entry.id, HitLocation::Header, name, &[name, value]);
        }
        for (name, value) in &entry.cookies {
            self.collect(&mut hits, entry.id, HitLocation::Cookie, name, &[name, value]);
        }
        for row in &entry.trace_info {
            for (column, value) in row {
                self.collect(&mut hits, entry.id, HitLocation::TraceInfo, column, &[value]);
            }
        }
        if let Some(url) = &entry.url {
            self.collect(&mut hits, entry.id, HitLocation::Url, "url", &[url]);
        }

        hits
    }

    fn collect(
        &self,
        hits: &mut Vec<KeywordHit>,
        id: u64,
        location: HitLocation,
        field: &str,
        texts: &[&String],
    ) {
        for keyword in &self.keywords {
            let found = texts
                .iter()
                .any(|text| text.to_ascii_lowercase().contains(keyword.as_str()));
            if found {
                hits.push(KeywordHit {
                    id,
                    keyword: keyword.clone(),
                    location,
                    field: field.to_string(),
                });
            }
        }
    }
}
