//! Source-side row model for the wide-column scan.
//!
//! A [`SourceRow`] is one row from the post table: a row key plus cell
//! values addressed by (column family, column qualifier). The engine only
//! needs two accessors from it: the row key, and cell-by-(family, qualifier)
//! returning raw bytes or absent.

use std::collections::BTreeMap;

/// Column family holding post content (`user`, `message` qualifiers).
pub const FAMILY_POST: &str = "post";
/// Column family holding geo coordinates (`lat`, `lon` qualifiers).
pub const FAMILY_LOCATION: &str = "location";

pub const QUALIFIER_USER: &str = "user";
pub const QUALIFIER_MESSAGE: &str = "message";
pub const QUALIFIER_LAT: &str = "lat";
pub const QUALIFIER_LON: &str = "lon";

/// One row from the wide-column store.
///
/// Cell values are raw bytes; decoding is the transformer's job. Families and
/// qualifiers are kept in sorted maps so iteration order is deterministic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceRow {
    key: Vec<u8>,
    cells: BTreeMap<String, BTreeMap<String, Vec<u8>>>,
}

impl SourceRow {
    #[must_use]
    pub fn new(key: impl Into<Vec<u8>>) -> Self {
        Self {
            key: key.into(),
            cells: BTreeMap::new(),
        }
    }

    /// Insert a cell value, replacing any existing value under the same
    /// (family, qualifier).
    pub fn set_cell(
        &mut self,
        family: impl Into<String>,
        qualifier: impl Into<String>,
        value: impl Into<Vec<u8>>,
    ) {
        self.cells
            .entry(family.into())
            .or_default()
            .insert(qualifier.into(), value.into());
    }

    /// Builder-style [`set_cell`](Self::set_cell).
    #[must_use]
    pub fn with_cell(
        mut self,
        family: impl Into<String>,
        qualifier: impl Into<String>,
        value: impl Into<Vec<u8>>,
    ) -> Self {
        self.set_cell(family, qualifier, value);
        self
    }

    /// Raw row key bytes.
    #[must_use]
    pub fn key(&self) -> &[u8] {
        &self.key
    }

    /// Row key rendered for log/DLQ output; invalid UTF-8 is replaced, not
    /// an error here.
    #[must_use]
    pub fn key_lossy(&self) -> String {
        String::from_utf8_lossy(&self.key).into_owned()
    }

    /// Cell value under (family, qualifier), or `None` if absent.
    #[must_use]
    pub fn cell(&self, family: &str, qualifier: &str) -> Option<&[u8]> {
        self.cells
            .get(family)
            .and_then(|quals| quals.get(qualifier))
            .map(Vec::as_slice)
    }

    /// Iterate all cells as (family, qualifier, value).
    pub fn cells(&self) -> impl Iterator<Item = (&str, &str, &[u8])> {
        self.cells.iter().flat_map(|(family, quals)| {
            quals
                .iter()
                .map(move |(qual, value)| (family.as_str(), qual.as_str(), value.as_slice()))
        })
    }
}
