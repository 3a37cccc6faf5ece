//! Alternate country names, read from a tab-separated table.
//!
//! Each row is `canonical<TAB>alias<TAB>alias...`. Every field of a row,
//! the canonical name included, resolves to the row's first field.

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use crate::error::{MapError, Result};

#[derive(Debug, Clone, Default)]
pub struct AliasTable {
    to_canonical: HashMap<String, String>,
}

impl AliasTable {
    pub fn parse(text: &str) -> Self {
        let mut to_canonical = HashMap::new();
        for line in text.lines().filter(|l| !l.trim().is_empty()) {
            let mut fields = line.split('\t');
            let Some(canonical) = fields.next() else {
                continue;
            };
            to_canonical.insert(canonical.to_owned(), canonical.to_owned());
            for alias in fields.filter(|f| !f.is_empty()) {
                to_canonical.insert(alias.to_owned(), canonical.to_owned());
            }
        }
        Self { to_canonical }
    }

    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path).map_err(|e| {
            MapError::asset(path, e, "alias table of tab-separated country names is required")
        })?;
        Ok(Self::parse(&text))
    }

    /// Canonical name for `name`, or `name` itself when it has no entry.
    pub fn resolve<'a>(&'a self, name: &'a str) -> &'a str {
        self.to_canonical.get(name).map_or(name, String::as_str)
    }

    pub fn len(&self) -> usize {
        self.to_canonical.len()
    }

    pub fn is_empty(&self) -> bool {
        self.to_canonical.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TABLE: &str = "Germany\tDeutschland\tAllemagne\n\
                         \n\
                         United States\tUSA\tUnited States of America\n";

    #[test]
    fn alias_resolves_to_first_field() {
        let aliases = AliasTable::parse(TABLE);
        assert_eq!(aliases.resolve("Deutschland"), "Germany");
        assert_eq!(aliases.resolve("Allemagne"), "Germany");
        assert_eq!(aliases.resolve("USA"), "United States");
    }

    #[test]
    fn canonical_and_unknown_names_resolve_to_themselves() {
        let aliases = AliasTable::parse(TABLE);
        assert_eq!(aliases.resolve("Germany"), "Germany");
        assert_eq!(aliases.resolve("France"), "France");
    }

    #[test]
    fn blank_lines_and_trailing_tabs_are_ignored() {
        let aliases = AliasTable::parse("\nFrance\t\n\n");
        assert_eq!(aliases.len(), 1);
        assert_eq!(aliases.resolve(""), "");
    }

    #[test]
    fn missing_table_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nicknames.csv");
        let err = AliasTable::load(&path).unwrap_err();
        assert_eq!(err.kind(), "missing_asset");
    }
}
