//! Region catalog: the two-letter codes and display names found in the template.

use std::collections::HashMap;
use std::io::{self, Write};

use log::debug;
use serde::Serialize;

use crate::svg::{Document, Element};

/// One named, uniquely identified area of the template.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Region {
    pub code: String,
    pub name: String,
}

impl Region {
    pub fn new(code: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            name: name.into(),
        }
    }
}

/// True for exactly two lowercase ASCII letters (`fr`, `de`, ...).
pub fn is_region_code(s: &str) -> bool {
    s.len() == 2 && s.bytes().all(|b| b.is_ascii_lowercase())
}

/// Immutable set of regions in document order, with lookups both ways.
#[derive(Debug, Clone, Default)]
pub struct RegionCatalog {
    regions: Vec<Region>,
    by_code: HashMap<String, usize>,
    by_name: HashMap<String, usize>,
}

impl RegionCatalog {
    /// Build from a region list. Later duplicates of a code are dropped; for
    /// duplicate display names the first region keeps the name lookup.
    pub fn from_regions(regions: impl IntoIterator<Item = Region>) -> Self {
        let mut catalog = Self::default();
        for region in regions {
            if catalog.by_code.contains_key(&region.code) {
                debug!("duplicate region code {} ({}) ignored", region.code, region.name);
                continue;
            }
            let idx = catalog.regions.len();
            catalog.by_code.insert(region.code.clone(), idx);
            catalog.by_name.entry(region.name.clone()).or_insert(idx);
            catalog.regions.push(region);
        }
        catalog
    }

    /// Collect every `g`/`path` element whose id is a region code and whose
    /// first child element is a non-empty `title`.
    pub fn from_document(doc: &Document) -> Self {
        let Some(root) = doc.root() else {
            return Self::default();
        };
        Self::from_regions(root.descendants().into_iter().filter_map(region_of))
    }

    pub fn regions(&self) -> &[Region] {
        &self.regions
    }

    pub fn len(&self) -> usize {
        self.regions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.regions.is_empty()
    }

    pub fn contains_code(&self, code: &str) -> bool {
        self.by_code.contains_key(code)
    }

    pub fn code_for(&self, name: &str) -> Option<&str> {
        self.by_name
            .get(name)
            .map(|&i| self.regions[i].code.as_str())
    }

    pub fn name_for(&self, code: &str) -> Option<&str> {
        self.by_code
            .get(code)
            .map(|&i| self.regions[i].name.as_str())
    }

    /// Write a blank `name<TAB>` table, one line per region, sorted by name.
    pub fn write_name_template<W: Write>(&self, mut out: W) -> io::Result<()> {
        let mut names: Vec<&str> = self.regions.iter().map(|r| r.name.as_str()).collect();
        names.sort_unstable();
        for name in names {
            writeln!(out, "{name}\t")?;
        }
        out.flush()
    }
}

fn region_of(el: &Element) -> Option<Region> {
    if !matches!(el.local_name(), "g" | "path") {
        return None;
    }
    let code = el.attr("id").filter(|id| is_region_code(id))?;
    let title = el.elements().next().filter(|c| c.local_name() == "title")?;
    let name = title.text();
    let name = name.trim();
    if name.is_empty() {
        return None;
    }
    Some(Region::new(code, name))
}

#[cfg(test)]
mod tests {
    use super::*;

    const TEMPLATE: &str = r#"<svg xmlns="http://www.w3.org/2000/svg">
  <g id="de">
    <title id="title-de">Germany</title>
    <path d="M0 0"/>
  </g>
  <path id="fr" style="fill:#c0c0c0"><title>France</title></path>
  <g id="ocean"><title>Ocean</title></g>
  <g id="xx"><path d="M1 1"/><title>Too late</title></g>
  <rect id="it"><title>Italy</title></rect>
  <g id="islands">
    <path id="mt"><title>Malta</title></path>
    <g id="AB"><title>Upper</title></g>
  </g>
</svg>"#;

    #[test]
    fn collects_titled_two_letter_regions_in_document_order() {
        let doc = Document::parse(TEMPLATE).unwrap();
        let catalog = RegionCatalog::from_document(&doc);
        assert_eq!(
            catalog.regions(),
            &[
                Region::new("de", "Germany"),
                Region::new("fr", "France"),
                Region::new("mt", "Malta"),
            ]
        );
    }

    #[test]
    fn lookups_work_both_ways() {
        let catalog = RegionCatalog::from_regions([
            Region::new("fr", "France"),
            Region::new("de", "Germany"),
        ]);
        assert_eq!(catalog.code_for("Germany"), Some("de"));
        assert_eq!(catalog.name_for("fr"), Some("France"));
        assert!(catalog.contains_code("de"));
        assert!(!catalog.contains_code("it"));
        assert_eq!(catalog.code_for("Italy"), None);
    }

    #[test]
    fn first_registration_wins() {
        let catalog = RegionCatalog::from_regions([
            Region::new("cy", "Cyprus"),
            Region::new("cy", "Northern Cyprus"),
            Region::new("nc", "Cyprus"),
        ]);
        assert_eq!(catalog.len(), 2);
        assert_eq!(catalog.name_for("cy"), Some("Cyprus"));
        assert_eq!(catalog.code_for("Cyprus"), Some("cy"));
        assert_eq!(catalog.name_for("nc"), Some("Cyprus"));
    }

    #[test]
    fn region_code_pattern() {
        assert!(is_region_code("fr"));
        assert!(!is_region_code("FR"));
        assert!(!is_region_code("fra"));
        assert!(!is_region_code("f1"));
        assert!(!is_region_code(""));
    }

    #[test]
    fn name_template_is_sorted_with_blank_values() {
        let catalog = RegionCatalog::from_regions([
            Region::new("fr", "France"),
            Region::new("at", "Austria"),
            Region::new("de", "Germany"),
        ]);
        let mut out = Vec::new();
        catalog.write_name_template(&mut out).unwrap();
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "Austria\t\nFrance\t\nGermany\t\n"
        );
    }
}
