//! Template rewriting: match top-level elements to regions and recolour them.

use std::collections::HashMap;
use std::sync::LazyLock;

use log::{debug, info};
use regex::{NoExpand, Regex};
use serde::Serialize;

use crate::catalog::RegionCatalog;
use crate::error::{MapError, Result};
use crate::input::CodedValue;
use crate::palette::{Palette, Rgb};
use crate::svg::{Document, Element};

static FILL_DECL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"fill:#[0-9a-fA-F]{6}").expect("fill pattern is valid"));

/// Region code → colour.
pub type ColorMap = HashMap<String, Rgb>;

pub fn build_color_map(values: &[CodedValue], palette: Palette) -> ColorMap {
    values
        .iter()
        .map(|v| (v.code.clone(), palette.color(v.intensity)))
        .collect()
}

/// One recoloured region.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PaintedRegion {
    pub code: String,
    pub name: String,
    pub hex: String,
    pub styles_rewritten: usize,
}

/// Region code of a top-level element: its own id when that is two
/// characters long, otherwise the first class token that is a known code.
pub fn region_id_for<'a>(el: &'a Element, catalog: &RegionCatalog) -> Option<&'a str> {
    if let Some(id) = el.attr("id").filter(|id| id.chars().count() == 2) {
        return Some(id);
    }
    el.attr("class")?
        .split_whitespace()
        .find(|token| catalog.contains_code(token))
}

/// Replace every `fill:#xxxxxx` in `style` with `fill:<hex>`. Returns the new
/// style and how many declarations were replaced.
pub fn restyle(style: &str, hex: &str) -> (String, usize) {
    let count = FILL_DECL.find_iter(style).count();
    if count == 0 {
        return (style.to_owned(), 0);
    }
    let replacement = format!("fill:{hex}");
    let updated = FILL_DECL.replace_all(style, NoExpand(&replacement)).into_owned();
    (updated, count)
}

/// Restyle `el` and all its descendants, children first.
fn paint(el: &mut Element, hex: &str) -> usize {
    let mut rewritten = 0;
    el.visit_post_order_mut(&mut |node: &mut Element| {
        let Some(style) = node.attr("style") else {
            return;
        };
        debug!(" {style}");
        let (updated, n) = restyle(style, hex);
        if n > 0 {
            node.set_attr("style", updated);
            rewritten += n;
        }
    });
    rewritten
}

/// Recolour every top-level element whose region has a colour. Elements with
/// no match are left as they are.
pub fn rewrite_document(
    doc: &mut Document,
    colors: &ColorMap,
    catalog: &RegionCatalog,
) -> Result<Vec<PaintedRegion>> {
    let root = doc
        .root_mut()
        .ok_or_else(|| MapError::xml("document has no root element"))?;
    let mut painted = Vec::new();

    for el in root.elements_mut() {
        let Some(code) = region_id_for(el, catalog).map(str::to_owned) else {
            continue;
        };
        let Some(color) = colors.get(&code) else {
            continue;
        };
        let name = catalog.name_for(&code).unwrap_or("?").to_owned();
        let hex = color.to_hex();
        info!("{code} {name}");

        let styles_rewritten = paint(el, &hex);
        painted.push(PaintedRegion {
            code,
            name,
            hex,
            styles_rewritten,
        });
    }
    Ok(painted)
}
