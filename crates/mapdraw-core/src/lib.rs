//! Choropleth rendering by recolouring region fills in a blank SVG world map.
//!
//! Pipeline: [`svg::Document`] → [`catalog::RegionCatalog`] and
//! [`alias::AliasTable`] → [`input`] value table → [`palette`] colours →
//! [`rewrite::rewrite_document`].

pub mod alias;
pub mod catalog;
pub mod error;
pub mod input;
pub mod palette;
pub mod report;
pub mod rewrite;
pub mod svg;

pub use alias::AliasTable;
pub use catalog::{Region, RegionCatalog};
pub use error::{MapError, Result};
pub use input::{InputMode, ValueTable};
pub use palette::{Palette, Rgb};
pub use report::RunReport;
pub use svg::Document;
