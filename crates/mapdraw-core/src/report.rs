//! Summary of one run, written as JSON when requested.

use serde::Serialize;

use crate::input::InputMode;
use crate::palette::Palette;
use crate::rewrite::PaintedRegion;

#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub palette: Palette,
    pub selector: u8,
    pub mode: InputMode,
    pub regions_in_template: usize,
    pub painted: Vec<PaintedRegion>,
    /// Names dropped in lenient mode because no region carries them.
    pub skipped: Vec<String>,
}

impl RunReport {
    pub fn new(palette: Palette, mode: InputMode, regions_in_template: usize) -> Self {
        Self {
            palette,
            selector: palette.selector(),
            mode,
            regions_in_template,
            painted: Vec::new(),
            skipped: Vec::new(),
        }
    }
}
