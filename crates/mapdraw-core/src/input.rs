//! Value input: tab-separated batch tables and interactive prompting.

use std::collections::HashMap;
use std::fs::{self, File};
use std::io::{BufRead, BufWriter, Write};
use std::path::{Path, PathBuf};

use log::{debug, warn};
use serde::Serialize;

use crate::alias::AliasTable;
use crate::catalog::RegionCatalog;
use crate::error::{MapError, Result};

/// Intensity assigned to every entry when all batch values are equal.
pub const DEGENERATE_INTENSITY: f64 = 0.5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum InputMode {
    Batch,
    Interactive,
}

/// A canonical country name and its value.
#[derive(Debug, Clone, PartialEq)]
pub struct ValueEntry {
    pub name: String,
    pub value: f64,
}

/// Entries keyed by canonical name, in first-seen order. A repeated name
/// overwrites the earlier value.
#[derive(Debug, Clone, Default)]
pub struct ValueTable {
    entries: Vec<ValueEntry>,
    index: HashMap<String, usize>,
}

impl ValueTable {
    pub fn insert(&mut self, name: &str, value: f64) {
        match self.index.get(name) {
            Some(&i) => self.entries[i].value = value,
            None => {
                self.index.insert(name.to_owned(), self.entries.len());
                self.entries.push(ValueEntry {
                    name: name.to_owned(),
                    value,
                });
            }
        }
    }

    pub fn get(&self, name: &str) -> Option<f64> {
        self.index.get(name).map(|&i| self.entries[i].value)
    }

    pub fn entries(&self) -> &[ValueEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Linear min-max rescale into [0, 1]. When every value is equal each
    /// entry gets [`DEGENERATE_INTENSITY`].
    pub fn rescale(&mut self) {
        let (min, max) = self
            .entries
            .iter()
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), e| {
                (lo.min(e.value), hi.max(e.value))
            });
        // Halved so that `max - min` cannot overflow for finite extremes.
        let (lo, half_span) = (min / 2.0, max / 2.0 - min / 2.0);
        if half_span > 0.0 {
            for e in &mut self.entries {
                e.value = ((e.value / 2.0 - lo) / half_span).clamp(0.0, 1.0);
            }
        } else {
            if self.entries.len() > 1 {
                warn!("all {} values are equal; using intensity {DEGENERATE_INTENSITY}", self.len());
            }
            for e in &mut self.entries {
                e.value = DEGENERATE_INTENSITY;
            }
        }
    }
}

fn parse_finite(raw: &str) -> Option<f64> {
    raw.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}

fn parse_value(raw: &str, path: &Path, line: usize) -> Result<f64> {
    parse_finite(raw).ok_or_else(|| MapError::MalformedInputRow {
        path: path.to_path_buf(),
        line,
        message: format!("not a finite number: {:?}", raw.trim()),
    })
}

// ── Batch mode ───────────────────────────────────────────────────────────────

/// Parse `name<TAB>value` rows. Blank lines, rows with an empty name and rows
/// with an empty or missing value are skipped. `path` is only used in errors.
pub fn parse_batch(text: &str, path: &Path, aliases: &AliasTable) -> Result<ValueTable> {
    let mut table = ValueTable::default();
    for (i, line) in text.lines().enumerate() {
        let mut fields = line.split('\t');
        let name = fields.next().unwrap_or_default();
        if name.is_empty() {
            continue;
        }
        let raw = fields.next().unwrap_or_default();
        if raw.is_empty() {
            debug!("{}:{}: no value for {name:?}", path.display(), i + 1);
            continue;
        }
        let value = parse_value(raw, path, i + 1)?;
        table.insert(aliases.resolve(name), value);
    }
    Ok(table)
}

/// Read a batch table and rescale it into [0, 1].
pub fn read_batch(path: &Path, aliases: &AliasTable) -> Result<ValueTable> {
    let text = fs::read_to_string(path).map_err(|e| MapError::io(path, e))?;
    let mut table = parse_batch(&text, path, aliases)?;
    table.rescale();
    Ok(table)
}

// ── Interactive mode ─────────────────────────────────────────────────────────

/// A country to prompt for, with its line in the list file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListedName {
    pub line: usize,
    pub name: String,
}

pub fn parse_country_list(text: &str) -> Vec<ListedName> {
    text.lines()
        .enumerate()
        .filter(|(_, l)| !l.is_empty())
        .map(|(i, l)| ListedName {
            line: i + 1,
            name: l.to_owned(),
        })
        .collect()
}

pub fn read_country_list(path: &Path) -> Result<Vec<ListedName>> {
    let text = fs::read_to_string(path).map_err(|e| MapError::io(path, e))?;
    Ok(parse_country_list(&text))
}

/// Append-only record of interactive answers in batch format. Every answer
/// is flushed as soon as it is written.
pub struct Backup<W: Write> {
    path: PathBuf,
    out: W,
}

impl Backup<BufWriter<File>> {
    pub fn create(path: &Path) -> Result<Self> {
        let file = File::create(path).map_err(|e| MapError::io(path, e))?;
        Ok(Self::new(path, BufWriter::new(file)))
    }
}

impl<W: Write> Backup<W> {
    pub fn new(path: &Path, out: W) -> Self {
        Self {
            path: path.to_path_buf(),
            out,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn record(&mut self, name: &str, answer: &str) -> Result<()> {
        writeln!(self.out, "{name}\t{answer}")
            .and_then(|()| self.out.flush())
            .map_err(|e| MapError::io(&self.path, e))
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

/// Prompt for each listed country on `console`, reading answers from `answers`.
///
/// A blank answer skips the country; end of input stops early and keeps what
/// was collected. Values are stored as given, without rescaling.
pub fn collect_interactive<R, C, W>(
    names: &[ListedName],
    mut answers: R,
    mut console: C,
    backup: &mut Backup<W>,
    aliases: &AliasTable,
) -> Result<ValueTable>
where
    R: BufRead,
    C: Write,
    W: Write,
{
    let console_err = |e| MapError::io(Path::new("<console>"), e);
    let mut table = ValueTable::default();
    let mut buf = String::new();

    for listed in names {
        write!(console, "{}: ", listed.name).map_err(console_err)?;
        console.flush().map_err(console_err)?;

        buf.clear();
        if answers.read_line(&mut buf).map_err(console_err)? == 0 {
            warn!("input closed after {} answers", table.len());
            break;
        }
        let answer = buf.trim();
        if answer.is_empty() {
            continue;
        }
        let value = parse_finite(answer).ok_or_else(|| MapError::MalformedAnswer {
            name: listed.name.clone(),
            answer: answer.to_owned(),
        })?;
        if !(0.0..=1.0).contains(&value) {
            warn!("{}: {value} is outside [0, 1] and will saturate", listed.name);
        }
        table.insert(aliases.resolve(&listed.name), value);
        backup.record(&listed.name, answer)?;
    }
    Ok(table)
}

// ── Resolution to region codes ───────────────────────────────────────────────

/// An intensity attached to its region.
#[derive(Debug, Clone, PartialEq)]
pub struct CodedValue {
    pub code: String,
    pub name: String,
    pub intensity: f64,
}

#[derive(Debug, Clone, Default)]
pub struct Resolution {
    pub values: Vec<CodedValue>,
    /// Names skipped in lenient mode.
    pub skipped: Vec<String>,
}

/// Look every canonical name up in the catalog. Unknown names abort the run
/// unless `lenient`, in which case they are logged and skipped.
pub fn resolve_codes(
    table: &ValueTable,
    catalog: &RegionCatalog,
    lenient: bool,
) -> Result<Resolution> {
    let mut out = Resolution::default();
    for entry in table.entries() {
        match catalog.code_for(&entry.name) {
            Some(code) => out.values.push(CodedValue {
                code: code.to_owned(),
                name: entry.name.clone(),
                intensity: entry.value,
            }),
            None if lenient => {
                warn!("no region named {:?}; skipping", entry.name);
                out.skipped.push(entry.name.clone());
            }
            None => {
                return Err(MapError::UnresolvableCountryName {
                    name: entry.name.clone(),
                })
            }
        }
    }
    Ok(out)
}
