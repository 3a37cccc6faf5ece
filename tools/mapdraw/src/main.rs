/// Choropleth renderer: recolours region fills in a blank SVG world map
/// from a table of per-country values.
///
/// Batch mode (`--csv`) rescales values to [0, 1]; interactive mode (`--txt`)
/// prompts for each listed country and keeps a running backup of the answers.
use std::fs::{self, File};
use std::io::{self, BufWriter};
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::{ArgAction, Parser};
use log::{info, LevelFilter};
use mapdraw_core::input::{self, Backup, InputMode, ValueTable};
use mapdraw_core::rewrite::{build_color_map, rewrite_document};
use mapdraw_core::{AliasTable, Document, Palette, RegionCatalog, RunReport};

// ── CLI ──────────────────────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(
    name = "mapdraw",
    about = "Colour a blank SVG world map from per-country values"
)]
struct Args {
    /// Tab-separated `country<TAB>value` table (values rescaled to [0, 1])
    #[arg(long, conflicts_with = "txt", required_unless_present_any = ["txt", "write_template"])]
    csv: Option<PathBuf>,

    /// Country list, one per line; values are entered interactively
    #[arg(long)]
    txt: Option<PathBuf>,

    /// Colour scheme: 0 olive, 1 red-teal, 2 red-blue
    #[arg(long, default_value_t = 1, allow_negative_numbers = true)]
    cl: i64,

    /// Write a blank `country<TAB>` table for every region to this path and exit
    #[arg(long, value_name = "PATH")]
    write_template: Option<PathBuf>,

    /// Path to the resulting image
    #[arg(long, required_unless_present = "write_template")]
    out: Option<PathBuf>,

    /// Warn about unknown country names instead of aborting
    #[arg(short, long)]
    ignore: bool,

    /// Blank world map with titled two-letter region ids
    #[arg(long, default_value = "res/BlankMap-World-Microstates.svg")]
    template: PathBuf,

    /// Tab-separated alias table: canonical name first, then alternates
    #[arg(long, default_value = "data/nicknames.csv")]
    aliases: PathBuf,

    /// Where interactive answers are appended as they are given
    #[arg(long, default_value = "country2intensity.backup.csv")]
    backup: PathBuf,

    /// Optional JSON summary of the painted regions
    #[arg(long)]
    report: Option<PathBuf>,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        2 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    };
    // RUST_LOG, when set, overrides the -v level.
    let _ = env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .format_timestamp(None)
        .try_init();
}

// ── Pipeline ─────────────────────────────────────────────────────────────────

fn read_values(args: &Args, aliases: &AliasTable) -> Result<(InputMode, ValueTable)> {
    if let Some(csv) = &args.csv {
        let table = input::read_batch(csv, aliases)?;
        info!("{} values from {}", table.len(), csv.display());
        return Ok((InputMode::Batch, table));
    }
    let Some(txt) = &args.txt else {
        bail!("one of --csv or --txt is required");
    };
    let names = input::read_country_list(txt)?;
    let mut backup = Backup::create(&args.backup)?;
    let stdin = io::stdin();
    let table =
        input::collect_interactive(&names, stdin.lock(), io::stdout(), &mut backup, aliases)?;
    info!(
        "{} answers, backed up to {}",
        table.len(),
        backup.path().display()
    );
    Ok((InputMode::Interactive, table))
}

fn run(args: &Args) -> Result<Option<RunReport>> {
    // Validated before any file is touched.
    let palette = Palette::from_selector(args.cl)?;

    let mut doc = Document::open(&args.template)?;
    let catalog = RegionCatalog::from_document(&doc);
    info!("{} regions in {}", catalog.len(), args.template.display());

    if let Some(path) = &args.write_template {
        let file =
            File::create(path).with_context(|| format!("Cannot create {}", path.display()))?;
        catalog
            .write_name_template(BufWriter::new(file))
            .with_context(|| format!("Write failed: {}", path.display()))?;
        info!("Wrote name table {}", path.display());
        return Ok(None);
    }

    let Some(out) = &args.out else {
        bail!("--out is required");
    };

    let aliases = AliasTable::load(&args.aliases)?;
    let (mode, table) = read_values(args, &aliases)?;
    let resolution = input::resolve_codes(&table, &catalog, args.ignore)?;

    let colors = build_color_map(&resolution.values, palette);
    let painted = rewrite_document(&mut doc, &colors, &catalog)?;
    doc.save(out)?;
    info!("Painted {} regions into {}", painted.len(), out.display());

    let mut report = RunReport::new(palette, mode, catalog.len());
    report.painted = painted;
    report.skipped = resolution.skipped;

    if let Some(path) = &args.report {
        fs::write(path, serde_json::to_string_pretty(&report)?)
            .with_context(|| format!("Write failed: {}", path.display()))?;
    }
    Ok(Some(report))
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(args.verbose);
    run(&args)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;
    use mapdraw_core::MapError;
    use std::path::Path;
    use tempfile::tempdir;

    const TEMPLATE: &str = r##"<?xml version="1.0" encoding="UTF-8"?>
<svg xmlns="http://www.w3.org/2000/svg">
  <g id="fr"><title>France</title><path style="fill:#c0c0c0"/></g>
  <g id="de"><title>Germany</title><path style="fill:#c0c0c0"/></g>
  <g id="it"><title>Italy</title><path style="fill:#c0c0c0"/></g>
</svg>
"##;

    fn args(argv: &[&str]) -> Args {
        Args::try_parse_from(std::iter::once("mapdraw").chain(argv.iter().copied())).unwrap()
    }

    fn path_arg(p: &Path) -> &str {
        p.to_str().unwrap()
    }

    #[test]
    fn cli_definition_is_consistent() {
        Args::command().debug_assert();
    }

    #[test]
    fn csv_and_txt_are_mutually_exclusive() {
        let err = Args::try_parse_from(["mapdraw", "--csv", "a", "--txt", "b", "--out", "o.svg"]);
        assert!(err.is_err());
    }

    #[test]
    fn input_and_out_are_required_without_write_template() {
        assert!(Args::try_parse_from(["mapdraw", "--out", "o.svg"]).is_err());
        assert!(Args::try_parse_from(["mapdraw", "--csv", "a"]).is_err());
        let a = args(&["--write-template", "names.csv"]);
        assert_eq!(a.cl, 1);
        assert!(!a.ignore);
    }

    #[test]
    fn invalid_palette_fails_before_any_file_is_opened() {
        let a = args(&[
            "--csv",
            "/nonexistent/values.csv",
            "--out",
            "/nonexistent/out.svg",
            "--template",
            "/nonexistent/map.svg",
            "--cl",
            "9",
        ]);
        let err = run(&a).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<MapError>(),
            Some(MapError::InvalidPalette(9))
        ));
    }

    #[test]
    fn missing_template_is_reported() {
        let a = args(&["--csv", "v.csv", "--out", "o.svg", "--template", "/nonexistent/map.svg"]);
        let err = run(&a).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<MapError>(),
            Some(MapError::MissingAsset { .. })
        ));
    }

    #[test]
    fn write_template_lists_sorted_names() {
        let dir = tempdir().unwrap();
        let template = dir.path().join("map.svg");
        let names = dir.path().join("names.csv");
        fs::write(&template, TEMPLATE).unwrap();

        let a = args(&[
            "--template",
            path_arg(&template),
            "--write-template",
            path_arg(&names),
        ]);
        assert!(run(&a).unwrap().is_none());
        assert_eq!(
            fs::read_to_string(&names).unwrap(),
            "France\t\nGermany\t\nItaly\t\n"
        );
    }

    #[test]
    fn batch_run_paints_matching_regions() {
        let dir = tempdir().unwrap();
        let template = dir.path().join("map.svg");
        let aliases = dir.path().join("nicknames.csv");
        let values = dir.path().join("values.csv");
        let out = dir.path().join("out.svg");
        let report = dir.path().join("report.json");
        fs::write(&template, TEMPLATE).unwrap();
        fs::write(&aliases, "Germany\tDeutschland\n").unwrap();
        fs::write(&values, "Deutschland\t10\nFrance\t20\n").unwrap();

        let a = args(&[
            "--csv",
            path_arg(&values),
            "--out",
            path_arg(&out),
            "--template",
            path_arg(&template),
            "--aliases",
            path_arg(&aliases),
            "--report",
            path_arg(&report),
        ]);
        let summary = run(&a).unwrap().unwrap();
        assert_eq!(summary.painted.len(), 2);
        assert_eq!(summary.mode, InputMode::Batch);

        let svg = fs::read_to_string(&out).unwrap();
        assert!(svg.contains(r##"<g id="fr"><title>France</title><path style="fill:#00B4B4"/></g>"##));
        assert!(svg.contains(r##"<g id="de"><title>Germany</title><path style="fill:#B40000"/></g>"##));
        assert!(svg.contains(r##"<g id="it"><title>Italy</title><path style="fill:#c0c0c0"/></g>"##));

        let json: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&report).unwrap()).unwrap();
        assert_eq!(json["palette"], "red_teal");
        assert_eq!(json["painted"][1]["name"], "Germany");
    }

    #[test]
    fn unknown_country_aborts_unless_ignored() {
        let dir = tempdir().unwrap();
        let template = dir.path().join("map.svg");
        let aliases = dir.path().join("nicknames.csv");
        let values = dir.path().join("values.csv");
        let out = dir.path().join("out.svg");
        fs::write(&template, TEMPLATE).unwrap();
        fs::write(&aliases, "").unwrap();
        fs::write(&values, "France\t1\nAtlantis\t2\n").unwrap();

        let base = [
            "--csv",
            path_arg(&values),
            "--out",
            path_arg(&out),
            "--template",
            path_arg(&template),
            "--aliases",
            path_arg(&aliases),
        ];
        let err = run(&args(&base)).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<MapError>(),
            Some(MapError::UnresolvableCountryName { .. })
        ));
        assert!(!out.exists());

        let mut lenient = base.to_vec();
        lenient.push("-i");
        let summary = run(&args(&lenient)).unwrap().unwrap();
        assert_eq!(summary.skipped, ["Atlantis"]);
        assert!(out.exists());
    }
}
