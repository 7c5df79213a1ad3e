use std::fmt::Write as _;

use anyhow::{Context, Result};
use clap::Args;
use serde::Serialize;
use time::format_description::well_known::Rfc3339;

use crate::app::App;
use crate::catalog::{compute_range, compute_ranges, Clock, DateSpan, PresetKey};
use crate::picker::resolve_logged;

#[derive(Args, Debug, Clone)]
pub struct PresetsArgs {
    /// Emit JSON instead of a table
    #[arg(long)]
    pub json: bool,
}

#[derive(Args, Debug, Clone)]
pub struct RangeArgs {
    /// Preset key such as Last7Days (unknown keys fall back to Last28Days)
    #[arg()]
    pub key: String,
    /// Emit JSON instead of text
    #[arg(long)]
    pub json: bool,
}

#[derive(Debug, Serialize)]
struct PresetRow {
    key: PresetKey,
    label: &'static str,
    #[serde(flatten)]
    span: DateSpan,
}

impl PresetRow {
    fn new(key: PresetKey, span: DateSpan) -> Self {
        Self {
            key,
            label: key.label(),
            span,
        }
    }
}

pub fn run_tui(app: &mut App) -> Result<()> {
    app.run()
}

pub fn list_presets(clock: &dyn Clock, args: PresetsArgs) -> Result<()> {
    let output = render_presets(clock, args.json)?;
    print!("{output}");
    Ok(())
}

pub fn show_range(clock: &dyn Clock, args: RangeArgs) -> Result<()> {
    let output = render_range(clock, &args.key, args.json)?;
    print!("{output}");
    Ok(())
}

fn render_presets(clock: &dyn Clock, json: bool) -> Result<String> {
    let rows: Vec<PresetRow> = compute_ranges(clock.now())
        .into_iter()
        .map(|(key, span)| PresetRow::new(key, span))
        .collect();
    if json {
        let mut out = serde_json::to_string_pretty(&rows).context("serializing presets")?;
        out.push('\n');
        return Ok(out);
    }

    let mut out = String::new();
    for row in &rows {
        let _ = writeln!(
            &mut out,
            "{:<18} {:<25} {}",
            row.key.as_str(),
            row.label,
            row.span.label()
        );
    }
    Ok(out)
}

fn render_range(clock: &dyn Clock, raw_key: &str, json: bool) -> Result<String> {
    let key = resolve_logged(raw_key);
    let row = PresetRow::new(key, compute_range(key, clock.now()));
    if json {
        let mut out = serde_json::to_string_pretty(&row).context("serializing range")?;
        out.push('\n');
        return Ok(out);
    }

    let start = row.span.start.format(&Rfc3339).context("formatting start")?;
    let end = row.span.end.format(&Rfc3339).context("formatting end")?;
    let mut out = String::new();
    let _ = writeln!(&mut out, "{}  {}", row.key.as_str(), row.label);
    let _ = writeln!(&mut out, "    {}", row.span.label());
    let _ = writeln!(&mut out, "    start {start}");
    let _ = writeln!(&mut out, "    end   {end}");
    Ok(out)
}
