//! The `run` and `inspect` commands.
//!
//! `run` reads the log, enriches it, builds sessions, cleans, scales and
//! encodes the frame, then prints the exploration report. Diagnostics go
//! through `tracing`; the report itself is written to `out`.

use anyhow::Context;
use logscope_core::LogscopeError;
use logscope_core::config::LogscopeConfig;
use logscope_core::frame::Frame;
use logscope_geo::{CountryLookup, GeoCache, GeoEnricher, IpInfoClient, OfflineLookup};
use logscope_reader::{LogReader, load_chunks};
use logscope_report::{
    describe, export_jsonl, info, render_bar_chart, render_frame, render_table,
    requests_per_session, top_n,
};
use logscope_transform::{
    CLIENT_COLUMN, DELTA_COLUMN, SESSION_ID_COLUMN, add_request_deltas, add_session_info,
    drop_column, drop_null_rows, missing_values, normalize, one_hot,
};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::warn;

/// Column added by geolocation.
pub const COUNTRY_COLUMN: &str = "country_code";

#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    /// Skip geolocation even when it is enabled in the configuration.
    pub no_geo: bool,
    /// Write the final frame here as JSON Lines.
    pub export: Option<PathBuf>,
    pub show_progress: bool,
}

#[derive(Debug)]
pub struct RunSummary {
    pub parsed: usize,
    pub rejected: usize,
    pub chunks: usize,
    pub dropped_rows: usize,
    pub sessions: usize,
    pub frame: Frame,
}

pub async fn run<W: Write>(
    config: &LogscopeConfig,
    opts: &RunOptions,
    out: &mut W,
) -> anyhow::Result<RunSummary> {
    let input = &config.input;
    let outcome = LogReader::new(input.chunk_size)
        .with_progress(opts.show_progress)
        .read(&input.logfile, &input.chunk_dir, &input.errors_file)
        .with_context(|| format!("failed to read {}", input.logfile.display()))?;
    writeln!(
        out,
        "Parsed {} lines ({} rejected) into {} chunk file(s) under {}",
        outcome.parsed,
        outcome.rejected,
        outcome.chunks.len(),
        input.chunk_dir.display()
    )?;
    let mut frame = outcome.frame;

    if config.geo.enabled && !opts.no_geo {
        add_country_codes(config, &mut frame, opts.show_progress).await?;
    } else {
        tracing::info!("Geolocation disabled, no country codes added");
    }

    add_request_deltas(&mut frame, DELTA_COLUMN)?;
    add_session_info(&mut frame, config.sessions.minutes)?;
    let dropped_rows = drop_null_rows(&mut frame);
    for name in &config.pipeline.drop_columns {
        drop_column(&mut frame, name).with_context(|| format!("cannot drop column {name}"))?;
    }

    section(out, "Missing values")?;
    let missing: Vec<Vec<String>> = missing_values(&frame)
        .into_iter()
        .map(|m| {
            vec![
                m.column,
                m.missing.to_string(),
                format!("{:.2}", m.percentage),
            ]
        })
        .collect();
    write!(out, "{}", render_table(&["column", "missing", "percent"], &missing))?;

    normalize(&mut frame, &as_strs(&config.pipeline.normalize))
        .context("normalization failed")?;
    one_hot(&mut frame, &as_strs(&config.pipeline.one_hot)).context("one-hot encoding failed")?;

    write_summary(out, &frame, config.report.head)?;

    let ranking = requests_per_session(&frame, SESSION_ID_COLUMN)?;
    let top = top_n(&ranking, config.report.top_sessions);
    section(
        out,
        &format!("Top {} sessions by number of requests", top.len()),
    )?;
    write!(out, "{}", render_bar_chart(top))?;

    if let Some(path) = &opts.export {
        export_jsonl(&frame, path)
            .with_context(|| format!("failed to export to {}", path.display()))?;
        writeln!(out, "\nExported {} rows to {}", frame.height(), path.display())?;
    }

    Ok(RunSummary {
        parsed: outcome.parsed,
        rejected: outcome.rejected,
        chunks: outcome.chunks.len(),
        dropped_rows,
        sessions: ranking.len(),
        frame,
    })
}

/// Load the chunk files of an earlier run and print their summary.
pub fn inspect<W: Write>(chunk_dir: &Path, head: usize, out: &mut W) -> anyhow::Result<Frame> {
    let frame = load_chunks(chunk_dir)
        .with_context(|| format!("failed to load chunks from {}", chunk_dir.display()))?;
    write_summary(out, &frame, head)?;
    Ok(frame)
}

async fn add_country_codes(
    config: &LogscopeConfig,
    frame: &mut Frame,
    show_progress: bool,
) -> anyhow::Result<()> {
    let cache = GeoCache::load(config.geo.cache_file.as_deref());
    let delay = Duration::from_millis(config.geo.delay_ms);
    match config.geo_token() {
        Some(token) => {
            let client = IpInfoClient::from_config(&config.geo, token)
                .map_err(|e| LogscopeError::Geo(e.to_string()))
                .context("failed to build IPinfo client")?;
            enrich(client, cache, delay, frame, show_progress).await
        }
        None => {
            warn!("IPINFO_TOKEN is not set, country codes come from the cache or are Unknown");
            enrich(OfflineLookup, cache, delay, frame, show_progress).await
        }
    }
}

async fn enrich<L: CountryLookup>(
    lookup: L,
    cache: GeoCache,
    delay: Duration,
    frame: &mut Frame,
    show_progress: bool,
) -> anyhow::Result<()> {
    GeoEnricher::new(lookup, cache)
        .with_delay(delay)
        .with_progress(show_progress)
        .add_country_code(frame, CLIENT_COLUMN, COUNTRY_COLUMN)
        .await
        .context("geolocation failed")?;
    Ok(())
}

fn write_summary<W: Write>(out: &mut W, frame: &Frame, head: usize) -> anyhow::Result<()> {
    let (rows, columns) = frame.shape();

    section(out, &format!("First {} rows", head.min(rows)))?;
    write!(out, "{}", render_frame(&frame.head(head)))?;

    section(out, "Shape")?;
    writeln!(out, "{rows} rows x {columns} columns")?;

    section(out, "Describe")?;
    let stats: Vec<Vec<String>> = describe(frame)
        .into_iter()
        .map(|s| {
            vec![
                s.column,
                s.count.to_string(),
                format!("{:.4}", s.mean),
                format!("{:.4}", s.std),
                format!("{:.4}", s.min),
                format!("{:.4}", s.p25),
                format!("{:.4}", s.p50),
                format!("{:.4}", s.p75),
                format!("{:.4}", s.max),
            ]
        })
        .collect();
    write!(
        out,
        "{}",
        render_table(
            &["column", "count", "mean", "std", "min", "25%", "50%", "75%", "max"],
            &stats
        )
    )?;

    section(out, "Info")?;
    let info: Vec<Vec<String>> = info(frame)
        .into_iter()
        .map(|c| vec![c.column, c.non_null.to_string(), c.dtype.to_string()])
        .collect();
    write!(out, "{}", render_table(&["column", "non-null", "dtype"], &info))?;
    Ok(())
}

fn section<W: Write>(out: &mut W, title: &str) -> std::io::Result<()> {
    writeln!(out, "\n== {title} ==")
}

fn as_strs(names: &[String]) -> Vec<&str> {
    names.iter().map(String::as_str).collect()
}
