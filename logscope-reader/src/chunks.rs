//! Chunked access-log reader.
//!
//! Lines are parsed one at a time. Parsed records are buffered and flushed to
//! `chunk_dir/file_{n}.jsonl` every `chunk_size` records, where `n` is the
//! running count of parsed records. Unparsable lines are appended to the
//! errors file as JSON Lines and skipped.

use crate::clf::parse_line;
use indicatif::{ProgressBar, ProgressStyle};
use logscope_core::frame::Frame;
use logscope_core::record::AccessRecord;
use logscope_core::LogscopeError;
use serde::Serialize;
use std::fs::{self, File, OpenOptions};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

const CHUNK_PREFIX: &str = "file_";
const CHUNK_EXT: &str = "jsonl";

/// One rejected line, as written to the errors file.
#[derive(Debug, Serialize)]
struct RejectedLine<'a> {
    line: usize,
    content: &'a str,
    error: String,
}

/// Result of reading a log file.
#[derive(Debug)]
pub struct ReadOutcome {
    pub frame: Frame,
    pub parsed: usize,
    pub rejected: usize,
    pub chunks: Vec<PathBuf>,
}

/// Streaming Common Log Format reader.
#[derive(Debug, Clone)]
pub struct LogReader {
    chunk_size: usize,
    show_progress: bool,
}

impl LogReader {
    pub fn new(chunk_size: usize) -> Self {
        Self {
            chunk_size: chunk_size.max(1),
            show_progress: false,
        }
    }

    pub fn with_progress(mut self, show: bool) -> Self {
        self.show_progress = show;
        self
    }

    /// Parse `logfile`, writing chunk files to `chunk_dir` and rejects to
    /// `errors_file`. Chunk files left over from an earlier run are removed first.
    pub fn read(
        &self,
        logfile: &Path,
        chunk_dir: &Path,
        errors_file: &Path,
    ) -> Result<ReadOutcome, LogscopeError> {
        let file = File::open(logfile)?;
        let total_bytes = file.metadata()?.len();
        let mut source = BufReader::new(file);

        fs::create_dir_all(chunk_dir)?;
        let stale = remove_chunks(chunk_dir)?;
        if stale > 0 {
            debug!(dir = %chunk_dir.display(), removed = stale, "Removed stale chunk files");
        }

        let progress = self.progress_bar(total_bytes);
        let mut errors = ErrorSink::new(errors_file);

        let mut frame = Frame::from_records(&[]);
        let mut buffer: Vec<AccessRecord> = Vec::with_capacity(self.chunk_size.min(65_536));
        let mut chunks = Vec::new();
        let mut parsed = 0usize;
        let mut line_no = 0usize;
        let mut raw = Vec::new();

        loop {
            raw.clear();
            let n = source.read_until(b'\n', &mut raw)?;
            if n == 0 {
                break;
            }
            line_no += 1;
            progress.inc(n as u64);

            let line = String::from_utf8_lossy(&raw);
            match parse_line(&line) {
                Ok(record) => {
                    buffer.push(record);
                    parsed += 1;
                    if parsed % self.chunk_size == 0 {
                        chunks.push(write_chunk(chunk_dir, parsed, &buffer)?);
                        frame.vstack(Frame::from_records(&buffer))?;
                        buffer.clear();
                    }
                }
                Err(e) => errors.reject(line_no, line.trim_end_matches(['\n', '\r']), &e)?,
            }
        }

        // An input with no parsable lines still yields one empty chunk.
        if !buffer.is_empty() || chunks.is_empty() {
            chunks.push(write_chunk(chunk_dir, parsed, &buffer)?);
            frame.vstack(Frame::from_records(&buffer))?;
        }
        progress.finish_and_clear();

        let rejected = errors.count;
        if rejected > 0 {
            warn!(
                rejected,
                errors_file = %errors_file.display(),
                "Some lines could not be parsed"
            );
        }
        info!(
            path = %logfile.display(),
            lines = line_no,
            parsed,
            rejected,
            chunks = chunks.len(),
            "Log file read"
        );

        Ok(ReadOutcome {
            frame,
            parsed,
            rejected,
            chunks,
        })
    }

    fn progress_bar(&self, total_bytes: u64) -> ProgressBar {
        if !self.show_progress {
            return ProgressBar::hidden();
        }
        let pb = ProgressBar::new(total_bytes);
        if let Ok(style) = ProgressStyle::with_template(
            "{spinner:.blue} reading [{bar:30.cyan/blue}] {bytes}/{total_bytes} ({eta})",
        ) {
            pb.set_style(style.progress_chars("=> "));
        }
        pb
    }
}

impl Default for LogReader {
    fn default() -> Self {
        Self::new(250_000)
    }
}

/// Appends rejected lines, opening the file on first use.
struct ErrorSink<'a> {
    path: &'a Path,
    writer: Option<BufWriter<File>>,
    count: usize,
}

impl<'a> ErrorSink<'a> {
    fn new(path: &'a Path) -> Self {
        Self {
            path,
            writer: None,
            count: 0,
        }
    }

    fn reject(
        &mut self,
        line: usize,
        content: &str,
        error: &dyn std::error::Error,
    ) -> Result<(), LogscopeError> {
        self.count += 1;
        debug!(line, error = %error, "Rejected log line");
        if self.writer.is_none() {
            if let Some(parent) = self.path.parent()
                && !parent.as_os_str().is_empty()
            {
                fs::create_dir_all(parent)?;
            }
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(self.path)?;
            self.writer = Some(BufWriter::new(file));
        }
        if let Some(w) = self.writer.as_mut() {
            let entry = RejectedLine {
                line,
                content,
                error: error.to_string(),
            };
            serde_json::to_writer(&mut *w, &entry)?;
            w.write_all(b"\n")?;
        }
        Ok(())
    }
}

impl Drop for ErrorSink<'_> {
    fn drop(&mut self) {
        if let Some(w) = self.writer.as_mut()
            && let Err(e) = w.flush()
        {
            warn!(error = %e, path = %self.path.display(), "Failed to flush errors file");
        }
    }
}

fn chunk_path(dir: &Path, count: usize) -> PathBuf {
    dir.join(format!("{CHUNK_PREFIX}{count}.{CHUNK_EXT}"))
}

/// Numeric suffix of a chunk file name, `None` for anything else.
fn chunk_index(path: &Path) -> Option<usize> {
    if path.extension()?.to_str()? != CHUNK_EXT {
        return None;
    }
    path.file_stem()?
        .to_str()?
        .strip_prefix(CHUNK_PREFIX)?
        .parse()
        .ok()
}

fn write_chunk(
    dir: &Path,
    count: usize,
    records: &[AccessRecord],
) -> Result<PathBuf, LogscopeError> {
    let path = chunk_path(dir, count);
    let mut w = BufWriter::new(File::create(&path)?);
    for record in records {
        serde_json::to_writer(&mut w, record)?;
        w.write_all(b"\n")?;
    }
    w.flush()?;
    debug!(path = %path.display(), records = records.len(), "Chunk written");
    Ok(path)
}

fn list_chunks(dir: &Path) -> Result<Vec<(usize, PathBuf)>, LogscopeError> {
    let mut found = Vec::new();
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        if let Some(idx) = chunk_index(&path) {
            found.push((idx, path));
        }
    }
    found.sort();
    Ok(found)
}

fn remove_chunks(dir: &Path) -> Result<usize, LogscopeError> {
    let chunks = list_chunks(dir)?;
    for (_, path) in &chunks {
        fs::remove_file(path)?;
    }
    Ok(chunks.len())
}

/// Read every chunk file in `dir` back into one frame, in chunk order.
pub fn load_chunks(dir: &Path) -> Result<Frame, LogscopeError> {
    let chunks = list_chunks(dir)?;
    if chunks.is_empty() {
        warn!(dir = %dir.display(), "No chunk files found");
    }
    let mut records = Vec::new();
    for (_, path) in &chunks {
        let reader = BufReader::new(File::open(path)?);
        for (i, line) in reader.lines().enumerate() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            let record: AccessRecord = serde_json::from_str(&line).map_err(|e| {
                LogscopeError::Parse(format!("{}:{}: {e}", path.display(), i + 1))
            })?;
            records.push(record);
        }
    }
    info!(dir = %dir.display(), chunks = chunks.len(), records = records.len(), "Chunks loaded");
    Ok(Frame::from_records(&records))
}
