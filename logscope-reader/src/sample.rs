use logscope_core::LogscopeError;
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Read, Write};
use std::path::Path;
use tracing::info;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SampleOutcome {
    pub bytes_written: u64,
    pub lines: usize,
}

/// Copy at most `max_bytes` from the start of `input` to `output`, keeping
/// only complete lines. Whatever follows the last newline inside the budget
/// is dropped.
pub fn sample(input: &Path, output: &Path, max_bytes: u64) -> Result<SampleOutcome, LogscopeError> {
    let mut source = BufReader::new(File::open(input)?.take(max_bytes));
    if let Some(parent) = output.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)?;
    }
    let mut sink = BufWriter::new(File::create(output)?);

    let mut outcome = SampleOutcome {
        bytes_written: 0,
        lines: 0,
    };
    let mut line = Vec::new();
    loop {
        line.clear();
        if source.read_until(b'\n', &mut line)? == 0 {
            break;
        }
        if line.last() != Some(&b'\n') {
            // Cut by the budget (or an unterminated final line).
            break;
        }
        sink.write_all(&line)?;
        outcome.bytes_written += line.len() as u64;
        outcome.lines += 1;
    }
    sink.flush()?;

    info!(
        input = %input.display(),
        output = %output.display(),
        max_bytes,
        bytes = outcome.bytes_written,
        lines = outcome.lines,
        "Log sampled"
    );
    Ok(outcome)
}

/// Parse a byte budget such as `4096`, `512K`, `10M` or `1G` (binary units,
/// case-insensitive, optional trailing `B`).
pub fn parse_byte_size(raw: &str) -> Result<u64, LogscopeError> {
    let s = raw.trim();
    let s = s.strip_suffix(['b', 'B']).unwrap_or(s);
    let (digits, multiplier) = match s.chars().last() {
        Some('k' | 'K') => (&s[..s.len() - 1], 1u64 << 10),
        Some('m' | 'M') => (&s[..s.len() - 1], 1u64 << 20),
        Some('g' | 'G') => (&s[..s.len() - 1], 1u64 << 30),
        _ => (s, 1),
    };
    let value: u64 = digits
        .trim()
        .parse()
        .map_err(|_| LogscopeError::Parse(format!("invalid byte size: {raw:?}")))?;
    value
        .checked_mul(multiplier)
        .ok_or_else(|| LogscopeError::Parse(format!("byte size overflows: {raw:?}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_plain_and_suffixed_sizes() {
        assert_eq!(parse_byte_size("4096").unwrap(), 4096);
        assert_eq!(parse_byte_size("512K").unwrap(), 512 * 1024);
        assert_eq!(parse_byte_size("10M").unwrap(), 10 * 1024 * 1024);
        assert_eq!(parse_byte_size("10mb").unwrap(), 10 * 1024 * 1024);
        assert_eq!(parse_byte_size("1G").unwrap(), 1 << 30);
        assert_eq!(parse_byte_size("512B").unwrap(), 512);
    }

    #[test]
    fn rejects_garbage_sizes() {
        assert!(parse_byte_size("").is_err());
        assert!(parse_byte_size("M").is_err());
        assert!(parse_byte_size("ten").is_err());
        assert!(parse_byte_size("-5").is_err());
    }

    #[test]
    fn rejects_overflowing_size() {
        assert!(parse_byte_size("99999999999999999G").is_err());
    }
}
