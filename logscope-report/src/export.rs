use logscope_core::frame::Frame;
use logscope_core::LogscopeError;
use std::path::Path;
use tracing::info;

/// Write the frame as JSON Lines for viewing in an external tool.
pub fn export_jsonl(frame: &Frame, path: &Path) -> Result<(), LogscopeError> {
    frame.write_jsonl_file(path)?;
    info!(
        path = %path.display(),
        rows = frame.height(),
        columns = frame.width(),
        "Exported frame"
    );
    Ok(())
}
