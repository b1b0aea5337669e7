pub mod export;
pub mod render;
pub mod sessions;
pub mod summary;

pub use export::export_jsonl;
pub use render::{render_bar_chart, render_frame, render_table};
pub use sessions::{SessionCount, requests_per_session, top_n};
pub use summary::{ColumnInfo, ColumnStats, describe, info};
