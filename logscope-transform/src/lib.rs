pub mod clean;
pub mod deltas;
pub mod encode;
pub mod scale;
pub mod sessions;

pub use clean::{MissingInfo, drop_column, drop_null_rows, missing_values};
pub use deltas::add_request_deltas;
pub use encode::one_hot;
pub use scale::normalize;
pub use sessions::add_session_info;

pub use logscope_core::config::DEFAULT_SESSION_MINUTES;

/// Column holding the client address.
pub const CLIENT_COLUMN: &str = "client";
/// Column holding the request timestamp.
pub const DATETIME_COLUMN: &str = "datetime";
/// Default name of the inter-request delta column.
pub const DELTA_COLUMN: &str = "datetime_delta_ms";
pub const SESSION_ID_COLUMN: &str = "session_global_id";
pub const SESSION_DELTA_COLUMN: &str = "datetime_delta_ms_in_session";
