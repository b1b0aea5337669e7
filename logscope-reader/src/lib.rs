pub mod chunks;
pub mod clf;
pub mod sample;

pub use chunks::{LogReader, ReadOutcome, load_chunks};
pub use clf::{ParseError, parse_line};
pub use sample::{SampleOutcome, parse_byte_size, sample};
