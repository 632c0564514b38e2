pub mod file_parser;
pub mod line_parser;
pub mod record;
pub mod stream_parser;

pub use file_parser::FileParser;
pub use line_parser::{ColumnLayout, LineParser};
pub use record::Record;
pub use stream_parser::StreamParser;

use crate::error::Result;

/// Anything that yields parsed records one line at a time.
pub trait RecordSource {
    /// The next record, or `None` at end of input. A malformed line is an error.
    fn next_record(&mut self) -> Result<Option<Record>>;

    /// 1-based number of the last line read.
    fn line_number(&self) -> usize;
}
