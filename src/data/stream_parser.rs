use std::io::BufRead;

use crate::data::line_parser::LineParser;
use crate::data::record::Record;
use crate::data::RecordSource;
use crate::error::Result;

/// Records read from any forward-only line source: stdin, a socket body,
/// an in-memory buffer.
pub struct StreamParser<R: BufRead> {
    reader: R,
    line_parser: LineParser,
    line_number: usize,
}

impl<R: BufRead> StreamParser<R> {
    pub fn new(reader: R, line_parser: LineParser) -> StreamParser<R> {
        StreamParser { reader, line_parser, line_number: 0 }
    }

    /// Parses a line supplied by the caller, counting it as the next line.
    pub fn process_line(&mut self, line: &str) -> Result<Record> {
        self.line_number += 1;
        self.line_parser.parse(line, self.line_number)
    }
}

impl<R: BufRead> RecordSource for StreamParser<R> {
    fn next_record(&mut self) -> Result<Option<Record>> {
        let mut line = String::new();
        if self.reader.read_line(&mut line)? == 0 {
            return Ok(None);
        }
        self.process_line(&line).map(Some)
    }

    fn line_number(&self) -> usize {
        self.line_number
    }
}
