use std::fs::File;
use std::io::{BufRead, BufReader, Seek, SeekFrom};
use std::path::{Path, PathBuf};

use crate::data::line_parser::LineParser;
use crate::data::record::Record;
use crate::data::RecordSource;
use crate::error::{MlpError, Result};

/// A dataset file read line by line.
///
/// Besides streaming records, the parser knows how many lines the file holds
/// and where the training prefix ends (the training-ratio line): lines with a
/// 0-based index below it are training lines, the rest are testing lines.
#[derive(Debug)]
pub struct FileParser {
    path: PathBuf,
    reader: Option<BufReader<File>>,
    line_parser: LineParser,
    /// Lines consumed since the last reset; equals the 1-based number of the
    /// last line read.
    current_line_number: usize,
    total_lines: Option<usize>,
    training_ratio: f32,
    training_ratio_line_override: Option<usize>,
    training_ratio_line: Option<usize>,
}

impl FileParser {
    pub fn new(path: impl AsRef<Path>, line_parser: LineParser) -> FileParser {
        FileParser {
            path: path.as_ref().to_path_buf(),
            reader: None,
            line_parser,
            current_line_number: 0,
            total_lines: None,
            training_ratio: 1.0,
            training_ratio_line_override: None,
            training_ratio_line: None,
        }
    }

    /// Sets the ratio used to compute the training-ratio line, or an explicit
    /// line that takes precedence over it.
    pub fn with_training_ratio(mut self, ratio: f32, line_override: Option<usize>) -> FileParser {
        self.training_ratio = ratio;
        self.training_ratio_line_override = line_override;
        self.training_ratio_line = None;
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn line_parser(&self) -> &LineParser {
        &self.line_parser
    }

    pub fn open(&mut self) -> Result<()> {
        if !self.path.exists() {
            return Err(MlpError::FileNotFound(self.path.clone()));
        }
        let file = File::open(&self.path).map_err(|source| MlpError::FileOpen {
            path: self.path.clone(),
            source,
        })?;
        self.reader = Some(BufReader::new(file));
        self.current_line_number = 0;
        log::debug!("opened {}", self.path.display());
        Ok(())
    }

    pub fn close(&mut self) {
        if self.reader.take().is_some() {
            log::debug!("closed {}", self.path.display());
        }
    }

    pub fn is_open(&self) -> bool {
        self.reader.is_some()
    }

    pub fn current_line_number(&self) -> usize {
        self.current_line_number
    }

    /// Rewinds to the first line.
    pub fn reset_pos(&mut self) -> Result<()> {
        let reader = self.reader.as_mut().ok_or(MlpError::FileParserNotOpen)?;
        reader.seek(SeekFrom::Start(0))?;
        self.current_line_number = 0;
        Ok(())
    }

    /// Counts the file's lines with a full scan, then rewinds. Cached.
    pub fn total_lines(&mut self) -> Result<usize> {
        if let Some(total) = self.total_lines {
            return Ok(total);
        }
        self.reset_pos()?;
        let mut total = 0;
        while self.read_next_line()?.is_some() {
            total += 1;
        }
        self.reset_pos()?;
        self.total_lines = Some(total);
        log::debug!("{} holds {} lines", self.path.display(), total);
        Ok(total)
    }

    /// Index of the first testing line: the explicit override if any,
    /// otherwise `floor(total_lines · training_ratio)`. Computed once.
    pub fn training_ratio_line(&mut self) -> Result<usize> {
        if let Some(line) = self.training_ratio_line {
            return Ok(line);
        }
        let line = match self.training_ratio_line_override {
            Some(line) => line,
            None => {
                if !(self.training_ratio > 0.0 && self.training_ratio <= 1.0) {
                    return Err(MlpError::InvalidTrainingRatio(self.training_ratio));
                }
                let total = self.total_lines()?;
                (total as f64 * self.training_ratio as f64).floor() as usize
            }
        };
        self.training_ratio_line = Some(line);
        Ok(line)
    }

    pub fn is_training_ratio_line_processed(&self) -> bool {
        self.training_ratio_line.is_some()
    }

    /// Reads the next raw line, without its line terminator.
    pub fn read_next_line(&mut self) -> Result<Option<String>> {
        let reader = self.reader.as_mut().ok_or(MlpError::FileParserNotOpen)?;
        let mut line = String::new();
        if reader.read_line(&mut line)? == 0 {
            return Ok(None);
        }
        self.current_line_number += 1;
        while line.ends_with('\n') || line.ends_with('\r') {
            line.pop();
        }
        Ok(Some(line))
    }

    /// Reads and discards lines until `line_index` lines have been consumed
    /// since the last reset. Lines are re-read, not seeked over.
    pub fn skip_to_line(&mut self, line_index: usize) -> Result<()> {
        while self.current_line_number < line_index {
            if self.read_next_line()?.is_none() {
                break;
            }
        }
        Ok(())
    }

    /// Parses `line`, counting it as the next line. An empty `line` means
    /// "read the next line from the file"; `None` at end of file.
    pub fn process_line(&mut self, line: &str) -> Result<Option<Record>> {
        if line.is_empty() {
            return self.next_record();
        }
        self.current_line_number += 1;
        self.line_parser.parse(line, self.current_line_number).map(Some)
    }
}

impl RecordSource for FileParser {
    fn next_record(&mut self) -> Result<Option<Record>> {
        match self.read_next_line()? {
            Some(line) => self.line_parser.parse(&line, self.current_line_number).map(Some),
            None => Ok(None),
        }
    }

    fn line_number(&self) -> usize {
        self.current_line_number
    }
}
