//! Whitespace-token line scanner for the text-based case, mesh and boundary
//! files.
//!
//! Tracks the file name and current line number so every validation failure
//! can say exactly where it happened and what was expected.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use crate::error::FlowError;

pub struct LineReader {
    file: String,
    lines: std::io::Lines<BufReader<File>>,
    line_no: usize,
    tokens: std::collections::VecDeque<String>,
}

impl LineReader {
    /// Open a file for token-wise reading.
    pub fn open(path: &Path) -> Result<Self, FlowError> {
        let f = File::open(path).map_err(|e| FlowError::io(path, e))?;
        log::debug!("file opened: {}", path.display());
        Ok(Self {
            file: path.display().to_string(),
            lines: BufReader::new(f).lines(),
            line_no: 0,
            tokens: std::collections::VecDeque::new(),
        })
    }

    /// A data error pinned to the current file position, for validation the
    /// caller performs on consumed tokens (range checks and the like).
    pub fn data_error(&self, message: impl Into<String>) -> FlowError {
        self.data_err(message.into())
    }

    fn data_err(&self, message: String) -> FlowError {
        FlowError::Data {
            file: self.file.clone(),
            line: self.line_no,
            message,
        }
    }

    /// Advance to the next line and split it into whitespace-separated
    /// tokens. Unconsumed tokens from the previous line are discarded.
    pub fn next_line(&mut self) -> Result<(), FlowError> {
        let line = match self.lines.next() {
            Some(line) => line.map_err(|e| FlowError::io(self.file.clone(), e))?,
            None => String::new(),
        };
        self.line_no += 1;
        self.tokens = line.split_whitespace().map(str::to_owned).collect();
        Ok(())
    }

    fn next_token(&mut self, label: &str) -> Result<String, FlowError> {
        self.tokens
            .pop_front()
            .ok_or_else(|| self.data_err(format!("value for {label} was expected")))
    }

    /// Consume one token and require it to equal `keyword`.
    pub fn expect_keyword(&mut self, keyword: &str) -> Result<(), FlowError> {
        let word = self.tokens.pop_front().unwrap_or_default();
        if word != keyword {
            return Err(
                self.data_err(format!("keyword '{keyword}' was expected, but '{word}' was found"))
            );
        }
        Ok(())
    }

    /// Consume one token as an integer.
    pub fn take_int(&mut self, label: &str) -> Result<i64, FlowError> {
        let word = self.next_token(label)?;
        word.parse::<i64>()
            .map_err(|_| self.data_err(format!("integer value for {label} was expected, found '{word}'")))
    }

    /// Consume one integer token and require it to equal `expected`.
    /// Mesh and boundary records echo their own 1-based index; a mismatch
    /// means the file is out of order or corrupt.
    pub fn take_expected_int(&mut self, expected: i64, label: &str) -> Result<(), FlowError> {
        let val = self.take_int(label)?;
        if val != expected {
            return Err(
                self.data_err(format!("integer value {expected} for {label} was expected, found {val}"))
            );
        }
        Ok(())
    }

    /// Consume one token as a floating-point value.
    pub fn take_f64(&mut self, label: &str) -> Result<f64, FlowError> {
        let word = self.next_token(label)?;
        word.parse::<f64>().map_err(|_| {
            self.data_err(format!("floating point value for {label} was expected, found '{word}'"))
        })
    }

    /// Consume one token as a string.
    pub fn take_str(&mut self, label: &str) -> Result<String, FlowError> {
        self.next_token(label)
    }

    /// Read a `label value` line, requiring the exact keyword.
    pub fn labeled_f64(&mut self, label: &str) -> Result<f64, FlowError> {
        self.next_line()?;
        self.expect_keyword(label)?;
        self.take_f64(label)
    }

    /// Read a `label value` line with an integer payload.
    pub fn labeled_int(&mut self, label: &str) -> Result<i64, FlowError> {
        self.next_line()?;
        self.expect_keyword(label)?;
        self.take_int(label)
    }

    /// Read a `label value` line with a string payload.
    pub fn labeled_str(&mut self, label: &str) -> Result<String, FlowError> {
        self.next_line()?;
        self.expect_keyword(label)?;
        self.take_str(label)
    }
}
