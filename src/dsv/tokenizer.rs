//! Line-oriented delimited tokenizer with one-line lookahead.

use std::io::BufRead;

use encoding_rs::Encoding;
use tracing::trace;

use crate::encoding::{decode_line, skip_bom};
use crate::error::Result;
use crate::options::Quote;

/// Default prefix marking a comment line.
pub const DEFAULT_COMMENT_PREFIX: &str = "#";

/// One tokenized physical line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Line {
    /// 1-based physical line number in the source.
    pub number: u64,
    /// Cell tokens, left to right.
    pub cells: Vec<String>,
}

/// Splits each line of a reader into cell tokens.
///
/// Comment lines are always skipped; blank lines are skipped unless the
/// tokenizer is strict, in which case they read as a row of one empty cell.
/// Skipped lines still advance the physical line counter.
#[derive(Debug)]
pub struct Tokenizer<R> {
    reader: R,
    delimiter: char,
    quote: Option<char>,
    comment_prefix: Option<String>,
    strict: bool,
    encoding: Option<&'static Encoding>,
    line: u64,
    buffer: Vec<u8>,
    peeked: Option<Line>,
}

impl<R: BufRead> Tokenizer<R> {
    /// Create a tokenizer splitting on `delimiter` with `"` quoting and `#` comments.
    pub fn new(reader: R, delimiter: u8) -> Self {
        Self {
            reader,
            delimiter: delimiter as char,
            quote: Quote::default().char().map(char::from),
            comment_prefix: Some(DEFAULT_COMMENT_PREFIX.to_string()),
            strict: false,
            encoding: None,
            line: 0,
            buffer: Vec::new(),
            peeked: None,
        }
    }

    pub fn quote(&mut self, quote: Quote) -> &mut Self {
        self.quote = quote.char().map(char::from);
        self
    }

    /// Set the comment prefix; `None` disables comment skipping.
    pub fn comment_prefix(&mut self, prefix: Option<&str>) -> &mut Self {
        self.comment_prefix = prefix.filter(|p| !p.is_empty()).map(str::to_string);
        self
    }

    /// In strict mode blank lines are rows, not skipped.
    pub fn strict(&mut self, strict: bool) -> &mut Self {
        self.strict = strict;
        self
    }

    /// Encoding used for lines that are not valid UTF-8.
    pub fn encoding(&mut self, encoding: Option<&'static Encoding>) -> &mut Self {
        self.encoding = encoding;
        self
    }

    /// Number of physical lines consumed so far, including skipped ones.
    #[inline]
    pub fn line_number(&self) -> u64 {
        self.line
    }

    /// Returns true if another row is available, without consuming it.
    pub fn has_next_row(&mut self) -> Result<bool> {
        if self.peeked.is_none() {
            self.peeked = self.read_row()?;
        }
        Ok(self.peeked.is_some())
    }

    /// Consume and return the next row.
    pub fn next_row(&mut self) -> Result<Option<Line>> {
        match self.peeked.take() {
            Some(line) => Ok(Some(line)),
            None => self.read_row(),
        }
    }

    /// Read physical lines until one qualifies as a row.
    fn read_row(&mut self) -> Result<Option<Line>> {
        loop {
            if !self.read_physical_line()? {
                return Ok(None);
            }
            self.line += 1;

            let mut bytes = self.buffer.as_slice();
            if self.line == 1 {
                bytes = skip_bom(bytes);
            }
            let text = decode_line(bytes, self.line, self.encoding)?;

            if let Some(prefix) = &self.comment_prefix
                && text.starts_with(prefix.as_str())
            {
                trace!(line = self.line, "skipping comment line");
                continue;
            }
            if !self.strict && text.trim().is_empty() {
                trace!(line = self.line, "skipping blank line");
                continue;
            }

            return Ok(Some(Line {
                number: self.line,
                cells: split_line(&text, self.delimiter, self.quote),
            }));
        }
    }

    /// Read one physical line into the buffer, without its terminator.
    ///
    /// `\n`, `\r\n` and a lone `\r` all end a line. Returns false at end of input.
    fn read_physical_line(&mut self) -> Result<bool> {
        self.buffer.clear();
        let mut read_any = false;
        loop {
            let available = self.reader.fill_buf()?;
            if available.is_empty() {
                return Ok(read_any);
            }
            read_any = true;

            match available.iter().position(|b| matches!(b, b'\n' | b'\r')) {
                Some(end) => {
                    let carriage_return = available[end] == b'\r';
                    self.buffer.extend_from_slice(&available[..end]);
                    self.reader.consume(end + 1);
                    if carriage_return && self.reader.fill_buf()?.first() == Some(&b'\n') {
                        self.reader.consume(1);
                    }
                    return Ok(true);
                }
                None => {
                    let len = available.len();
                    self.buffer.extend_from_slice(available);
                    self.reader.consume(len);
                }
            }
        }
    }
}

/// Split a line into cells.
///
/// A quote opens only at the start of a cell; inside quotes a doubled quote
/// is a literal quote and delimiters are kept. Unquoted text is taken verbatim.
pub fn split_line(line: &str, delimiter: char, quote: Option<char>) -> Vec<String> {
    let mut cells = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut at_cell_start = true;
    let mut chars = line.chars().peekable();

    while let Some(c) = chars.next() {
        if let Some(q) = quote
            && c == q
            && (in_quotes || at_cell_start)
        {
            if in_quotes {
                if chars.peek() == Some(&q) {
                    current.push(q);
                    chars.next();
                } else {
                    in_quotes = false;
                }
            } else {
                in_quotes = true;
            }
            at_cell_start = false;
            continue;
        }

        if c == delimiter && !in_quotes {
            cells.push(std::mem::take(&mut current));
            at_cell_start = true;
        } else {
            current.push(c);
            at_cell_start = false;
        }
    }

    cells.push(current);
    cells
}
