//! Two-dimensional read cursor over a [`Tokenizer`].

use std::io::BufRead;

use super::convert::Position;
use super::tokenizer::{Line, Tokenizer};
use crate::error::{DatasetError, Result};
use crate::options::RowSize;

/// Row/column cursor enforcing the row-size invariant.
///
/// The first row whose size is enforced establishes the expected width.
/// With [`RowSize::Same`] every later row must match it exactly; with
/// [`RowSize::Max`] the width grows to the widest row and shorter rows are
/// padded with empty cells.
#[derive(Debug)]
pub struct RowCursor<R> {
    tokenizer: Tokenizer<R>,
    row_size: RowSize,
    width: Option<usize>,
    current: Option<Line>,
    row: usize,
    column: usize,
}

impl<R: BufRead> RowCursor<R> {
    pub fn new(tokenizer: Tokenizer<R>, row_size: RowSize) -> Self {
        Self {
            tokenizer,
            row_size,
            width: None,
            current: None,
            row: 0,
            column: 0,
        }
    }

    /// Returns true if another row can be read. Does not move the cursor.
    pub fn has_next_row(&mut self) -> Result<bool> {
        self.tokenizer.has_next_row()
    }

    /// Move to the next row and enforce its width. Returns false at end of input.
    pub fn next_row(&mut self) -> Result<bool> {
        if !self.advance()? {
            return Ok(false);
        }
        self.enforce_row_size()?;
        Ok(true)
    }

    /// Move to the next row without checking its width.
    ///
    /// Callers that need to look at a row before deciding whether it is
    /// subject to the row-size invariant follow up with [`Self::enforce_row_size`].
    pub fn advance(&mut self) -> Result<bool> {
        self.current = self.tokenizer.next_row()?;
        self.column = 0;
        if self.current.is_some() {
            self.row += 1;
        }
        Ok(self.current.is_some())
    }

    /// Check the current row against the established width, establishing it
    /// on the first call.
    pub fn enforce_row_size(&mut self) -> Result<()> {
        let line = self.current.as_mut().ok_or(DatasetError::NoCurrentRow)?;
        let actual = line.cells.len();

        match (self.width, self.row_size) {
            (None, _) => self.width = Some(actual),
            (Some(expected), RowSize::Same) if expected != actual => {
                return Err(DatasetError::RowSize {
                    row: self.row,
                    line: line.number,
                    expected,
                    actual,
                });
            }
            (Some(expected), RowSize::Max) => {
                if actual > expected {
                    self.width = Some(actual);
                } else {
                    line.cells.resize(expected, String::new());
                }
            }
            _ => {}
        }
        Ok(())
    }

    /// Expected row width, once established.
    #[inline]
    pub fn row_width(&self) -> Option<usize> {
        self.width
    }

    /// 1-based number of the current row, counting only rows that were not skipped.
    #[inline]
    pub fn row_number(&self) -> usize {
        self.row
    }

    /// Physical line of the current row.
    pub fn line_number(&self) -> u64 {
        self.current
            .as_ref()
            .map_or(self.tokenizer.line_number(), |line| line.number)
    }

    /// Row and physical line of the current row.
    pub fn position(&self) -> Position {
        Position::new(self.row, self.line_number())
    }

    /// Index of the next column [`Self::next_column`] returns.
    #[inline]
    pub fn column_index(&self) -> usize {
        self.column
    }

    /// Cells of the current row.
    pub fn cells(&self) -> Result<&[String]> {
        self.current
            .as_ref()
            .map(|line| line.cells.as_slice())
            .ok_or(DatasetError::NoCurrentRow)
    }

    /// Cell `index` of the current row.
    pub fn cell(&self, index: usize) -> Result<&str> {
        let cells = self.cells()?;
        cells
            .get(index)
            .map(String::as_str)
            .ok_or(DatasetError::ColumnOutOfRange {
                column: index,
                width: cells.len(),
            })
    }

    /// Returns true if the current row has a cell right of the column cursor.
    pub fn has_next_column(&self) -> bool {
        self.current
            .as_ref()
            .is_some_and(|line| self.column < line.cells.len())
    }

    /// Return the cell under the column cursor and move right.
    pub fn next_column(&mut self) -> Result<&str> {
        let index = self.column;
        self.column += 1;
        self.cell(index)
    }
}
