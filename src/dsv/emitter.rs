//! Two-dimensional write cursor, the mirror of [`super::cursor::RowCursor`].

use std::io::Write;

use crate::error::{DatasetError, Result};
use crate::options::RowSize;

/// Writes cells row by row through a [`csv::Writer`].
///
/// [`Self::new_row`] terminates the previous row and starts the next one;
/// [`Self::write_cell`] appends a cell to the current row. The first
/// completed row establishes the row width, which later rows must match
/// under [`RowSize::Same`].
#[derive(Debug)]
pub struct RowEmitter<W: Write> {
    writer: csv::Writer<W>,
    row_size: RowSize,
    width: Option<usize>,
    in_row: bool,
    row: usize,
    column: usize,
}

impl<W: Write> RowEmitter<W> {
    /// Create an emitter separating cells with `delimiter`.
    pub fn new(inner: W, delimiter: u8, row_size: RowSize) -> Self {
        let writer = csv::WriterBuilder::new()
            .delimiter(delimiter)
            .quote_style(csv::QuoteStyle::Necessary)
            .flexible(true)
            .has_headers(false)
            .from_writer(inner);

        Self {
            writer,
            row_size,
            width: None,
            in_row: false,
            row: 0,
            column: 0,
        }
    }

    /// Finish the current row, if any, and start a new one.
    pub fn new_row(&mut self) -> Result<()> {
        self.end_row()?;
        self.in_row = true;
        self.row += 1;
        self.column = 0;
        Ok(())
    }

    /// Append one cell to the current row.
    pub fn write_cell(&mut self, cell: &str) -> Result<()> {
        if !self.in_row {
            return Err(DatasetError::NoCurrentRow);
        }
        if let Some(width) = self.width
            && self.row_size == RowSize::Same
            && self.column >= width
        {
            return Err(DatasetError::ColumnOutOfRange {
                column: self.column,
                width,
            });
        }
        if cell.contains(['\n', '\r']) {
            return Err(DatasetError::UnwritableValue {
                row: self.row,
                value: cell.to_string(),
                reason: "cells may not contain line breaks",
            });
        }
        self.writer.write_field(cell)?;
        self.column += 1;
        Ok(())
    }

    /// Append every cell of `cells` to the current row.
    pub fn write_cells<I, S>(&mut self, cells: I) -> Result<()>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for cell in cells {
            self.write_cell(cell.as_ref())?;
        }
        Ok(())
    }

    /// 1-based number of the current row.
    #[inline]
    pub fn row_number(&self) -> usize {
        self.row
    }

    /// Number of cells written to the current row.
    #[inline]
    pub fn column_index(&self) -> usize {
        self.column
    }

    /// Terminate the last row, flush, and hand back the inner writer.
    pub fn finish(mut self) -> Result<W> {
        self.end_row()?;
        self.writer.flush()?;
        self.writer
            .into_inner()
            .map_err(|e| DatasetError::Io(e.into_error()))
    }

    fn end_row(&mut self) -> Result<()> {
        if !self.in_row {
            return Ok(());
        }
        match self.width {
            None => self.width = Some(self.column),
            Some(expected) if self.row_size == RowSize::Same && expected != self.column => {
                return Err(DatasetError::RowSize {
                    row: self.row,
                    line: self.row as u64,
                    expected,
                    actual: self.column,
                });
            }
            Some(expected) => self.width = Some(expected.max(self.column)),
        }
        self.writer.write_record(None::<&[u8]>)?;
        self.in_row = false;
        Ok(())
    }
}
