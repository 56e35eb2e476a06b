//! Row/column scanning for key matrices wired directly to GPIO lines.

use crate::error::Result;
use crate::traits::KeyMatrix;
use crate::types::{KEYMAP, KeySymbol};

/// Raw access to the row and column lines of a key matrix.
pub trait MatrixLines: Send {
    /// Drive `row` active and every other row inactive.
    fn select_row(&mut self, row: usize) -> Result<()>;

    /// Whether `column` reads active while the selected row is driven.
    fn column_active(&mut self, column: usize) -> Result<bool>;

    /// Drive every row inactive.
    fn release_rows(&mut self) -> Result<()>;
}

/// [`KeyMatrix`] that scans [`MatrixLines`] row by row.
#[derive(Debug)]
pub struct ScanningMatrix<L> {
    lines: L,
}

impl<L: MatrixLines> ScanningMatrix<L> {
    pub fn new(lines: L) -> Self {
        Self { lines }
    }

    pub fn lines(&self) -> &L {
        &self.lines
    }
}

impl<L: MatrixLines> KeyMatrix for ScanningMatrix<L> {
    fn scan(&mut self) -> Result<Option<KeySymbol>> {
        let mut found = None;
        'rows: for (row, keys) in KEYMAP.iter().enumerate() {
            self.lines.select_row(row)?;
            for column in 0..keys.len() {
                if self.lines.column_active(column)? {
                    found = KeySymbol::at(row, column);
                    break 'rows;
                }
            }
        }
        self.lines.release_rows()?;
        Ok(found)
    }
}
