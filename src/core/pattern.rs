//! Bipolar patterns and the store that validates them.
//!
//! Patterns are rows x columns grids with every cell in {+1, -1}. The network only ever
//! sees the flattened row-major cells; the grid shape is kept so results can be reshaped
//! and rendered.

use core::fmt;

use crate::error::{Error, Result};
use crate::prng::RandomSource;

/// One neuron state: +1 or -1.
pub type Cell = i8;

/// Normalize a raw input cell to bipolar: exactly `1` maps to +1, anything else to -1.
#[inline]
pub fn to_bipolar(cell: i32) -> Cell {
    if cell == 1 {
        1
    } else {
        -1
    }
}

/// Inverse of [`to_bipolar`] for display: +1 -> 1, -1 -> 0.
#[inline]
pub fn to_binary(cell: Cell) -> u8 {
    if cell == 1 {
        1
    } else {
        0
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Pattern {
    rows: usize,
    columns: usize,
    cells: Vec<Cell>,
}

impl Pattern {
    /// Build a pattern from a grid of raw cells, normalizing each to bipolar.
    ///
    /// Every row must have the same length as the first one.
    pub fn from_rows<R: AsRef<[i32]>>(grid: &[R]) -> Result<Self> {
        let Some(first) = grid.first() else {
            return Err(Error::InvalidInput("pattern has no rows"));
        };
        let columns = first.as_ref().len();
        if columns == 0 {
            return Err(Error::InvalidInput("pattern has no columns"));
        }

        let mut cells = Vec::with_capacity(grid.len() * columns);
        for row in grid {
            let row = row.as_ref();
            if row.len() != columns {
                return Err(Error::ShapeMismatch {
                    expected_rows: grid.len(),
                    expected_columns: columns,
                    rows: grid.len(),
                    columns: row.len(),
                });
            }
            cells.extend(row.iter().map(|&c| to_bipolar(c)));
        }

        Ok(Self {
            rows: grid.len(),
            columns,
            cells,
        })
    }

    /// Build a pattern from flat row-major raw cells.
    pub fn from_cells(rows: usize, columns: usize, cells: &[i32]) -> Result<Self> {
        if rows == 0 || columns == 0 {
            return Err(Error::InvalidInput("pattern shape must be non-empty"));
        }
        if cells.len() != rows * columns {
            return Err(Error::DimensionMismatch {
                expected: rows * columns,
                actual: cells.len(),
            });
        }
        Ok(Self {
            rows,
            columns,
            cells: cells.iter().map(|&c| to_bipolar(c)).collect(),
        })
    }

    /// Wrap cells that are already bipolar. Callers guarantee `cells.len() == rows * columns`.
    pub(crate) fn from_bipolar(rows: usize, columns: usize, cells: Vec<Cell>) -> Self {
        debug_assert_eq!(cells.len(), rows * columns);
        debug_assert!(cells.iter().all(|&c| c == 1 || c == -1));
        Self {
            rows,
            columns,
            cells,
        }
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn columns(&self) -> usize {
        self.columns
    }

    /// Flattened length (neuron count this pattern feeds).
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Row-major bipolar cells.
    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }

    pub fn get(&self, row: usize, column: usize) -> Option<Cell> {
        if row >= self.rows || column >= self.columns {
            return None;
        }
        self.cells.get(row * self.columns + column).copied()
    }

    pub fn to_rows(&self) -> Vec<Vec<Cell>> {
        self.cells.chunks(self.columns).map(<[Cell]>::to_vec).collect()
    }

    /// Binary display encoding (+1 -> 1, -1 -> 0).
    pub fn to_binary(&self) -> Vec<Vec<u8>> {
        self.cells
            .chunks(self.columns)
            .map(|row| row.iter().map(|&c| to_binary(c)).collect())
            .collect()
    }

    /// Every cell flipped. A Hebbian memory stores each pattern together with its inversion.
    pub fn inverted(&self) -> Self {
        Self {
            rows: self.rows,
            columns: self.columns,
            cells: self.cells.iter().map(|&c| -c).collect(),
        }
    }

    /// Number of differing cells. Patterns must have the same length.
    pub fn hamming(&self, other: &Pattern) -> usize {
        debug_assert_eq!(self.len(), other.len());
        self.cells
            .iter()
            .zip(&other.cells)
            .filter(|(a, b)| a != b)
            .count()
    }

    /// Copy with `flips` distinct cells inverted (clamped to the pattern length).
    pub fn with_noise<R: RandomSource>(&self, flips: usize, rng: &mut R) -> Self {
        let mut noisy = self.clone();
        let order = rng.permutation(self.len());
        for &i in order.iter().take(flips) {
            noisy.cells[i] = -noisy.cells[i];
        }
        noisy
    }

    /// Same cells viewed with another grid shape. `rows * columns` must equal `len()`.
    pub fn reshaped(&self, rows: usize, columns: usize) -> Result<Self> {
        if rows * columns != self.len() {
            return Err(Error::DimensionMismatch {
                expected: self.len(),
                actual: rows * columns,
            });
        }
        Ok(Self::from_bipolar(rows, columns, self.cells.clone()))
    }

    /// Bordered ASCII rendering: `*` for +1, space for -1.
    pub fn render(&self) -> String {
        let border = format!("+{}+", "-".repeat(self.columns));
        let mut out = String::with_capacity((self.columns + 3) * (self.rows + 2));
        out.push_str(&border);
        out.push('\n');
        for row in self.cells.chunks(self.columns) {
            out.push('|');
            out.extend(row.iter().map(|&c| if c == 1 { '*' } else { ' ' }));
            out.push_str("|\n");
        }
        out.push_str(&border);
        out
    }
}

impl fmt::Display for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render())
    }
}

/// A training set: fixed-shape patterns, validated and normalized on insert.
#[derive(Debug, Clone, Default)]
pub struct PatternStore {
    rows: usize,
    columns: usize,
    patterns: Vec<Pattern>,
}

impl PatternStore {
    pub fn new(rows: usize, columns: usize) -> Self {
        Self {
            rows,
            columns,
            patterns: Vec::new(),
        }
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn columns(&self) -> usize {
        self.columns
    }

    pub fn num_neurons(&self) -> usize {
        self.rows * self.columns
    }

    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    pub fn patterns(&self) -> &[Pattern] {
        &self.patterns
    }

    /// Validate the grid shape and store its bipolar normalization.
    pub fn add_pattern<R: AsRef<[i32]>>(&mut self, grid: &[R]) -> Result<()> {
        if grid.len() != self.rows {
            return Err(self.mismatch(grid.len(), grid.first().map_or(0, |r| r.as_ref().len())));
        }
        if let Some(bad) = grid.iter().find(|r| r.as_ref().len() != self.columns) {
            return Err(self.mismatch(grid.len(), bad.as_ref().len()));
        }
        let pattern = Pattern::from_rows(grid)?;
        self.patterns.push(pattern);
        Ok(())
    }

    /// Stored pattern `index` in binary display encoding.
    pub fn get_pattern(&self, index: usize) -> Result<Vec<Vec<u8>>> {
        self.patterns
            .get(index)
            .map(Pattern::to_binary)
            .ok_or(Error::PatternIndex {
                index,
                len: self.patterns.len(),
            })
    }

    /// All stored patterns rendered one after another.
    pub fn display_patterns(&self) -> String {
        self.patterns
            .iter()
            .map(Pattern::render)
            .collect::<Vec<_>>()
            .join("\n")
    }

    fn mismatch(&self, rows: usize, columns: usize) -> Error {
        Error::ShapeMismatch {
            expected_rows: self.rows,
            expected_columns: self.columns,
            rows,
            columns,
        }
    }
}
