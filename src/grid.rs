pub use bacteria_common::DEFAULT_GRID_SIZE;

/// State of a single lattice site.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Cell {
    #[default]
    Empty,
    Full,
}

/// Square lattice of `size * size` cells stored row-major (`index = y * size + x`).
///
/// Cloning duplicates the whole cell buffer; the step engine relies on that to
/// build the next generation from a copy of the current one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Grid {
    size: usize,
    cells: Vec<Cell>,
}

impl Grid {
    /// All-Empty grid with the default side length.
    pub fn new() -> Self {
        Self::with_size(DEFAULT_GRID_SIZE)
    }

    /// All-Empty grid with side length `size`.
    pub fn with_size(size: usize) -> Self {
        assert!(size > 0, "grid side length must be positive");
        Self {
            size,
            cells: vec![Cell::Empty; size * size],
        }
    }

    #[inline(always)]
    pub fn size(&self) -> usize {
        self.size
    }

    // Calculates the flat cell index for a coordinate
    #[inline(always)]
    fn index(&self, x: usize, y: usize) -> usize {
        assert!(
            x < self.size && y < self.size,
            "cell ({}, {}) outside {}x{} grid",
            x, y, self.size, self.size
        );
        y * self.size + x
    }

    #[inline(always)]
    pub fn get(&self, x: usize, y: usize) -> Cell {
        self.cells[self.index(x, y)]
    }

    #[inline(always)]
    pub fn set(&mut self, x: usize, y: usize, cell: Cell) {
        let idx = self.index(x, y);
        self.cells[idx] = cell;
    }

    /// Number of Full cells on the whole lattice. Full scan, nothing cached.
    pub fn count_full(&self) -> usize {
        self.cells.iter().filter(|&&c| c == Cell::Full).count()
    }

    /// Coordinates of every Full cell, y outer and x inner.
    pub fn full_cells(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        let size = self.size;
        self.cells
            .iter()
            .enumerate()
            .filter(|(_, &c)| c == Cell::Full)
            .map(move |(idx, _)| (idx % size, idx / size))
    }
}

impl Default for Grid {
    fn default() -> Self {
        Self::new()
    }
}
