use crate::snake::Cell;

/// Size of one cell in surface units, matching the original window layout.
pub const DEFAULT_CELL_SIZE: u32 = 10;

/// The discrete playfield. The outermost ring of cells is the decorative
/// border and is never playable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Grid {
    cell_size: u32,
    cols: i32,
    rows: i32,
}

impl Grid {
    pub fn new(cols: i32, rows: i32, cell_size: u32) -> Self {
        Grid { cell_size: cell_size.max(1), cols: cols.max(0), rows: rows.max(0) }
    }

    /// Derives the grid from a drawing surface measured in surface units.
    pub fn from_surface(width: u32, height: u32, cell_size: u32) -> Self {
        let cell_size = cell_size.max(1);
        Grid::new((width / cell_size) as i32, (height / cell_size) as i32, cell_size)
    }

    pub fn cell_size(&self) -> u32 {
        self.cell_size
    }

    pub fn cols(&self) -> i32 {
        self.cols
    }

    pub fn rows(&self) -> i32 {
        self.rows
    }

    pub fn center(&self) -> Cell {
        Cell::new(self.cols / 2, self.rows / 2)
    }

    pub fn to_cell(&self, pixel: (u32, u32)) -> Cell {
        let size = self.cell_size;
        Cell::new((pixel.0 / size) as i32, (pixel.1 / size) as i32)
    }

    /// Top-left surface position of a cell. Cells left of or above the
    /// origin clamp to zero.
    pub fn to_pixel(&self, cell: Cell) -> (u32, u32) {
        let size = self.cell_size;
        (cell.x.max(0) as u32 * size, cell.y.max(0) as u32 * size)
    }

    pub fn is_in_bounds(&self, cell: Cell) -> bool {
        cell.x >= 1 && cell.y >= 1 && cell.x <= self.cols - 2 && cell.y <= self.rows - 2
    }

    /// Every playable cell, row by row.
    pub fn playable_cells(&self) -> impl Iterator<Item = Cell> + '_ {
        (1..self.rows - 1).flat_map(move |y| (1..self.cols - 1).map(move |x| Cell::new(x, y)))
    }

    pub fn playable_count(&self) -> usize {
        let w = (self.cols - 2).max(0) as usize;
        let h = (self.rows - 2).max(0) as usize;
        w * h
    }
}
