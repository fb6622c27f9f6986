use std::collections::VecDeque;
use std::ops::Add;

use rand::seq::SliceRandom;
use rand::Rng;
use tracing::trace;

use crate::error::GameError;
use crate::grid::Grid;
use Direction::*;

/// A position on the grid, in cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Cell {
    pub x: i32,
    pub y: i32,
}

impl Cell {
    pub const fn new(x: i32, y: i32) -> Self {
        Cell { x, y }
    }
}

impl Add<Direction> for Cell {
    type Output = Cell;

    fn add(self, dir: Direction) -> Cell {
        let (dx, dy) = dir.delta();
        Cell::new(self.x + dx, self.y + dy)
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

impl Direction {
    pub const ALL: [Direction; 4] = [Up, Down, Left, Right];

    pub fn delta(self) -> (i32, i32) {
        match self {
            Up => (0, -1),
            Down => (0, 1),
            Left => (-1, 0),
            Right => (1, 0),
        }
    }

    pub fn opposite(self) -> Direction {
        match self {
            Up => Down,
            Down => Up,
            Left => Right,
            Right => Left,
        }
    }

    pub fn random<R: Rng + ?Sized>(rng: &mut R) -> Direction {
        *Direction::ALL.choose(rng).unwrap_or(&Right)
    }
}

/// The snake's body, head first.
///
/// Growth is deferred: `grow` duplicates the tail cell, and the following
/// `advance` drops that duplicate instead of a real segment, so the body ends
/// up one cell longer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snake {
    body: VecDeque<Cell>,
    heading: Direction,
    // Heading that produced the current head.
    moved: Direction,
}

impl Snake {
    pub fn new(head: Cell, heading: Direction) -> Self {
        let mut body = VecDeque::new();
        body.push_back(head);
        Snake { body, heading, moved: heading }
    }

    /// Builds a snake from explicit cells, head first. Returns `None` for an
    /// empty body.
    pub fn from_cells<I: IntoIterator<Item = Cell>>(cells: I, heading: Direction) -> Option<Self> {
        let body: VecDeque<Cell> = cells.into_iter().collect();
        if body.is_empty() {
            return None;
        }
        Some(Snake { body, heading, moved: heading })
    }

    pub fn body(&self) -> &VecDeque<Cell> {
        &self.body
    }

    pub fn len(&self) -> usize {
        self.body.len()
    }

    // Never empty, but clippy wants the pair.
    pub fn is_empty(&self) -> bool {
        self.body.is_empty()
    }

    pub fn head(&self) -> Cell {
        self.body[0]
    }

    pub fn tail(&self) -> Cell {
        self.body[self.body.len() - 1]
    }

    pub fn heading(&self) -> Direction {
        self.heading
    }

    pub fn occupies(&self, cell: Cell) -> bool {
        self.body.contains(&cell)
    }

    pub fn change_direction(&mut self, requested: Direction) -> Result<(), GameError> {
        if requested == self.heading.opposite() || requested == self.moved.opposite() {
            trace!(?requested, heading = ?self.heading, "reversal ignored");
            return Err(GameError::IllegalDirectionChange);
        }
        self.heading = requested;
        Ok(())
    }

    pub fn advance(&mut self) {
        let new_head = self.head() + self.heading;
        self.moved = self.heading;
        self.body.pop_back();
        self.body.push_front(new_head);
    }

    pub fn grow(&mut self) {
        let tail = self.tail();
        self.body.push_back(tail);
    }

    pub fn head_collided_with_body(&self) -> bool {
        // A length-2 body right after the first meal is the head plus the
        // duplicated tail, which may share a cell without a real collision.
        if self.body.len() <= 2 {
            return false;
        }
        let head = self.head();
        self.body.iter().skip(1).any(|cell| *cell == head)
    }

    pub fn head_out_of_bounds(&self, grid: &Grid) -> bool {
        !grid.is_in_bounds(self.head())
    }
}
