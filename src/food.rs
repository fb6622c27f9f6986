use std::collections::HashSet;

use rand::seq::SliceRandom;
use rand::Rng;
use tracing::debug;

use crate::error::GameError;
use crate::grid::Grid;
use crate::snake::Cell;

/// Random picks tried before falling back to scanning for free cells.
pub const MAX_SAMPLE_ATTEMPTS: usize = 64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FoodKind {
    Regular,
    Special,
}

impl FoodKind {
    pub fn points(self) -> u32 {
        match self {
            FoodKind::Regular => 1,
            FoodKind::Special => 5,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Food {
    pub cell: Cell,
    pub kind: FoodKind,
}

/// Places food on free playable cells.
#[derive(Debug, Clone)]
pub struct FoodSpawner<R> {
    rng: R,
}

impl<R: Rng> FoodSpawner<R> {
    pub fn new(rng: R) -> Self {
        FoodSpawner { rng }
    }

    pub fn rng(&mut self) -> &mut R {
        &mut self.rng
    }

    pub fn spawn(&mut self, kind: FoodKind, grid: &Grid, occupied: &HashSet<Cell>) -> Result<Food, GameError> {
        if grid.playable_count() == 0 {
            return Err(GameError::NoSpaceAvailable);
        }

        for _ in 0..MAX_SAMPLE_ATTEMPTS {
            let x = self.rng.gen_range(1..grid.cols() - 1);
            let y = self.rng.gen_range(1..grid.rows() - 1);
            let cell = Cell::new(x, y);
            if !occupied.contains(&cell) {
                debug!(?kind, x, y, "food spawned");
                return Ok(Food { cell, kind });
            }
        }

        // Crowded board, pick directly among what is left
        let free: Vec<Cell> = grid.playable_cells().filter(|cell| !occupied.contains(cell)).collect();
        match free.choose(&mut self.rng) {
            Some(&cell) => {
                debug!(?kind, x = cell.x, y = cell.y, free = free.len(), "food spawned after scan");
                Ok(Food { cell, kind })
            }
            None => Err(GameError::NoSpaceAvailable),
        }
    }
}
