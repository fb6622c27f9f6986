//! Snake game core: a grid, a snake, food, and the per-tick session that
//! ties them together. A host drives it with `start`, `tick` and
//! `handle_input`, and renders from `snapshot`.

pub mod error;
pub mod food;
pub mod grid;
pub mod input;
pub mod session;
pub mod snake;

pub use error::GameError;
pub use food::{Food, FoodKind, FoodSpawner};
pub use grid::Grid;
pub use input::{Command, Key};
pub use session::{GameEvent, GameSession, GameState, Snapshot};
pub use snake::{Cell, Direction, Snake};
