use std::collections::HashSet;
use std::time::Duration;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::{debug, info, warn};

use crate::error::GameError;
use crate::food::{Food, FoodKind, FoodSpawner};
use crate::grid::Grid;
use crate::input::{self, Command, Key};
use crate::snake::{Cell, Direction, Snake};

pub const BASE_INTERVAL: Duration = Duration::from_millis(100);
pub const MIN_INTERVAL: Duration = Duration::from_millis(10);
pub const SPEEDUP_STEP: Duration = Duration::from_millis(10);
pub const SPEEDUP_PERIOD: Duration = Duration::from_secs(60);
pub const SPECIAL_FOOD_EVERY: u32 = 15;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameState {
    NotPlaying,
    Playing,
    /// Not playing, with the score of the game that just ended.
    GameOver { final_score: u32 },
}

/// Signals for the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameEvent {
    ScoreChanged(u32),
    /// Restart the tick timer with this interval.
    RescheduleTimer(Duration),
    GameOver { final_score: u32 },
}

/// Everything a renderer needs for one frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snapshot {
    pub body: Vec<Cell>,
    pub food: Option<Food>,
    pub special: Option<Food>,
    pub score: u32,
    pub state: GameState,
    pub interval: Duration,
}

pub struct GameSession<R = StdRng> {
    grid: Grid,
    spawner: FoodSpawner<R>,
    snake: Option<Snake>,
    food: Option<Food>,
    special: Option<Food>,
    score: u32,
    interval: Duration,
    elapsed_at_speed: Duration,
    state: GameState,
}

impl GameSession<StdRng> {
    pub fn new(grid: Grid) -> Self {
        GameSession::with_rng(grid, StdRng::from_entropy())
    }

    pub fn with_seed(grid: Grid, seed: u64) -> Self {
        GameSession::with_rng(grid, StdRng::seed_from_u64(seed))
    }
}

impl<R: Rng> GameSession<R> {
    pub fn with_rng(grid: Grid, rng: R) -> Self {
        GameSession {
            grid,
            spawner: FoodSpawner::new(rng),
            snake: None,
            food: None,
            special: None,
            score: 0,
            interval: BASE_INTERVAL,
            elapsed_at_speed: Duration::ZERO,
            state: GameState::NotPlaying,
        }
    }

    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    pub fn snake(&self) -> Option<&Snake> {
        self.snake.as_ref()
    }

    pub fn food(&self) -> Option<Food> {
        self.food
    }

    pub fn special(&self) -> Option<Food> {
        self.special
    }

    pub fn score(&self) -> u32 {
        self.score
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn state(&self) -> GameState {
        self.state
    }

    pub fn is_playing(&self) -> bool {
        self.state == GameState::Playing
    }

    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            body: self.snake.as_ref().map(|s| s.body().iter().copied().collect()).unwrap_or_default(),
            food: self.food,
            special: self.special,
            score: self.score,
            state: self.state,
            interval: self.interval,
        }
    }

    pub fn start(&mut self) -> Result<Vec<GameEvent>, GameError> {
        if self.is_playing() {
            return Err(GameError::InvalidTransition);
        }

        let heading = Direction::random(self.spawner.rng());
        self.snake = Some(Snake::new(self.grid.center(), heading));
        self.food = None;
        self.special = None;
        self.score = 0;
        self.interval = BASE_INTERVAL;
        self.elapsed_at_speed = Duration::ZERO;
        self.state = GameState::Playing;
        info!(cols = self.grid.cols(), rows = self.grid.rows(), ?heading, "game started");

        let mut events = vec![GameEvent::ScoreChanged(0), GameEvent::RescheduleTimer(self.interval)];
        if self.spawn(FoodKind::Regular).is_err() {
            self.end_game(&mut events);
        }
        Ok(events)
    }

    pub fn handle_input(&mut self, key: Key) -> Vec<GameEvent> {
        match input::route(key) {
            Command::Turn(dir) if self.is_playing() => {
                if let Some(snake) = self.snake.as_mut() {
                    let _ = snake.change_direction(dir);
                }
                vec![]
            }
            Command::Confirm if !self.is_playing() => self.start().unwrap_or_default(),
            _ => vec![],
        }
    }

    /// Runs one simulation step. `dt` is the wall-clock time since the
    /// previous tick.
    pub fn tick(&mut self, dt: Duration) -> Result<Vec<GameEvent>, GameError> {
        if !self.is_playing() {
            return Err(GameError::InvalidTransition);
        }
        let head = match self.snake.as_mut() {
            Some(snake) => {
                snake.advance();
                snake.head()
            }
            None => return Err(GameError::InvalidTransition),
        };
        let mut events = Vec::new();

        if self.food.map_or(false, |food| food.cell == head) {
            self.food = None;
            self.eat(FoodKind::Regular, &mut events);
            if self.spawn(FoodKind::Regular).is_err() {
                self.end_game(&mut events);
                return Ok(events);
            }
        }

        if self.special.map_or(false, |food| food.cell == head) {
            self.special = None;
            self.eat(FoodKind::Special, &mut events);
        }

        let special_due = self.score > 0 && self.score % SPECIAL_FOOD_EVERY == 0;
        if special_due && self.special.is_none() && self.spawn(FoodKind::Special).is_err() {
            self.end_game(&mut events);
            return Ok(events);
        }

        self.elapsed_at_speed += dt;
        if self.elapsed_at_speed >= SPEEDUP_PERIOD {
            self.elapsed_at_speed = Duration::ZERO;
            let next = self.interval.saturating_sub(SPEEDUP_STEP).max(MIN_INTERVAL);
            if next != self.interval {
                info!(from = ?self.interval, to = ?next, "speeding up");
                self.interval = next;
                events.push(GameEvent::RescheduleTimer(next));
            }
        }

        let crashed = match self.snake.as_ref() {
            Some(snake) => snake.head_out_of_bounds(&self.grid) || snake.head_collided_with_body(),
            None => false,
        };
        if crashed {
            self.end_game(&mut events);
        }

        Ok(events)
    }

    #[doc(hidden)]
    pub fn debug_set_snake(&mut self, snake: Snake) {
        self.snake = Some(snake);
    }

    #[doc(hidden)]
    pub fn debug_set_food(&mut self, food: Food) {
        self.place(food);
    }

    fn place(&mut self, food: Food) {
        match food.kind {
            FoodKind::Regular => self.food = Some(food),
            FoodKind::Special => self.special = Some(food),
        }
    }

    fn eat(&mut self, kind: FoodKind, events: &mut Vec<GameEvent>) {
        if let Some(snake) = self.snake.as_mut() {
            snake.grow();
        }
        self.score += kind.points();
        debug!(?kind, score = self.score, "food eaten");
        events.push(GameEvent::ScoreChanged(self.score));
    }

    fn spawn(&mut self, kind: FoodKind) -> Result<(), GameError> {
        let mut occupied: HashSet<Cell> = match self.snake.as_ref() {
            Some(snake) => snake.body().iter().copied().collect(),
            None => HashSet::new(),
        };
        occupied.extend(self.food.iter().chain(self.special.iter()).map(|food| food.cell));

        match self.spawner.spawn(kind, &self.grid, &occupied) {
            Ok(food) => {
                self.place(food);
                Ok(())
            }
            Err(err) => {
                warn!(?kind, score = self.score, "{}", err);
                Err(err)
            }
        }
    }

    fn end_game(&mut self, events: &mut Vec<GameEvent>) {
        let final_score = self.score;
        self.state = GameState::GameOver { final_score };
        self.food = None;
        self.special = None;
        info!(final_score, "game over");
        events.push(GameEvent::GameOver { final_score });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session() -> GameSession {
        GameSession::with_seed(Grid::new(30, 30, 1), 42)
    }

    fn place(session: &mut GameSession, head: Cell, heading: Direction) {
        session.debug_set_snake(Snake::new(head, heading));
    }

    #[test]
    fn start_resets_everything() {
        let mut s = session();
        assert_eq!(s.state(), GameState::NotPlaying);
        let events = s.start().unwrap();
        assert_eq!(events, vec![GameEvent::ScoreChanged(0), GameEvent::RescheduleTimer(BASE_INTERVAL)]);
        assert!(s.is_playing());
        assert_eq!(s.score(), 0);
        assert_eq!(s.interval(), BASE_INTERVAL);
        assert_eq!(s.snake().unwrap().body().len(), 1);
        assert_eq!(s.snake().unwrap().head(), Cell::new(15, 15));
        let food = s.food().unwrap();
        assert_eq!(food.kind, FoodKind::Regular);
        assert_ne!(food.cell, Cell::new(15, 15));
        assert!(s.special().is_none());
    }

    #[test]
    fn start_while_playing_is_rejected() {
        let mut s = session();
        s.start().unwrap();
        s.debug_set_snake(Snake::new(Cell::new(3, 3), Direction::Down));
        assert_eq!(s.start(), Err(GameError::InvalidTransition));
        assert_eq!(s.snake().unwrap().head(), Cell::new(3, 3));
    }

    #[test]
    fn tick_when_not_playing_is_a_noop() {
        let mut s = session();
        assert_eq!(s.tick(BASE_INTERVAL), Err(GameError::InvalidTransition));
        assert_eq!(s.state(), GameState::NotPlaying);
        assert!(s.snake().is_none());
    }

    #[test]
    fn regular_food_scores_one_and_respawns() {
        let mut s = session();
        s.start().unwrap();
        place(&mut s, Cell::new(10, 10), Direction::Right);
        s.debug_set_food(Food { cell: Cell::new(11, 10), kind: FoodKind::Regular });

        let events = s.tick(BASE_INTERVAL).unwrap();
        assert_eq!(events, vec![GameEvent::ScoreChanged(1)]);
        assert_eq!(s.score(), 1);
        let food = s.food().unwrap();
        assert!(!s.snake().unwrap().occupies(food.cell));

        s.debug_set_food(Food { cell: Cell::new(1, 1), kind: FoodKind::Regular });
        s.tick(BASE_INTERVAL).unwrap();
        assert_eq!(s.snake().unwrap().len(), 2);
    }

    #[test]
    fn special_food_scores_five_and_is_not_replaced() {
        let mut s = session();
        s.start().unwrap();
        place(&mut s, Cell::new(10, 10), Direction::Right);
        s.debug_set_food(Food { cell: Cell::new(2, 2), kind: FoodKind::Regular });
        s.debug_set_food(Food { cell: Cell::new(11, 10), kind: FoodKind::Special });

        let events = s.tick(BASE_INTERVAL).unwrap();
        assert_eq!(events, vec![GameEvent::ScoreChanged(5)]);
        assert!(s.special().is_none());
        assert_eq!(s.food().unwrap().cell, Cell::new(2, 2));
    }

    #[test]
    fn special_food_appears_every_fifteen_points() {
        let mut s = session();
        s.start().unwrap();
        place(&mut s, Cell::new(5, 10), Direction::Right);
        s.debug_set_food(Food { cell: Cell::new(1, 1), kind: FoodKind::Regular });
        s.score = 14;

        s.tick(BASE_INTERVAL).unwrap();
        assert!(s.special().is_none());

        s.debug_set_food(Food { cell: Cell::new(7, 10), kind: FoodKind::Regular });
        s.tick(BASE_INTERVAL).unwrap();
        assert_eq!(s.score(), 15);
        let special = s.special().unwrap();
        assert_eq!(special.kind, FoodKind::Special);
        assert_ne!(special.cell, s.food().unwrap().cell);

        // Still at 15, but one is already out
        let parked = Food { cell: Cell::new(1, 2), kind: FoodKind::Special };
        s.debug_set_food(Food { cell: Cell::new(1, 1), kind: FoodKind::Regular });
        s.debug_set_food(parked);
        s.tick(BASE_INTERVAL).unwrap();
        assert_eq!(s.score(), 15);
        assert_eq!(s.special(), Some(parked));
    }

    #[test]
    fn speed_up_every_minute() {
        let mut s = session();
        s.start().unwrap();
        place(&mut s, Cell::new(2, 15), Direction::Right);
        s.debug_set_food(Food { cell: Cell::new(1, 1), kind: FoodKind::Regular });

        assert!(s.tick(Duration::from_secs(30)).unwrap().is_empty());
        assert!(s.tick(Duration::from_secs(29)).unwrap().is_empty());
        let events = s.tick(Duration::from_secs(1)).unwrap();
        assert_eq!(events, vec![GameEvent::RescheduleTimer(Duration::from_millis(90))]);
        assert_eq!(s.interval(), Duration::from_millis(90));

        let events = s.tick(SPEEDUP_PERIOD).unwrap();
        assert_eq!(events, vec![GameEvent::RescheduleTimer(Duration::from_millis(80))]);
    }

    #[test]
    fn interval_never_drops_below_floor() {
        let mut s = GameSession::with_seed(Grid::new(40, 5, 1), 1);
        s.start().unwrap();
        place(&mut s, Cell::new(1, 2), Direction::Right);
        s.debug_set_food(Food { cell: Cell::new(1, 1), kind: FoodKind::Regular });

        let mut reschedules = 0;
        for _ in 0..12 {
            for event in s.tick(SPEEDUP_PERIOD).unwrap() {
                if let GameEvent::RescheduleTimer(interval) = event {
                    assert!(interval >= MIN_INTERVAL);
                    reschedules += 1;
                }
            }
        }
        assert_eq!(s.interval(), MIN_INTERVAL);
        assert_eq!(reschedules, 9);
    }

    #[test]
    fn wall_ends_the_game() {
        let mut s = session();
        s.start().unwrap();
        place(&mut s, Cell::new(28, 4), Direction::Right);
        s.debug_set_food(Food { cell: Cell::new(1, 1), kind: FoodKind::Regular });
        s.score = 7;

        let events = s.tick(BASE_INTERVAL).unwrap();
        assert_eq!(events, vec![GameEvent::GameOver { final_score: 7 }]);
        assert_eq!(s.state(), GameState::GameOver { final_score: 7 });
        assert!(s.food().is_none());
        assert_eq!(s.tick(BASE_INTERVAL), Err(GameError::InvalidTransition));
    }

    #[test]
    fn biting_itself_ends_the_game() {
        let mut s = session();
        s.start().unwrap();
        let body = [(3, 4), (3, 5), (4, 5), (5, 5), (5, 4), (4, 4)].iter().map(|&(x, y)| Cell::new(x, y));
        s.debug_set_snake(Snake::from_cells(body, Direction::Down).unwrap());
        s.debug_set_food(Food { cell: Cell::new(20, 20), kind: FoodKind::Regular });

        let events = s.tick(BASE_INTERVAL).unwrap();
        assert_eq!(events, vec![GameEvent::GameOver { final_score: 0 }]);
    }

    #[test]
    fn input_turns_and_filters_reversal() {
        let mut s = session();
        assert!(s.handle_input(Key::Up).is_empty());
        assert!(s.snake().is_none());

        s.start().unwrap();
        place(&mut s, Cell::new(10, 10), Direction::Right);
        s.handle_input(Key::Left);
        assert_eq!(s.snake().unwrap().heading(), Direction::Right);
        s.handle_input(Key::Char('w'));
        assert_eq!(s.snake().unwrap().heading(), Direction::Up);
        s.handle_input(Key::Char('x'));
        assert_eq!(s.snake().unwrap().heading(), Direction::Up);
    }

    #[test]
    fn enter_starts_only_when_not_playing() {
        let mut s = session();
        let events = s.handle_input(Key::Enter);
        assert!(events.contains(&GameEvent::ScoreChanged(0)));
        assert!(s.is_playing());

        place(&mut s, Cell::new(4, 4), Direction::Up);
        assert!(s.handle_input(Key::Enter).is_empty());
        assert_eq!(s.snake().unwrap().head(), Cell::new(4, 4));
    }

    #[test]
    fn no_room_for_food_ends_the_game() {
        // 3x3 grid: the single playable cell is the centre
        let mut s = GameSession::with_seed(Grid::new(3, 3, 1), 9);
        let events = s.start().unwrap();
        assert_eq!(events.last(), Some(&GameEvent::GameOver { final_score: 0 }));
        assert_eq!(s.state(), GameState::GameOver { final_score: 0 });
    }

    #[test]
    fn restart_after_game_over() {
        let mut s = session();
        s.start().unwrap();
        place(&mut s, Cell::new(1, 4), Direction::Left);
        s.score = 3;
        s.interval = Duration::from_millis(50);
        s.tick(BASE_INTERVAL).unwrap();
        assert_eq!(s.state(), GameState::GameOver { final_score: 3 });
        assert_eq!(s.snapshot().score, 3);

        s.start().unwrap();
        assert_eq!(s.score(), 0);
        assert_eq!(s.interval(), BASE_INTERVAL);
        assert!(s.is_playing());
    }
}
