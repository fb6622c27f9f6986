use std::collections::HashSet;
use std::time::{Duration, Instant};

use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use tracing::{debug, warn};

use lindworm::{Cell, Direction, FoodKind, GameEvent, GameSession, Grid, Key};

use crate::term::{Pos, TermManager};

/// One terminal character per cell.
pub const TERMINAL_CELL_SIZE: u32 = 1;

const IDLE_POLL: Duration = Duration::from_millis(250);

const SNAKE_BODY_CHAR: char = '█';
const DEAD_SNAKE_CHAR: char = 'X';
const FOOD_CHAR: char = 'O';
const SPECIAL_FOOD_CHAR: char = '$';

/// Playfield for a terminal of `size`, optionally capped.
pub fn playfield(size: Pos, cols: Option<u16>, rows: Option<u16>) -> Grid {
    let width = cols.map_or(size.0, |c| c.min(size.0));
    let height = rows.map_or(size.1, |r| r.min(size.1));
    Grid::from_surface(width as u32, height as u32, TERMINAL_CELL_SIZE)
}

/// Terminal host: owns the tick timer and turns session state into
/// characters.
pub struct App {
    term: TermManager,
    session: GameSession,
    paused: bool,
    interval: Duration,
    drawn: HashSet<Cell>,
}

impl App {
    pub fn new(term: TermManager, session: GameSession) -> Self {
        let interval = session.interval();
        App { term, session, paused: false, interval, drawn: HashSet::new() }
    }

    pub fn shutdown(&mut self) -> Result<()> {
        self.term.restore()?;
        Ok(())
    }

    pub fn run(&mut self) -> Result<()> {
        self.term.clear()?;
        self.draw_border()?;
        let center = self.center();
        self.term.show_message(center, &[
            "Arrow keys or WASD to move",
            "Esc to pause",
            "Ctrl+C or q to quit",
            "",
            "Press Enter to begin",
        ])?;

        let mut last_tick = Instant::now();

        loop {
            let ticking = self.session.is_playing() && !self.paused;
            let timeout = if ticking { self.interval.saturating_sub(last_tick.elapsed()) } else { IDLE_POLL };

            if let Some(ev) = self.term.next_key(timeout)? {
                if is_quit(&ev) {
                    return Ok(());
                }

                if ev.code == KeyCode::Esc && self.session.is_playing() {
                    self.toggle_pause()?;
                    last_tick = Instant::now();
                } else if !self.paused {
                    let was_playing = self.session.is_playing();
                    let events = self.session.handle_input(to_key(ev.code));
                    if !was_playing && self.session.is_playing() {
                        self.redraw()?;
                        last_tick = Instant::now();
                    }
                    self.apply(&events)?;
                }
            }

            if self.session.is_playing() && !self.paused && last_tick.elapsed() >= self.interval {
                let now = Instant::now();
                let dt = now - last_tick;
                last_tick = now;

                match self.session.tick(dt) {
                    Ok(events) => {
                        self.render()?;
                        self.apply(&events)?;
                    }
                    Err(err) => warn!("tick skipped: {}", err),
                }
            }
        }
    }

    ///////////////////////////////////////////////////////////////////////////

    fn apply(&mut self, events: &[GameEvent]) -> Result<()> {
        for event in events {
            match *event {
                GameEvent::ScoreChanged(score) => self.draw_score(score)?,
                GameEvent::RescheduleTimer(interval) => {
                    debug!(?interval, "timer rescheduled");
                    self.interval = interval;
                }
                GameEvent::GameOver { final_score } => self.game_over(final_score)?,
            }
        }
        self.term.flush()?;
        Ok(())
    }

    fn redraw(&mut self) -> Result<()> {
        self.term.clear()?;
        self.drawn.clear();
        self.draw_border()?;
        self.draw_score(self.session.score())?;
        self.render()
    }

    /// Draws the current frame, erasing whatever moved away since the last one.
    fn render(&mut self) -> Result<()> {
        let snapshot = self.session.snapshot();
        let grid = *self.session.grid();

        let mut frame: Vec<(Cell, char)> = Vec::with_capacity(snapshot.body.len() + 2);
        let foods = snapshot.food.iter().chain(snapshot.special.iter());
        frame.extend(foods.map(|food| {
            let ch = match food.kind {
                FoodKind::Regular => FOOD_CHAR,
                FoodKind::Special => SPECIAL_FOOD_CHAR,
            };
            (food.cell, ch)
        }));
        // Tail first so the head wins where cells overlap
        frame.extend(snapshot.body.iter().skip(1).rev().map(|cell| (*cell, SNAKE_BODY_CHAR)));
        if let Some(head) = snapshot.body.first() {
            frame.push((*head, self.head_char()));
        }

        let current: HashSet<Cell> = frame.iter().map(|(cell, _)| *cell).collect();
        for gone in self.drawn.difference(&current) {
            if grid.is_in_bounds(*gone) {
                self.term.print_at(to_pos(&grid, *gone), ' ')?;
            }
        }
        for (cell, ch) in &frame {
            if grid.is_in_bounds(*cell) {
                self.term.print_at(to_pos(&grid, *cell), *ch)?;
            }
        }
        self.drawn = current;
        self.term.flush()?;
        Ok(())
    }

    fn draw_border(&mut self) -> Result<()> {
        let grid = *self.session.grid();
        let (end_x, end_y) = (grid.cols() - 1, grid.rows() - 1);

        for x in 0..grid.cols() {
            let ch = if x == 0 || x == end_x { '+' } else { '-' };
            self.term.print_at(to_pos(&grid, Cell::new(x, 0)), ch)?;
            self.term.print_at(to_pos(&grid, Cell::new(x, end_y)), ch)?;
        }
        for y in 1..end_y {
            self.term.print_at(to_pos(&grid, Cell::new(0, y)), '|')?;
            self.term.print_at(to_pos(&grid, Cell::new(end_x, y)), '|')?;
        }
        self.term.flush()?;
        Ok(())
    }

    fn draw_score(&mut self, score: u32) -> Result<()> {
        let grid = *self.session.grid();
        let label = format!(" Score: {} ", score);
        if (label.len() as i32) < grid.cols() - 4 {
            self.term.print_str_at(to_pos(&grid, Cell::new(2, 0)), &label)?;
        }
        Ok(())
    }

    fn game_over(&mut self, final_score: u32) -> Result<()> {
        let grid = *self.session.grid();
        let body: Vec<Cell> = self.session.snapshot().body;
        for cell in body {
            if grid.is_in_bounds(cell) {
                self.term.print_at(to_pos(&grid, cell), DEAD_SNAKE_CHAR)?;
            }
        }
        let headline = format!("Game over. You scored {} points", final_score);
        let center = self.center();
        self.term.show_message(center, &[
            headline.as_str(),
            "",
            "Press Enter to play again,",
            "or Ctrl+C to quit.",
        ])?;
        Ok(())
    }

    fn toggle_pause(&mut self) -> Result<()> {
        if !self.paused {
            let center = self.center();
            self.term.show_message(center, &["Paused", "Press Esc to resume", "or Ctrl+C to quit"])?;
        } else {
            self.term.hide_message()?;
        }
        self.paused = !self.paused;
        Ok(())
    }

    fn head_char(&self) -> char {
        match self.session.snake().map(|s| s.heading()) {
            Some(Direction::Up) => '^',
            Some(Direction::Down) => 'v',
            Some(Direction::Left) => '<',
            Some(Direction::Right) | None => '>',
        }
    }

    fn center(&self) -> Pos {
        let grid = self.session.grid();
        let (w, h) = grid.to_pixel(Cell::new(grid.cols(), grid.rows()));
        ((w / 2) as u16, (h / 2) as u16)
    }
}

fn to_pos(grid: &Grid, cell: Cell) -> Pos {
    let (x, y) = grid.to_pixel(cell);
    (x as u16, y as u16)
}

fn to_key(code: KeyCode) -> Key {
    match code {
        KeyCode::Up => Key::Up,
        KeyCode::Down => Key::Down,
        KeyCode::Left => Key::Left,
        KeyCode::Right => Key::Right,
        KeyCode::Enter => Key::Enter,
        KeyCode::Char(c) => Key::Char(c),
        _ => Key::Other,
    }
}

fn is_quit(ev: &KeyEvent) -> bool {
    match ev.code {
        KeyCode::Char('c') => ev.modifiers.contains(KeyModifiers::CONTROL),
        KeyCode::Char('q') => true,
        _ => false,
    }
}
