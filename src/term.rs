use std::io::{stdout, Stdout, Write};
use std::time::Duration;

use crossterm::event::{poll, read, Event, KeyEvent};
use crossterm::terminal::{ClearType, EnterAlternateScreen, LeaveAlternateScreen};
use crossterm::{cursor, execute, queue, style, terminal, Result};

/// Terminal column and row.
pub type Pos = (u16, u16);

/// Draws characters on the alternate screen and keeps a copy of what was
/// drawn, so message boxes can be lifted off again.
pub struct TermManager {
    width: u16,
    height: u16,
    stdout: Stdout,
    screen: Vec<char>,
    current_msg: Option<MessageBox>,
}

struct MessageBox {
    top_left: Pos,
    width: u16,
    height: u16,
}

impl TermManager {
    pub fn new() -> Result<Self> {
        let (width, height) = terminal::size()?;
        let screen = vec![' '; width as usize * height as usize];
        Ok(TermManager { width, height, stdout: stdout(), screen, current_msg: None })
    }

    pub fn size(&self) -> Pos {
        (self.width, self.height)
    }

    pub fn setup(&mut self) -> Result<()> {
        execute!(self.stdout, EnterAlternateScreen)?;
        terminal::enable_raw_mode()?;
        execute!(self.stdout, cursor::Hide, cursor::DisableBlinking)
    }

    pub fn restore(&mut self) -> Result<()> {
        terminal::disable_raw_mode()?;
        execute!(self.stdout, cursor::Show, cursor::EnableBlinking, LeaveAlternateScreen)
    }

    /// Waits up to `timeout` for a key press.
    pub fn next_key(&self, timeout: Duration) -> Result<Option<KeyEvent>> {
        if !poll(timeout)? {
            return Ok(None);
        }
        match read()? {
            Event::Key(ev) => Ok(Some(ev)),
            _ => Ok(None),
        }
    }

    pub fn clear(&mut self) -> Result<()> {
        execute!(self.stdout, terminal::Clear(ClearType::All))?;
        self.screen.iter_mut().for_each(|ch| *ch = ' ');
        self.current_msg = None;
        Ok(())
    }

    pub fn print_at(&mut self, pos: Pos, ch: char) -> Result<()> {
        if pos.0 >= self.width || pos.1 >= self.height {
            return Ok(());
        }
        queue!(self.stdout, cursor::MoveTo(pos.0, pos.1), style::Print(ch))?;
        self.screen[self.width as usize * pos.1 as usize + pos.0 as usize] = ch;
        Ok(())
    }

    pub fn print_str_at(&mut self, pos: Pos, text: &str) -> Result<()> {
        for (i, ch) in text.chars().enumerate() {
            self.print_at((pos.0 + i as u16, pos.1), ch)?;
        }
        Ok(())
    }

    /// Shows a boxed message centred on `center`, replacing any previous one.
    pub fn show_message(&mut self, center: Pos, lines: &[&str]) -> Result<()> {
        self.hide_message()?;

        let height = lines.len() as u16 + 2;
        let width = lines.iter().map(|l| l.chars().count()).max().unwrap_or(0) as u16 + 2;
        let top_left = (center.0.saturating_sub(width / 2), center.1.saturating_sub(height / 2));

        for y in 0..height {
            let line = match y {
                0 => "",
                y if y == height - 1 => "",
                y => lines[y as usize - 1],
            };
            let padded = format!("{: ^width$}", line, width = width as usize);
            for (x, ch) in padded.chars().enumerate() {
                self.print_overlay((top_left.0 + x as u16, top_left.1 + y), ch)?;
            }
        }

        self.current_msg = Some(MessageBox { top_left, width, height });
        self.flush()
    }

    pub fn hide_message(&mut self) -> Result<()> {
        let msg = match self.current_msg.take() {
            Some(msg) => msg,
            None => return Ok(()),
        };

        for dy in 0..msg.height {
            for dx in 0..msg.width {
                let (x, y) = (msg.top_left.0 + dx, msg.top_left.1 + dy);
                if x < self.width && y < self.height {
                    let ch = self.screen[self.width as usize * y as usize + x as usize];
                    self.print_overlay((x, y), ch)?;
                }
            }
        }
        self.flush()
    }

    pub fn flush(&mut self) -> Result<()> {
        self.stdout.flush()?;
        Ok(())
    }

    // Message boxes bypass the screen copy so hiding them restores the game.
    fn print_overlay(&mut self, pos: Pos, ch: char) -> Result<()> {
        if pos.0 >= self.width || pos.1 >= self.height {
            return Ok(());
        }
        queue!(self.stdout, cursor::MoveTo(pos.0, pos.1), style::Print(ch))
    }
}
