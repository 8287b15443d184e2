use std::io::{self, Stdout, Write};

use crossterm::{
    event::{DisableMouseCapture, EnableMouseCapture},
    execute,
    terminal::{self, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};

use crate::error::Result;
use crate::view::Viewport;

/// Raw-mode terminal session for the tree view.
///
/// Dropping the session restores the terminal, so startup failures after
/// `Tui::new` leave the shell usable.
pub struct Tui {
    terminal: Terminal<CrosstermBackend<Stdout>>,
    mouse_enabled: bool,
    active: bool,
}

impl Tui {
    /// Enter raw mode and the alternate screen, capturing the mouse when
    /// `enable_mouse` is set.
    pub fn new(enable_mouse: bool) -> Result<Self> {
        terminal::enable_raw_mode()?;
        let mut stdout = io::stdout();
        if let Err(e) = enter_screen(&mut stdout, enable_mouse) {
            let _ = terminal::disable_raw_mode();
            return Err(e.into());
        }
        let terminal = Terminal::new(CrosstermBackend::new(stdout))?;
        Ok(Self {
            terminal,
            mouse_enabled: enable_mouse,
            active: true,
        })
    }

    /// Viewport matching the current terminal size.
    pub fn viewport(&self) -> Result<Viewport> {
        let size = self.terminal.size()?;
        Ok(Viewport::new(size.width as usize, size.height as usize))
    }

    /// Leave the session. Calling it again does nothing.
    pub fn restore(&mut self) -> Result<()> {
        if !self.active {
            return Ok(());
        }
        self.active = false;
        terminal::disable_raw_mode()?;
        leave_screen(self.terminal.backend_mut(), self.mouse_enabled)?;
        self.terminal.show_cursor()?;
        Ok(())
    }

    pub fn terminal_mut(&mut self) -> &mut Terminal<CrosstermBackend<Stdout>> {
        &mut self.terminal
    }
}

impl Drop for Tui {
    fn drop(&mut self) {
        let _ = self.restore();
    }
}

fn enter_screen(out: &mut impl Write, mouse: bool) -> io::Result<()> {
    execute!(out, EnterAlternateScreen)?;
    if mouse {
        execute!(out, EnableMouseCapture)?;
    }
    Ok(())
}

fn leave_screen(out: &mut impl Write, mouse: bool) -> io::Result<()> {
    if mouse {
        execute!(out, DisableMouseCapture)?;
    }
    execute!(out, LeaveAlternateScreen)
}

/// Restore the terminal before the default hook prints the panic.
pub fn install_panic_hook() {
    let original_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |panic_info| {
        let _ = terminal::disable_raw_mode();
        let _ = leave_screen(&mut io::stdout(), true);
        original_hook(panic_info);
    }));
}
