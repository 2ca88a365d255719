use std::io;
use std::time::{Duration, Instant};

use anyhow::Result;
use crossterm::{
    event::{self, Event, KeyEvent, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::{Backend, CrosstermBackend},
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
    Frame, Terminal,
};

use crate::editor::TextInput;
use crate::models::{FontSize, MessageKind, Modal, Theme};

const TICK_RATE: Duration = Duration::from_millis(250);
pub const STATUS_TTL: Duration = Duration::from_secs(3);

/// A full-screen app driven by the shared event loop.
pub trait TuiApp {
    fn draw(&mut self, f: &mut Frame);
    fn handle_key(&mut self, key: KeyEvent);
    fn on_tick(&mut self, now: Instant);
    fn should_quit(&self) -> bool;
}

pub fn run<A: TuiApp>(app: &mut A) -> Result<()> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let res = run_app(&mut terminal, app);

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    res?;
    Ok(())
}

fn run_app<B: Backend, A: TuiApp>(terminal: &mut Terminal<B>, app: &mut A) -> io::Result<()> {
    loop {
        terminal.draw(|f| app.draw(f))?;

        // wake up periodically so timers and status expiry run without input
        if event::poll(TICK_RATE)? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    app.handle_key(key);
                }
            }
        }
        app.on_tick(Instant::now());

        if app.should_quit() {
            break;
        }
    }
    Ok(())
}

#[derive(Debug, Clone, Copy)]
pub struct Palette {
    pub fg: Color,
    pub bg: Color,
    pub accent: Color,
    pub muted: Color,
    pub highlight: Color,
    pub popup_bg: Color,
}

impl Palette {
    pub fn for_theme(theme: Theme) -> Self {
        match theme {
            Theme::Light => Palette {
                fg: Color::Black,
                bg: Color::White,
                accent: Color::Blue,
                muted: Color::DarkGray,
                highlight: Color::LightBlue,
                popup_bg: Color::Gray,
            },
            Theme::Dark => Palette {
                fg: Color::White,
                bg: Color::Black,
                accent: Color::Cyan,
                muted: Color::Gray,
                highlight: Color::DarkGray,
                popup_bg: Color::DarkGray,
            },
        }
    }

    pub fn base(&self) -> Style {
        Style::default().fg(self.fg).bg(self.bg)
    }
}

/// Terminal stand-in for font size: larger tiers get more breathing room.
#[derive(Debug, Clone, Copy)]
pub struct Density {
    pub margin: u16,
    pub text: Modifier,
}

impl Density {
    pub fn for_font_size(size: FontSize) -> Self {
        match size {
            FontSize::Small => Density { margin: 0, text: Modifier::empty() },
            FontSize::Medium => Density { margin: 1, text: Modifier::empty() },
            FontSize::Large => Density { margin: 2, text: Modifier::BOLD },
        }
    }
}

/// Transient status bar text.
#[derive(Debug, Default)]
pub struct StatusLine {
    message: Option<(String, Instant)>,
}

impl StatusLine {
    pub fn show(&mut self, text: impl Into<String>) {
        self.message = Some((text.into(), Instant::now() + STATUS_TTL));
    }

    pub fn expire(&mut self, now: Instant) {
        if matches!(&self.message, Some((_, until)) if now >= *until) {
            self.message = None;
        }
    }

    pub fn text(&self) -> &str {
        self.message.as_ref().map(|(m, _)| m.as_str()).unwrap_or("")
    }
}

// Helper function to create centered rectangles for popups
pub fn centered_rect(percent_x: u16, percent_y: u16, r: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(r);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}

pub fn render_modal(f: &mut Frame, modal: &Modal, palette: &Palette) {
    let area = centered_rect(60, 30, f.area());
    let title_color = match modal.kind {
        MessageKind::Info => palette.accent,
        MessageKind::Warning => Color::Yellow,
        MessageKind::Error => Color::Red,
    };

    let mut lines: Vec<Line> = modal.body.lines().map(Line::from).collect();
    lines.push(Line::from(""));
    lines.push(Line::from(Span::styled("Enter / Esc 关闭", Style::default().fg(palette.muted))));

    let block = Block::default()
        .title(Span::styled(
            modal.title.clone(),
            Style::default().fg(title_color).add_modifier(Modifier::BOLD),
        ))
        .borders(Borders::ALL)
        .style(Style::default().bg(palette.popup_bg).fg(palette.fg));

    f.render_widget(Clear, area);
    f.render_widget(
        Paragraph::new(lines)
            .block(block)
            .alignment(Alignment::Center)
            .wrap(Wrap { trim: false }),
        area,
    );
}

/// Draws an input box and, when focused, places the terminal cursor in it.
pub fn render_input(
    f: &mut Frame,
    area: Rect,
    title: &str,
    input: &mut TextInput,
    focused: bool,
    palette: &Palette,
) {
    let border = if focused { palette.accent } else { palette.muted };
    let block = Block::default()
        .title(title.to_string())
        .borders(Borders::ALL)
        .border_style(Style::default().fg(border));
    let inner = block.inner(area);

    input.adjust_scroll(inner.height as usize);
    let lines: Vec<Line> = input
        .content
        .iter()
        .skip(input.scroll_offset)
        .take(inner.height as usize)
        .map(|l| Line::from(l.as_str()))
        .collect();

    f.render_widget(Paragraph::new(lines).block(block).style(palette.base()), area);

    if focused && inner.height > 0 {
        let x = inner.x + Span::raw(input.before_cursor()).width() as u16;
        let y = inner.y + (input.cursor_row - input.scroll_offset) as u16;
        f.set_cursor_position((x.min(inner.right().saturating_sub(1)), y));
    }
}
