use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use rand::rngs::StdRng;
use rand::SeedableRng;
use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Clear, Paragraph, Row, Table, TableState, Tabs, Wrap},
    Frame,
};

use crate::editor::TextInput;
use crate::models::{FontSize, Modal, Theme, WordEntry};
use crate::settings::SettingsStore;
use crate::ui::{self, Density, Palette, StatusLine, TuiApp};
use crate::wordlist::WordList;
use crate::worklog_app::edit_text;

pub const RANDOM_WORD_INTERVAL: Duration = Duration::from_secs(60);
const DEFAULT_NEW_FILE: &str = "untitled.csv";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WordsTab {
    Add,
    Preview,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WordField {
    Word,
    Definition,
}

/// Actions that discard the in-memory list and so go through the dirty check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PendingAction {
    New,
    Open,
    Quit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathPurpose {
    New,
    Open,
    SaveAs { then: Option<PendingAction> },
}

#[derive(Debug)]
pub enum WordsPopup {
    Message(Modal),
    PathPrompt { purpose: PathPurpose, input: TextInput },
    ConfirmDirty { pending: PendingAction, error: Option<String> },
}

/// Fires the random-word refresh at a fixed interval while running.
#[derive(Debug)]
pub struct RandomWordTimer {
    interval: Duration,
    next_due: Option<Instant>,
}

impl RandomWordTimer {
    pub fn new(interval: Duration) -> Self {
        RandomWordTimer { interval, next_due: None }
    }

    pub fn start(&mut self, now: Instant) {
        self.next_due = Some(now + self.interval);
    }

    pub fn stop(&mut self) {
        self.next_due = None;
    }

    pub fn is_running(&self) -> bool {
        self.next_due.is_some()
    }

    /// Returns true and re-arms when the interval has elapsed.
    pub fn poll(&mut self, now: Instant) -> bool {
        match self.next_due {
            Some(due) if now >= due => {
                self.next_due = Some(now + self.interval);
                true
            }
            _ => false,
        }
    }
}

pub struct WordsApp {
    pub list: WordList,
    settings: SettingsStore,
    rng: StdRng,
    pub tab: WordsTab,
    pub focus: WordField,
    pub word_input: TextInput,
    pub definition_input: TextInput,
    pub shown_word: Option<WordEntry>,
    pub timer: RandomWordTimer,
    pub popup: Option<WordsPopup>,
    pub preview_state: TableState,
    pub theme: Theme,
    pub font_size: FontSize,
    pub status: StatusLine,
    should_quit: bool,
}

impl WordsApp {
    /// Applies stored preferences, then opens `initial` or the last opened file.
    pub fn new(settings: SettingsStore, initial: Option<PathBuf>) -> Self {
        let theme = settings.theme();
        let font_size = settings.font_size();

        let mut app = WordsApp {
            list: WordList::new(),
            settings,
            rng: StdRng::from_entropy(),
            tab: WordsTab::Add,
            focus: WordField::Word,
            word_input: TextInput::single_line(),
            definition_input: TextInput::single_line(),
            shown_word: None,
            timer: RandomWordTimer::new(RANDOM_WORD_INTERVAL),
            popup: None,
            preview_state: TableState::default(),
            theme,
            font_size,
            status: StatusLine::default(),
            should_quit: false,
        };

        match initial {
            Some(path) => app.open_path(&path),
            None => app.auto_load_last_file(),
        }
        app
    }

    fn auto_load_last_file(&mut self) {
        let Some(last) = self.settings.last_opened_file() else {
            return;
        };
        if !last.exists() {
            log::info!("last opened file {} no longer exists", last.display());
            return;
        }

        match self.list.load(&last) {
            Ok(_) => {
                log::info!("auto-loaded {}", last.display());
                self.restart_random_word();
            }
            Err(e) => {
                log::warn!("auto-load of {} failed: {}", last.display(), e);
                self.popup = Some(WordsPopup::Message(Modal::warning(
                    "自动加载失败",
                    format!(
                        "无法自动加载上次的词表 '{}':\n{}\n\n将清空此记录。",
                        display_name(&last),
                        e
                    ),
                )));
                self.forget_last_opened();
            }
        }
    }

    fn remember_last_opened(&mut self) {
        let path = self.list.path().map(Path::to_path_buf);
        if let Err(e) = self.settings.set_last_opened_file(path.as_deref()) {
            log::warn!("failed to remember last opened file: {}", e);
        }
    }

    fn forget_last_opened(&mut self) {
        if let Err(e) = self.settings.set_last_opened_file(None) {
            log::warn!("failed to clear last opened file: {}", e);
        }
    }

    fn message(&mut self, modal: Modal) {
        self.popup = Some(WordsPopup::Message(modal));
    }

    // --- random word -------------------------------------------------------

    pub fn show_random_word(&mut self) {
        self.shown_word = self.list.random_word(&mut self.rng).cloned();
    }

    /// Starts the timer and shows a word if the list has rows, else stops it.
    fn restart_random_word(&mut self) {
        if self.list.word_count() > 0 {
            self.timer.start(Instant::now());
            self.show_random_word();
        } else {
            self.timer.stop();
            self.shown_word = None;
        }
    }

    // --- word entry --------------------------------------------------------

    pub fn add_word(&mut self) {
        let word = self.word_input.text();
        let definition = self.definition_input.text();
        match self.list.add_word(&word, &definition) {
            Ok(()) => {
                self.word_input.clear();
                self.definition_input.clear();
                self.focus = WordField::Word;
                self.status.show(format!("已添加: {}", word.trim()));
                if self.list.word_count() == 1 {
                    self.restart_random_word();
                }
            }
            Err(_) => {
                self.message(Modal::warning("添加失败", "无法添加单词（单词不能为空）。"));
            }
        }
    }

    // --- file actions ------------------------------------------------------

    /// Runs `action`, asking to save first when there are unsaved changes.
    pub fn request(&mut self, action: PendingAction) {
        if self.list.is_dirty() {
            self.popup = Some(WordsPopup::ConfirmDirty { pending: action, error: None });
        } else {
            self.proceed(action);
        }
    }

    fn proceed(&mut self, action: PendingAction) {
        match action {
            PendingAction::New => {
                let default = self
                    .list
                    .path()
                    .map(|p| p.display().to_string())
                    .unwrap_or_else(|| DEFAULT_NEW_FILE.to_string());
                self.prompt_path(PathPurpose::New, &default);
            }
            PendingAction::Open => self.prompt_path(PathPurpose::Open, ""),
            PendingAction::Quit => self.should_quit = true,
        }
    }

    fn prompt_path(&mut self, purpose: PathPurpose, default: &str) {
        self.popup = Some(WordsPopup::PathPrompt {
            purpose,
            input: TextInput::single_line().with_text(default),
        });
    }

    /// Save chosen from the unsaved-changes prompt.
    fn save_then(&mut self, pending: PendingAction) {
        if self.list.path().is_none() {
            let default = DEFAULT_NEW_FILE.to_string();
            self.prompt_path(PathPurpose::SaveAs { then: Some(pending) }, &default);
            return;
        }
        match self.list.save(None) {
            Ok(message) => {
                self.status.show(message);
                self.remember_last_opened();
                self.popup = None;
                self.proceed(pending);
            }
            Err(e) => {
                log::error!("save before {:?} failed: {}", pending, e);
                self.popup = Some(WordsPopup::ConfirmDirty { pending, error: Some(e.to_string()) });
            }
        }
    }

    pub fn create_new_at(&mut self, path: PathBuf) {
        let path = with_csv_extension(path);

        self.list.create_new();
        self.list.set_path(path.clone());
        match self.list.save(None) {
            Ok(_) => {
                log::info!("created word list {}", path.display());
                self.word_input.clear();
                self.definition_input.clear();
                self.timer.stop();
                self.shown_word = None;
                self.message(Modal::info(
                    "创建成功",
                    format!("词表 '{}' 已创建并连接。", display_name(&path)),
                ));
                self.remember_last_opened();
            }
            Err(e) => {
                log::error!("failed to create {}: {}", path.display(), e);
                self.message(Modal::error("创建失败", format!("无法创建词表文件：{}", e)));
                self.list.create_new();
                self.timer.stop();
                self.shown_word = None;
            }
        }
    }

    pub fn open_path(&mut self, path: &Path) {
        match self.list.load(path) {
            Ok(message) => {
                self.message(Modal::info("打开成功", message));
                self.remember_last_opened();
                self.restart_random_word();
            }
            Err(e) => {
                log::warn!("failed to open {}: {}", path.display(), e);
                self.message(Modal::error("打开失败", e.to_string()));
            }
        }
        self.preview_state.select(None);
    }

    /// Returns whether the list ended up saved.
    pub fn save(&mut self) -> bool {
        if !self.list.is_dirty() && self.list.path().is_some() {
            return true;
        }
        if self.list.path().is_none() {
            let default = DEFAULT_NEW_FILE.to_string();
            self.prompt_path(PathPurpose::SaveAs { then: None }, &default);
            return false;
        }
        match self.list.save(None) {
            Ok(message) => {
                self.message(Modal::info("保存成功", message));
                self.remember_last_opened();
                true
            }
            Err(e) => {
                log::error!("save failed: {}", e);
                self.message(Modal::error("保存失败", e.to_string()));
                false
            }
        }
    }

    pub fn save_as_prompt(&mut self) {
        let default = self
            .list
            .path()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| DEFAULT_NEW_FILE.to_string());
        self.prompt_path(PathPurpose::SaveAs { then: None }, &default);
    }

    fn save_as(&mut self, path: PathBuf, then: Option<PendingAction>) {
        match self.list.save(Some(&path)) {
            Ok(message) => {
                self.remember_last_opened();
                match then {
                    Some(pending) => {
                        self.status.show(message);
                        self.popup = None;
                        self.proceed(pending);
                    }
                    None => self.message(Modal::info("保存成功", message)),
                }
            }
            Err(e) => {
                log::error!("save as {} failed: {}", path.display(), e);
                match then {
                    Some(pending) => {
                        self.popup = Some(WordsPopup::ConfirmDirty { pending, error: Some(e.to_string()) })
                    }
                    None => self.message(Modal::error("保存失败", e.to_string())),
                }
            }
        }
    }

    // --- preferences -------------------------------------------------------

    pub fn set_theme(&mut self, theme: Theme) {
        self.theme = theme;
        if let Err(e) = self.settings.set_theme(theme) {
            log::warn!("failed to store theme: {}", e);
        }
    }

    pub fn toggle_theme(&mut self) {
        self.set_theme(self.theme.toggled());
        self.status.show(format!("主题: {}", self.theme.as_str()));
    }

    pub fn set_font_size(&mut self, size: FontSize) {
        self.font_size = size;
        if let Err(e) = self.settings.set_font_size(size) {
            log::warn!("failed to store font size: {}", e);
        }
        self.status.show(format!("字体大小: {}", size.label()));
    }

    // --- key handling ------------------------------------------------------

    fn handle_popup_key(&mut self, key: KeyEvent) {
        let Some(popup) = self.popup.take() else {
            return;
        };

        match popup {
            WordsPopup::Message(modal) => {
                if !matches!(key.code, KeyCode::Enter | KeyCode::Esc) {
                    self.popup = Some(WordsPopup::Message(modal));
                }
            }
            WordsPopup::ConfirmDirty { pending, error } => match key.code {
                KeyCode::Char('s') | KeyCode::Char('y') | KeyCode::Enter => self.save_then(pending),
                KeyCode::Char('d') | KeyCode::Char('n') => self.proceed(pending),
                KeyCode::Char('c') | KeyCode::Esc => {}
                _ => self.popup = Some(WordsPopup::ConfirmDirty { pending, error }),
            },
            WordsPopup::PathPrompt { purpose, mut input } => match key.code {
                KeyCode::Esc => {
                    // a cancelled save-as inside the dirty prompt returns to it
                    if let PathPurpose::SaveAs { then: Some(pending) } = purpose {
                        self.popup = Some(WordsPopup::ConfirmDirty { pending, error: None });
                    }
                }
                KeyCode::Enter => {
                    if input.is_blank() {
                        self.popup = Some(WordsPopup::PathPrompt { purpose, input });
                        return;
                    }
                    let path = PathBuf::from(input.text().trim());
                    match purpose {
                        PathPurpose::New => self.create_new_at(path),
                        PathPurpose::Open => self.open_path(&path),
                        PathPurpose::SaveAs { then } => self.save_as(path, then),
                    }
                }
                _ => {
                    edit_text(&mut input, key);
                    self.popup = Some(WordsPopup::PathPrompt { purpose, input });
                }
            },
        }
    }

    fn handle_add_tab_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Tab | KeyCode::BackTab => {
                self.focus = match self.focus {
                    WordField::Word => WordField::Definition,
                    WordField::Definition => WordField::Word,
                }
            }
            KeyCode::Enter => self.add_word(),
            _ => {
                let input = match self.focus {
                    WordField::Word => &mut self.word_input,
                    WordField::Definition => &mut self.definition_input,
                };
                edit_text(input, key);
            }
        }
    }

    fn handle_preview_key(&mut self, key: KeyEvent) {
        let len = self.list.word_count();
        if len == 0 {
            return;
        }
        let current = self.preview_state.selected().unwrap_or(0);
        let next = match key.code {
            KeyCode::Down => (current + 1).min(len - 1),
            KeyCode::Up => current.saturating_sub(1),
            KeyCode::PageDown => (current + 10).min(len - 1),
            KeyCode::PageUp => current.saturating_sub(10),
            KeyCode::Home => 0,
            KeyCode::End => len - 1,
            _ => return,
        };
        self.preview_state.select(Some(next));
    }
}

impl TuiApp for WordsApp {
    fn handle_key(&mut self, key: KeyEvent) {
        if self.popup.is_some() {
            self.handle_popup_key(key);
            return;
        }

        if key.modifiers.contains(KeyModifiers::CONTROL) {
            match key.code {
                KeyCode::Char('n') => self.request(PendingAction::New),
                KeyCode::Char('o') => self.request(PendingAction::Open),
                KeyCode::Char('s') => {
                    self.save();
                }
                KeyCode::Char('a') => self.save_as_prompt(),
                KeyCode::Char('q') | KeyCode::Char('c') => self.request(PendingAction::Quit),
                KeyCode::Char('t') => self.toggle_theme(),
                _ => {}
            }
            return;
        }

        match key.code {
            KeyCode::F(1) => self.tab = WordsTab::Add,
            KeyCode::F(2) => self.tab = WordsTab::Preview,
            KeyCode::F(5) => self.show_random_word(),
            KeyCode::F(6) => self.set_font_size(FontSize::Small),
            KeyCode::F(7) => self.set_font_size(FontSize::Medium),
            KeyCode::F(8) => self.set_font_size(FontSize::Large),
            _ => match self.tab {
                WordsTab::Add => self.handle_add_tab_key(key),
                WordsTab::Preview => self.handle_preview_key(key),
            },
        }
    }

    fn on_tick(&mut self, now: Instant) {
        self.status.expire(now);
        if self.timer.poll(now) {
            if self.list.word_count() > 0 {
                self.show_random_word();
            } else {
                self.timer.stop();
                self.shown_word = None;
            }
        }
    }

    fn should_quit(&self) -> bool {
        self.should_quit
    }

    fn draw(&mut self, f: &mut Frame) {
        let palette = Palette::for_theme(self.theme);
        let density = Density::for_font_size(self.font_size);
        f.render_widget(Block::default().style(palette.base()), f.area());

        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .margin(density.margin)
            .constraints([
                Constraint::Length(1),
                Constraint::Length(3),
                Constraint::Min(0),
                Constraint::Length(1),
            ])
            .split(f.area());

        f.render_widget(
            Paragraph::new(self.list.status_text())
                .alignment(Alignment::Center)
                .style(Style::default().fg(palette.accent).add_modifier(Modifier::BOLD)),
            chunks[0],
        );

        let marker = if self.list.is_dirty() { "*" } else { "" };
        let titles: Vec<Line> = ["新增单词 (F1)", "词表预览 (F2)"].iter().cloned().map(Line::from).collect();
        let tabs = Tabs::new(titles)
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .title(format!("{}{} - 单词记录本", self.list.current_filename(), marker)),
            )
            .select(if self.tab == WordsTab::Add { 0 } else { 1 })
            .style(Style::default().fg(palette.fg))
            .highlight_style(Style::default().add_modifier(Modifier::BOLD).fg(palette.accent));
        f.render_widget(tabs, chunks[1]);

        match self.tab {
            WordsTab::Add => self.render_add_tab(f, chunks[2], &palette, &density),
            WordsTab::Preview => self.render_preview(f, chunks[2], &palette, &density),
        }

        let help = "Ctrl+N 新建  Ctrl+O 打开  Ctrl+S 保存  Ctrl+A 另存为  Ctrl+T 主题  F6/F7/F8 字体  Ctrl+Q 退出";
        let footer = if self.status.text().is_empty() { help } else { self.status.text() };
        f.render_widget(
            Paragraph::new(footer.to_string()).style(Style::default().fg(palette.muted)),
            chunks[3],
        );

        self.render_popup(f, &palette);
    }
}

impl WordsApp {
    fn render_add_tab(&mut self, f: &mut Frame, area: Rect, palette: &Palette, density: &Density) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(8), Constraint::Length(3), Constraint::Min(0)])
            .split(area);

        let top = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Ratio(1, 3), Constraint::Ratio(2, 3)])
            .split(chunks[0]);

        let count = Paragraph::new(vec![
            Line::from(""),
            Line::from(Span::styled(
                self.list.word_count().to_string(),
                Style::default().fg(palette.accent).add_modifier(Modifier::BOLD),
            )),
        ])
        .alignment(Alignment::Center)
        .block(Block::default().borders(Borders::ALL).title("当前单词数"));
        f.render_widget(count, top[0]);

        let text_style = Style::default().add_modifier(density.text);
        let random_lines = match &self.shown_word {
            Some(entry) => vec![
                Line::from(vec![
                    Span::styled("单词：", Style::default().add_modifier(Modifier::BOLD)),
                    Span::styled(entry.word.clone(), text_style),
                ]),
                Line::from(""),
                Line::from(Span::styled(entry.definition.clone(), text_style)),
            ],
            None => vec![
                Line::from(vec![
                    Span::styled("单词：", Style::default().add_modifier(Modifier::BOLD)),
                    Span::raw(" N/A"),
                ]),
                Line::from(""),
                Line::from("释义： 词表为空或无法获取。"),
            ],
        };
        let timer_hint = if self.timer.is_running() { "随机词条 (每分钟刷新, F5 换一个)" } else { "随机词条" };
        f.render_widget(
            Paragraph::new(random_lines)
                .wrap(Wrap { trim: false })
                .block(Block::default().borders(Borders::ALL).title(timer_hint)),
            top[1],
        );

        let inputs = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Ratio(1, 3), Constraint::Ratio(2, 3)])
            .split(chunks[1]);
        let word_focused = self.popup.is_none() && self.focus == WordField::Word;
        let def_focused = self.popup.is_none() && self.focus == WordField::Definition;
        ui::render_input(f, inputs[0], "单词", &mut self.word_input, word_focused, palette);
        ui::render_input(f, inputs[1], "释义", &mut self.definition_input, def_focused, palette);

        f.render_widget(
            Paragraph::new("Tab 切换输入框, Enter 添加到词表")
                .alignment(Alignment::Right)
                .style(Style::default().fg(palette.muted)),
            chunks[2],
        );
    }

    fn render_preview(&mut self, f: &mut Frame, area: Rect, palette: &Palette, density: &Density) {
        let rows = self.list.entries().iter().enumerate().map(|(i, entry)| {
            let style = if i % 2 == 1 { Style::default().fg(palette.muted) } else { Style::default() };
            Row::new(vec![Cell::from(entry.display())]).style(style.add_modifier(density.text))
        });

        let table = Table::new(rows, [Constraint::Percentage(100)])
            .header(
                Row::new(vec![Cell::from("词条")])
                    .style(Style::default().fg(palette.accent).add_modifier(Modifier::BOLD)),
            )
            .block(Block::default().borders(Borders::ALL).title("↑/↓ 浏览"))
            .highlight_style(Style::default().bg(palette.highlight));

        f.render_stateful_widget(table, area, &mut self.preview_state);
    }

    fn render_popup(&mut self, f: &mut Frame, palette: &Palette) {
        match &mut self.popup {
            None => {}
            Some(WordsPopup::Message(modal)) => ui::render_modal(f, modal, palette),
            Some(WordsPopup::ConfirmDirty { error, .. }) => {
                let area = ui::centered_rect(60, 30, f.area());
                let mut lines = vec![
                    Line::from(format!(
                        "词表 '{}' 有未保存的更改。是否保存？",
                        self.list.current_filename()
                    )),
                    Line::from(""),
                ];
                if let Some(err) = error {
                    lines.push(Line::from(Span::styled(
                        format!("保存失败: {}", err),
                        Style::default().fg(ratatui::style::Color::Red),
                    )));
                    lines.push(Line::from(""));
                }
                lines.push(Line::from("[S] 保存   [D] 不保存   [C/Esc] 取消"));

                f.render_widget(Clear, area);
                f.render_widget(
                    Paragraph::new(lines)
                        .alignment(Alignment::Center)
                        .wrap(Wrap { trim: false })
                        .block(
                            Block::default()
                                .title("未保存的更改")
                                .borders(Borders::ALL)
                                .style(Style::default().bg(palette.popup_bg).fg(palette.fg)),
                        ),
                    area,
                );
            }
            Some(WordsPopup::PathPrompt { purpose, input }) => {
                let title = match purpose {
                    PathPurpose::New => "创建并保存新单词表",
                    PathPurpose::Open => "打开单词表",
                    PathPurpose::SaveAs { .. } => "单词表另存为",
                };
                let area = ui::centered_rect(70, 25, f.area());
                f.render_widget(Clear, area);
                let block = Block::default()
                    .title(title)
                    .borders(Borders::ALL)
                    .style(Style::default().bg(palette.popup_bg).fg(palette.fg));
                let inner = block.inner(area);
                f.render_widget(block, area);

                let rows = Layout::default()
                    .direction(Direction::Vertical)
                    .constraints([Constraint::Length(3), Constraint::Min(0)])
                    .split(inner);
                ui::render_input(f, rows[0], "CSV 文件路径", input, true, palette);
                f.render_widget(
                    Paragraph::new("Enter 确认, Esc 取消").style(Style::default().fg(palette.muted)),
                    rows[1],
                );
            }
        }
    }
}

fn with_csv_extension(path: PathBuf) -> PathBuf {
    let is_csv = path
        .extension()
        .map(|ext| ext.eq_ignore_ascii_case("csv"))
        .unwrap_or(false);
    if is_csv {
        path
    } else {
        let mut name = path.into_os_string();
        name.push(".csv");
        PathBuf::from(name)
    }
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::MessageKind;
    use ratatui::{backend::TestBackend, Terminal};
    use std::fs;
    use tempfile::{tempdir, TempDir};

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn ctrl(c: char) -> KeyEvent {
        KeyEvent::new(KeyCode::Char(c), KeyModifiers::CONTROL)
    }

    fn type_str(app: &mut WordsApp, s: &str) {
        for c in s.chars() {
            app.handle_key(key(KeyCode::Char(c)));
        }
    }

    fn fresh_app() -> WordsApp {
        WordsApp::new(SettingsStore::open_in_memory().unwrap(), None)
    }

    fn add(app: &mut WordsApp, word: &str, definition: &str) {
        app.focus = WordField::Word;
        type_str(app, word);
        app.handle_key(key(KeyCode::Tab));
        type_str(app, definition);
        app.handle_key(key(KeyCode::Enter));
    }

    fn enter_path(app: &mut WordsApp, path: &Path) {
        match &mut app.popup {
            Some(WordsPopup::PathPrompt { input, .. }) => input.clear(),
            other => panic!("expected path prompt, got {:?}", other),
        }
        type_str(app, &path.display().to_string());
        app.handle_key(key(KeyCode::Enter));
    }

    fn message_title(app: &WordsApp) -> Option<&str> {
        match &app.popup {
            Some(WordsPopup::Message(m)) => Some(m.title.as_str()),
            _ => None,
        }
    }

    fn dismiss(app: &mut WordsApp) {
        app.handle_key(key(KeyCode::Enter));
    }

    fn words_file(dir: &TempDir, name: &str, content: &str) -> PathBuf {
        let path = dir.path().join(name);
        fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn test_timer_poll() {
        let start = Instant::now();
        let mut timer = RandomWordTimer::new(Duration::from_secs(60));
        assert!(!timer.poll(start + Duration::from_secs(120)));

        timer.start(start);
        assert!(!timer.poll(start + Duration::from_secs(59)));
        assert!(timer.poll(start + Duration::from_secs(60)));
        assert!(!timer.poll(start + Duration::from_secs(61)));
        assert!(timer.poll(start + Duration::from_secs(121)));

        timer.stop();
        assert!(!timer.is_running());
    }

    #[test]
    fn test_first_word_starts_timer() {
        let mut app = fresh_app();
        assert!(app.popup.is_none());
        assert!(!app.timer.is_running());

        add(&mut app, "apple", "苹果");
        assert!(app.list.is_dirty());
        assert!(app.timer.is_running());
        assert_eq!(app.shown_word, Some(WordEntry::new("apple", "苹果")));
        assert_eq!(app.word_input.text(), "");
        assert_eq!(app.focus, WordField::Word);
    }

    #[test]
    fn test_empty_word_warns() {
        let mut app = fresh_app();
        app.handle_key(key(KeyCode::Tab));
        type_str(&mut app, "orphan definition");
        app.handle_key(key(KeyCode::Enter));

        match &app.popup {
            Some(WordsPopup::Message(m)) => assert_eq!(m.kind, MessageKind::Warning),
            other => panic!("unexpected popup {:?}", other),
        }
        assert_eq!(app.list.word_count(), 0);
        assert!(!app.list.is_dirty());
    }

    #[test]
    fn test_tick_refreshes_random_word() {
        let mut app = fresh_app();
        add(&mut app, "one", "1");
        add(&mut app, "two", "2");
        app.shown_word = None;

        app.on_tick(Instant::now() + RANDOM_WORD_INTERVAL + Duration::from_secs(1));
        let shown = app.shown_word.clone().unwrap();
        assert!(app.list.entries().contains(&shown));
    }

    #[test]
    fn test_open_remembers_file() {
        let dir = tempdir().unwrap();
        let path = words_file(&dir, "words.csv", "单词,释义\napple,苹果\n");

        let mut app = fresh_app();
        app.handle_key(ctrl('o'));
        enter_path(&mut app, &path);

        assert_eq!(message_title(&app), Some("打开成功"));
        assert_eq!(app.list.word_count(), 1);
        assert!(app.timer.is_running());
        assert_eq!(app.settings.last_opened_file(), Some(path.clone()));
    }

    #[test]
    fn test_open_failure_keeps_state() {
        let dir = tempdir().unwrap();
        let bad = words_file(&dir, "bad.csv", "a,b,c\n");

        let mut app = fresh_app();
        add(&mut app, "keep", "");
        app.open_path(&bad);
        assert_eq!(message_title(&app), Some("打开失败"));
        assert_eq!(app.list.word_count(), 1);
        assert!(app.list.is_dirty());
    }

    #[test]
    fn test_auto_load_last_file() {
        let dir = tempdir().unwrap();
        let path = words_file(&dir, "last.csv", "单词,释义\nbook,书\n");

        let settings = SettingsStore::open_in_memory().unwrap();
        settings.set_last_opened_file(Some(&path)).unwrap();
        settings.set_theme(Theme::Dark).unwrap();

        let app = WordsApp::new(settings, None);
        assert!(app.popup.is_none());
        assert_eq!(app.theme, Theme::Dark);
        assert_eq!(app.list.word_count(), 1);
        assert!(app.timer.is_running());
    }

    #[test]
    fn test_auto_load_failure_clears_record() {
        let dir = tempdir().unwrap();
        let path = words_file(&dir, "broken.csv", "a,b,c\n");

        let settings = SettingsStore::open_in_memory().unwrap();
        settings.set_last_opened_file(Some(&path)).unwrap();

        let app = WordsApp::new(settings, None);
        assert_eq!(message_title(&app), Some("自动加载失败"));
        assert_eq!(app.settings.last_opened_file(), None);
        assert_eq!(app.list.status_text(), "当前无列表打开");
    }

    #[test]
    fn test_new_list_appends_extension_and_writes_header() {
        let dir = tempdir().unwrap();
        let mut app = fresh_app();

        app.handle_key(ctrl('n'));
        enter_path(&mut app, &dir.path().join("vocab"));

        let created = dir.path().join("vocab.csv");
        assert_eq!(message_title(&app), Some("创建成功"));
        assert_eq!(fs::read_to_string(&created).unwrap(), "单词,释义\n");
        assert_eq!(app.list.path(), Some(created.as_path()));
        assert!(!app.list.is_dirty());
        assert_eq!(app.settings.last_opened_file(), Some(created));
    }

    #[test]
    fn test_new_list_failure_resets_to_unnamed() {
        let dir = tempdir().unwrap();
        let mut app = fresh_app();
        app.create_new_at(dir.path().join("missing_dir").join("x.csv"));

        assert_eq!(message_title(&app), Some("创建失败"));
        assert!(app.list.path().is_none());
        assert_eq!(app.list.status_text(), "当前无列表打开");
    }

    #[test]
    fn test_dirty_prompt_cancel_and_discard() {
        let mut app = fresh_app();
        add(&mut app, "pending", "");

        app.handle_key(ctrl('q'));
        assert!(matches!(
            app.popup,
            Some(WordsPopup::ConfirmDirty { pending: PendingAction::Quit, .. })
        ));
        app.handle_key(key(KeyCode::Char('c')));
        assert!(app.popup.is_none());
        assert!(!app.should_quit());

        app.handle_key(ctrl('q'));
        app.handle_key(key(KeyCode::Char('d')));
        assert!(app.should_quit());
    }

    #[test]
    fn test_dirty_prompt_save_unnamed_then_open() {
        let dir = tempdir().unwrap();
        let other = words_file(&dir, "other.csv", "x,y\n");
        let saved = dir.path().join("saved.csv");

        let mut app = fresh_app();
        add(&mut app, "draft", "草稿");

        app.handle_key(ctrl('o'));
        app.handle_key(key(KeyCode::Char('s')));
        // unnamed list: save goes through save-as first
        enter_path(&mut app, &saved);
        // then the open prompt follows
        enter_path(&mut app, &other);

        assert_eq!(fs::read_to_string(&saved).unwrap(), "单词,释义\ndraft,草稿\n");
        assert_eq!(app.list.path(), Some(other.as_path()));
        assert!(app.list.is_dirty());
        assert_eq!(app.list.entries(), &[WordEntry::new("x", "y")]);
    }

    #[test]
    fn test_dirty_prompt_save_failure_allows_discard() {
        let dir = tempdir().unwrap();
        let mut app = fresh_app();
        add(&mut app, "w", "");
        app.list.set_path(dir.path().join("no_such_dir").join("w.csv"));

        app.handle_key(ctrl('q'));
        app.handle_key(key(KeyCode::Char('s')));
        match &app.popup {
            Some(WordsPopup::ConfirmDirty { error: Some(_), pending: PendingAction::Quit }) => {}
            other => panic!("expected prompt with error, got {:?}", other),
        }
        assert!(!app.should_quit());

        app.handle_key(key(KeyCode::Char('d')));
        assert!(app.should_quit());
    }

    #[test]
    fn test_save_clears_dirty_and_reopens_identically() {
        let dir = tempdir().unwrap();
        let path = words_file(&dir, "words.csv", "alpha,一\n");

        let mut app = fresh_app();
        app.open_path(&path);
        dismiss(&mut app);
        assert!(app.list.is_dirty());

        add(&mut app, "beta", "二");
        app.handle_key(ctrl('s'));
        assert_eq!(message_title(&app), Some("保存成功"));
        assert!(!app.list.is_dirty());

        let mut reopened = WordList::new();
        reopened.load(&path).unwrap();
        assert_eq!(reopened.entries(), app.list.entries());
    }

    #[test]
    fn test_clean_save_is_noop() {
        let dir = tempdir().unwrap();
        let path = words_file(&dir, "words.csv", "单词,释义\na,b\n");
        let mut app = fresh_app();
        app.open_path(&path);
        dismiss(&mut app);

        assert!(app.save());
        assert!(app.popup.is_none());
    }

    #[test]
    fn test_preferences_persist() {
        let mut app = fresh_app();
        app.handle_key(ctrl('t'));
        app.handle_key(key(KeyCode::F(8)));
        assert_eq!(app.settings.theme(), Theme::Dark);
        assert_eq!(app.settings.font_size(), FontSize::Large);
    }

    #[test]
    fn test_with_csv_extension() {
        assert_eq!(with_csv_extension(PathBuf::from("a")), PathBuf::from("a.csv"));
        assert_eq!(with_csv_extension(PathBuf::from("a.CSV")), PathBuf::from("a.CSV"));
        assert_eq!(with_csv_extension(PathBuf::from("a.txt")), PathBuf::from("a.txt.csv"));
    }

    #[test]
    fn test_render_all_states() {
        let mut app = fresh_app();
        add(&mut app, "render", "渲染");
        let mut terminal = Terminal::new(TestBackend::new(100, 30)).unwrap();
        terminal.draw(|f| app.draw(f)).unwrap();

        app.handle_key(key(KeyCode::F(2)));
        app.handle_key(key(KeyCode::Down));
        terminal.draw(|f| app.draw(f)).unwrap();

        app.handle_key(ctrl('n'));
        terminal.draw(|f| app.draw(f)).unwrap();
        app.handle_key(key(KeyCode::Esc));
        app.handle_key(key(KeyCode::Char('s')));
        terminal.draw(|f| app.draw(f)).unwrap();
    }
}
