use std::time::Instant;

use chrono::{Days, Local, Months, NaiveDate};
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Paragraph, Row, Table, TableState, Tabs},
    Frame,
};

use crate::editor::TextInput;
use crate::error::RecorderError;
use crate::models::{LogEntry, LogForm, Modal, Theme, DATE_FORMAT};
use crate::ui::{self, Palette, StatusLine, TuiApp};
use crate::worklog::{WorkLogStore, LOG_HEADERS};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogPage {
    Form,
    Table,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormField {
    StartDate,
    EndDate,
    Task,
    Notes,
    Submit,
}

impl FormField {
    const ORDER: [FormField; 5] = [
        FormField::StartDate,
        FormField::EndDate,
        FormField::Task,
        FormField::Notes,
        FormField::Submit,
    ];

    fn next(self) -> Self {
        let i = Self::ORDER.iter().position(|f| *f == self).unwrap_or(0);
        Self::ORDER[(i + 1) % Self::ORDER.len()]
    }

    fn previous(self) -> Self {
        let i = Self::ORDER.iter().position(|f| *f == self).unwrap_or(0);
        Self::ORDER[(i + Self::ORDER.len() - 1) % Self::ORDER.len()]
    }
}

pub struct WorkLogApp {
    store: WorkLogStore,
    pub page: LogPage,
    pub focus: FormField,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub task: TextInput,
    pub notes: TextInput,
    pub entries: Vec<LogEntry>,
    pub table_state: TableState,
    pub popup: Option<Modal>,
    pub status: StatusLine,
    palette: Palette,
    should_quit: bool,
}

impl WorkLogApp {
    pub fn new(store: WorkLogStore) -> Self {
        let today = Local::now().date_naive();
        let mut app = WorkLogApp {
            store,
            page: LogPage::Form,
            focus: FormField::Task,
            start_date: today,
            end_date: today + Days::new(1),
            task: TextInput::multi_line(),
            notes: TextInput::multi_line(),
            entries: Vec::new(),
            table_state: TableState::default(),
            popup: None,
            status: StatusLine::default(),
            palette: Palette::for_theme(Theme::default()),
            should_quit: false,
        };

        if let Err(e) = app.store.ensure_file() {
            log::error!("cannot create {}: {}", app.store.path().display(), e);
            app.popup = Some(Modal::error(
                "文件错误",
                format!("无法创建CSV文件: {}\n{}", app.store.path().display(), e),
            ));
        }
        app.status.show("就绪");
        app
    }

    fn form(&self) -> LogForm {
        LogForm {
            start_date: self.start_date,
            end_date: self.end_date,
            task: self.task.text(),
            notes: self.notes.text(),
        }
    }

    pub fn submit(&mut self) {
        match self.store.submit(&self.form()) {
            Ok(entry) => {
                log::info!("submitted log entry for {}", entry.date_range);
                self.status.show("日志写入完成！");
                self.popup = Some(Modal::info("成功", "日志写入完成！"));
                self.task.clear();
                self.notes.clear();
                self.focus = FormField::Task;
            }
            Err(e) if e.is_validation() => {
                if matches!(e, RecorderError::EmptyTask) {
                    self.focus = FormField::Task;
                }
                self.popup = Some(Modal::from_error(&e));
            }
            Err(e) => {
                log::error!("failed to append to {}: {}", self.store.path().display(), e);
                self.popup = Some(Modal::error(
                    "写入错误",
                    format!("无法写入到CSV文件: {}\n{}", self.store.path().display(), e),
                ));
            }
        }
    }

    pub fn load_table(&mut self) {
        match self.store.load() {
            Ok(table) => {
                if table.header_mismatch {
                    self.popup = Some(Modal::warning(
                        "文件警告",
                        "CSV文件头与预期不符。可能无法正确显示。",
                    ));
                }
                if table.file_missing {
                    self.status.show(format!(
                        "日志文件 {} 不存在或为空。",
                        self.store.path().display()
                    ));
                } else {
                    self.status.show(format!("已加载 {} 条日志。", table.entries.len()));
                }
                self.entries = table.entries;
            }
            Err(e) => {
                log::error!("failed to read {}: {}", self.store.path().display(), e);
                self.popup = Some(Modal::error(
                    "读取错误",
                    format!("无法读取CSV文件: {}\n{}", self.store.path().display(), e),
                ));
                self.entries.clear();
            }
        }
        self.table_state.select(if self.entries.is_empty() { None } else { Some(0) });
    }

    pub fn toggle_view(&mut self) {
        match self.page {
            LogPage::Form => {
                self.load_table();
                self.page = LogPage::Table;
            }
            LogPage::Table => {
                self.page = LogPage::Form;
                self.status.show("切换到日志输入模式");
            }
        }
    }

    fn shift_date(&mut self, forward: bool, months: bool) {
        let date = match self.focus {
            FormField::StartDate => &mut self.start_date,
            FormField::EndDate => &mut self.end_date,
            _ => return,
        };
        let shifted = match (forward, months) {
            (true, false) => date.checked_add_days(Days::new(1)),
            (false, false) => date.checked_sub_days(Days::new(1)),
            (true, true) => date.checked_add_months(Months::new(1)),
            (false, true) => date.checked_sub_months(Months::new(1)),
        };
        if let Some(d) = shifted {
            *date = d;
        }
    }

    fn handle_form_key(&mut self, key: KeyEvent) {
        if key.code == KeyCode::Char('s') && key.modifiers.contains(KeyModifiers::CONTROL) {
            self.submit();
            return;
        }

        match key.code {
            KeyCode::Tab => self.focus = self.focus.next(),
            KeyCode::BackTab => self.focus = self.focus.previous(),
            _ => match self.focus {
                FormField::StartDate | FormField::EndDate => match key.code {
                    KeyCode::Up | KeyCode::Char('+') => self.shift_date(true, false),
                    KeyCode::Down | KeyCode::Char('-') => self.shift_date(false, false),
                    KeyCode::PageUp => self.shift_date(true, true),
                    KeyCode::PageDown => self.shift_date(false, true),
                    KeyCode::Char('t') => {
                        let today = Local::now().date_naive();
                        if self.focus == FormField::StartDate {
                            self.start_date = today;
                        } else {
                            self.end_date = today;
                        }
                    }
                    KeyCode::Enter => self.focus = self.focus.next(),
                    _ => {}
                },
                FormField::Task | FormField::Notes => {
                    let input = if self.focus == FormField::Task { &mut self.task } else { &mut self.notes };
                    edit_text(input, key);
                }
                FormField::Submit => {
                    if matches!(key.code, KeyCode::Enter | KeyCode::Char(' ')) {
                        self.submit();
                    }
                }
            },
        }
    }

    fn handle_table_key(&mut self, key: KeyEvent) {
        let len = self.entries.len();
        if len == 0 {
            return;
        }
        let current = self.table_state.selected().unwrap_or(0);
        let next = match key.code {
            KeyCode::Down => (current + 1).min(len - 1),
            KeyCode::Up => current.saturating_sub(1),
            KeyCode::PageDown => (current + 10).min(len - 1),
            KeyCode::PageUp => current.saturating_sub(10),
            KeyCode::Home => 0,
            KeyCode::End => len - 1,
            _ => return,
        };
        self.table_state.select(Some(next));
    }
}

pub(crate) fn edit_text(input: &mut TextInput, key: KeyEvent) {
    if key.modifiers.contains(KeyModifiers::CONTROL) {
        return;
    }
    match key.code {
        KeyCode::Char(c) => input.insert_char(c),
        KeyCode::Enter => input.insert_newline(),
        KeyCode::Backspace => input.backspace(),
        KeyCode::Delete => input.delete(),
        KeyCode::Left => input.move_left(),
        KeyCode::Right => input.move_right(),
        KeyCode::Up => input.move_up(),
        KeyCode::Down => input.move_down(),
        KeyCode::Home => input.move_home(),
        KeyCode::End => input.move_end(),
        _ => {}
    }
}

impl TuiApp for WorkLogApp {
    fn handle_key(&mut self, key: KeyEvent) {
        if self.popup.is_some() {
            if matches!(key.code, KeyCode::Enter | KeyCode::Esc) {
                self.popup = None;
            }
            return;
        }

        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
        match key.code {
            KeyCode::Char('q') | KeyCode::Char('c') if ctrl => self.should_quit = true,
            KeyCode::F(2) => self.toggle_view(),
            _ => match self.page {
                LogPage::Form => self.handle_form_key(key),
                LogPage::Table => match key.code {
                    KeyCode::Esc => self.toggle_view(),
                    _ => self.handle_table_key(key),
                },
            },
        }
    }

    fn on_tick(&mut self, now: Instant) {
        self.status.expire(now);
    }

    fn should_quit(&self) -> bool {
        self.should_quit
    }

    fn draw(&mut self, f: &mut Frame) {
        let palette = self.palette;
        f.render_widget(Block::default().style(palette.base()), f.area());

        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .margin(1)
            .constraints([Constraint::Length(3), Constraint::Min(0), Constraint::Length(1)])
            .split(f.area());

        let titles: Vec<Line> = ["日志输入", "日志数据"].iter().cloned().map(Line::from).collect();
        let selected = if self.page == LogPage::Form { 0 } else { 1 };
        let tabs = Tabs::new(titles)
            .block(Block::default().borders(Borders::ALL).title("日志记录器 (F2 切换视图, Ctrl+Q 退出)"))
            .select(selected)
            .style(Style::default().fg(palette.accent))
            .highlight_style(Style::default().add_modifier(Modifier::BOLD).bg(palette.highlight));
        f.render_widget(tabs, chunks[0]);

        match self.page {
            LogPage::Form => self.render_form(f, chunks[1]),
            LogPage::Table => self.render_table(f, chunks[1]),
        }

        f.render_widget(
            Paragraph::new(self.status.text().to_string()).style(Style::default().fg(palette.muted)),
            chunks[2],
        );

        if let Some(modal) = &self.popup {
            ui::render_modal(f, modal, &palette);
        }
    }
}

impl WorkLogApp {
    fn render_form(&mut self, f: &mut Frame, area: Rect) {
        let palette = self.palette;
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3),
                Constraint::Percentage(60),
                Constraint::Min(4),
                Constraint::Length(3),
            ])
            .split(area);

        let date_chunks = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Length(24), Constraint::Length(24), Constraint::Min(0)])
            .split(chunks[0]);

        for (i, (label, date, field)) in [
            ("起始日期*", self.start_date, FormField::StartDate),
            ("结束日期*", self.end_date, FormField::EndDate),
        ]
        .into_iter()
        .enumerate()
        {
            let focused = self.focus == field;
            let border = if focused { palette.accent } else { palette.muted };
            let text = if focused {
                format!("◀ {} ▶", date.format(DATE_FORMAT))
            } else {
                date.format(DATE_FORMAT).to_string()
            };
            f.render_widget(
                Paragraph::new(text)
                    .alignment(Alignment::Center)
                    .block(
                        Block::default()
                            .title(label)
                            .borders(Borders::ALL)
                            .border_style(Style::default().fg(border)),
                    ),
                date_chunks[i],
            );
        }
        f.render_widget(
            Paragraph::new(vec![Line::from(""), Line::from(" ↑/↓ 日  PgUp/PgDn 月  t 今天")])
                .style(Style::default().fg(palette.muted)),
            date_chunks[2],
        );

        let task_focused = self.focus == FormField::Task;
        ui::render_input(f, chunks[1], "任务* (必填)", &mut self.task, task_focused, &palette);
        let notes_focused = self.focus == FormField::Notes;
        ui::render_input(f, chunks[2], "备注 (可选)", &mut self.notes, notes_focused, &palette);

        let button_area = ui::centered_rect(30, 100, chunks[3]);
        let button_style = if self.focus == FormField::Submit {
            Style::default().fg(palette.bg).bg(palette.accent).add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(palette.accent)
        };
        f.render_widget(
            Paragraph::new(Line::from(Span::styled("提交日志 (Ctrl+S)", button_style)))
                .alignment(Alignment::Center)
                .block(Block::default().borders(Borders::ALL)),
            button_area,
        );
    }

    fn render_table(&mut self, f: &mut Frame, area: Rect) {
        let palette = self.palette;
        let header = Row::new(LOG_HEADERS.iter().map(|h| Cell::from(*h)))
            .style(Style::default().add_modifier(Modifier::BOLD).fg(palette.accent));

        let rows = self.entries.iter().enumerate().map(|(i, e)| {
            let height = e.task.lines().count().max(e.notes.lines().count()).max(1) as u16;
            let style = if i % 2 == 1 { Style::default().fg(palette.muted) } else { Style::default() };
            Row::new(vec![
                Cell::from(e.date_range.clone()),
                Cell::from(e.task.clone()),
                Cell::from(e.notes.clone()),
            ])
            .height(height)
            .style(style)
        });

        let table = Table::new(
            rows,
            [Constraint::Length(24), Constraint::Percentage(50), Constraint::Min(10)],
        )
        .header(header)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(format!("日志数据 ({} 条) - ↑/↓ 浏览, Esc 返回", self.entries.len())),
        )
        .highlight_style(Style::default().bg(palette.highlight));

        f.render_stateful_widget(table, area, &mut self.table_state);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ratatui::{backend::TestBackend, Terminal};
    use std::fs;
    use tempfile::tempdir;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn ctrl(c: char) -> KeyEvent {
        KeyEvent::new(KeyCode::Char(c), KeyModifiers::CONTROL)
    }

    fn type_str(app: &mut WorkLogApp, s: &str) {
        for c in s.chars() {
            app.handle_key(key(KeyCode::Char(c)));
        }
    }

    fn app_in(dir: &tempfile::TempDir) -> WorkLogApp {
        let mut app = WorkLogApp::new(WorkLogStore::new(dir.path().join("blogs.csv")));
        app.start_date = NaiveDate::from_ymd_opt(2025, 6, 2).unwrap();
        app.end_date = NaiveDate::from_ymd_opt(2025, 6, 3).unwrap();
        app
    }

    #[test]
    fn test_startup_creates_file() {
        let dir = tempdir().unwrap();
        let app = app_in(&dir);
        assert!(app.popup.is_none());
        assert_eq!(app.status.text(), "就绪");
        assert!(dir.path().join("blogs.csv").exists());
    }

    #[test]
    fn test_submit_via_keys_and_review() {
        let dir = tempdir().unwrap();
        let mut app = app_in(&dir);

        type_str(&mut app, "写日报");
        app.handle_key(key(KeyCode::Tab));
        type_str(&mut app, "顺利");
        app.handle_key(ctrl('s'));

        assert_eq!(app.popup.as_ref().map(|m| m.title.as_str()), Some("成功"));
        assert_eq!(app.task.text(), "");
        assert_eq!(app.notes.text(), "");
        assert_eq!(app.focus, FormField::Task);

        app.handle_key(key(KeyCode::Esc));
        app.handle_key(key(KeyCode::F(2)));
        assert_eq!(app.page, LogPage::Table);
        assert_eq!(app.entries.len(), 1);
        assert_eq!(app.entries[0].date_range, "2025/6/2至2025/6/3");
        assert_eq!(app.entries[0].task, "写日报");
        assert_eq!(app.entries[0].notes, "顺利");
        assert_eq!(app.status.text(), "已加载 1 条日志。");
    }

    #[test]
    fn test_empty_task_warns_and_refocuses() {
        let dir = tempdir().unwrap();
        let mut app = app_in(&dir);
        let before = fs::read(dir.path().join("blogs.csv")).unwrap();

        app.focus = FormField::Submit;
        app.handle_key(key(KeyCode::Enter));

        let modal = app.popup.clone().unwrap();
        assert_eq!(modal.title, "输入错误");
        assert_eq!(app.focus, FormField::Task);
        assert_eq!(fs::read(dir.path().join("blogs.csv")).unwrap(), before);
    }

    #[test]
    fn test_reversed_dates_are_rejected() {
        let dir = tempdir().unwrap();
        let mut app = app_in(&dir);
        type_str(&mut app, "task");

        app.focus = FormField::StartDate;
        app.handle_key(key(KeyCode::Up));
        app.handle_key(key(KeyCode::Up));
        assert_eq!(app.start_date, NaiveDate::from_ymd_opt(2025, 6, 4).unwrap());

        app.handle_key(ctrl('s'));
        assert_eq!(app.popup.as_ref().unwrap().title, "日期错误");
        assert_eq!(app.task.text(), "task");
    }

    #[test]
    fn test_month_shift_and_focus_cycle() {
        let dir = tempdir().unwrap();
        let mut app = app_in(&dir);
        app.focus = FormField::EndDate;
        app.handle_key(key(KeyCode::PageUp));
        assert_eq!(app.end_date, NaiveDate::from_ymd_opt(2025, 7, 3).unwrap());

        app.handle_key(key(KeyCode::Tab));
        assert_eq!(app.focus, FormField::Task);
        app.handle_key(key(KeyCode::BackTab));
        app.handle_key(key(KeyCode::BackTab));
        assert_eq!(app.focus, FormField::StartDate);
        app.handle_key(key(KeyCode::BackTab));
        assert_eq!(app.focus, FormField::Submit);
    }

    #[test]
    fn test_header_mismatch_warns() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("blogs.csv"), "a,b,c\r\nx,y,z\r\n").unwrap();
        let mut app = app_in(&dir);
        app.toggle_view();
        assert_eq!(app.popup.as_ref().unwrap().title, "文件警告");
        assert_eq!(app.entries.len(), 1);
    }

    #[test]
    fn test_quit_and_render() {
        let dir = tempdir().unwrap();
        let mut app = app_in(&dir);
        type_str(&mut app, "渲染");

        let mut terminal = Terminal::new(TestBackend::new(80, 30)).unwrap();
        terminal.draw(|f| app.draw(f)).unwrap();
        app.toggle_view();
        terminal.draw(|f| app.draw(f)).unwrap();

        app.handle_key(ctrl('q'));
        assert!(app.should_quit());
    }
}
