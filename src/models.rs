use chrono::NaiveDate;
use serde::Serialize;

use crate::error::{RecorderError, Result};

pub const DATE_FORMAT: &str = "%Y/%-m/%-d";
pub const DATE_RANGE_SEPARATOR: &str = "至";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LogEntry {
    #[serde(rename = "期日")]
    pub date_range: String,
    #[serde(rename = "任务")]
    pub task: String,
    #[serde(rename = "备注")]
    pub notes: String,
}

impl LogEntry {
    /// Builds an entry from a CSV record, padding missing trailing fields.
    pub fn from_fields<'a, I>(fields: I) -> Self
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut fields = fields.into_iter();
        let mut next = || fields.next().unwrap_or_default().to_string();
        LogEntry {
            date_range: next(),
            task: next(),
            notes: next(),
        }
    }
}

/// Raw form input before validation.
#[derive(Debug, Clone)]
pub struct LogForm {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub task: String,
    pub notes: String,
}

impl LogForm {
    pub fn validate(&self) -> Result<LogEntry> {
        let task = self.task.trim();
        if task.is_empty() {
            return Err(RecorderError::EmptyTask);
        }
        if self.start_date > self.end_date {
            return Err(RecorderError::InvalidDateRange {
                start: self.start_date,
                end: self.end_date,
            });
        }

        Ok(LogEntry {
            date_range: format_date_range(self.start_date, self.end_date),
            task: task.to_string(),
            notes: self.notes.trim().to_string(),
        })
    }
}

pub fn format_date_range(start: NaiveDate, end: NaiveDate) -> String {
    format!(
        "{}{}{}",
        start.format(DATE_FORMAT),
        DATE_RANGE_SEPARATOR,
        end.format(DATE_FORMAT)
    )
}

/// Accepts `2025/6/2`, `2025/06/02` and `2025-06-02`.
pub fn parse_date(input: &str) -> Result<NaiveDate> {
    let input = input.trim();
    ["%Y/%m/%d", "%Y-%m-%d"]
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(input, fmt).ok())
        .ok_or_else(|| RecorderError::InvalidDate(input.to_string()))
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WordEntry {
    #[serde(rename = "单词")]
    pub word: String,
    #[serde(rename = "释义")]
    pub definition: String,
}

impl WordEntry {
    pub fn new(word: impl Into<String>, definition: impl Into<String>) -> Self {
        WordEntry {
            word: word.into(),
            definition: definition.into(),
        }
    }

    /// Single-cell rendering used by the preview table.
    pub fn display(&self) -> String {
        format!("{}：{}", self.word, self.definition)
    }
}

#[derive(Debug, Clone)]
pub struct ConfigItem {
    pub key_name: String,
    pub value: String,
    pub updated_at: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

impl Theme {
    pub fn as_str(&self) -> &'static str {
        match self {
            Theme::Light => "light",
            Theme::Dark => "dark",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "light" => Some(Theme::Light),
            "dark" => Some(Theme::Dark),
            _ => None,
        }
    }

    pub fn toggled(&self) -> Self {
        match self {
            Theme::Light => Theme::Dark,
            Theme::Dark => Theme::Light,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FontSize {
    Small,
    #[default]
    Medium,
    Large,
}

impl FontSize {
    pub fn as_str(&self) -> &'static str {
        match self {
            FontSize::Small => "small",
            FontSize::Medium => "medium",
            FontSize::Large => "large",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "small" => Some(FontSize::Small),
            "medium" => Some(FontSize::Medium),
            "large" => Some(FontSize::Large),
            _ => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            FontSize::Small => "小",
            FontSize::Medium => "中",
            FontSize::Large => "大",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageKind {
    Info,
    Warning,
    Error,
}

/// A blocking message box, dismissed with Enter or Esc.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Modal {
    pub kind: MessageKind,
    pub title: String,
    pub body: String,
}

impl Modal {
    pub fn info(title: impl Into<String>, body: impl Into<String>) -> Self {
        Modal { kind: MessageKind::Info, title: title.into(), body: body.into() }
    }

    pub fn warning(title: impl Into<String>, body: impl Into<String>) -> Self {
        Modal { kind: MessageKind::Warning, title: title.into(), body: body.into() }
    }

    pub fn error(title: impl Into<String>, body: impl Into<String>) -> Self {
        Modal { kind: MessageKind::Error, title: title.into(), body: body.into() }
    }

    pub fn from_error(err: &RecorderError) -> Self {
        let kind = if err.is_validation() { MessageKind::Warning } else { MessageKind::Error };
        Modal { kind, title: err.title().to_string(), body: err.to_string() }
    }
}
