/// Error types for the recorder apps
///
/// Display strings are shown to the user verbatim, so they are written
/// in the language of the UI.

use std::path::PathBuf;

use chrono::NaiveDate;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum RecorderError {
    /// I/O errors (file create, read, append)
    #[error("文件操作失败: {0}")]
    Io(#[from] std::io::Error),

    /// CSV encoding or decoding errors
    #[error("CSV 解析失败: {0}")]
    Csv(#[from] csv::Error),

    /// Preference store errors
    #[error("设置存储错误: {0}")]
    Settings(#[from] rusqlite::Error),

    #[error("任务内容为必填项，不能为空！")]
    EmptyTask,

    #[error("起始日期不能晚于结束日期！")]
    InvalidDateRange { start: NaiveDate, end: NaiveDate },

    #[error("无法识别的日期: {0}（应为 YYYY/M/D）")]
    InvalidDate(String),

    #[error("单词不能为空。")]
    EmptyWord,

    #[error("文件不存在。")]
    FileNotFound(PathBuf),

    #[error("文件格式错误：应包含 {expected} 列数据。")]
    ColumnCount { expected: usize, found: usize },

    #[error("未指定保存路径。")]
    NoSavePath,

    #[error("未知的设置项: {0}")]
    UnknownSetting(String),

    #[error("设置项 {key} 不接受值 '{value}'")]
    InvalidSetting { key: String, value: String },
}

pub type Result<T> = std::result::Result<T, RecorderError>;

impl RecorderError {
    /// Title of the message box this error is reported under.
    pub fn title(&self) -> &'static str {
        match self {
            RecorderError::EmptyTask | RecorderError::EmptyWord => "输入错误",
            RecorderError::InvalidDateRange { .. } | RecorderError::InvalidDate(_) => "日期错误",
            RecorderError::FileNotFound(_) => "文件错误",
            RecorderError::ColumnCount { .. } | RecorderError::Csv(_) => "格式错误",
            RecorderError::NoSavePath => "保存失败",
            RecorderError::Io(_) => "读写错误",
            RecorderError::Settings(_)
            | RecorderError::UnknownSetting(_)
            | RecorderError::InvalidSetting { .. } => "设置错误",
        }
    }

    /// Validation failures are reported as warnings, everything else as errors.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            RecorderError::EmptyTask
                | RecorderError::EmptyWord
                | RecorderError::InvalidDateRange { .. }
                | RecorderError::InvalidDate(_)
        )
    }
}
