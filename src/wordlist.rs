use std::fs;
use std::path::{Path, PathBuf};

use rand::seq::SliceRandom;
use rand::Rng;

use crate::error::{RecorderError, Result};
use crate::models::WordEntry;

pub const WORD_HEADERS: [&str; 2] = ["单词", "释义"];
pub const UNNAMED: &str = "未命名";

/// In-memory word table backed by a CSV file, with dirty tracking.
#[derive(Debug, Default)]
pub struct WordList {
    entries: Vec<WordEntry>,
    path: Option<PathBuf>,
    dirty: bool,
}

impl WordList {
    pub fn new() -> Self {
        WordList::default()
    }

    /// Resets to an unnamed, empty and clean list.
    pub fn create_new(&mut self) {
        self.entries.clear();
        self.path = None;
        self.dirty = false;
    }

    /// Loads a word list. On error the current state is left untouched.
    /// Returns the message to show the user.
    pub fn load(&mut self, path: &Path) -> Result<String> {
        if !path.exists() {
            return Err(RecorderError::FileNotFound(path.to_path_buf()));
        }

        let content = fs::read_to_string(path)?;
        let content = content.strip_prefix('\u{feff}').unwrap_or(&content);

        let mut rdr = csv::ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .from_reader(content.as_bytes());
        let records = rdr.records().collect::<std::result::Result<Vec<_>, _>>()?;

        if records.is_empty() {
            self.entries.clear();
            self.path = Some(path.to_path_buf());
            // empty file: mark dirty so the header is written on first save
            self.dirty = true;
            log::info!("loaded empty word list {}", path.display());
            return Ok("成功加载空的词表。首次保存时将添加列名。".to_string());
        }

        // the first row fixes the width; later rows may be shorter but not wider
        let columns = records[0].len();
        let widest = records.iter().map(|r| r.len()).max().unwrap_or(columns);
        if columns != WORD_HEADERS.len() || widest > columns {
            return Err(RecorderError::ColumnCount {
                expected: WORD_HEADERS.len(),
                found: if columns != WORD_HEADERS.len() { columns } else { widest },
            });
        }

        let has_header = records[0].iter().eq(WORD_HEADERS.iter().copied());
        let data = if has_header { &records[1..] } else { &records[..] };

        self.entries = data
            .iter()
            .map(|r| WordEntry::new(r.get(0).unwrap_or_default(), r.get(1).unwrap_or_default()))
            .collect();
        self.path = Some(path.to_path_buf());
        self.dirty = !has_header;

        log::info!(
            "loaded {} words from {} (header {})",
            self.entries.len(),
            path.display(),
            if has_header { "matched" } else { "inferred" }
        );

        if has_header {
            Ok("词表加载成功。".to_string())
        } else {
            Ok("词表加载成功。文件缺少标准表头，已按默认格式加载。保存时将添加标准表头。".to_string())
        }
    }

    /// Saves to `path` when given (save-as), otherwise to the remembered path.
    pub fn save(&mut self, path: Option<&Path>) -> Result<String> {
        let target = match path.or(self.path.as_deref()) {
            Some(p) => p.to_path_buf(),
            None => return Err(RecorderError::NoSavePath),
        };

        let mut wtr = csv::WriterBuilder::new()
            .has_headers(false)
            .terminator(csv::Terminator::Any(b'\n'))
            .from_path(&target)?;
        wtr.write_record(WORD_HEADERS)?;
        for entry in &self.entries {
            wtr.serialize(entry)?;
        }
        wtr.flush()?;

        log::info!("saved {} words to {}", self.entries.len(), target.display());

        let message = format!("词表已成功保存到: {}", file_name(&target));
        self.path = Some(target);
        self.dirty = false;
        Ok(message)
    }

    pub fn add_word(&mut self, word: &str, definition: &str) -> Result<()> {
        let word = word.trim();
        if word.is_empty() {
            return Err(RecorderError::EmptyWord);
        }
        self.entries.push(WordEntry::new(word, definition.trim()));
        self.dirty = true;
        Ok(())
    }

    pub fn random_word<R: Rng + ?Sized>(&self, rng: &mut R) -> Option<&WordEntry> {
        self.entries.choose(rng)
    }

    pub fn entries(&self) -> &[WordEntry] {
        &self.entries
    }

    pub fn word_count(&self) -> usize {
        self.entries.len()
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn set_path(&mut self, path: PathBuf) {
        self.path = Some(path);
    }

    pub fn current_filename(&self) -> String {
        self.path.as_deref().map(file_name).unwrap_or_else(|| UNNAMED.to_string())
    }

    /// Text for the info bar.
    pub fn status_text(&self) -> String {
        if self.path.is_none() && !self.dirty && self.entries.is_empty() {
            return "当前无列表打开".to_string();
        }
        let marker = if self.dirty { "*" } else { "" };
        format!("当前词表：{}{}", self.current_filename(), marker)
    }
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use tempfile::tempdir;

    #[test]
    fn test_load_with_header() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("words.csv");
        fs::write(&path, "单词,释义\napple,苹果\nbook,书\n").unwrap();

        let mut list = WordList::new();
        let message = list.load(&path).unwrap();
        assert_eq!(message, "词表加载成功。");
        assert!(!list.is_dirty());
        assert_eq!(list.entries(), &[WordEntry::new("apple", "苹果"), WordEntry::new("book", "书")]);
        assert_eq!(list.current_filename(), "words.csv");
    }

    #[test]
    fn test_load_without_header_is_dirty() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("words.csv");
        fs::write(&path, "apple,苹果\nbook,书\n").unwrap();

        let mut list = WordList::new();
        list.load(&path).unwrap();
        assert!(list.is_dirty());
        assert_eq!(list.word_count(), 2);
        assert_eq!(list.entries()[0].word, "apple");
        assert_eq!(list.status_text(), "当前词表：words.csv*");
    }

    #[test]
    fn test_load_empty_file_is_dirty() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("empty.csv");
        fs::write(&path, "").unwrap();

        let mut list = WordList::new();
        list.load(&path).unwrap();
        assert!(list.is_dirty());
        assert_eq!(list.word_count(), 0);

        list.save(None).unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "单词,释义\n");
    }

    #[test]
    fn test_load_failures_keep_state() {
        let dir = tempdir().unwrap();
        let bad = dir.path().join("bad.csv");
        fs::write(&bad, "a,b,c\nd,e,f\n").unwrap();

        let mut list = WordList::new();
        list.add_word("keep", "me").unwrap();

        assert!(matches!(
            list.load(&bad),
            Err(RecorderError::ColumnCount { expected: 2, found: 3 })
        ));
        assert!(matches!(
            list.load(&dir.path().join("missing.csv")),
            Err(RecorderError::FileNotFound(_))
        ));
        assert_eq!(list.entries(), &[WordEntry::new("keep", "me")]);
        assert!(list.is_dirty());
        assert!(list.path().is_none());
    }

    #[test]
    fn test_width_is_fixed_by_first_row() {
        let dir = tempdir().unwrap();
        let narrow_first = dir.path().join("narrow.csv");
        fs::write(&narrow_first, "apple\nbook,书\n").unwrap();
        let wide_later = dir.path().join("wide.csv");
        fs::write(&wide_later, "单词,释义\napple,苹果\nbook,书,extra\n").unwrap();

        let mut list = WordList::new();
        assert!(matches!(
            list.load(&narrow_first),
            Err(RecorderError::ColumnCount { expected: 2, found: 1 })
        ));
        assert!(matches!(
            list.load(&wide_later),
            Err(RecorderError::ColumnCount { expected: 2, found: 3 })
        ));
        assert_eq!(list.word_count(), 0);
        assert!(list.path().is_none());
    }

    #[test]
    fn test_short_rows_get_empty_definition() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("words.csv");
        fs::write(&path, "单词,释义\napple,苹果\nlonely\n").unwrap();

        let mut list = WordList::new();
        list.load(&path).unwrap();
        assert_eq!(list.entries()[1], WordEntry::new("lonely", ""));
    }

    #[test]
    fn test_save_then_reopen_round_trips() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("saved.csv");

        let mut list = WordList::new();
        list.add_word("serendipity", "机缘巧合").unwrap();
        list.add_word("quote", "含有 \"引号\", 和逗号").unwrap();
        list.add_word("blank", "").unwrap();
        assert!(matches!(list.save(None), Err(RecorderError::NoSavePath)));

        let message = list.save(Some(&path)).unwrap();
        assert_eq!(message, "词表已成功保存到: saved.csv");
        assert!(!list.is_dirty());
        assert_eq!(list.path(), Some(path.as_path()));

        let mut reopened = WordList::new();
        reopened.load(&path).unwrap();
        assert!(!reopened.is_dirty());
        assert_eq!(reopened.entries(), list.entries());
    }

    #[test]
    fn test_add_word_rejects_empty() {
        let mut list = WordList::new();
        assert!(matches!(list.add_word("  ", "x"), Err(RecorderError::EmptyWord)));
        assert!(!list.is_dirty());
        assert_eq!(list.status_text(), "当前无列表打开");

        list.add_word(" word ", " def ").unwrap();
        assert!(list.is_dirty());
        assert_eq!(list.entries()[0], WordEntry::new("word", "def"));
        assert_eq!(list.status_text(), "当前词表：未命名*");
    }

    #[test]
    fn test_random_word_only_returns_present_entries() {
        let mut rng = StdRng::seed_from_u64(7);
        let mut list = WordList::new();
        assert!(list.random_word(&mut rng).is_none());

        for i in 0..5 {
            list.add_word(&format!("w{i}"), "d").unwrap();
        }
        let mut seen = std::collections::HashSet::new();
        for _ in 0..500 {
            let entry = list.random_word(&mut rng).unwrap();
            assert!(list.entries().contains(entry));
            seen.insert(entry.word.clone());
        }
        assert_eq!(seen.len(), 5);

        list.create_new();
        assert!(list.random_word(&mut rng).is_none());
    }
}
