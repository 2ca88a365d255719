/// Editable text buffer behind every input field. Cursor columns count
/// characters, not bytes.
#[derive(Debug, Clone)]
pub struct TextInput {
    pub content: Vec<String>,
    pub cursor_row: usize,
    pub cursor_col: usize,
    pub scroll_offset: usize,
    multiline: bool,
}

impl TextInput {
    pub fn single_line() -> Self {
        TextInput {
            content: vec![String::new()],
            cursor_row: 0,
            cursor_col: 0,
            scroll_offset: 0,
            multiline: false,
        }
    }

    pub fn multi_line() -> Self {
        TextInput { multiline: true, ..TextInput::single_line() }
    }

    pub fn with_text(mut self, text: &str) -> Self {
        self.set_text(text);
        self
    }

    pub fn set_text(&mut self, text: &str) {
        self.content = if self.multiline {
            text.split('\n').map(|s| s.trim_end_matches('\r').to_string()).collect()
        } else {
            vec![text.replace(['\r', '\n'], " ")]
        };
        self.cursor_row = self.content.len() - 1;
        self.cursor_col = char_len(&self.content[self.cursor_row]);
        self.scroll_offset = 0;
    }

    pub fn clear(&mut self) {
        self.content = vec![String::new()];
        self.cursor_row = 0;
        self.cursor_col = 0;
        self.scroll_offset = 0;
    }

    pub fn text(&self) -> String {
        self.content.join("\n")
    }

    pub fn is_blank(&self) -> bool {
        self.content.iter().all(|line| line.trim().is_empty())
    }

    pub fn insert_char(&mut self, c: char) {
        if c == '\n' {
            self.insert_newline();
            return;
        }
        let line = &mut self.content[self.cursor_row];
        let idx = byte_index(line, self.cursor_col);
        line.insert(idx, c);
        self.cursor_col += 1;
    }

    /// Splits the line at the cursor. Ignored by single-line inputs.
    pub fn insert_newline(&mut self) {
        if !self.multiline {
            return;
        }
        let line = &mut self.content[self.cursor_row];
        let idx = byte_index(line, self.cursor_col);
        let remaining = line.split_off(idx);

        self.cursor_row += 1;
        self.cursor_col = 0;
        self.content.insert(self.cursor_row, remaining);
    }

    pub fn backspace(&mut self) {
        if self.cursor_col > 0 {
            let line = &mut self.content[self.cursor_row];
            let idx = byte_index(line, self.cursor_col - 1);
            line.remove(idx);
            self.cursor_col -= 1;
        } else if self.cursor_row > 0 {
            // join with previous line
            let current = self.content.remove(self.cursor_row);
            self.cursor_row -= 1;
            self.cursor_col = char_len(&self.content[self.cursor_row]);
            self.content[self.cursor_row].push_str(&current);
        }
    }

    pub fn delete(&mut self) {
        let len = char_len(&self.content[self.cursor_row]);
        if self.cursor_col < len {
            let line = &mut self.content[self.cursor_row];
            let idx = byte_index(line, self.cursor_col);
            line.remove(idx);
        } else if self.cursor_row + 1 < self.content.len() {
            let next = self.content.remove(self.cursor_row + 1);
            self.content[self.cursor_row].push_str(&next);
        }
    }

    pub fn move_left(&mut self) {
        if self.cursor_col > 0 {
            self.cursor_col -= 1;
        } else if self.cursor_row > 0 {
            self.cursor_row -= 1;
            self.cursor_col = char_len(&self.content[self.cursor_row]);
        }
    }

    pub fn move_right(&mut self) {
        let len = char_len(&self.content[self.cursor_row]);
        if self.cursor_col < len {
            self.cursor_col += 1;
        } else if self.cursor_row + 1 < self.content.len() {
            self.cursor_row += 1;
            self.cursor_col = 0;
        }
    }

    pub fn move_up(&mut self) {
        if self.cursor_row > 0 {
            self.cursor_row -= 1;
            self.clamp_col();
        }
    }

    pub fn move_down(&mut self) {
        if self.cursor_row + 1 < self.content.len() {
            self.cursor_row += 1;
            self.clamp_col();
        }
    }

    pub fn move_home(&mut self) {
        self.cursor_col = 0;
    }

    pub fn move_end(&mut self) {
        self.cursor_col = char_len(&self.content[self.cursor_row]);
    }

    fn clamp_col(&mut self) {
        let len = char_len(&self.content[self.cursor_row]);
        if self.cursor_col > len {
            self.cursor_col = len;
        }
    }

    /// Keeps the cursor row inside a window of `visible_height` rows.
    pub fn adjust_scroll(&mut self, visible_height: usize) {
        let visible_height = visible_height.max(1);
        if self.cursor_row < self.scroll_offset {
            self.scroll_offset = self.cursor_row;
        } else if self.cursor_row >= self.scroll_offset + visible_height {
            self.scroll_offset = self.cursor_row + 1 - visible_height;
        }
    }

    /// Text before the cursor on the cursor line, for placing the terminal cursor.
    pub fn before_cursor(&self) -> &str {
        let line = &self.content[self.cursor_row];
        &line[..byte_index(line, self.cursor_col)]
    }
}

fn char_len(s: &str) -> usize {
    s.chars().count()
}

fn byte_index(s: &str, char_idx: usize) -> usize {
    s.char_indices().nth(char_idx).map(|(i, _)| i).unwrap_or(s.len())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn type_str(input: &mut TextInput, s: &str) {
        for c in s.chars() {
            input.insert_char(c);
        }
    }

    #[test]
    fn test_cjk_editing() {
        let mut input = TextInput::single_line();
        type_str(&mut input, "单词本");
        input.move_left();
        input.backspace();
        assert_eq!(input.text(), "单本");
        input.insert_char('语');
        assert_eq!(input.text(), "单语本");
        assert_eq!(input.before_cursor(), "单语");
        input.delete();
        assert_eq!(input.text(), "单语");
    }

    #[test]
    fn test_single_line_ignores_newline() {
        let mut input = TextInput::single_line();
        type_str(&mut input, "a\nb");
        assert_eq!(input.text(), "ab");
        assert_eq!(input.content.len(), 1);

        let input = TextInput::single_line().with_text("x\ny");
        assert_eq!(input.text(), "x y");
    }

    #[test]
    fn test_multi_line_split_and_join() {
        let mut input = TextInput::multi_line();
        type_str(&mut input, "第一行第二行");
        for _ in 0..3 {
            input.move_left();
        }
        input.insert_newline();
        assert_eq!(input.text(), "第一行\n第二行");
        assert_eq!((input.cursor_row, input.cursor_col), (1, 0));

        input.backspace();
        assert_eq!(input.text(), "第一行第二行");
        assert_eq!((input.cursor_row, input.cursor_col), (0, 3));
    }

    #[test]
    fn test_vertical_moves_clamp_column() {
        let mut input = TextInput::multi_line().with_text("long line\nab");
        input.move_up();
        input.move_end();
        input.move_down();
        assert_eq!((input.cursor_row, input.cursor_col), (1, 2));
    }

    #[test]
    fn test_clear_and_blank() {
        let mut input = TextInput::multi_line().with_text("  \n ");
        assert!(input.is_blank());
        input.set_text("x");
        assert!(!input.is_blank());
        input.clear();
        assert_eq!(input.text(), "");
        assert_eq!((input.cursor_row, input.cursor_col), (0, 0));
    }

    #[test]
    fn test_adjust_scroll() {
        let mut input = TextInput::multi_line().with_text("1\n2\n3\n4\n5");
        input.adjust_scroll(2);
        assert_eq!(input.scroll_offset, 3);
        input.cursor_row = 0;
        input.adjust_scroll(2);
        assert_eq!(input.scroll_offset, 0);
    }
}
