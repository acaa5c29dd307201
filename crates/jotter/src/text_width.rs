//! Display-width helpers for laying out buffer lines on a terminal grid.
//!
//! Wide (East Asian, emoji) characters take two cells, control characters
//! none, and tabs advance to the next tab stop.

use unicode_width::UnicodeWidthChar;

#[derive(Debug, Clone, Copy)]
pub struct TextWidth {
    tab_size: usize,
}

impl Default for TextWidth {
    fn default() -> Self {
        Self { tab_size: 4 }
    }
}

impl TextWidth {
    pub fn new(tab_size: usize) -> Self {
        Self {
            tab_size: tab_size.max(1),
        }
    }

    /// Width of `c` when drawn starting at display column `col`.
    pub fn char_width_at(&self, c: char, col: usize) -> usize {
        match c {
            '\t' => self.tab_size - (col % self.tab_size),
            '\n' | '\r' => 0,
            _ => c.width().unwrap_or(0),
        }
    }

    pub fn str_width(&self, text: &str) -> usize {
        text.chars()
            .fold(0, |col, c| col + self.char_width_at(c, col))
    }

    /// Display column at which the `char_idx`-th character of `line` starts.
    pub fn col_of(&self, line: &str, char_idx: usize) -> usize {
        line.chars()
            .take(char_idx)
            .fold(0, |col, c| col + self.char_width_at(c, col))
    }

    /// Cells of `line` for a viewport that starts `skip` columns in and is
    /// `max` columns wide, each tagged with the char index it came from.
    /// Tabs become spaces and wide characters cut by either edge are padded
    /// with spaces so cells stay aligned.
    pub fn visible_cells(&self, line: &str, skip: usize, max: usize) -> Vec<(usize, String)> {
        let mut out = Vec::new();
        let mut col = 0;
        let end = skip + max;

        for (idx, c) in line.chars().enumerate() {
            if c == '\n' || c == '\r' {
                break;
            }
            let w = self.char_width_at(c, col);
            let next = col + w;
            if next <= skip {
                col = next;
                continue;
            }
            if col >= end {
                break;
            }
            if col < skip || next > end || c == '\t' {
                let from = col.max(skip);
                let to = next.min(end);
                out.push((idx, " ".repeat(to - from)));
            } else {
                out.push((idx, c.to_string()));
            }
            col = next;
        }

        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ascii_and_wide_widths() {
        let tw = TextWidth::default();
        assert_eq!(tw.str_width("Hello"), 5);
        assert_eq!(tw.str_width("こんにちは"), 10);
        assert_eq!(tw.str_width("Hello世界"), 9);
    }

    #[test]
    fn test_tab_advances_to_next_stop() {
        let tw = TextWidth::new(4);
        assert_eq!(tw.str_width("\t"), 4);
        assert_eq!(tw.str_width("ab\t"), 4);
        assert_eq!(tw.str_width("abcd\tx"), 9);
    }

    #[test]
    fn test_col_of() {
        let tw = TextWidth::default();
        let line = "Hello世界";
        assert_eq!(tw.col_of(line, 0), 0);
        assert_eq!(tw.col_of(line, 5), 5);
        assert_eq!(tw.col_of(line, 6), 7);
        assert_eq!(tw.col_of(line, 7), 9);
    }

    fn visible(tw: &TextWidth, line: &str, skip: usize, max: usize) -> String {
        tw.visible_cells(line, skip, max)
            .into_iter()
            .map(|(_, cells)| cells)
            .collect()
    }

    #[test]
    fn test_visible_cells_scroll_and_pad() {
        let tw = TextWidth::new(4);
        assert_eq!(visible(&tw, "Hello world\n", 6, 5), "world");
        assert_eq!(visible(&tw, "a\tb", 0, 10), "a   b");
        // "世" spans columns 0-1; skipping one column leaves half of it.
        assert_eq!(visible(&tw, "世界", 1, 3), " 界");
    }

    #[test]
    fn test_visible_cells_keep_char_indices() {
        let tw = TextWidth::new(4);
        let cells = tw.visible_cells("ab\tc", 1, 10);
        assert_eq!(
            cells,
            vec![
                (1, "b".to_string()),
                (2, "  ".to_string()),
                (3, "c".to_string())
            ]
        );
    }
}
