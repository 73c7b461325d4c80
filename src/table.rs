use std::borrow::Cow;
use std::fmt::{self, Write as _};

/// Plain-text grid with a header row, a dashed separator, and left-aligned
/// cells separated by two spaces.
#[derive(Debug, Clone, Default)]
pub struct TextTable {
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl TextTable {
    pub fn new<I, S>(headers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            headers: headers.into_iter().map(Into::into).collect(),
            rows: Vec::new(),
        }
    }

    pub fn push_row<I, S>(&mut self, cells: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.rows.push(cells.into_iter().map(Into::into).collect());
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    fn widths(&self) -> Vec<usize> {
        let mut widths = self
            .headers
            .iter()
            .map(|header| display_width(header).max(1))
            .collect::<Vec<_>>();
        for row in &self.rows {
            for (width, cell) in widths.iter_mut().zip(row) {
                *width = (*width).max(display_width(cell));
            }
        }
        widths
    }
}

impl fmt::Display for TextTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let widths = self.widths();
        writeln!(f, "{}", format_line(&self.headers, &widths))?;

        let separator_widths = widths.iter().map(|w| (*w).max(3)).collect::<Vec<_>>();
        let dashes = separator_widths
            .iter()
            .map(|w| "-".repeat(*w))
            .collect::<Vec<_>>();
        writeln!(f, "{}", format_line(&dashes, &separator_widths))?;

        for row in &self.rows {
            writeln!(f, "{}", format_line(row, &widths))?;
        }
        Ok(())
    }
}

fn format_line(values: &[String], widths: &[usize]) -> String {
    let mut line = String::new();
    for (idx, (value, width)) in values.iter().zip(widths).enumerate() {
        if idx > 0 {
            line.push_str("  ");
        }
        let cell = sanitize_cell(value);
        let padding = width.saturating_sub(display_width(&cell));
        let _ = write!(line, "{cell}{}", " ".repeat(padding));
    }
    line.truncate(line.trim_end().len());
    line
}

fn display_width(value: &str) -> usize {
    let mut width = 0usize;
    let mut chars = value.chars();
    while let Some(ch) = chars.next() {
        if ch == '\u{1b}' {
            // ANSI colour sequence, e.g. \x1b[31m
            for next in chars.by_ref() {
                if next == 'm' {
                    break;
                }
            }
        } else {
            width += 1;
        }
    }
    width
}

fn sanitize_cell(value: &str) -> Cow<'_, str> {
    if value.contains(['\n', '\r', '\t']) {
        Cow::Owned(value.replace(['\n', '\r', '\t'], " "))
    } else {
        Cow::Borrowed(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn columns_are_padded_to_widest_cell() {
        let mut table = TextTable::new(["name", "type"]);
        table.push_row(["id", "int(4)"]);
        table.push_row(["total", "decimal(10,2)"]);
        let rendered = table.to_string();
        let lines: Vec<&str> = rendered.lines().collect();
        assert_eq!(
            lines,
            vec![
                "name   type",
                "-----  -------------",
                "id     int(4)",
                "total  decimal(10,2)",
            ]
        );
    }

    #[test]
    fn control_characters_become_spaces() {
        let mut table = TextTable::new(["statement"]);
        table.push_row(["BEGIN\n\tSET NOCOUNT ON"]);
        let rendered = table.to_string();
        assert_eq!(rendered.lines().nth(2), Some("BEGIN  SET NOCOUNT ON"));
    }
}
