//! Terminal output for the one-shot commands: notes and a plain table.

pub const RESET: &str = "\x1b[0m";
pub const BOLD: &str = "\x1b[1m";
pub const DIM: &str = "\x1b[2m";

pub const RED: &str = "\x1b[31m";
pub const GREEN: &str = "\x1b[32m";
pub const YELLOW: &str = "\x1b[33m";

/// Check if the terminal supports color output.
pub fn supports_color() -> bool {
    std::env::var("NO_COLOR").is_err()
        && (std::env::var("COLORTERM").is_ok()
            || std::env::var("TERM")
                .map(|t| t != "dumb")
                .unwrap_or(false))
}

/// Strip ANSI escape codes from a string.
pub fn strip_ansi(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    let mut chars = s.chars();
    while let Some(c) = chars.next() {
        if c == '\x1b' {
            for next in chars.by_ref() {
                if next == 'm' {
                    break;
                }
            }
        } else {
            result.push(c);
        }
    }
    result
}

pub fn note_warn(msg: &str) {
    if supports_color() {
        eprintln!("{YELLOW}{BOLD}⚠{RESET} {msg}");
    } else {
        eprintln!("WARN: {msg}");
    }
}

pub fn note_error(msg: &str) {
    if supports_color() {
        eprintln!("{RED}{BOLD}✗{RESET} {msg}");
    } else {
        eprintln!("ERROR: {msg}");
    }
}

pub fn note_success(msg: &str) {
    if supports_color() {
        println!("{GREEN}{BOLD}✓{RESET} {msg}");
    } else {
        println!("OK: {msg}");
    }
}

/// A left-aligned table column, optionally truncated.
pub struct Column {
    pub header: String,
    pub max_width: Option<usize>,
}

impl Column {
    pub fn new(header: impl Into<String>) -> Self {
        Self {
            header: header.into(),
            max_width: None,
        }
    }

    pub fn max_width(mut self, width: usize) -> Self {
        self.max_width = Some(width);
        self
    }
}

fn visible_width(s: &str) -> usize {
    strip_ansi(s).chars().count()
}

fn fit(cell: &str, width: usize) -> String {
    let plain = strip_ansi(cell);
    let len = plain.chars().count();
    if len > width {
        let cut: String = plain.chars().take(width.saturating_sub(1)).collect();
        format!("{cut}…")
    } else {
        format!("{cell}{}", " ".repeat(width - visible_width(cell)))
    }
}

/// Render rows under the given columns, two spaces between cells.
pub fn render_table(columns: &[Column], rows: &[Vec<String>]) -> String {
    let mut widths: Vec<usize> = columns.iter().map(|c| visible_width(&c.header)).collect();
    for row in rows {
        for (i, cell) in row.iter().enumerate().take(columns.len()) {
            let w = visible_width(cell);
            let w = columns[i].max_width.map_or(w, |max| w.min(max));
            widths[i] = widths[i].max(w);
        }
    }

    let render_row = |cells: Vec<String>| {
        let line = cells.join("  ");
        format!("  {}\n", line.trim_end())
    };

    let mut out = String::new();
    let header: Vec<String> = columns
        .iter()
        .enumerate()
        .map(|(i, c)| fit(&c.header, widths[i]))
        .collect();
    if supports_color() {
        out.push_str(&format!("{BOLD}{}{RESET}", render_row(header)));
    } else {
        out.push_str(&render_row(header));
    }
    out.push_str(&render_row(widths.iter().map(|w| "-".repeat(*w)).collect()));
    for row in rows {
        let cells = (0..columns.len())
            .map(|i| fit(row.get(i).map(String::as_str).unwrap_or(""), widths[i]))
            .collect();
        out.push_str(&render_row(cells));
    }
    out
}

/// Dim a string when color is available.
pub fn dim(s: &str) -> String {
    if supports_color() {
        format!("{DIM}{s}{RESET}")
    } else {
        s.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_ansi() {
        let colored = format!("{GREEN}hello{RESET}");
        assert_eq!(strip_ansi(&colored), "hello");
    }

    #[test]
    fn renders_and_truncates() {
        let cols = vec![Column::new("Key"), Column::new("Title").max_width(8)];
        let rows = vec![
            vec!["a".to_string(), "Short".to_string()],
            vec!["bb".to_string(), "A very long title".to_string()],
        ];
        let table = strip_ansi(&render_table(&cols, &rows));
        assert!(table.contains("Short"));
        assert!(table.contains("A very …"));
        assert!(!table.contains("long title"));
    }
}
