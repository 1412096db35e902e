/*!
format.rs

Human-readable output helpers for `list` (JSON paths never use these).

  - StyleOptions::detect()  NO_COLOR disables ANSI, COLUMNS sets width (40..=220, default 100)
  - color(role, text, &style)
  - table(headers, rows, &style)  widest columns shrink first, cells end in '…'
  - truncate_ellipsis(s, max_chars)
*/

use std::borrow::Cow;

/// Narrowest a column gets when the table is squeezed.
const MIN_COL_WIDTH: usize = 4;
const COL_GAP: &str = "  ";

#[derive(Debug, Clone)]
pub struct StyleOptions {
    pub use_color: bool,
    pub term_width: usize,
}

impl StyleOptions {
    pub fn detect() -> Self {
        let width = std::env::var("COLUMNS")
            .ok()
            .and_then(|v| v.parse::<usize>().ok())
            .map(|w| w.clamp(40, 220))
            .unwrap_or(100);
        StyleOptions {
            use_color: std::env::var_os("NO_COLOR").is_none(),
            term_width: width,
        }
    }

    pub fn plain(term_width: usize) -> Self {
        StyleOptions {
            use_color: false,
            term_width,
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub enum Role {
    Title,
    Header,
    Name,
    Dim,
}

pub fn color(role: Role, text: impl AsRef<str>, style: &StyleOptions) -> String {
    if !style.use_color {
        return text.as_ref().to_string();
    }
    let code = match role {
        Role::Title => "1;38;5;45",
        Role::Header => "38;5;213",
        Role::Name => "38;5;82",
        Role::Dim => "2",
    };
    format!("\x1b[{code}m{}\x1b[0m", text.as_ref())
}

/// Fixed-width table; the last row has no trailing newline.
pub fn table(headers: &[&str], rows: &[Vec<String>], style: &StyleOptions) -> String {
    if headers.is_empty() {
        return String::new();
    }
    let mut widths: Vec<usize> = headers.iter().map(|h| h.chars().count()).collect();
    for row in rows {
        for (i, cell) in row.iter().enumerate().take(headers.len()) {
            widths[i] = widths[i].max(display_width(cell));
        }
    }
    shrink_to_fit(&mut widths, style.term_width);

    let mut lines = Vec::with_capacity(rows.len() + 2);
    let header_cells: Vec<String> = headers
        .iter()
        .zip(&widths)
        .map(|(h, w)| color(Role::Header, fit(h, *w), style))
        .collect();
    lines.push(header_cells.join(COL_GAP));
    let rule: Vec<String> = widths.iter().map(|w| "-".repeat(*w)).collect();
    lines.push(color(Role::Dim, rule.join(COL_GAP), style));

    for row in rows {
        let cells: Vec<String> = widths
            .iter()
            .enumerate()
            .map(|(i, w)| fit(row.get(i).map(String::as_str).unwrap_or(""), *w))
            .collect();
        lines.push(cells.join(COL_GAP).trim_end().to_string());
    }
    lines.join("\n")
}

fn shrink_to_fit(widths: &mut [usize], limit: usize) {
    let gaps = COL_GAP.len() * widths.len().saturating_sub(1);
    let mut total: usize = widths.iter().sum::<usize>() + gaps;
    while total > limit {
        let Some((idx, widest)) = widths
            .iter()
            .copied()
            .enumerate()
            .max_by_key(|(_, w)| *w)
        else {
            return;
        };
        if widest <= MIN_COL_WIDTH {
            return;
        }
        widths[idx] -= 1;
        total -= 1;
    }
}

fn fit(s: &str, width: usize) -> String {
    let cut = truncate_ellipsis(s, width);
    let pad = width.saturating_sub(display_width(&cut));
    format!("{cut}{}", " ".repeat(pad))
}

pub fn truncate_ellipsis(s: &str, max_chars: usize) -> String {
    if max_chars == 0 {
        return String::new();
    }
    if s.chars().count() <= max_chars {
        return s.to_string();
    }
    let mut out: String = s.chars().take(max_chars - 1).collect();
    out.push('…');
    out
}

fn strip_ansi(s: &str) -> Cow<'_, str> {
    if !s.contains('\x1b') {
        return Cow::Borrowed(s);
    }
    let mut out = String::with_capacity(s.len());
    let mut chars = s.chars();
    while let Some(c) = chars.next() {
        if c == '\x1b' {
            // skip CSI sequence up to its final letter
            for n in chars.by_ref() {
                if n.is_ascii_alphabetic() {
                    break;
                }
            }
            continue;
        }
        out.push(c);
    }
    Cow::Owned(out)
}

fn display_width(s: &str) -> usize {
    strip_ansi(s).chars().count()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_table_layout() {
        let style = StyleOptions::plain(100);
        let t = table(
            &["#", "NAME"],
            &[vec!["1".into(), "get_issue".into()], vec!["2".into(), "x".into()]],
            &style,
        );
        let lines: Vec<&str> = t.lines().collect();
        assert_eq!(lines[0], "#  NAME     ");
        assert_eq!(lines[1], "-  ---------");
        assert_eq!(lines[2], "1  get_issue");
        assert_eq!(lines[3], "2  x");
    }

    #[test]
    fn wide_columns_are_truncated() {
        let style = StyleOptions::plain(40);
        let long = "d".repeat(80);
        let t = table(&["NAME", "DESCRIPTION"], &[vec!["op".into(), long]], &style);
        for line in t.lines() {
            assert!(line.chars().count() <= 40, "{line}");
        }
        assert!(t.contains('…'));
    }

    #[test]
    fn truncate() {
        assert_eq!(truncate_ellipsis("abcdef", 4), "abc…");
        assert_eq!(truncate_ellipsis("abc", 4), "abc");
        assert_eq!(truncate_ellipsis("abc", 0), "");
    }

    #[test]
    fn ansi_is_ignored_for_width() {
        assert_eq!(strip_ansi("\x1b[31mRED\x1b[0m"), "RED");
        assert_eq!(display_width("\x1b[1;38;5;45mab\x1b[0m"), 2);
    }
}
