//! Text formatting helpers for terminal reports.

use std::io::{self, Write};

const KB: u64 = 1024;
const MB: u64 = KB * 1024;
const GB: u64 = MB * 1024;

/// Format a byte count as B, KB, MB or GB (1024 base, one decimal)
pub fn format_size(bytes: u64) -> String {
    match bytes {
        b if b >= GB => format!("{:.1} GB", b as f64 / GB as f64),
        b if b >= MB => format!("{:.1} MB", b as f64 / MB as f64),
        b if b >= KB => format!("{:.1} KB", b as f64 / KB as f64),
        b => format!("{} B", b),
    }
}

/// Shorten `name` to at most `max` characters, ending with `...`
pub fn truncate_name(name: &str, max: usize) -> String {
    if name.chars().count() <= max {
        return name.to_string();
    }
    let keep = max.saturating_sub(3);
    let mut short: String = name.chars().take(keep).collect();
    short.push_str("...");
    short
}

/// Truecolor background swatch for a `#rrggbb` color, empty when malformed
pub fn hex_to_ansi(color: &str) -> String {
    let hex = color.strip_prefix('#').unwrap_or(color);
    if hex.len() != 6 || !hex.is_ascii() {
        return String::new();
    }

    let channel = |range: std::ops::Range<usize>| u8::from_str_radix(&hex[range], 16).ok();
    match (channel(0..2), channel(2..4), channel(4..6)) {
        (Some(r), Some(g), Some(b)) => format!("\x1b[48;2;{};{};{}m  \x1b[0m", r, g, b),
        _ => String::new(),
    }
}

/// Age as `Xa Ym`, `Xa`, `Ym` or `Xj` (years of 365 days, months of 30)
pub fn format_age_days(days: i64) -> String {
    let years = days / 365;
    let months = (days % 365) / 30;

    match (years, months) {
        (y, 0) if y > 0 => format!("{}a", y),
        (y, m) if y > 0 => format!("{}a {}m", y, m),
        (_, m) if m > 0 => format!("{}m", m),
        _ => format!("{}j", days),
    }
}

/// Percentage of `part` in `total`, zero when the total is zero
pub fn percent(part: u64, total: u64) -> f64 {
    if total == 0 {
        0.0
    } else {
        part as f64 / total as f64 * 100.0
    }
}

/// Left-aligned columns separated by at least two spaces
#[derive(Debug, Default)]
pub struct Table {
    header: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl Table {
    pub fn new<I, S>(header: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            header: header.into_iter().map(Into::into).collect(),
            rows: Vec::new(),
        }
    }

    pub fn row<I, S>(&mut self, cells: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.rows.push(cells.into_iter().map(Into::into).collect());
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn write_to(&self, out: &mut impl Write) -> io::Result<()> {
        let columns = self
            .rows
            .iter()
            .map(Vec::len)
            .chain(std::iter::once(self.header.len()))
            .max()
            .unwrap_or(0);

        let mut widths = vec![0usize; columns];
        for line in std::iter::once(&self.header).chain(&self.rows) {
            for (i, cell) in line.iter().enumerate() {
                widths[i] = widths[i].max(cell.chars().count());
            }
        }

        for line in std::iter::once(&self.header).chain(&self.rows) {
            let mut text = String::new();
            for (i, cell) in line.iter().enumerate() {
                text.push_str(cell);
                if i + 1 < line.len() {
                    let pad = widths[i] - cell.chars().count() + 2;
                    text.extend(std::iter::repeat(' ').take(pad));
                }
            }
            writeln!(out, "{}", text)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_size() {
        assert_eq!(format_size(0), "0 B");
        assert_eq!(format_size(1023), "1023 B");
        assert_eq!(format_size(1024), "1.0 KB");
        assert_eq!(format_size(1536), "1.5 KB");
        assert_eq!(format_size(1024 * 1024), "1.0 MB");
        assert_eq!(format_size(5 * 1024 * 1024 * 1024 + 512 * 1024 * 1024), "5.5 GB");
    }

    #[test]
    fn test_truncate_name() {
        assert_eq!(truncate_name("short", 10), "short");
        assert_eq!(truncate_name("exactly10!", 10), "exactly10!");
        assert_eq!(truncate_name("a much longer name", 10), "a much ...");
        assert_eq!(truncate_name("éèàùçéèàùç-suite", 8), "éèàùç...");
    }

    #[test]
    fn test_hex_to_ansi() {
        assert_eq!(hex_to_ansi("#ff8800"), "\x1b[48;2;255;136;0m  \x1b[0m");
        assert_eq!(hex_to_ansi("00ff00"), "\x1b[48;2;0;255;0m  \x1b[0m");
        assert_eq!(hex_to_ansi("#fff"), "");
        assert_eq!(hex_to_ansi("#gg0000"), "");
    }

    #[test]
    fn test_format_age_days() {
        assert_eq!(format_age_days(12), "12j");
        assert_eq!(format_age_days(45), "1m");
        assert_eq!(format_age_days(365), "1a");
        assert_eq!(format_age_days(800), "2a 2m");
    }

    #[test]
    fn test_table_alignment() {
        let mut table = Table::new(["ID", "NAME"]);
        table.row(["1", "root"]);
        table.row(["12345", "deep"]);

        let mut out = Vec::new();
        table.write_to(&mut out).unwrap();
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "ID     NAME\n1      root\n12345  deep\n"
        );
    }
}
