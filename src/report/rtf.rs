//! Minimal RTF document builder.
//!
//! Produces RTF 1.x readable by Word, LibreOffice and WordPad: a font table,
//! a colour table, headings, paragraphs and bordered tables. Text is escaped
//! on the way in; callers never write control words.

use std::fmt::Write as _;

/// A4 page with 2 cm margins, in twips
const PAGE_WIDTH: u32 = 11906;
const PAGE_HEIGHT: u32 = 16838;
const MARGIN: u32 = 1134;

/// Usable text width in twips
pub const TEXT_WIDTH: u32 = PAGE_WIDTH - 2 * MARGIN;

const HEADER: &str = concat!(
    r"{\rtf1\ansi\ansicpg1252\deff0\uc1",
    "\n",
    r"{\fonttbl{\f0\fswiss\fcharset0 Calibri;}{\f1\fswiss\fcharset0 Calibri Light;}}",
    "\n",
    // 1 accent blue, 2 header shading, 3 border grey
    r"{\colortbl;\red47\green84\blue150;\red242\green242\blue242;\red191\green191\blue191;}",
    "\n",
);

/// Escape text for an RTF body.
///
/// Backslash and braces are escaped; characters outside ASCII become `\uN?`
/// with `N` the signed 16-bit UTF-16 code unit, so astral characters are
/// written as a surrogate pair.
pub fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '\\' => out.push_str(r"\\"),
            '{' => out.push_str(r"\{"),
            '}' => out.push_str(r"\}"),
            '\n' => out.push_str(r"\line "),
            '\t' => out.push_str(r"\tab "),
            c if c.is_ascii() && !c.is_ascii_control() => out.push(c),
            c if c.is_ascii() => {}
            c => {
                let mut units = [0u16; 2];
                for unit in c.encode_utf16(&mut units) {
                    let _ = write!(out, r"\u{}?", *unit as i16);
                }
            }
        }
    }
    out
}

/// One table cell
#[derive(Debug, Clone, PartialEq)]
pub struct Cell {
    text: String,
    bold: bool,
}

impl Cell {
    /// Plain cell
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            bold: false,
        }
    }

    /// Bold cell
    pub fn bold(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            bold: true,
        }
    }

    /// Cell with no content
    pub fn empty() -> Self {
        Self::new(String::new())
    }
}

impl From<&str> for Cell {
    fn from(text: &str) -> Self {
        Cell::new(text)
    }
}

impl From<String> for Cell {
    fn from(text: String) -> Self {
        Cell::new(text)
    }
}

/// Bordered table with a shaded header row
#[derive(Debug, Clone)]
pub struct Table {
    widths: Vec<u32>,
    header: Vec<String>,
    rows: Vec<Vec<Cell>>,
}

impl Table {
    /// Table whose column widths are proportional to `weights` across the
    /// text width; `header` must have one entry per column
    pub fn new(weights: &[u32], header: &[&str]) -> Self {
        let total: u32 = weights.iter().sum::<u32>().max(1);
        let widths = weights.iter().map(|w| TEXT_WIDTH * w / total).collect();
        Self {
            widths,
            header: header.iter().map(|h| h.to_string()).collect(),
            rows: Vec::new(),
        }
    }

    /// Append a row; missing cells are rendered empty, extra cells dropped
    pub fn row<I, C>(&mut self, cells: I) -> &mut Self
    where
        I: IntoIterator<Item = C>,
        C: Into<Cell>,
    {
        let mut row: Vec<Cell> = cells.into_iter().map(Into::into).take(self.widths.len()).collect();
        row.resize(self.widths.len(), Cell::empty());
        self.rows.push(row);
        self
    }

    /// Number of body rows
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// True if the table has no body rows
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    fn row_definition(&self, out: &mut String, shaded: bool) {
        out.push_str(r"\trowd\trgaph108\trleft5");
        let mut right = 0;
        for width in &self.widths {
            right += width;
            out.push_str(r"\clbrdrt\brdrs\brdrw10\brdrcf3\clbrdrb\brdrs\brdrw10\brdrcf3\clpadt108");
            if shaded {
                out.push_str(r"\clcbpat2");
            }
            let _ = write!(out, r"\cellx{right}");
        }
        out.push('\n');
    }

    fn write_cells<'a>(out: &mut String, cells: impl Iterator<Item = (&'a str, bool)>) {
        for (text, bold) in cells {
            let weight = if bold { r"\b" } else { "" };
            let _ = writeln!(out, r"\pard\intbl\ql{{\fs20{weight} {}}}\cell", escape(text));
        }
        out.push_str("\\row\n");
    }

    fn write(&self, out: &mut String) {
        if !self.header.is_empty() {
            self.row_definition(out, true);
            Self::write_cells(out, self.header.iter().map(|h| (h.as_str(), true)));
        }
        for row in &self.rows {
            self.row_definition(out, false);
            Self::write_cells(out, row.iter().map(|c| (c.text.as_str(), c.bold)));
        }
        out.push_str("\\pard\\par\n");
    }
}

/// RTF document assembled block by block
#[derive(Debug, Clone, Default)]
pub struct RtfDocument {
    body: String,
}

impl RtfDocument {
    /// Empty document
    pub fn new() -> Self {
        Self::default()
    }

    /// Document title
    pub fn title(&mut self, text: &str) -> &mut Self {
        let _ = writeln!(
            self.body,
            r"\pard\sb240\sa120\ql{{\f1\fs36\b\cf1 {}}}\par",
            escape(text)
        );
        self
    }

    /// Section heading
    pub fn heading(&mut self, text: &str) -> &mut Self {
        let _ = writeln!(
            self.body,
            r"\pard\sb240\sa80\ql{{\f1\fs26\b\cf1 {}}}\par",
            escape(text)
        );
        self
    }

    /// Body paragraph
    pub fn paragraph(&mut self, text: &str) -> &mut Self {
        let _ = writeln!(self.body, r"\pard\sa60\ql{{\fs22 {}}}\par", escape(text));
        self
    }

    /// Bordered table
    pub fn table(&mut self, table: &Table) -> &mut Self {
        table.write(&mut self.body);
        self
    }

    /// Complete document text
    pub fn finish(&self) -> String {
        let mut out = String::with_capacity(HEADER.len() + self.body.len() + 128);
        out.push_str(HEADER);
        let _ = writeln!(
            out,
            r"\paperw{PAGE_WIDTH}\paperh{PAGE_HEIGHT}\margl{MARGIN}\margr{MARGIN}\margt{MARGIN}\margb{MARGIN}"
        );
        out.push_str("\\plain\\f0\\fs22\n");
        out.push_str(&self.body);
        out.push_str("}\n");
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_control_characters() {
        assert_eq!(escape(r"a\b{c}"), r"a\\b\{c\}");
        assert_eq!(escape("line\nbreak"), r"line\line break");
    }

    #[test]
    fn test_escape_unicode() {
        assert_eq!(escape("1.2 Å"), r"1.2 \u197?");
        assert_eq!(escape("µm"), r"\u181?m");
        // Above U+7FFF the code unit is written as a negative number
        assert_eq!(escape("\u{FF21}"), r"\u-223?");
        // Astral characters become a surrogate pair
        assert_eq!(escape("\u{1F52C}"), r"\u-10179?\u-8916?");
    }

    #[test]
    fn test_table_rows_padded() {
        let mut table = Table::new(&[1, 1, 2], &["A", "B", "C"]);
        table.row(["x"]).row(["1", "2", "3", "4"]);
        assert_eq!(table.len(), 2);

        let mut doc = RtfDocument::new();
        doc.table(&table);
        let text = doc.finish();

        // Header plus two body rows, three cells each
        assert_eq!(text.matches(r"\row").count(), 3);
        assert_eq!(text.matches(r"\cell").count() - text.matches(r"\cellx").count(), 9);
        assert!(!text.contains("{\\fs20 4}"));
        assert!(text.contains(&format!(r"\cellx{}", TEXT_WIDTH / 4)));
    }

    #[test]
    fn test_document_is_balanced() {
        let mut doc = RtfDocument::new();
        doc.title("Report {draft}")
            .heading("Parameters")
            .paragraph("Pixel size 0.654 Å");
        let text = doc.finish();

        assert!(text.starts_with(r"{\rtf1"));
        assert!(text.ends_with("}\n"));

        let mut depth = 0i32;
        let mut chars = text.chars();
        while let Some(c) = chars.next() {
            match c {
                '\\' => {
                    chars.next();
                }
                '{' => depth += 1,
                '}' => depth -= 1,
                _ => {}
            }
            assert!(depth >= 0);
        }
        assert_eq!(depth, 0);
    }
}
