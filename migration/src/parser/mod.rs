//! Raw sheet reader for the census migration workbook.
//!
//! Reads either the published spreadsheet (`.xls`, `.xlsx`, `.ods`) or a
//! delimited text export of it, and strips the header and footer
//! boilerplate. No census-specific column logic here; that lives in
//! [`crate::normalize`].

use calamine::{open_workbook_auto, Data, Reader};
use std::collections::HashMap;
use std::path::Path;

use crate::error::{NormalizeError, ReadError, ReadResult};
use crate::layout::SheetLayout;
use crate::logs::{log_info, log_success};

/// Extensions routed to the spreadsheet reader instead of the CSV reader
const SPREADSHEET_EXTENSIONS: [&str; 5] = ["xls", "xlsx", "xlsm", "xlsb", "ods"];

/// Lines inspected when guessing the delimiter of a text export
const DELIMITER_SAMPLE_LINES: usize = 20;

/// One data row of the raw sheet
#[derive(Debug, Clone, PartialEq)]
pub struct RawRow {
    /// Position among the data rows as first read, before any drop
    pub position: usize,
    /// Cell text, padded to the header width
    pub cells: Vec<String>,
}

/// A sheet with boilerplate removed and unique column labels
#[derive(Debug, Clone, PartialEq)]
pub struct RawSheet {
    /// Column labels, deduplicated (`Estimate`, `Estimate.1`, `Unnamed: 11`, ...)
    pub headers: Vec<String>,
    /// Data rows between the heading row and the footer
    pub rows: Vec<RawRow>,
}

impl RawSheet {
    /// Build a sheet from a full cell grid, skipping the layout's header
    /// and footer rows.
    ///
    /// Header and footer are fixed counts of sheet rows, blank or not. In
    /// between, the first non-blank row is the heading row and fully blank
    /// rows are skipped before data rows are numbered.
    pub fn from_grid(mut grid: Vec<Vec<String>>, layout: &SheetLayout) -> Result<Self, NormalizeError> {
        let minimum = layout.header_rows + 1 + layout.footer_rows;
        if grid.len() < minimum {
            return Err(NormalizeError::Shape {
                what: "sheet rows",
                expected: minimum,
                actual: grid.len(),
            });
        }
        grid.truncate(grid.len() - layout.footer_rows);

        let mut body = grid.into_iter().skip(layout.header_rows).filter(|row| !is_blank(row));

        let header_cells = body.next().ok_or(NormalizeError::Shape {
            what: "sheet rows",
            expected: minimum,
            actual: layout.header_rows + layout.footer_rows,
        })?;

        let data: Vec<Vec<String>> = body.collect();

        let width = data
            .iter()
            .map(Vec::len)
            .chain(std::iter::once(header_cells.len()))
            .max()
            .unwrap_or(0);

        let headers = unique_headers(&header_cells, width);
        let rows = data
            .into_iter()
            .enumerate()
            .map(|(position, mut cells)| {
                cells.resize(width, String::new());
                RawRow { position, cells }
            })
            .collect();

        Ok(Self { headers, rows })
    }

    /// Index of a column label
    pub fn column(&self, label: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == label)
    }
}

/// Label heading cells the way spreadsheet loaders do: blanks become
/// `Unnamed: <index>`, repeats get a `.<n>` suffix.
pub fn unique_headers(cells: &[String], width: usize) -> Vec<String> {
    let mut seen: HashMap<String, usize> = HashMap::new();
    let mut used: Vec<String> = Vec::with_capacity(width);

    for i in 0..width {
        let raw = cells.get(i).map(|c| c.trim()).unwrap_or("");
        let base = if raw.is_empty() {
            format!("Unnamed: {}", i)
        } else {
            raw.to_string()
        };

        let label = match seen.get(&base).copied() {
            None => {
                seen.insert(base.clone(), 0);
                base
            }
            Some(mut count) => {
                let mut candidate;
                loop {
                    count += 1;
                    candidate = format!("{}.{}", base, count);
                    if !used.contains(&candidate) {
                        break;
                    }
                }
                seen.insert(base, count);
                candidate
            }
        };
        used.push(label);
    }

    used
}

fn is_blank(row: &[String]) -> bool {
    row.iter().all(|c| c.trim().is_empty())
}

/// Read the census sheet at `path` and strip its boilerplate.
///
/// Spreadsheet files go through calamine (first worksheet); anything else
/// is read as delimited text with encoding and delimiter detection.
pub fn read_sheet<P: AsRef<Path>>(path: P, layout: &SheetLayout) -> ReadResult<RawSheet> {
    let path = path.as_ref();
    log_info(format!("Reading {}", path.display()));

    let is_spreadsheet = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| SPREADSHEET_EXTENSIONS.contains(&e.to_lowercase().as_str()));

    let grid = if is_spreadsheet {
        read_spreadsheet_grid(path)?
    } else {
        let bytes = std::fs::read(path)?;
        read_text_grid(&bytes)?
    };

    if grid.is_empty() {
        return Err(ReadError::EmptySheet);
    }

    let sheet = RawSheet::from_grid(grid, layout)?;
    log_success(format!(
        "Read {} data rows, {} columns",
        sheet.rows.len(),
        sheet.headers.len()
    ));
    Ok(sheet)
}

/// Read the first worksheet into a grid anchored at cell A1.
pub fn read_spreadsheet_grid(path: &Path) -> ReadResult<Vec<Vec<String>>> {
    let mut workbook = open_workbook_auto(path)?;
    let range = workbook
        .worksheet_range_at(0)
        .ok_or(ReadError::NoWorksheet)??;

    // calamine trims leading empty rows/columns; put them back so fixed
    // offsets still count from A1.
    let (top, left) = range
        .start()
        .map(|(r, c)| (r as usize, c as usize))
        .unwrap_or((0, 0));

    let mut grid: Vec<Vec<String>> = vec![Vec::new(); top];
    for row in range.rows() {
        let mut cells = vec![String::new(); left];
        cells.extend(row.iter().map(cell_text));
        grid.push(cells);
    }
    Ok(grid)
}

fn cell_text(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::String(s) => s.clone(),
        Data::Int(i) => i.to_string(),
        Data::Float(f) if f.fract() == 0.0 && f.abs() < i64::MAX as f64 => (*f as i64).to_string(),
        other => other.to_string(),
    }
}

/// Decode a delimited text export into a grid.
pub fn read_text_grid(bytes: &[u8]) -> ReadResult<Vec<Vec<String>>> {
    let encoding = detect_encoding(bytes);
    let content = decode_content(bytes, &encoding);
    let delimiter = detect_delimiter(&content);
    log_info(format!(
        "Encoding: {}, delimiter: '{}'",
        encoding,
        format_delimiter(delimiter)
    ));

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .delimiter(delimiter)
        .from_reader(content.as_bytes());

    let mut grid = Vec::new();
    for record in reader.records() {
        let record = record?;
        grid.push(record.iter().map(|c| c.trim().to_string()).collect());
    }
    Ok(grid)
}

/// Detect the encoding of raw bytes using chardet
pub fn detect_encoding(bytes: &[u8]) -> String {
    let result = chardet::detect(bytes);
    let charset = result.0;

    // Normalize charset names
    match charset.to_lowercase().as_str() {
        "ascii" | "utf-8" | "utf8" | "" => "utf-8".to_string(),
        "iso-8859-1" | "iso-8859-15" | "latin-1" | "latin1" => "iso-8859-1".to_string(),
        "windows-1252" | "cp1252" => "windows-1252".to_string(),
        _ => charset,
    }
}

/// Decode bytes to string using the specified encoding
pub fn decode_content(bytes: &[u8], encoding: &str) -> String {
    match encoding.to_lowercase().as_str() {
        "iso-8859-1" | "latin-1" | "latin1" => encoding_rs::ISO_8859_15.decode(bytes).0.into_owned(),
        "windows-1252" | "cp1252" => encoding_rs::WINDOWS_1252.decode(bytes).0.into_owned(),
        // UTF-8 and anything unknown: lossy UTF-8
        _ => String::from_utf8_lossy(bytes).into_owned(),
    }
}

/// Detect the delimiter by counting occurrences over the first lines.
///
/// Census exports start with title lines that may hold no separator at
/// all, so a single line is not enough.
pub fn detect_delimiter(content: &str) -> u8 {
    let sample: Vec<&str> = content.lines().take(DELIMITER_SAMPLE_LINES).collect();

    let separators = [b',', b';', b'\t', b'|'];
    let mut best_sep = b',';
    let mut best_count = 0;

    for &sep in &separators {
        let count: usize = sample
            .iter()
            .map(|line| line.bytes().filter(|&b| b == sep).count())
            .sum();
        if count > best_count {
            best_count = count;
            best_sep = sep;
        }
    }

    best_sep
}

fn format_delimiter(d: u8) -> &'static str {
    match d {
        b',' => ",",
        b';' => ";",
        b'\t' => "TAB",
        b'|' => "|",
        _ => "?",
    }
}
