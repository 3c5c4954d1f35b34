//! Census sheet normalizer.
//!
//! Turns a [`RawSheet`] into a [`CleanTable`] by fixed-position drops and
//! renames described by a [`SheetLayout`]:
//!
//! ```text
//! RawSheet ─▶ drop spacer + repeated heading rows ─▶ drop repeated locale columns
//!          ─▶ parse counts ─▶ Total / Stayed ─▶ drop MOE, abroad, summary
//!          ─▶ name inflow columns after the state rows ─▶ CleanTable
//! ```
//!
//! Every step works on an owned copy; the caller's sheet is never touched.
//! A sheet that does not match the layout fails at the first step that
//! relies on it.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::{NormalizeError, NormalizeResult};
use crate::layout::SheetLayout;
use crate::logs::{log_info, log_success};
use crate::models::{CleanTable, LocaleRow, STAYED_COLUMN, TOTAL_COLUMN};
use crate::parser::{RawRow, RawSheet};

/// Plain or thousands-grouped decimal number
static NUMERIC_CELL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^-?(\d{1,3}(,\d{3})+|\d+)(\.\d+)?$").expect("valid numeric cell pattern")
});

/// Rows and labelled text columns, before counts are parsed
struct TextFrame {
    headers: Vec<String>,
    rows: Vec<RawRow>,
}

/// Locale names plus labelled integer columns
struct CountFrame {
    locales: Vec<String>,
    columns: Vec<(String, Vec<i64>)>,
}

/// Normalize the raw census sheet into the clean migration table.
pub fn normalize(raw: &RawSheet, layout: &SheetLayout) -> NormalizeResult<CleanTable> {
    log_info("Normalizing migration table...");

    let mut frame = TextFrame {
        headers: raw.headers.clone(),
        rows: raw.rows.clone(),
    };

    frame.drop_spacer_rows();
    frame.drop_row_at(layout.duplicate_heading_row)?;
    for col in layout.duplicate_heading_columns() {
        frame.drop_column(&format!("Unnamed: {}", col))?;
    }
    log_info(format!(
        "{} locale rows, {} columns after removing repeated headings",
        frame.rows.len(),
        frame.headers.len()
    ));

    let mut counts = frame.into_counts()?;

    counts.rename(&layout.estimate(0), TOTAL_COLUMN)?;

    let [same_house, same_state] = layout.stayed_columns;
    let same_house = counts.take(&layout.estimate(same_house))?;
    let same_state = counts.take(&layout.estimate(same_state))?;
    let stayed = same_house.iter().zip(&same_state).map(|(a, b)| a + b).collect();
    counts.columns.insert(1, (STAYED_COLUMN.to_string(), stayed));

    counts.take(&layout.moe(0))?;
    for i in 1..=layout.moe_columns {
        counts.take(&layout.moe(i))?;
    }
    for i in layout.abroad_column_range() {
        counts.take(&layout.estimate(i))?;
    }
    counts.take(&layout.estimate(layout.different_state_column))?;

    let table = counts.into_table(layout)?;
    let (rows, columns) = table.shape();
    log_success(format!("Clean table: {} rows x {} columns", rows, columns));
    Ok(table)
}

impl TextFrame {
    /// Rows whose locale cell is empty only separate blocks of states
    fn drop_spacer_rows(&mut self) {
        self.rows
            .retain(|row| row.cells.first().is_some_and(|c| !c.trim().is_empty()));
    }

    /// Drop the row first read at `position`; reindexing is implicit.
    fn drop_row_at(&mut self, position: usize) -> NormalizeResult<()> {
        let index = self
            .rows
            .iter()
            .position(|row| row.position == position)
            .ok_or(NormalizeError::MissingRow(position))?;
        self.rows.remove(index);
        Ok(())
    }

    fn drop_column(&mut self, label: &str) -> NormalizeResult<()> {
        let index = self
            .headers
            .iter()
            .position(|h| h == label)
            .ok_or_else(|| NormalizeError::MissingColumn(label.to_string()))?;
        self.headers.remove(index);
        for row in &mut self.rows {
            row.cells.remove(index);
        }
        Ok(())
    }

    /// Split off the locale column and parse every other column as counts.
    fn into_counts(self) -> NormalizeResult<CountFrame> {
        let locales = self
            .rows
            .iter()
            .map(|row| row.cells[0].trim().to_string())
            .collect();

        let mut columns = Vec::with_capacity(self.headers.len().saturating_sub(1));
        for (col, label) in self.headers.iter().enumerate().skip(1) {
            let values = self
                .rows
                .iter()
                .map(|row| parse_count(&row.cells[col], row.position, label))
                .collect::<NormalizeResult<Vec<i64>>>()?;
            columns.push((label.clone(), values));
        }

        Ok(CountFrame { locales, columns })
    }
}

impl CountFrame {
    fn position(&self, label: &str) -> NormalizeResult<usize> {
        self.columns
            .iter()
            .position(|(l, _)| l == label)
            .ok_or_else(|| NormalizeError::MissingColumn(label.to_string()))
    }

    fn rename(&mut self, from: &str, to: &str) -> NormalizeResult<()> {
        let index = self.position(from)?;
        self.columns[index].0 = to.to_string();
        Ok(())
    }

    /// Remove a column and hand back its values
    fn take(&mut self, label: &str) -> NormalizeResult<Vec<i64>> {
        let index = self.position(label)?;
        Ok(self.columns.remove(index).1)
    }

    /// Name the inflow columns after the state rows and check the shape.
    fn into_table(mut self, layout: &SheetLayout) -> NormalizeResult<CleanTable> {
        if self.locales.len() != layout.expected_rows() {
            return Err(NormalizeError::Shape {
                what: "rows",
                expected: layout.expected_rows(),
                actual: self.locales.len(),
            });
        }
        let total_columns = self.columns.len() + 1;
        if total_columns != layout.expected_columns() {
            return Err(NormalizeError::Shape {
                what: "columns",
                expected: layout.expected_columns(),
                actual: total_columns,
            });
        }

        let total = self.take(TOTAL_COLUMN)?;
        let stayed = self.take(STAYED_COLUMN)?;

        let states: Vec<String> = self.locales[1..].to_vec();
        let mut inflow_columns = Vec::with_capacity(states.len());
        for estimate in layout.state_columns() {
            inflow_columns.push(self.take(&layout.estimate(estimate))?);
        }

        let mut rows = Vec::with_capacity(self.locales.len());
        for (i, name) in self.locales.into_iter().enumerate() {
            if stayed[i] > total[i] {
                return Err(NormalizeError::StayedExceedsTotal(name));
            }
            rows.push(LocaleRow {
                name,
                total: total[i],
                stayed: stayed[i],
                inflows: inflow_columns.iter().map(|col| col[i]).collect(),
            });
        }

        CleanTable::new(states, rows).map_err(|_| NormalizeError::Shape {
            what: "inflow columns",
            expected: layout.state_count,
            actual: inflow_columns.len(),
        })
    }
}

/// Parse one count cell. Empty is zero; fractions truncate toward zero.
pub fn parse_count(cell: &str, row: usize, column: &str) -> NormalizeResult<i64> {
    let text = cell.trim();
    if text.is_empty() {
        return Ok(0);
    }

    let invalid = |message: &str| NormalizeError::InvalidCell {
        row,
        column: column.to_string(),
        value: text.to_string(),
        message: message.to_string(),
    };

    if !NUMERIC_CELL.is_match(text) {
        return Err(invalid("not a number"));
    }

    let digits = text.replace(',', "");
    let value = match digits.parse::<i64>() {
        Ok(v) => v,
        Err(_) => {
            let f = digits.parse::<f64>().map_err(|_| invalid("out of range"))?;
            if f.abs() >= i64::MAX as f64 {
                return Err(invalid("out of range"));
            }
            f.trunc() as i64
        }
    };

    if value < 0 {
        return Err(invalid("negative count"));
    }
    Ok(value)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// Build a census-shaped grid for `states` with the given layout
    /// offsets. Inflow from state `o` into state `d` is `10 * (o + 1)`,
    /// stayed is split 3:1 between same house and same state, and every
    /// origin's total equals stayed plus outflows.
    pub(crate) fn census_grid(states: &[&str], layout: &SheetLayout) -> Vec<Vec<String>> {
        let n = states.len();
        let inflow = |_dest: usize, origin: usize| 10 * (origin as i64 + 1);
        let stayed = |s: usize| 1_000 * (s as i64 + 1);
        let total = |s: usize| stayed(s) + inflow(0, s) * (n as i64 - 1);

        // Estimate/MOE pairs, then the repeated locale columns spliced in
        let estimates = layout.first_abroad_column + layout.abroad_columns;
        let mut heading = vec![String::new()];
        for _ in 0..estimates {
            heading.push(layout.estimate_label.clone());
            heading.push(layout.moe_label.clone());
        }
        for col in layout.duplicate_heading_columns() {
            if col <= heading.len() {
                heading.insert(col, String::new());
            }
        }

        let mut grid: Vec<Vec<String>> = Vec::new();
        for i in 0..layout.header_rows {
            grid.push(vec![format!("Title line {}", i)]);
        }
        grid.push(heading.clone());

        let locales: Vec<String> = std::iter::once("United States2".to_string())
            .chain(states.iter().map(|s| s.to_string()))
            .collect();

        let mut data: Vec<Vec<String>> = Vec::new();
        for (r, locale) in locales.iter().enumerate() {
            let mut values = vec![locale.clone()];
            for e in 0..estimates {
                let value: i64 = if r == 0 {
                    match e {
                        0 => (0..n).map(total).sum(),
                        _ => 1,
                    }
                } else {
                    let s = r - 1;
                    if e == 0 {
                        total(s)
                    } else if e == layout.stayed_columns[0] {
                        stayed(s) / 4 * 3
                    } else if e == layout.stayed_columns[1] {
                        stayed(s) - stayed(s) / 4 * 3
                    } else if layout.state_columns().contains(&e) {
                        let origin = e - layout.first_state_column;
                        if origin == s { 0 } else { inflow(s, origin) }
                    } else {
                        7
                    }
                };
                // Leave a few cells empty to exercise the zero fill
                values.push(if value == 1 && r == 0 { String::new() } else { value.to_string() });
                values.push("99".to_string());
            }
            for col in layout.duplicate_heading_columns() {
                if col <= values.len() {
                    values.insert(col, locale.clone());
                }
            }
            data.push(values);
        }

        let repeated_heading: Vec<String> = heading
            .iter()
            .map(|h| if h.is_empty() { "Locale".to_string() } else { h.clone() })
            .collect();

        // A spacer row (blank locale, stray mark) after the nation row,
        // and the repeated heading at its fixed data position
        let mut positioned = Vec::new();
        for (i, row) in data.into_iter().enumerate() {
            if i == 1 {
                positioned.push(vec![String::new(), String::new(), "*".to_string()]);
            }
            if positioned.len() == layout.duplicate_heading_row {
                positioned.push(repeated_heading.clone());
            }
            positioned.push(row);
        }
        while positioned.len() <= layout.duplicate_heading_row {
            positioned.push(repeated_heading.clone());
        }
        grid.extend(positioned);

        // Footnotes open with a blank line, as in the published sheet
        for i in 0..layout.footer_rows {
            grid.push(if i == 0 { vec![String::new()] } else { vec![format!("Footnote {}", i)] });
        }
        grid
    }

    /// 51 synthetic state names in table order
    pub(crate) fn state_names(n: usize) -> Vec<String> {
        (0..n).map(|i| format!("State {:02}", i)).collect()
    }

    fn full_table() -> CleanTable {
        let layout = SheetLayout::default();
        let names = state_names(layout.state_count);
        let refs: Vec<&str> = names.iter().map(String::as_str).collect();
        let raw = RawSheet::from_grid(census_grid(&refs, &layout), &layout).unwrap();
        normalize(&raw, &layout).unwrap()
    }

    #[test]
    fn test_parse_count() {
        assert_eq!(parse_count("", 0, "Total").unwrap(), 0);
        assert_eq!(parse_count(" 1105 ", 0, "Total").unwrap(), 1105);
        assert_eq!(parse_count("4,850,000", 0, "Total").unwrap(), 4_850_000);
        assert_eq!(parse_count("12.9", 0, "Total").unwrap(), 12);
    }

    #[test]
    fn test_parse_count_rejects_text_and_negatives() {
        let err = parse_count("N", 3, "Estimate.7").unwrap_err();
        assert!(err.to_string().contains("Estimate.7"));
        assert!(matches!(parse_count("-5", 0, "Total"), Err(NormalizeError::InvalidCell { .. })));
        assert!(parse_count("1,23", 0, "Total").is_err());
    }

    #[test]
    fn test_parse_count_out_of_range() {
        let err = parse_count("99999999999999999999.5", 4, "Total").unwrap_err();
        assert!(matches!(err, NormalizeError::InvalidCell { row: 4, ref message, .. } if message == "out of range"));
        assert!(parse_count("99999999999999999999", 4, "Total").is_err());
    }

    #[test]
    fn test_clean_table_shape() {
        let table = full_table();
        assert_eq!(table.shape(), (52, 54));
        assert_eq!(table.nation().unwrap().name, "United States2");

        let row_names: Vec<&String> = table.state_rows().iter().map(|r| &r.name).collect();
        let col_names: Vec<&String> = table.states().iter().collect();
        assert_eq!(row_names, col_names);
        assert_eq!(&table.headers()[..3], &["Locale", "Total", "Stayed"]);
    }

    #[test]
    fn test_stayed_and_counts() {
        let table = full_table();
        for row in table.rows() {
            assert!(row.stayed <= row.total, "{}", row.name);
            assert!(row.inflows.iter().all(|&v| v >= 0));
        }
        let first = table.row("State 00").unwrap();
        assert_eq!(first.stayed, 1_000);
        assert_eq!(first.inflows[0], 0);
        assert_eq!(table.inflow("State 00", "State 01"), Some(20));
        // Nation row: empty cells read as zero
        assert_eq!(table.nation().unwrap().stayed, 0);
    }

    #[test]
    fn test_raw_sheet_untouched() {
        let layout = SheetLayout::default();
        let names = state_names(layout.state_count);
        let refs: Vec<&str> = names.iter().map(String::as_str).collect();
        let raw = RawSheet::from_grid(census_grid(&refs, &layout), &layout).unwrap();
        let before = raw.clone();
        normalize(&raw, &layout).unwrap();
        assert_eq!(raw, before);
    }

    #[test]
    fn test_missing_heading_row_is_structural_error() {
        let layout = SheetLayout::default();
        let names = state_names(layout.state_count);
        let refs: Vec<&str> = names.iter().map(String::as_str).collect();
        let raw = RawSheet::from_grid(census_grid(&refs, &layout), &layout).unwrap();

        let shifted = SheetLayout {
            duplicate_heading_row: 500,
            ..layout.clone()
        };
        let err = normalize(&raw, &shifted).unwrap_err();
        assert!(matches!(err, NormalizeError::MissingRow(500)));
    }

    #[test]
    fn test_missing_state_is_row_count_error() {
        let layout = SheetLayout::default();
        let names = state_names(layout.state_count - 1);
        let refs: Vec<&str> = names.iter().map(String::as_str).collect();
        let raw = RawSheet::from_grid(census_grid(&refs, &layout), &layout).unwrap();

        let err = normalize(&raw, &layout).unwrap_err();
        assert!(matches!(err, NormalizeError::Shape { what: "rows", expected: 52, actual: 51 }));
    }

    #[test]
    fn test_small_edition_layout() {
        let layout = SheetLayout {
            header_rows: 2,
            footer_rows: 1,
            duplicate_heading_row: 2,
            duplicate_heading_start: 5,
            duplicate_heading_stride: 5,
            duplicate_heading_end: 11,
            moe_columns: 5,
            state_count: 2,
            first_abroad_column: 6,
            abroad_columns: 0,
            ..SheetLayout::default()
        };
        let raw = RawSheet::from_grid(census_grid(&["East", "West"], &layout), &layout).unwrap();
        let table = normalize(&raw, &layout).unwrap();

        assert_eq!(table.headers(), vec!["Locale", "Total", "Stayed", "East", "West"]);
        assert_eq!(table.row("West").unwrap().inflows, vec![10, 0]);
        assert_eq!(table.row("East").unwrap().total, 1_010);
    }
}
