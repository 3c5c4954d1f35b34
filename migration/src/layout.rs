//! Fixed structure of the published census migration table.
//!
//! The Census Bureau's "State-to-State Migration Flows" workbook has a
//! fixed shape for a given edition. Every offset and stride the normalizer
//! relies on lives here so another edition can be described by changing
//! values, not logic.

use serde::{Deserialize, Serialize};

/// Structural constants of one edition of the migration workbook.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SheetLayout {
    /// Boilerplate rows above the estimate/MOE heading row
    pub header_rows: usize,

    /// Explanatory rows at the bottom of the sheet
    pub footer_rows: usize,

    /// Data row position of the heading repeated mid-table
    pub duplicate_heading_row: usize,

    /// First column holding a repeated copy of the locale names
    pub duplicate_heading_start: usize,

    /// Distance between repeated locale-name columns
    pub duplicate_heading_stride: usize,

    /// Exclusive upper bound for repeated locale-name columns
    pub duplicate_heading_end: usize,

    /// Label of estimate columns (mangled as `Estimate`, `Estimate.1`, ...)
    pub estimate_label: String,

    /// Label of margin-of-error columns
    pub moe_label: String,

    /// Number of indexed MOE columns after the unlabelled-index one
    pub moe_columns: usize,

    /// Estimate indexes summed into `Stayed` (same house, same state)
    pub stayed_columns: [usize; 2],

    /// Estimate index of the "moved, different state" summary column
    pub different_state_column: usize,

    /// Estimate index of the first per-state inflow column
    pub first_state_column: usize,

    /// Number of states (50 states plus DC)
    pub state_count: usize,

    /// Estimate index of the first moved-from-abroad column
    pub first_abroad_column: usize,

    /// Number of moved-from-abroad columns
    pub abroad_columns: usize,
}

impl Default for SheetLayout {
    fn default() -> Self {
        Self::edition_2019()
    }
}

impl SheetLayout {
    /// Layout of the 2019 edition (`State_to_State_Migrations_Table_2019.xls`).
    pub fn edition_2019() -> Self {
        Self {
            header_rows: 7,
            footer_rows: 11,
            duplicate_heading_row: 36,
            duplicate_heading_start: 11,
            duplicate_heading_stride: 11,
            duplicate_heading_end: 132,
            estimate_label: "Estimate".to_string(),
            moe_label: "MOE".to_string(),
            moe_columns: 58,
            stayed_columns: [1, 2],
            different_state_column: 3,
            first_state_column: 4,
            state_count: 51,
            first_abroad_column: 55,
            abroad_columns: 4,
        }
    }

    /// Parse a layout from JSON; missing fields fall back to the 2019 edition.
    ///
    /// Library callers use this to describe another edition of the workbook
    /// without rebuilding; the command-line report always uses
    /// [`SheetLayout::default`].
    ///
    /// ```rust
    /// use state_migration::SheetLayout;
    ///
    /// let layout = SheetLayout::from_json(r#"{"footer_rows": 12}"#).unwrap();
    /// assert_eq!(layout.footer_rows, 12);
    /// assert_eq!(layout.state_count, 51);
    /// ```
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Serialize the layout to pretty JSON, the format [`SheetLayout::from_json`] reads.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Rows of the clean table: the nation aggregate plus every state.
    pub fn expected_rows(&self) -> usize {
        self.state_count + 1
    }

    /// Columns of the clean table: `Locale`, `Total`, `Stayed` and one per state.
    pub fn expected_columns(&self) -> usize {
        self.state_count + 3
    }

    /// Positions of the columns that repeat the locale names.
    pub fn duplicate_heading_columns(&self) -> Vec<usize> {
        if self.duplicate_heading_stride == 0 {
            return Vec::new();
        }
        (self.duplicate_heading_start..self.duplicate_heading_end)
            .step_by(self.duplicate_heading_stride)
            .collect()
    }

    /// Label of the estimate column with the given index (0 is unsuffixed).
    pub fn estimate(&self, index: usize) -> String {
        indexed_label(&self.estimate_label, index)
    }

    /// Label of the MOE column with the given index (0 is unsuffixed).
    pub fn moe(&self, index: usize) -> String {
        indexed_label(&self.moe_label, index)
    }

    /// Estimate indexes of the per-state inflow columns, in row order.
    pub fn state_columns(&self) -> std::ops::Range<usize> {
        self.first_state_column..self.first_state_column + self.state_count
    }

    /// Estimate indexes of the moved-from-abroad columns.
    pub fn abroad_column_range(&self) -> std::ops::Range<usize> {
        self.first_abroad_column..self.first_abroad_column + self.abroad_columns
    }
}

/// `Estimate`, `Estimate.1`, `Estimate.2`, ...
fn indexed_label(label: &str, index: usize) -> String {
    if index == 0 {
        label.to_string()
    } else {
        format!("{}.{}", label, index)
    }
}
