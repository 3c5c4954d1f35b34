//! End-to-end report: census sheet in, tables and matrices out.
//!
//! ```text
//! sheet ─▶ RawSheet ─▶ CleanTable ─▶ full TransitionMatrix
//!                              └──▶ California/New York subset ─▶ 2x2 ─▶ 3x3 with Other
//! ```

use std::io::Write;
use std::path::Path;

use crate::error::PipelineResult;
use crate::layout::SheetLayout;
use crate::logs::{log_info, log_success};
use crate::markov::{build_transition_matrix, close_with_other};
use crate::normalize::normalize;
use crate::parser::read_sheet;

/// States of the worked two-state example
pub const EXAMPLE_STATES: [&str; 2] = ["California", "New York"];

/// Read the sheet at `path` and write the report sections to `out`:
/// clean table, full transition matrix, two-state subset, its matrix and
/// the same matrix closed with an `Other` state.
pub fn run_report<W: Write>(path: &Path, layout: &SheetLayout, out: &mut W) -> PipelineResult<()> {
    let raw = read_sheet(path, layout)?;
    let table = normalize(&raw, layout)?;

    writeln!(out, "# Clean table")?;
    table.write_csv(&mut *out)?;

    log_info("Building transition matrix...");
    let full = build_transition_matrix(&table)?;
    writeln!(out)?;
    writeln!(out, "# Transition matrix ({} states)", full.dim())?;
    writeln!(out, "{}", full)?;

    log_info(format!("Worked example: {}", EXAMPLE_STATES.join(" / ")));
    let subset = table.subset(&EXAMPLE_STATES)?;
    writeln!(out)?;
    writeln!(out, "# Subset table")?;
    subset.write_csv(&mut *out)?;

    let open = build_transition_matrix(&subset)?;
    writeln!(out)?;
    writeln!(out, "# Subset transition matrix")?;
    writeln!(out, "{}", open)?;

    let closed = close_with_other(&subset)?;
    writeln!(out)?;
    writeln!(out, "# Subset transition matrix with Other")?;
    writeln!(out, "{}", closed)?;

    log_success("Report complete");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{PipelineError, ProjectionError};
    use crate::normalize::tests::{census_grid, state_names};

    fn write_grid(grid: &[Vec<String>]) -> tempfile::NamedTempFile {
        let file = tempfile::Builder::new().suffix(".csv").tempfile().unwrap();
        let mut writer = csv::WriterBuilder::new()
            .flexible(true)
            .from_path(file.path())
            .unwrap();
        for row in grid {
            writer.write_record(row).unwrap();
        }
        writer.flush().unwrap();
        file
    }

    fn names_with_example_states() -> Vec<String> {
        let mut names = state_names(51);
        names[4] = "California".to_string();
        names[32] = "New York".to_string();
        names
    }

    #[test]
    fn test_report_sections_in_order() {
        let layout = SheetLayout::default();
        let names = names_with_example_states();
        let refs: Vec<&str> = names.iter().map(String::as_str).collect();
        let file = write_grid(&census_grid(&refs, &layout));

        let mut out = Vec::new();
        run_report(file.path(), &layout, &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();

        let headings: Vec<&str> = text.lines().filter(|l| l.starts_with('#')).collect();
        assert_eq!(
            headings,
            vec![
                "# Clean table",
                "# Transition matrix (51 states)",
                "# Subset table",
                "# Subset transition matrix",
                "# Subset transition matrix with Other",
            ]
        );
        assert!(text.contains("Locale,Total,Stayed,California,New York\n"));
        assert!(text.lines().any(|l| l.starts_with("Other")));
    }

    #[test]
    fn test_full_matrix_is_closed() {
        let layout = SheetLayout::default();
        let names = names_with_example_states();
        let refs: Vec<&str> = names.iter().map(String::as_str).collect();
        let file = write_grid(&census_grid(&refs, &layout));

        let table = normalize(&read_sheet(file.path(), &layout).unwrap(), &layout).unwrap();
        let full = build_transition_matrix(&table).unwrap();
        assert_eq!(full.dim(), 51);
        assert!(full.is_column_stochastic(1e-9), "{:?}", full.column_sums());

        let closed = close_with_other(&table.subset(&EXAMPLE_STATES).unwrap()).unwrap();
        assert_eq!(closed.dim(), 3);
        assert!(closed.is_column_stochastic(1e-9), "{:?}", closed.column_sums());
    }

    #[test]
    fn test_report_without_example_states() {
        let layout = SheetLayout::default();
        let names = state_names(51);
        let refs: Vec<&str> = names.iter().map(String::as_str).collect();
        let file = write_grid(&census_grid(&refs, &layout));

        let mut out = Vec::new();
        let err = run_report(file.path(), &layout, &mut out).unwrap_err();
        assert!(matches!(err, PipelineError::Projection(ProjectionError::UnknownLocale(_))));
    }
}
