//! State migration CLI - clean a census migration workbook and print its
//! transition matrices.
//!
//! ```bash
//! state-migration State_to_State_Migrations_Table_2019.xls
//! ```
//!
//! Output goes to stdout in this order: the clean table, the full
//! transition matrix, the California/New York subset, its matrix, and the
//! subset matrix closed with an `Other` state. Progress goes to stderr.

use clap::Parser;
use state_migration::logs::{self, log_error};
use state_migration::{run_report, PipelineError, SheetLayout};
use std::io::{self, Write};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "state-migration")]
#[command(about = "Clean a census state-to-state migration table and build its Markov transition matrix", long_about = None)]
struct Cli {
    /// Census migration workbook (.xls/.xlsx) or its CSV export
    input: PathBuf,
}

fn main() {
    logs::init();

    let cli = Cli::parse();

    let stdout = io::stdout();
    let mut out = stdout.lock();
    let result = run_report(&cli.input, &SheetLayout::default(), &mut out)
        .and_then(|()| out.flush().map_err(PipelineError::from));

    if let Err(e) = result {
        log_error(e.to_string());
        std::process::exit(1);
    }
}
