//! Menu-driven interactive shell over the ingest pipeline and the store.
//!
//! The shell reads from any `BufRead` and writes to any `Write`, so the binary
//! runs it on stdin/stdout and tests drive it with scripted buffers. End of
//! input always exits cleanly.

#[cfg(feature = "plot")]
mod visualize;

use crate::config::WarehouseConfig;
use crate::ingest::{IngestError, Ingestor};
use crate::store::TableStore;
use std::io::{BufRead, Write};
use thiserror::Error;
use tracing::{debug, warn};

#[derive(Error, Debug)]
pub enum ShellError {
    #[error("Invalid selection.")]
    InvalidSelection,
    #[error("Invalid input.")]
    InvalidInput(String),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Ingest(#[from] IngestError),
}

/// Parse a 1-based menu choice into an index below `len`.
pub fn parse_selection(input: &str, len: usize) -> Result<usize, ShellError> {
    let input = input.trim();
    let choice: usize = input
        .parse()
        .map_err(|_| ShellError::InvalidInput(input.to_string()))?;
    if (1..=len).contains(&choice) {
        Ok(choice - 1)
    } else {
        Err(ShellError::InvalidSelection)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShellOptions {
    /// Offer the Visualize entry. Ignored when built without plotting.
    pub plotting: bool,
}

impl Default for ShellOptions {
    fn default() -> Self {
        Self {
            plotting: cfg!(feature = "plot"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum MenuAction {
    Process,
    View,
    Visualize,
    Exit,
}

impl MenuAction {
    fn label(self) -> &'static str {
        match self {
            MenuAction::Process => "Process a file/URL",
            MenuAction::View => "View data",
            MenuAction::Visualize => "Visualize data",
            MenuAction::Exit => "Exit",
        }
    }
}

/// Whether the menu loop keeps going after a flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Flow {
    Continue,
    Exit,
}

/// Outcome of a numbered prompt.
enum Selection {
    Picked(usize),
    Rejected,
    Eof,
}

pub struct Shell<R, W> {
    input: R,
    output: W,
    config: WarehouseConfig,
    ingestor: Ingestor,
    actions: Vec<MenuAction>,
}

impl<R: BufRead, W: Write> Shell<R, W> {
    pub fn new(
        config: WarehouseConfig,
        options: ShellOptions,
        input: R,
        output: W,
    ) -> Result<Self, ShellError> {
        let ingestor = Ingestor::from_config(&config)?;
        let mut actions = vec![MenuAction::Process, MenuAction::View];
        if options.plotting && cfg!(feature = "plot") {
            actions.push(MenuAction::Visualize);
        }
        actions.push(MenuAction::Exit);

        Ok(Self {
            input,
            output,
            config,
            ingestor,
            actions,
        })
    }

    fn store(&self) -> &TableStore {
        self.ingestor.store()
    }

    /// Run the menu loop until Exit or end of input.
    pub fn run(&mut self) -> Result<(), ShellError> {
        loop {
            writeln!(self.output, "\nWarehouse CLI Options:")?;
            for (i, action) in self.actions.iter().enumerate() {
                writeln!(self.output, "{}. {}", i + 1, action.label())?;
            }

            let prompt = format!("Select an option (1-{}): ", self.actions.len());
            let Some(choice) = self.prompt(&prompt)? else {
                break;
            };
            let action = choice
                .parse::<usize>()
                .ok()
                .and_then(|n| n.checked_sub(1))
                .and_then(|i| self.actions.get(i).copied());

            let flow = match action {
                Some(MenuAction::Process) => self.process()?,
                Some(MenuAction::View) => self.view()?,
                Some(MenuAction::Visualize) => self.visualize()?,
                Some(MenuAction::Exit) => Flow::Exit,
                None => {
                    writeln!(self.output, "Invalid option. Please try again.")?;
                    Flow::Continue
                }
            };
            if flow == Flow::Exit {
                break;
            }
        }
        writeln!(self.output, "Exiting.")?;
        Ok(())
    }

    /// Print `text`, then read one trimmed line. `None` at end of input.
    fn prompt(&mut self, text: &str) -> Result<Option<String>, ShellError> {
        write!(self.output, "{text}")?;
        self.output.flush()?;

        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            writeln!(self.output)?;
            return Ok(None);
        }
        Ok(Some(line.trim().to_string()))
    }

    /// Prompt for a 1-based choice among `len` entries, reporting bad input.
    fn select(&mut self, text: &str, len: usize) -> Result<Selection, ShellError> {
        let Some(answer) = self.prompt(text)? else {
            return Ok(Selection::Eof);
        };
        match parse_selection(&answer, len) {
            Ok(index) => Ok(Selection::Picked(index)),
            Err(e) => {
                debug!(answer = %answer, "rejected selection");
                writeln!(self.output, "{e}")?;
                Ok(Selection::Rejected)
            }
        }
    }

    /// Print the numbered table list. `None` when the store is empty or unreadable.
    fn list_tables(&mut self) -> Result<Option<Vec<String>>, ShellError> {
        let tables = match self.store().list() {
            Ok(tables) => tables,
            Err(e) => {
                writeln!(self.output, "Error: {e}")?;
                return Ok(None);
            }
        };
        if tables.is_empty() {
            writeln!(self.output, "No tables found in the database.")?;
            return Ok(None);
        }

        writeln!(self.output, "Available tables:")?;
        for (i, table) in tables.iter().enumerate() {
            writeln!(self.output, "{}. {}", i + 1, table)?;
        }
        Ok(Some(tables))
    }

    fn process(&mut self) -> Result<Flow, ShellError> {
        if let Ok(cwd) = std::env::current_dir() {
            writeln!(self.output, "Current working directory: {}", cwd.display())?;
        }

        let file = loop {
            let Some(source) = self.prompt("Enter path to file or URL: ")? else {
                return Ok(Flow::Exit);
            };
            match self.ingestor.fetch(&source) {
                Ok(file) => break file,
                Err(e) if e.is_not_found() => {
                    writeln!(self.output, "File not found: {source}")?;
                    let Some(retry) = self.prompt("Try again? (y/n): ")? else {
                        return Ok(Flow::Exit);
                    };
                    if !retry.eq_ignore_ascii_case("y") {
                        return Ok(Flow::Continue);
                    }
                }
                Err(e) => {
                    warn!(source = %source, error = %e, "fetch failed");
                    writeln!(self.output, "Error: {e}")?;
                    return Ok(Flow::Continue);
                }
            }
        };

        let prepared = match self.ingestor.prepare(file) {
            Ok(prepared) => prepared,
            Err(e) => {
                warn!(error = %e, "load failed");
                writeln!(self.output, "Error: {e}")?;
                return Ok(Flow::Continue);
            }
        };

        let text = format!(
            "Enter table name to store data (default: {}): ",
            self.config.default_table
        );
        let Some(table) = self.prompt(&text)? else {
            return Ok(Flow::Exit);
        };
        let table = if table.is_empty() {
            self.config.default_table.clone()
        } else {
            table
        };

        match self.ingestor.persist(&table, prepared) {
            Ok(report) => {
                let db = self.store().db_path().display().to_string();
                writeln!(
                    self.output,
                    "Data loaded into {db} (table: {})",
                    report.table
                )?;
                writeln!(
                    self.output,
                    "{} rows stored, {} incomplete rows dropped",
                    report.rows, report.rows_dropped
                )?;
            }
            Err(e) => writeln!(self.output, "Error: {e}")?,
        }
        Ok(Flow::Continue)
    }

    fn view(&mut self) -> Result<Flow, ShellError> {
        let Some(tables) = self.list_tables()? else {
            return Ok(Flow::Continue);
        };
        let index = match self.select("Select a table to view (number): ", tables.len())? {
            Selection::Picked(index) => index,
            Selection::Rejected => return Ok(Flow::Continue),
            Selection::Eof => return Ok(Flow::Exit),
        };

        match self.store().describe(&tables[index]) {
            Ok(desc) => {
                writeln!(self.output, "\nTable: {}", desc.name)?;
                writeln!(self.output, "Rows: {}", desc.row_count)?;
                writeln!(self.output, "Columns: {}", desc.columns.join(", "))?;
                writeln!(self.output, "Sample data:")?;
                writeln!(self.output, "{}\n", desc.sample)?;
            }
            Err(e) => writeln!(self.output, "Error: {e}")?,
        }
        Ok(Flow::Continue)
    }

    #[cfg(not(feature = "plot"))]
    fn visualize(&mut self) -> Result<Flow, ShellError> {
        writeln!(self.output, "Plotting is not available in this build.")?;
        Ok(Flow::Continue)
    }
}
