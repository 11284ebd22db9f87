//! Line commands read from stdin.

use covalent_core::error::CoreError;
use covalent_core::query::{SortColumn, StatusFilter};
use covalent_store::Intent;

/// A parsed input line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UserCommand {
    /// Forwarded to the store unchanged.
    Store(Intent),
    /// Open the confirm dialog for the selected rows.
    Delete,
    /// Open the confirm dialog for every row matching the filter.
    DeleteAll,
    Confirm,
    Cancel,
    Logs { search: String },
    DownloadLogs,
    Settings,
    Help,
    Quit,
}

#[derive(Debug, thiserror::Error)]
pub enum CommandError {
    #[error("Unknown command {0:?}, type `help` for a list")]
    Unknown(String),

    #[error("`{command}` needs {argument}")]
    MissingArgument {
        command: &'static str,
        argument: &'static str,
    },

    #[error("Invalid page {0:?}")]
    InvalidPage(String),

    #[error(transparent)]
    Core(#[from] CoreError),
}

pub const HELP: &str = "\
commands:
  sort <column>        lattice_name | status | started_at | ended_at | runtime | total_electrons
  search [text]        update the search box (empty clears it)
  filter <status>      all | running | completed | failed | cancelled
  page <n>             go to page n
  select <id>          toggle a row
  select-all           toggle every visible row
  delete               delete selected rows (asks to confirm)
  delete-all           delete every row matching the filter (asks to confirm)
  confirm | cancel     answer the confirm dialog
  refresh              refetch the current page
  dismiss              hide the current notice
  logs [search]        show server logs
  download-logs        save the server log file
  settings             show dispatcher settings
  quit";

/// Parse one line. Returns `Ok(None)` for a blank line.
pub fn parse_command(line: &str) -> Result<Option<UserCommand>, CommandError> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(None);
    }
    let (word, rest) = match line.split_once(char::is_whitespace) {
        Some((word, rest)) => (word, rest.trim()),
        None => (line, ""),
    };

    let command = match word {
        "sort" => UserCommand::Store(Intent::SortBy(SortColumn::parse(required(
            "sort", "a column", rest,
        )?)?)),
        "search" => UserCommand::Store(Intent::SearchInput(rest.to_string())),
        "filter" => UserCommand::Store(Intent::FilterStatus(StatusFilter::parse(required(
            "filter", "a status", rest,
        )?)?)),
        "page" => {
            let raw = required("page", "a page number", rest)?;
            let page: u32 = raw
                .parse()
                .map_err(|_| CommandError::InvalidPage(raw.to_string()))?;
            UserCommand::Store(Intent::GoToPage(page))
        }
        "select" => UserCommand::Store(Intent::ToggleRow(
            required("select", "a dispatch id", rest)?.to_string(),
        )),
        "select-all" => UserCommand::Store(Intent::ToggleAll),
        "refresh" => UserCommand::Store(Intent::Refresh),
        "dismiss" => UserCommand::Store(Intent::DismissNotice),
        "delete" => UserCommand::Delete,
        "delete-all" => UserCommand::DeleteAll,
        "confirm" | "yes" => UserCommand::Confirm,
        "cancel" | "no" => UserCommand::Cancel,
        "logs" => UserCommand::Logs {
            search: rest.to_string(),
        },
        "download-logs" => UserCommand::DownloadLogs,
        "settings" => UserCommand::Settings,
        "help" | "?" => UserCommand::Help,
        "quit" | "exit" | "q" => UserCommand::Quit,
        other => return Err(CommandError::Unknown(other.to_string())),
    };
    Ok(Some(command))
}

fn required<'a>(
    command: &'static str,
    argument: &'static str,
    rest: &'a str,
) -> Result<&'a str, CommandError> {
    if rest.is_empty() {
        Err(CommandError::MissingArgument { command, argument })
    } else {
        Ok(rest)
    }
}
