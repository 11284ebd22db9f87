//! List view.
//!
//! A pure projection of [`ListState`] into a [`ViewModel`], plus the only
//! state the view owns itself: whether the delete confirmation dialog is
//! open. [`render`] turns a view model into the text written to stdout.

use std::fmt::Write as _;

use covalent_core::dispatch::{DispatchOverview, DispatchRecord};
use covalent_core::query::{SortColumn, SortDirection, StatusFilter};
use covalent_core::runtime::{display_runtime, format_runtime};
use covalent_core::status::DispatchStatus;
use covalent_core::types::Timestamp;
use covalent_store::{Intent, ListState};

pub const EMPTY_MESSAGE: &str = "No results found.";
pub const UNAVAILABLE_MESSAGE: &str = "Dispatches could not be loaded.";

const TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";
const PLACEHOLDER: &str = "-";

// ---------------------------------------------------------------------------
// Local dialog state
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Dialog {
    #[default]
    Closed,
    ConfirmDelete { count: usize },
    ConfirmDeleteAll { filter: StatusFilter },
}

#[derive(Debug, Default)]
pub struct ListView {
    dialog: Dialog,
}

impl ListView {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn dialog(&self) -> &Dialog {
        &self.dialog
    }

    /// Ask to delete the selection. Returns `false` when nothing is
    /// selected.
    pub fn request_delete(&mut self, state: &ListState) -> bool {
        if state.selection.is_empty() {
            return false;
        }
        self.dialog = Dialog::ConfirmDelete {
            count: state.selection.len(),
        };
        true
    }

    pub fn request_delete_all(&mut self, state: &ListState) {
        self.dialog = Dialog::ConfirmDeleteAll {
            filter: state.query.status_filter,
        };
    }

    /// Close the dialog and return the intent it confirmed, if any.
    pub fn confirm(&mut self) -> Option<Intent> {
        match std::mem::take(&mut self.dialog) {
            Dialog::Closed => None,
            Dialog::ConfirmDelete { .. } => Some(Intent::ConfirmDelete),
            Dialog::ConfirmDeleteAll { .. } => Some(Intent::DeleteAll),
        }
    }

    pub fn cancel(&mut self) {
        self.dialog = Dialog::Closed;
    }

    pub fn model(&self, state: &ListState) -> ViewModel {
        ViewModel {
            header: Header {
                sort_column: state.query.sort_column,
                sort_direction: state.query.sort_direction,
                status_filter: state.query.status_filter,
                search: state.search_draft.clone(),
            },
            summary: state.overview.as_ref().map(summary_line),
            body: body(state),
            pagination: Pagination {
                page: state.page(),
                page_count: state.page_count(),
                total_count: state.total_count,
            },
            selected: state.selection.len(),
            toast: state.notice.as_ref().map(|n| n.message.clone()),
            dialog: dialog_prompt(&self.dialog),
        }
    }
}

// ---------------------------------------------------------------------------
// View model
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct ViewModel {
    pub header: Header,
    pub summary: Option<String>,
    pub body: Body,
    pub pagination: Pagination,
    pub selected: usize,
    pub toast: Option<String>,
    pub dialog: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Header {
    pub sort_column: SortColumn,
    pub sort_direction: SortDirection,
    pub status_filter: StatusFilter,
    pub search: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Body {
    /// Placeholder rows while the first page is loading.
    Skeleton { rows: usize },
    /// A completed fetch returned no rows.
    Empty { message: String },
    /// No page has loaded yet and the last attempt failed.
    Unavailable { message: String },
    Table { rows: Vec<RowView> },
}

#[derive(Debug, Clone, PartialEq)]
pub struct RowView {
    pub selected: bool,
    pub dispatch_id: String,
    pub lattice_name: String,
    pub status: DispatchStatus,
    pub runtime: String,
    pub started_at: String,
    pub ended_at: String,
    pub progress: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    pub page: u32,
    pub page_count: u32,
    pub total_count: u64,
}

fn body(state: &ListState) -> Body {
    if state.records.is_empty() {
        return if state.is_fetching {
            Body::Skeleton {
                rows: state.page_size as usize,
            }
        } else if state.has_loaded {
            Body::Empty {
                message: EMPTY_MESSAGE.to_string(),
            }
        } else if state.error.is_some() {
            Body::Unavailable {
                message: UNAVAILABLE_MESSAGE.to_string(),
            }
        } else {
            Body::Skeleton {
                rows: state.page_size as usize,
            }
        };
    }
    Body::Table {
        rows: state
            .records
            .iter()
            .map(|record| row(record, state))
            .collect(),
    }
}

fn row(record: &DispatchRecord, state: &ListState) -> RowView {
    let (completed, total) = record.progress();
    RowView {
        selected: state.is_selected(&record.dispatch_id),
        dispatch_id: record.dispatch_id.clone(),
        lattice_name: record.lattice_name.clone(),
        status: record.status,
        runtime: display_runtime(record, state.now)
            .map(format_runtime)
            .unwrap_or_else(|| PLACEHOLDER.to_string()),
        started_at: format_time(record.started_at),
        ended_at: format_time(record.ended_at),
        progress: format!("{completed}/{total}"),
    }
}

fn format_time(at: Option<Timestamp>) -> String {
    at.map(|t| t.format(TIME_FORMAT).to_string())
        .unwrap_or_else(|| PLACEHOLDER.to_string())
}

fn summary_line(overview: &DispatchOverview) -> String {
    let mut line = format!(
        "Total {} | Running {} | Completed {} | Failed {}",
        overview.total_jobs,
        overview.total_jobs_running,
        overview.total_jobs_completed,
        overview.total_jobs_failed,
    );
    if let Some(ms) = overview.total_dispatcher_duration {
        let _ = write!(
            line,
            " | Dispatcher time {}",
            format_runtime(chrono::Duration::milliseconds(ms))
        );
    }
    line
}

fn dialog_prompt(dialog: &Dialog) -> Option<String> {
    match dialog {
        Dialog::Closed => None,
        Dialog::ConfirmDelete { count: 1 } => {
            Some("Delete 1 selected dispatch? (confirm / cancel)".to_string())
        }
        Dialog::ConfirmDelete { count } => Some(format!(
            "Delete {count} selected dispatches? (confirm / cancel)"
        )),
        Dialog::ConfirmDeleteAll { filter: StatusFilter::All } => {
            Some("Delete ALL dispatches? (confirm / cancel)".to_string())
        }
        Dialog::ConfirmDeleteAll { filter } => Some(format!(
            "Delete all {} dispatches? (confirm / cancel)",
            filter.as_str()
        )),
    }
}

// ---------------------------------------------------------------------------
// Text rendering
// ---------------------------------------------------------------------------

pub fn render(model: &ViewModel) -> String {
    let mut out = String::new();
    let header = &model.header;
    let arrow = match header.sort_direction {
        SortDirection::Asc => '▲',
        SortDirection::Desc => '▼',
    };
    let _ = writeln!(
        out,
        "Dispatches  filter: {}  search: {:?}  sort: {} {arrow}",
        header.status_filter.as_str(),
        header.search,
        header.sort_column.as_str(),
    );
    if let Some(summary) = &model.summary {
        let _ = writeln!(out, "{summary}");
    }
    if let Some(toast) = &model.toast {
        let _ = writeln!(out, "! {toast}");
    }

    match &model.body {
        Body::Skeleton { rows } => {
            for _ in 0..*rows {
                let _ = writeln!(out, "    ░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░");
            }
        }
        Body::Empty { message } | Body::Unavailable { message } => {
            let _ = writeln!(out, "    {message}");
        }
        Body::Table { rows } => {
            for row in rows {
                let _ = writeln!(
                    out,
                    "[{}] {} {:<9} {:<24} {:<36} {:>7} {:>11}  {}  {}",
                    if row.selected { 'x' } else { ' ' },
                    row.status.glyph(),
                    row.status.label(),
                    row.lattice_name,
                    row.dispatch_id,
                    row.progress,
                    row.runtime,
                    row.started_at,
                    row.ended_at,
                );
            }
        }
    }

    let pagination = &model.pagination;
    let _ = write!(
        out,
        "Page {} of {} ({} dispatches)",
        pagination.page, pagination.page_count, pagination.total_count
    );
    if model.selected > 0 {
        let _ = write!(out, "  {} selected", model.selected);
    }
    out.push('\n');
    if let Some(prompt) = &model.dialog {
        let _ = writeln!(out, "{prompt}");
    }
    out
}
