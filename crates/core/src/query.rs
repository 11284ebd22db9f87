//! List query parameters for the dispatch listing.
//!
//! [`ListQuery`] is the full set of view parameters that shapes a request
//! to `/api/v1/dispatches/list`. Two queries that compare equal produce the
//! same request; the refresh token is deliberately not part of it.

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::status::DispatchStatus;

// ---------------------------------------------------------------------------
// Sort column / direction
// ---------------------------------------------------------------------------

/// Columns the backend can sort the dispatch listing by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortColumn {
    LatticeName,
    Status,
    StartedAt,
    EndedAt,
    Runtime,
    TotalElectrons,
}

impl SortColumn {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::LatticeName => "lattice_name",
            Self::Status => "status",
            Self::StartedAt => "started_at",
            Self::EndedAt => "ended_at",
            Self::Runtime => "runtime",
            Self::TotalElectrons => "total_electrons",
        }
    }

    pub fn parse(s: &str) -> Result<Self, CoreError> {
        match s {
            "lattice_name" => Ok(Self::LatticeName),
            "status" => Ok(Self::Status),
            "started_at" => Ok(Self::StartedAt),
            "ended_at" => Ok(Self::EndedAt),
            "runtime" => Ok(Self::Runtime),
            "total_electrons" => Ok(Self::TotalElectrons),
            other => Err(CoreError::UnknownVariant {
                kind: "sort column",
                value: other.to_string(),
            }),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortDirection {
    Asc,
    #[default]
    Desc,
}

impl SortDirection {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Asc => "asc",
            Self::Desc => "desc",
        }
    }

    pub fn flipped(self) -> Self {
        match self {
            Self::Asc => Self::Desc,
            Self::Desc => Self::Asc,
        }
    }
}

// ---------------------------------------------------------------------------
// Status filter
// ---------------------------------------------------------------------------

/// Status filter applied server-side. `All` disables filtering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StatusFilter {
    #[default]
    All,
    Running,
    Completed,
    Failed,
    Cancelled,
}

impl StatusFilter {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::All => "ALL",
            Self::Running => "RUNNING",
            Self::Completed => "COMPLETED",
            Self::Failed => "FAILED",
            Self::Cancelled => "CANCELLED",
        }
    }

    /// Parse a filter name, case-insensitively.
    pub fn parse(s: &str) -> Result<Self, CoreError> {
        match s.to_ascii_uppercase().as_str() {
            "ALL" => Ok(Self::All),
            "RUNNING" => Ok(Self::Running),
            "COMPLETED" => Ok(Self::Completed),
            "FAILED" => Ok(Self::Failed),
            "CANCELLED" => Ok(Self::Cancelled),
            _ => Err(CoreError::UnknownVariant {
                kind: "status filter",
                value: s.to_string(),
            }),
        }
    }

    /// Whether a record with `status` passes this filter.
    pub fn matches(&self, status: DispatchStatus) -> bool {
        match self {
            Self::All => true,
            Self::Running => status == DispatchStatus::Running,
            Self::Completed => status == DispatchStatus::Completed,
            Self::Failed => status == DispatchStatus::Failed,
            Self::Cancelled => status == DispatchStatus::Cancelled,
        }
    }
}

// ---------------------------------------------------------------------------
// ListQuery
// ---------------------------------------------------------------------------

/// Current view parameters of the dispatch listing.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ListQuery {
    pub sort_column: SortColumn,
    pub sort_direction: SortDirection,
    /// Committed search text (never the in-progress draft).
    pub search: String,
    /// Zero-based row offset, always a multiple of the page size.
    pub offset: u64,
    pub status_filter: StatusFilter,
}

impl Default for ListQuery {
    fn default() -> Self {
        Self {
            sort_column: SortColumn::StartedAt,
            sort_direction: SortDirection::Desc,
            search: String::new(),
            offset: 0,
            status_filter: StatusFilter::All,
        }
    }
}

impl ListQuery {
    /// Apply a header click: the active column flips direction, any other
    /// column becomes active with a descending sort. Resets the offset.
    pub fn click_sort(&mut self, column: SortColumn) {
        if self.sort_column == column {
            self.sort_direction = self.sort_direction.flipped();
        } else {
            self.sort_column = column;
            self.sort_direction = SortDirection::default();
        }
        self.offset = 0;
    }

    /// Change the status filter. Returns `false` if it was already active.
    pub fn set_status_filter(&mut self, filter: StatusFilter) -> bool {
        if self.status_filter == filter {
            return false;
        }
        self.status_filter = filter;
        self.offset = 0;
        true
    }

    /// Commit a new search string. Returns `false` if nothing changed.
    pub fn set_search(&mut self, search: &str) -> bool {
        if self.search == search {
            return false;
        }
        self.search = search.to_string();
        self.offset = 0;
        true
    }

    /// 1-based page index of the current offset.
    pub fn page(&self, page_size: u32) -> u32 {
        if page_size == 0 {
            return 1;
        }
        (self.offset / u64::from(page_size)) as u32 + 1
    }

    /// Query-string parameters for `/api/v1/dispatches/list`.
    pub fn to_params(&self, page_size: u32) -> Vec<(&'static str, String)> {
        vec![
            ("count", page_size.to_string()),
            ("offset", self.offset.to_string()),
            ("search", self.search.clone()),
            ("sort_by", self.sort_column.as_str().to_string()),
            ("sort_direction", self.sort_direction.as_str().to_string()),
            ("status_filter", self.status_filter.as_str().to_string()),
        ]
    }
}

/// Translate a 1-based page index into a zero-based row offset.
pub fn page_offset(page: u32, page_size: u32) -> Result<u64, CoreError> {
    if page == 0 {
        return Err(CoreError::Validation("page must be >= 1".into()));
    }
    Ok(u64::from(page - 1) * u64::from(page_size))
}

/// Number of pages needed to show `total` rows. An empty listing still has
/// one (empty) page.
pub fn page_count(total: u64, page_size: u32) -> u32 {
    if page_size == 0 || total == 0 {
        return 1;
    }
    total.div_ceil(u64::from(page_size)) as u32
}
