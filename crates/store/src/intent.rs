//! User gestures forwarded by the view.

use covalent_core::query::{SortColumn, StatusFilter};
use covalent_core::types::DispatchId;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "intent", content = "value", rename_all = "snake_case")]
pub enum Intent {
    /// Header click on a sortable column.
    SortBy(SortColumn),
    /// Raw search-box contents after a keystroke.
    SearchInput(String),
    /// 1-based page index.
    GoToPage(u32),
    FilterStatus(StatusFilter),
    ToggleRow(DispatchId),
    ToggleAll,
    /// Delete every selected row. Sent after the user confirmed.
    ConfirmDelete,
    /// Delete every dispatch matching the current status filter.
    DeleteAll,
    DismissNotice,
    Refresh,
}
