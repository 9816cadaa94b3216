//! Paged, inline-editable grid over a Record Service
//!
//! The grid owns the full record set, the page cursor, staged edits and the
//! selection. All mutation goes through `&mut self`, so the draft map and the
//! record set only ever have one writer. Every mutating operation publishes a
//! [`GridEvent`] to subscribers so an adapter can re-render.
//!
//! `commit` holds `&mut self` across its awaits, so nothing can be staged while
//! it is pending; an adapter that accepts edits during a commit must queue them
//! and stage them once the commit returns.
//!
//! The loading flag is owned by a guard that resets it on drop, so a `load` or
//! `commit` future cancelled mid-flight (by `timeout` or `select!`) still leaves
//! the grid idle. A cancelled commit marks the grid stale and the next `commit`
//! resynchronizes with the backend even when nothing is staged.
//!
//! ```text
//! load ──► Paginator ──► page_records
//!              ▲
//! stage_edit ──► DraftSet ──► commit ──► EditBatcher (fan-out) ──► load
//! ```

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use indexmap::{IndexMap, IndexSet};
use serde_json::Value;
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

use crate::config::{ColumnConfig, GridConfig};
use crate::drafts::{check_value, CellEdit, DraftSet};
use crate::errors::{
    BatchError, BatchResult, ConfigResult, EditError, EditResult, LoadError, LoadResult,
};
use crate::notify::{Notification, NotificationSink};
use crate::paginator::Paginator;
use crate::record::{map_records, RowViewModel};
use crate::services::{CommitSummary, EditBatcher, Loader, RecordService};

pub const UPDATE_SUCCESS_MESSAGE: &str = "Records updated successfully";
pub const UPDATE_ERROR_MESSAGE: &str = "Error updating records";
pub const EMPTY_SELECTION_MESSAGE: &str = "Please select at least one record";

/// Row action name that resolves to [`RowAction::ViewDetails`]
pub const VIEW_DETAILS_ACTION: &str = "view_details";

const EVENT_CAPACITY: usize = 64;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GridEvent {
    Loaded {
        total_records: usize,
        total_pages: usize,
    },
    LoadFailed {
        message: String,
    },
    PageChanged {
        page_number: usize,
    },
    DraftsChanged {
        dirty_rows: usize,
    },
    SelectionChanged {
        selected: usize,
    },
    LoadingChanged(bool),
    Committed {
        success: bool,
    },
}

/// Navigation request produced by a row action
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RowAction {
    ViewDetails { record_id: String },
}

pub struct PagedEditableGrid {
    config: GridConfig,
    field_map: IndexMap<String, String>,
    loader: Loader,
    batcher: EditBatcher,
    notifier: Arc<dyn NotificationSink>,
    paginator: Paginator<RowViewModel>,
    drafts: DraftSet,
    selection: IndexSet<String>,
    is_loading: Arc<AtomicBool>,
    stale: Arc<AtomicBool>,
    error: Option<LoadError>,
    events: broadcast::Sender<GridEvent>,
}

impl std::fmt::Debug for PagedEditableGrid {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PagedEditableGrid")
            .field("config", &self.config)
            .field("field_map", &self.field_map)
            .field("paginator", &self.paginator)
            .field("drafts", &self.drafts)
            .field("selection", &self.selection)
            .field("is_loading", &self.is_loading)
            .field("stale", &self.stale)
            .field("error", &self.error)
            .finish_non_exhaustive()
    }
}

impl PagedEditableGrid {
    pub fn new(
        config: GridConfig,
        service: Arc<dyn RecordService>,
        notifier: Arc<dyn NotificationSink>,
    ) -> ConfigResult<Self> {
        config.validate()?;
        let (events, _) = broadcast::channel(EVENT_CAPACITY);

        Ok(Self {
            field_map: config.field_map(),
            paginator: Paginator::new(config.page_size),
            loader: Loader::new(Arc::clone(&service)),
            batcher: EditBatcher::new(service),
            notifier,
            config,
            drafts: DraftSet::new(),
            selection: IndexSet::new(),
            is_loading: Arc::new(AtomicBool::new(false)),
            stale: Arc::new(AtomicBool::new(false)),
            error: None,
            events,
        })
    }

    pub fn subscribe(&self) -> broadcast::Receiver<GridEvent> {
        self.events.subscribe()
    }

    fn emit(&self, event: GridEvent) {
        let _ = self.events.send(event);
    }

    /// Raise the loading flag until the returned guard is dropped
    ///
    /// With `reloads` set, dropping the guard before [`LoadingGuard::finish`]
    /// marks the grid stale.
    fn begin_loading(&self, reloads: bool) -> LoadingGuard {
        if !self.is_loading.swap(true, Ordering::SeqCst) {
            self.emit(GridEvent::LoadingChanged(true));
        }
        LoadingGuard {
            loading: Arc::clone(&self.is_loading),
            stale: Arc::clone(&self.stale),
            events: self.events.clone(),
            pending_reload: reloads,
        }
    }

    /// Fetch the full record set and rebuild every row
    ///
    /// On failure the record set is emptied and the error is kept on the grid
    /// until the next successful load.
    pub async fn load(&mut self) -> LoadResult<()> {
        let guard = self.begin_loading(false);
        let result = self.reload().await;
        guard.finish();
        result
    }

    async fn reload(&mut self) -> LoadResult<()> {
        match self.loader.load().await {
            Ok(records) => {
                let rows = map_records(&self.config, &records);
                self.paginator.set_full_set(rows);
                self.error = None;
                self.stale.store(false, Ordering::SeqCst);
                self.emit(GridEvent::Loaded {
                    total_records: self.paginator.len(),
                    total_pages: self.paginator.total_pages(),
                });
                Ok(())
            }
            Err(e) => {
                self.paginator.clear();
                self.error = Some(e.clone());
                self.emit(GridEvent::LoadFailed {
                    message: e.to_string(),
                });
                Err(e)
            }
        }
    }

    /// Stage a single cell edit; last write wins per field
    pub fn stage_edit(&mut self, row_id: &str, field: &str, value: Value) -> EditResult<()> {
        self.check_edit(row_id, field, &value)?;
        debug!("Staged {}={} on row {}", field, value, row_id);
        self.drafts.stage(row_id, field, value);
        self.emit(GridEvent::DraftsChanged {
            dirty_rows: self.drafts.len(),
        });
        Ok(())
    }

    /// Stage a batch of edits from a row-edit-saved event
    ///
    /// Every edit is checked before any is staged; on error nothing changes.
    pub fn stage_edits(&mut self, edits: Vec<CellEdit>) -> EditResult<()> {
        for edit in &edits {
            self.check_edit(&edit.row_id, &edit.field, &edit.value)?;
        }
        for edit in edits {
            debug!("Staged {}={} on row {}", edit.field, edit.value, edit.row_id);
            self.drafts.stage(&edit.row_id, &edit.field, edit.value);
        }
        self.emit(GridEvent::DraftsChanged {
            dirty_rows: self.drafts.len(),
        });
        Ok(())
    }

    fn check_edit(&self, row_id: &str, field: &str, value: &Value) -> EditResult<()> {
        let column = self
            .config
            .column(field)
            .ok_or_else(|| EditError::UnknownField(field.to_string()))?;
        check_value(column, value)?;
        if !self.paginator.full_set().iter().any(|row| row.id == row_id) {
            return Err(EditError::UnknownRow(row_id.to_string()));
        }
        Ok(())
    }

    /// Discard every staged edit without submitting anything
    pub fn discard_edits(&mut self) {
        if !self.drafts.is_empty() {
            self.drafts.clear();
            self.emit(GridEvent::DraftsChanged { dirty_rows: 0 });
        }
    }

    /// Submit staged edits as one update per dirty row, then reload
    ///
    /// The draft map is cleared before anything is sent, whatever the outcome.
    /// Any failed row fails the whole commit; rows that succeeded stay applied.
    /// A failed reload afterwards is recorded on the grid, not returned.
    ///
    /// With nothing staged no request is sent; the grid only reloads when an
    /// earlier commit was cancelled before its own reload ran.
    pub async fn commit(&mut self) -> BatchResult<CommitSummary> {
        if self.is_loading() {
            warn!("Commit requested while the grid is busy");
            return Err(BatchError::Busy);
        }

        let drafts = self.drafts.take();
        if drafts.is_empty() {
            if self.is_stale() {
                info!("Resynchronizing after an interrupted commit");
                let guard = self.begin_loading(false);
                if let Err(e) = self.reload().await {
                    warn!("Resynchronizing reload failed: {}", e);
                }
                guard.finish();
            } else {
                debug!("Nothing to commit");
            }
            return Ok(CommitSummary::default());
        }
        self.emit(GridEvent::DraftsChanged { dirty_rows: 0 });
        let guard = self.begin_loading(true);

        let requests = drafts.into_update_requests(&self.field_map);
        let result = self.batcher.submit(requests).await;

        match &result {
            Ok(summary) => {
                info!("Updated {} records", summary.updated.len());
                self.notifier
                    .notify(Notification::success(UPDATE_SUCCESS_MESSAGE));
            }
            Err(e) => {
                warn!("Commit failed: {}", e);
                self.notifier.notify(Notification::error(UPDATE_ERROR_MESSAGE));
            }
        }
        self.emit(GridEvent::Committed {
            success: result.is_ok(),
        });

        if let Err(e) = self.reload().await {
            warn!("Reload after commit failed: {}", e);
        }
        guard.finish();

        result
    }

    /// Replace the selection wholesale
    pub fn set_selection<I, S>(&mut self, row_ids: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.selection = row_ids.into_iter().map(Into::into).collect();
        debug!("Selected rows: {:?}", self.selection);
        self.emit(GridEvent::SelectionChanged {
            selected: self.selection.len(),
        });
    }

    pub fn selection(&self) -> &IndexSet<String> {
        &self.selection
    }

    pub fn has_selection(&self) -> bool {
        !self.selection.is_empty()
    }

    /// Selected rows still present in the loaded set, in selection order
    pub fn selected_rows(&self) -> Vec<&RowViewModel> {
        let rows = self.paginator.full_set();
        self.selection
            .iter()
            .filter_map(|id| rows.iter().find(|row| &row.id == id))
            .collect()
    }

    /// Run `action` over the selected rows
    ///
    /// With an empty selection a warning is surfaced, `action` is not called
    /// and `false` is returned.
    pub fn run_bulk_action<F>(&self, action: F) -> bool
    where
        F: FnOnce(&[&RowViewModel]),
    {
        if self.selection.is_empty() {
            warn!("Bulk action requested with no rows selected");
            self.notifier
                .notify(Notification::warning(EMPTY_SELECTION_MESSAGE));
            return false;
        }

        let rows = self.selected_rows();
        info!("Running bulk action on {} selected rows", rows.len());
        action(&rows);
        true
    }

    /// Resolve a named row action for `row_id`
    pub fn handle_row_action(&self, action_name: &str, row_id: &str) -> Option<RowAction> {
        match action_name {
            VIEW_DETAILS_ACTION => self
                .paginator
                .full_set()
                .iter()
                .find(|row| row.id == row_id)
                .map(|row| RowAction::ViewDetails {
                    record_id: row.record_id().to_string(),
                }),
            _ => None,
        }
    }

    fn page_moved(&self, moved: bool) -> bool {
        if moved {
            self.emit(GridEvent::PageChanged {
                page_number: self.paginator.page_number(),
            });
        }
        moved
    }

    /// Returns false and stays put when `n` is outside `[1, total_pages]`
    pub fn goto(&mut self, n: usize) -> bool {
        let moved = self.paginator.goto(n);
        self.page_moved(moved)
    }

    pub fn next_page(&mut self) -> bool {
        let moved = self.paginator.next();
        self.page_moved(moved)
    }

    pub fn previous_page(&mut self) -> bool {
        let moved = self.paginator.previous();
        self.page_moved(moved)
    }

    pub fn first_page(&mut self) -> bool {
        let moved = self.paginator.first();
        self.page_moved(moved)
    }

    pub fn last_page(&mut self) -> bool {
        let moved = self.paginator.last();
        self.page_moved(moved)
    }

    pub fn page_records(&self) -> &[RowViewModel] {
        self.paginator.window()
    }

    pub fn rows(&self) -> &[RowViewModel] {
        self.paginator.full_set()
    }

    pub fn page_number(&self) -> usize {
        self.paginator.page_number()
    }

    pub fn total_pages(&self) -> usize {
        self.paginator.total_pages()
    }

    pub fn page_info(&self) -> String {
        self.paginator.page_info()
    }

    pub fn is_first_page(&self) -> bool {
        self.paginator.is_first_page()
    }

    pub fn is_last_page(&self) -> bool {
        self.paginator.is_last_page()
    }

    pub fn drafts(&self) -> &DraftSet {
        &self.drafts
    }

    pub fn is_loading(&self) -> bool {
        self.is_loading.load(Ordering::SeqCst)
    }

    /// True when a commit was cancelled before its reload ran
    pub fn is_stale(&self) -> bool {
        self.stale.load(Ordering::SeqCst)
    }

    pub fn error(&self) -> Option<&LoadError> {
        self.error.as_ref()
    }

    pub fn has_error(&self) -> bool {
        self.error.is_some()
    }

    pub fn columns(&self) -> &[ColumnConfig] {
        &self.config.columns
    }

    pub fn config(&self) -> &GridConfig {
        &self.config
    }

    pub fn hide_checkbox_column(&self) -> bool {
        self.config.hide_checkbox_column
    }

    pub fn show_row_number_column(&self) -> bool {
        self.config.show_row_number_column
    }
}

/// Holds the grid's loading flag for one load or commit
struct LoadingGuard {
    loading: Arc<AtomicBool>,
    stale: Arc<AtomicBool>,
    events: broadcast::Sender<GridEvent>,
    pending_reload: bool,
}

impl LoadingGuard {
    /// Mark the operation complete; the flag drops with the guard
    fn finish(mut self) {
        self.pending_reload = false;
    }
}

impl Drop for LoadingGuard {
    fn drop(&mut self) {
        if self.pending_reload {
            warn!("Commit cancelled before its reload ran; grid marked stale");
            self.stale.store(true, Ordering::SeqCst);
        }
        if self.loading.swap(false, Ordering::SeqCst) {
            let _ = self.events.send(GridEvent::LoadingChanged(false));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GridConfig;
    use crate::notify::RecordingSink;
    use crate::record::Record;
    use crate::services::InMemoryRecordService;
    use serde_json::json;

    async fn loaded_grid() -> (PagedEditableGrid, InMemoryRecordService) {
        let service = InMemoryRecordService::new(vec![Record::new("a"), Record::new("b")]);
        let mut grid = PagedEditableGrid::new(
            GridConfig::default(),
            Arc::new(service.clone()),
            Arc::new(RecordingSink::new()),
        )
        .unwrap();
        grid.load().await.unwrap();
        (grid, service)
    }

    #[tokio::test]
    async fn test_commit_while_loading_is_busy() {
        let (mut grid, service) = loaded_grid().await;
        grid.stage_edit("a", "warrantyYears", json!(2)).unwrap();

        let guard = grid.begin_loading(false);
        assert!(grid.is_loading());
        let err = grid.commit().await.unwrap_err();
        assert!(err.is_busy());
        assert_eq!(grid.drafts().len(), 1);
        assert!(service.update_log().await.is_empty());

        drop(guard);
        assert!(!grid.is_loading());
        let summary = grid.commit().await.unwrap();
        assert_eq!(summary.updated, vec!["a".to_string()]);
        assert!(grid.drafts().is_empty());
    }

    #[tokio::test]
    async fn test_dropped_guard_resets_flag_and_marks_stale() {
        let (grid, _) = loaded_grid().await;
        let mut events = grid.subscribe();

        let guard = grid.begin_loading(true);
        drop(guard);
        assert!(!grid.is_loading());
        assert!(grid.is_stale());
        assert_eq!(events.recv().await.unwrap(), GridEvent::LoadingChanged(true));
        assert_eq!(events.recv().await.unwrap(), GridEvent::LoadingChanged(false));

        grid.begin_loading(true).finish();
        assert!(!grid.is_loading());
    }

    #[tokio::test]
    async fn test_finished_guard_leaves_grid_fresh() {
        let (grid, _) = loaded_grid().await;
        grid.begin_loading(true).finish();
        assert!(!grid.is_stale());
        assert!(!grid.is_loading());
    }
}
