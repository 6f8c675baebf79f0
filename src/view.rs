//! Dashboard view state.
//!
//! Holds the current record snapshot together with the table filter, search
//! term and window. Charts and the table are pure functions of that state.
//! Loads are tracked with generation tickets so that only the most recently
//! requested load can be applied, and nothing is applied after disposal.

use tracing::{debug, info, warn};

use crate::aggregator::ChartSet;
use crate::api::FraudApi;
use crate::config::DashboardConfig;
use crate::error::ApiError;
use crate::filter::{column_header, filter_indices, FraudFilter, TableWindow};
use crate::notify::{Notifier, Severity};
use crate::record::Transaction;

/// Handle for one outstanding load request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadTicket {
    generation: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    /// New records replaced the previous snapshot.
    Applied { records: usize },
    /// A newer load was requested after this one; result discarded.
    Stale,
    /// The view was disposed before the result arrived; result discarded.
    Disposed,
    /// The fetch failed; the previous snapshot is kept.
    Failed,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct TableKey {
    snapshot: u64,
    filter: FraudFilter,
    search: String,
}

#[derive(Debug)]
pub struct DashboardView {
    records: Vec<Transaction>,
    snapshot: u64,
    latest_request: u64,
    loading: bool,
    disposed: bool,
    filter: FraudFilter,
    search: String,
    window: TableWindow,
    num_periods: usize,
    table_cache: Option<(TableKey, Vec<usize>)>,
}

impl DashboardView {
    pub fn new(config: &DashboardConfig) -> Self {
        Self {
            records: Vec::new(),
            snapshot: 0,
            latest_request: 0,
            loading: false,
            disposed: false,
            filter: FraudFilter::All,
            search: String::new(),
            window: TableWindow::First(config.table_window),
            num_periods: config.num_periods,
            table_cache: None,
        }
    }

    /// Starts a load. Any earlier outstanding ticket becomes stale.
    pub fn begin_load(&mut self) -> LoadTicket {
        self.latest_request += 1;
        self.loading = true;
        debug!(generation = self.latest_request, "load requested");
        LoadTicket {
            generation: self.latest_request,
        }
    }

    pub fn finish_load(
        &mut self,
        ticket: LoadTicket,
        result: Result<Vec<Transaction>, ApiError>,
        notifier: &dyn Notifier,
    ) -> LoadOutcome {
        if self.disposed {
            debug!(generation = ticket.generation, "dropping load result for disposed view");
            return LoadOutcome::Disposed;
        }
        if ticket.generation != self.latest_request {
            debug!(
                generation = ticket.generation,
                latest = self.latest_request,
                "dropping stale load result"
            );
            return LoadOutcome::Stale;
        }
        self.loading = false;

        match result {
            Ok(records) => {
                let count = records.len();
                self.replace_records(records);
                info!(records = count, "dashboard data loaded");
                LoadOutcome::Applied { records: count }
            }
            Err(err) => {
                warn!(error = %err, "failed to fetch dashboard data");
                notifier.notify(
                    "Error",
                    "Failed to fetch example data. Please try again.",
                    Severity::Destructive,
                );
                LoadOutcome::Failed
            }
        }
    }

    /// Fetches the transaction log and applies it.
    pub fn load_from(&mut self, api: &dyn FraudApi, notifier: &dyn Notifier) -> LoadOutcome {
        let ticket = self.begin_load();
        let result = api.fetch_logs();
        self.finish_load(ticket, result, notifier)
    }

    /// Replaces the snapshot directly, e.g. with bulk scoring results.
    pub fn replace_records(&mut self, records: Vec<Transaction>) {
        self.records = records;
        self.snapshot += 1;
        self.table_cache = None;
    }

    pub fn dispose(&mut self) {
        self.disposed = true;
        self.loading = false;
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn records(&self) -> &[Transaction] {
        &self.records
    }

    pub fn filter(&self) -> FraudFilter {
        self.filter
    }

    pub fn set_filter(&mut self, filter: FraudFilter) {
        self.filter = filter;
    }

    pub fn search(&self) -> &str {
        &self.search
    }

    pub fn set_search(&mut self, term: impl Into<String>) {
        self.search = term.into();
    }

    pub fn window(&self) -> TableWindow {
        self.window
    }

    pub fn set_window(&mut self, window: TableWindow) {
        self.window = window;
    }

    /// Charts always cover the full snapshot, independent of filter and search.
    pub fn charts(&self) -> ChartSet {
        ChartSet::compute(&self.records, self.num_periods)
    }

    /// Filtered and searched rows, before windowing.
    pub fn filtered(&mut self) -> Vec<&Transaction> {
        self.refresh_table();
        match &self.table_cache {
            Some((_, indices)) => indices.iter().map(|&i| &self.records[i]).collect(),
            None => Vec::new(),
        }
    }

    /// Rows currently shown in the table.
    pub fn visible_rows(&mut self) -> Vec<&Transaction> {
        self.refresh_table();
        match &self.table_cache {
            Some((_, indices)) => self
                .window
                .apply(indices)
                .iter()
                .map(|&i| &self.records[i])
                .collect(),
            None => Vec::new(),
        }
    }

    /// Column headers taken from the first record of the snapshot.
    pub fn headers(&self) -> Vec<String> {
        self.records
            .first()
            .map(|tx| tx.field_names().into_iter().map(column_header).collect())
            .unwrap_or_default()
    }

    fn refresh_table(&mut self) {
        let key = TableKey {
            snapshot: self.snapshot,
            filter: self.filter,
            search: self.search.trim().to_lowercase(),
        };
        let fresh = matches!(&self.table_cache, Some((cached, _)) if *cached == key);
        if !fresh {
            let indices = filter_indices(&self.records, key.filter, &key.search);
            self.table_cache = Some((key, indices));
        }
    }
}
