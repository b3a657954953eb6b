//! Log surfaces
//!
//! A surface is where rendered rows end up. The stream engine appends a row
//! per event, then scrolls to the end so the newest row stays visible.
//! [`LogView`] is the bounded in-memory surface; front ends wrap or replace it.

use std::collections::VecDeque;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use buildlog_core::domain::row::LogRow;

/// Connection state shown next to the log
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamStatus {
    /// Join sent, no reply yet
    Joining,
    /// Join accepted; events are being rendered
    Joined,
    /// Join refused or timed out
    Failed,
    /// Subscription ended (left, closed by the server, or socket lost)
    Closed,
}

impl fmt::Display for StreamStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StreamStatus::Joining => write!(f, "Joining"),
            StreamStatus::Joined => write!(f, "Joined"),
            StreamStatus::Failed => write!(f, "Failed"),
            StreamStatus::Closed => write!(f, "Closed"),
        }
    }
}

/// Destination of rendered log rows
///
/// Owned and mutated by exactly one subscription task.
pub trait LogSurface: Send + 'static {
    /// Appends one row at the end
    fn append(&mut self, row: LogRow);

    /// Scrolls so the last row is visible
    fn scroll_to_end(&mut self);

    /// Shows the connection state
    fn set_status(&mut self, _status: StreamStatus) {}
}

struct ViewState {
    rows: VecDeque<LogRow>,
    max_rows: usize,
    scroll_top: usize,
    evicted: u64,
    status: Option<StreamStatus>,
}

/// Bounded log view
///
/// Keeps at most `max_rows` rows, evicting the oldest first. Cloning gives
/// another handle to the same view, so a reader can inspect it while a
/// subscription task writes to it.
///
/// Scrolling is measured in rows: the scrollable height is the number of
/// retained rows, and scrolling to the end puts the offset at that height.
#[derive(Clone)]
pub struct LogView {
    state: Arc<Mutex<ViewState>>,
}

impl LogView {
    /// Creates an empty view keeping at most `max_rows` rows (at least one)
    pub fn new(max_rows: usize) -> Self {
        Self {
            state: Arc::new(Mutex::new(ViewState {
                rows: VecDeque::new(),
                max_rows: max_rows.max(1),
                scroll_top: 0,
                evicted: 0,
                status: None,
            })),
        }
    }

    /// Row texts, oldest first
    pub fn lines(&self) -> Vec<String> {
        self.lock().rows.iter().map(LogRow::text).collect()
    }

    pub fn len(&self) -> usize {
        self.lock().rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().rows.is_empty()
    }

    pub fn max_rows(&self) -> usize {
        self.lock().max_rows
    }

    /// Current scroll offset
    pub fn scroll_top(&self) -> usize {
        self.lock().scroll_top
    }

    /// Full scrollable height
    pub fn scroll_height(&self) -> usize {
        self.lock().rows.len()
    }

    /// Number of rows dropped by the retention cap
    pub fn evicted(&self) -> u64 {
        self.lock().evicted
    }

    /// Last status shown, if any
    pub fn status(&self) -> Option<StreamStatus> {
        self.lock().status
    }

    fn lock(&self) -> MutexGuard<'_, ViewState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for LogView {
    fn default() -> Self {
        Self::new(1000)
    }
}

impl fmt::Debug for LogView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.lock();
        f.debug_struct("LogView")
            .field("rows", &state.rows.len())
            .field("max_rows", &state.max_rows)
            .field("scroll_top", &state.scroll_top)
            .field("evicted", &state.evicted)
            .field("status", &state.status)
            .finish()
    }
}

impl LogSurface for LogView {
    fn append(&mut self, row: LogRow) {
        let mut state = self.lock();
        while state.rows.len() >= state.max_rows {
            state.rows.pop_front();
            state.evicted += 1;
        }
        state.rows.push_back(row);
        state.scroll_top = state.scroll_top.min(state.rows.len());
    }

    fn scroll_to_end(&mut self) {
        let mut state = self.lock();
        state.scroll_top = state.rows.len();
    }

    fn set_status(&mut self, status: StreamStatus) {
        self.lock().status = Some(status);
    }
}
