//! Terminal log surface
//!
//! Prints each row as it is appended while keeping a bounded [`LogView`]
//! of what was shown.

use std::io::Write;

use buildlog_client::{LogRow, LogSurface, LogView, StreamStatus};
use buildlog_core::domain::row::sanitize;
use colored::*;

/// Surface that writes rows to a terminal
pub struct TerminalView<W: Write + Send + 'static> {
    out: W,
    view: LogView,
}

impl<W: Write + Send + 'static> TerminalView<W> {
    /// Creates a terminal surface keeping at most `max_rows` rows in memory
    pub fn new(out: W, max_rows: usize) -> Self {
        Self {
            out,
            view: LogView::new(max_rows),
        }
    }

    /// Handle to the rows shown so far
    pub fn view(&self) -> LogView {
        self.view.clone()
    }
}

impl<W: Write + Send + 'static> LogSurface for TerminalView<W> {
    fn append(&mut self, row: LogRow) {
        // A closed pipe must not stop the stream
        let _ = writeln!(self.out, "{}", format_row(&row));
        self.view.append(row);
    }

    fn scroll_to_end(&mut self) {
        let _ = self.out.flush();
        self.view.scroll_to_end();
    }

    fn set_status(&mut self, status: StreamStatus) {
        eprintln!("{} {}", "●".color(status_color(status)), status);
        self.view.set_status(status);
    }
}

/// Formats a row as `HH:MM:SS role: action — step`
fn format_row(row: &LogRow) -> String {
    let time = row
        .received_at
        .with_timezone(&chrono::Local)
        .format("%H:%M:%S")
        .to_string();

    format!(
        "{} {} {} — {}",
        time.dimmed(),
        format!("{}:", sanitize(row.event.role())).bold(),
        sanitize(row.event.action()).italic(),
        sanitize(row.event.step())
    )
}

fn status_color(status: StreamStatus) -> Color {
    match status {
        StreamStatus::Joining => Color::Yellow,
        StreamStatus::Joined => Color::Green,
        StreamStatus::Failed => Color::Red,
        StreamStatus::Closed => Color::BrightBlack,
    }
}
