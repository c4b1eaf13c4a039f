//! Invocation history.
//!
//! A [`HistorySink`] is told when an invocation starts, returning a [`Ticket`],
//! and is told again with that ticket when the invocation finishes. [`History`]
//! is the in-memory sink: it keeps the most recent entries up to a fixed
//! capacity and evicts the oldest first.

use std::collections::VecDeque;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use tracing::debug;

use crate::command::Command;
use crate::error::SdkError;
use crate::output::Output;
use crate::request::Request;

/// Default number of entries kept by [`History`].
pub const DEFAULT_HISTORY_CAPACITY: usize = 10;

/// Correlates the start of an invocation with its finish.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Ticket(u64);

impl fmt::Display for Ticket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Receives start and finish events of invocations.
pub trait HistorySink: Send + Sync {
    /// Record the start of an invocation and return its ticket.
    fn start(&self, command: &Command, request: Option<&Request>) -> Ticket;

    /// Record how the invocation behind `ticket` ended.
    ///
    /// Must be called at most once per ticket. Calling it twice is a bug in the
    /// caller and is not detected.
    fn finish(&self, ticket: Ticket, outcome: &Result<Output, SdkError>);
}

/// One recorded invocation.
#[derive(Debug, Clone)]
pub struct Entry {
    /// The ticket returned by `start`.
    pub ticket: Ticket,
    /// Snapshot of the command at start.
    pub command: Command,
    /// Snapshot of the request at start, if one had been built.
    pub request: Option<Request>,
    /// When the invocation started.
    pub started_at: DateTime<Utc>,
    /// When the invocation finished.
    pub finished_at: Option<DateTime<Utc>>,
    /// The outcome, once finished.
    pub outcome: Option<Result<Output, SdkError>>,
}

impl Entry {
    /// Whether `finish` has been recorded.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.outcome.is_some()
    }
}

/// A bounded in-memory [`HistorySink`].
#[derive(Debug)]
pub struct History {
    capacity: usize,
    next_ticket: AtomicU64,
    entries: Mutex<VecDeque<Entry>>,
}

impl History {
    /// A history keeping at most `capacity` entries (at least one).
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            capacity,
            next_ticket: AtomicU64::new(0),
            entries: Mutex::new(VecDeque::with_capacity(capacity)),
        }
    }

    /// Maximum number of entries kept.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of entries currently kept.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    /// Whether nothing has been recorded (or everything was cleared).
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }

    /// Snapshot of all entries, oldest first.
    #[must_use]
    pub fn entries(&self) -> Vec<Entry> {
        self.entries.lock().iter().cloned().collect()
    }

    /// The most recent entry.
    #[must_use]
    pub fn last(&self) -> Option<Entry> {
        self.entries.lock().back().cloned()
    }

    /// The entry for `ticket`, if it has not been evicted.
    #[must_use]
    pub fn get(&self, ticket: Ticket) -> Option<Entry> {
        self.entries
            .lock()
            .iter()
            .find(|entry| entry.ticket == ticket)
            .cloned()
    }

    /// Drop every entry. Tickets keep increasing.
    pub fn clear(&self) {
        self.entries.lock().clear();
    }
}

impl Default for History {
    fn default() -> Self {
        Self::new(DEFAULT_HISTORY_CAPACITY)
    }
}

impl HistorySink for History {
    fn start(&self, command: &Command, request: Option<&Request>) -> Ticket {
        let ticket = Ticket(self.next_ticket.fetch_add(1, Ordering::Relaxed));
        let entry = Entry {
            ticket,
            command: command.clone(),
            request: request.cloned(),
            started_at: Utc::now(),
            finished_at: None,
            outcome: None,
        };

        let mut entries = self.entries.lock();
        if entries.len() == self.capacity {
            entries.pop_front();
        }
        entries.push_back(entry);
        ticket
    }

    fn finish(&self, ticket: Ticket, outcome: &Result<Output, SdkError>) {
        let mut entries = self.entries.lock();
        match entries.iter_mut().find(|entry| entry.ticket == ticket) {
            Some(entry) => {
                entry.finished_at = Some(Utc::now());
                entry.outcome = Some(outcome.clone());
            }
            None => debug!(%ticket, "history entry evicted before finish"),
        }
    }
}
