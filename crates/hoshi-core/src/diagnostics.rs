use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

use chrono::{DateTime, Utc};
use serde::Serialize;

/// Maximum number of events retained in the ring buffer.
const EVENT_LOG_CAPACITY: usize = 200;

/// A recovered failure or notable degradation in one of the page components.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DiagnosticEvent {
    SuggestFailed {
        query: String,
        message: String,
    },
    StaleSuggestion {
        query: String,
        token: u64,
        latest: u64,
    },
    StorageDegraded {
        reason: String,
    },
    CorruptWatchlist {
        message: String,
    },
    ComponentInert {
        component: String,
        missing: String,
    },
    PlaybackRejected {
        message: String,
    },
}

/// A timestamped event entry.
pub type EventEntry = (DateTime<Utc>, DiagnosticEvent);

/// Bounded ring buffer of diagnostic events.
#[derive(Debug)]
pub struct EventLog {
    entries: VecDeque<EventEntry>,
}

impl Default for EventLog {
    fn default() -> Self {
        Self::new()
    }
}

impl EventLog {
    pub fn new() -> Self {
        Self {
            entries: VecDeque::with_capacity(EVENT_LOG_CAPACITY),
        }
    }

    /// Push a new event, evicting the oldest if at capacity.
    pub fn push(&mut self, event: DiagnosticEvent) {
        if self.entries.len() >= EVENT_LOG_CAPACITY {
            self.entries.pop_front();
        }
        self.entries.push_back((Utc::now(), event));
    }

    /// Events without timestamps, oldest first.
    pub fn events(&self) -> Vec<DiagnosticEvent> {
        self.entries.iter().map(|(_, e)| e.clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Serialize the buffer as a JSON array of `{at, kind, ...}` objects.
    pub fn to_json(&self) -> String {
        #[derive(Serialize)]
        struct Row<'a> {
            at: &'a DateTime<Utc>,
            #[serde(flatten)]
            event: &'a DiagnosticEvent,
        }

        let rows: Vec<Row<'_>> = self
            .entries
            .iter()
            .map(|(at, event)| Row { at, event })
            .collect();
        serde_json::to_string(&rows).unwrap_or_else(|_| "[]".to_string())
    }
}

/// Handle to the event log shared by every component on the page.
pub type SharedEventLog = Rc<RefCell<EventLog>>;

/// Create a new shared event log.
pub fn shared_event_log() -> SharedEventLog {
    Rc::new(RefCell::new(EventLog::new()))
}

/// Record `event` in `log`.
pub fn record(log: &SharedEventLog, event: DiagnosticEvent) {
    log.borrow_mut().push(event);
}
