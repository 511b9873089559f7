use keystone_logging::{LogEntry, LogSink};
use parking_lot::Mutex;

use std::collections::VecDeque;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LogKind {
    Log,
    Warning,
    Error,
}

impl LogKind {
    pub const ALL: [LogKind; 3] = [LogKind::Log, LogKind::Warning, LogKind::Error];

    #[inline]
    pub fn from_level(level: log::Level) -> Self {
        match level {
            log::Level::Error => LogKind::Error,
            log::Level::Warn => LogKind::Warning,
            _ => LogKind::Log,
        }
    }

    #[inline]
    pub fn as_str(self) -> &'static str {
        match self {
            LogKind::Log => "log",
            LogKind::Warning => "warning",
            LogKind::Error => "error",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "log" | "logs" | "info" => Some(LogKind::Log),
            "warning" | "warnings" | "warn" => Some(LogKind::Warning),
            "error" | "errors" => Some(LogKind::Error),
            _ => None,
        }
    }

    #[inline]
    fn idx(self) -> usize {
        self as usize
    }
}

/// One captured line in the console tab.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConsoleLog {
    pub kind: LogKind,
    pub target: String,
    pub text: String,
    pub location: Option<String>,
}

impl ConsoleLog {
    pub fn new(kind: LogKind, text: impl Into<String>) -> Self {
        Self {
            kind,
            target: String::new(),
            text: text.into(),
            location: None,
        }
    }

    pub fn from_entry(entry: &LogEntry) -> Self {
        Self {
            kind: LogKind::from_level(entry.level),
            target: entry.target.clone(),
            text: entry.message.clone(),
            location: entry.location(),
        }
    }

    /// Text shown when the line is selected.
    pub fn detail(&self) -> String {
        match &self.location {
            Some(loc) => format!("{}\n\n{} ({loc})", self.text, self.target),
            None => format!("{}\n\n{}", self.text, self.target),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LogCounts {
    pub logs: usize,
    pub warnings: usize,
    pub errors: usize,
}

struct Inner {
    entries: VecDeque<ConsoleLog>,
    max_len: usize,
    counts: [usize; 3],
    visible: [bool; 3],
    pinned: bool,
    selected: Option<String>,
}

/// Shared buffer of captured log lines. Clones share the same buffer.
///
/// Counts cover every line received since the last `clear`, including lines
/// already dropped to honor `max_len`.
#[derive(Clone)]
pub struct LogBuffer {
    inner: Arc<Mutex<Inner>>,
}

impl Default for LogBuffer {
    fn default() -> Self {
        Self::new(512)
    }
}

impl LogBuffer {
    pub fn new(max_len: usize) -> Self {
        Self {
            inner: Arc::new(Mutex::new(Inner {
                entries: VecDeque::new(),
                max_len: max_len.max(1),
                counts: [0; 3],
                visible: [true; 3],
                pinned: false,
                selected: None,
            })),
        }
    }

    pub fn push(&self, log: ConsoleLog) {
        let mut g = self.inner.lock();
        g.counts[log.kind.idx()] += 1;
        g.entries.push_back(log);
        while g.entries.len() > g.max_len {
            g.entries.pop_front();
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.inner.lock().entries.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.inner.lock().entries.is_empty()
    }

    #[inline]
    pub fn max_len(&self) -> usize {
        self.inner.lock().max_len
    }

    pub fn set_max_len(&self, max_len: usize) {
        let mut g = self.inner.lock();
        g.max_len = max_len.max(1);
        while g.entries.len() > g.max_len {
            g.entries.pop_front();
        }
    }

    #[inline]
    pub fn count(&self, kind: LogKind) -> usize {
        self.inner.lock().counts[kind.idx()]
    }

    pub fn counts(&self) -> LogCounts {
        let g = self.inner.lock();
        LogCounts {
            logs: g.counts[0],
            warnings: g.counts[1],
            errors: g.counts[2],
        }
    }

    /// Drops every line, resets the counts and the selection.
    pub fn clear(&self) {
        let mut g = self.inner.lock();
        g.entries.clear();
        g.counts = [0; 3];
        g.selected = None;
    }

    pub fn set_visible(&self, kind: LogKind, visible: bool) {
        self.inner.lock().visible[kind.idx()] = visible;
    }

    #[inline]
    pub fn is_visible(&self, kind: LogKind) -> bool {
        self.inner.lock().visible[kind.idx()]
    }

    /// Lines whose kind is visible, oldest first.
    pub fn visible_entries(&self) -> Vec<ConsoleLog> {
        let g = self.inner.lock();
        g.entries
            .iter()
            .filter(|e| g.visible[e.kind.idx()])
            .cloned()
            .collect()
    }

    /// Last `n` visible lines, oldest first.
    pub fn tail(&self, n: usize) -> Vec<ConsoleLog> {
        let mut all = self.visible_entries();
        let skip = all.len().saturating_sub(n);
        all.drain(..skip);
        all
    }

    /// Pinned counts stay on screen while the console is closed.
    pub fn set_pinned(&self, pinned: bool) {
        self.inner.lock().pinned = pinned;
    }

    #[inline]
    pub fn is_pinned(&self) -> bool {
        self.inner.lock().pinned
    }

    /// Selects the `index`-th visible line and returns its detail text.
    pub fn select(&self, index: usize) -> Option<String> {
        let detail = self.visible_entries().get(index).map(ConsoleLog::detail)?;
        self.inner.lock().selected = Some(detail.clone());
        Some(detail)
    }

    pub fn clear_selection(&self) {
        self.inner.lock().selected = None;
    }

    pub fn selected_detail(&self) -> Option<String> {
        self.inner.lock().selected.clone()
    }
}

impl LogSink for LogBuffer {
    // Must not log: runs inside the process logger.
    fn record(&self, entry: &LogEntry) {
        self.push(ConsoleLog::from_entry(entry));
    }
}

impl std::fmt::Debug for LogBuffer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let g = self.inner.lock();
        f.debug_struct("LogBuffer")
            .field("len", &g.entries.len())
            .field("max_len", &g.max_len)
            .field("counts", &g.counts)
            .finish()
    }
}
