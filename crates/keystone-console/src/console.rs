use std::collections::VecDeque;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Tab {
    Console,
    Options,
}

impl Tab {
    pub const ALL: [Tab; 2] = [Tab::Console, Tab::Options];

    #[inline]
    pub fn name(self) -> &'static str {
        match self {
            Tab::Console => "Console",
            Tab::Options => "Options",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        Tab::ALL
            .into_iter()
            .find(|t| t.name().eq_ignore_ascii_case(s))
    }
}

/// Open/close and tab selection of the console overlay, plus command history.
#[derive(Debug)]
pub struct DeveloperConsole {
    open: bool,
    selected: Option<Tab>,
    history: VecDeque<String>,
    output: VecDeque<String>,
    written: u64,
    max_lines: usize,
}

impl Default for DeveloperConsole {
    fn default() -> Self {
        Self::new(64)
    }
}

impl DeveloperConsole {
    pub fn new(max_lines: usize) -> Self {
        Self {
            open: false,
            selected: None,
            history: VecDeque::new(),
            output: VecDeque::new(),
            written: 0,
            max_lines: max_lines.max(1),
        }
    }

    #[inline]
    pub fn is_open(&self) -> bool {
        self.open
    }

    /// Opens the overlay on the first tab. Returns false when already open.
    pub fn open(&mut self) -> bool {
        if self.open {
            return false;
        }
        self.open = true;
        self.selected = Some(Tab::ALL[0]);
        true
    }

    pub fn close(&mut self) -> bool {
        if !self.open {
            return false;
        }
        self.open = false;
        self.selected = None;
        true
    }

    pub fn toggle(&mut self) {
        if self.open {
            self.close();
        } else {
            self.open();
        }
    }

    /// Selects a tab; only possible while open.
    pub fn select_tab(&mut self, tab: Tab) -> bool {
        if !self.open {
            return false;
        }
        self.selected = Some(tab);
        true
    }

    #[inline]
    pub fn selected_tab(&self) -> Option<Tab> {
        self.selected
    }

    /// Remembers a submitted line; repeats of the last line are not stored twice.
    pub fn record_command(&mut self, line: &str) {
        let line = line.trim();
        if line.is_empty() || self.history.back().is_some_and(|l| l == line) {
            return;
        }
        push_capped(&mut self.history, line.to_owned(), self.max_lines);
    }

    pub fn history(&self) -> impl Iterator<Item = &str> {
        self.history.iter().map(String::as_str)
    }

    pub fn push_output(&mut self, text: &str) {
        for line in text.lines() {
            push_capped(&mut self.output, line.to_owned(), self.max_lines);
            self.written += 1;
        }
    }

    /// Total output lines pushed so far, including dropped ones.
    #[inline]
    pub fn lines_written(&self) -> u64 {
        self.written
    }

    /// Lines pushed after the first `seen`, oldest first. Dropped lines are skipped.
    pub fn output_since(&self, seen: u64) -> Vec<&str> {
        let fresh = self.written.saturating_sub(seen);
        self.output_tail(usize::try_from(fresh).unwrap_or(usize::MAX))
    }

    /// Last `n` output lines, oldest first.
    pub fn output_tail(&self, n: usize) -> Vec<&str> {
        let skip = self.output.len().saturating_sub(n);
        self.output.iter().skip(skip).map(String::as_str).collect()
    }
}

fn push_capped(q: &mut VecDeque<String>, line: String, max: usize) {
    q.push_back(line);
    while q.len() > max {
        q.pop_front();
    }
}
