//! Bounded sliding-window buffers owned by a tracking session.
//!
//! Every buffer keeps insertion order (most recent last) and evicts the
//! oldest element once its capacity is reached.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

/// A FIFO buffer with a fixed capacity.
#[derive(Debug, Clone, PartialEq)]
pub struct SlidingWindow<T> {
    items: VecDeque<T>,
    capacity: usize,
}

impl<T> SlidingWindow<T> {
    pub fn new(capacity: usize) -> Self {
        Self {
            items: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Append an item, evicting the oldest ones past capacity.
    pub fn push(&mut self, item: T) {
        if self.capacity == 0 {
            return;
        }
        while self.items.len() >= self.capacity {
            self.items.pop_front();
        }
        self.items.push_back(item);
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn last(&self) -> Option<&T> {
        self.items.back()
    }

    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &T> + ExactSizeIterator {
        self.items.iter()
    }

    /// Iterate over at most the `n` most recent items, oldest first.
    pub fn recent(&self, n: usize) -> impl DoubleEndedIterator<Item = &T> + ExactSizeIterator {
        self.items.iter().skip(self.items.len().saturating_sub(n))
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }
}

impl<T: Clone> SlidingWindow<T> {
    pub fn to_vec(&self) -> Vec<T> {
        self.items.iter().cloned().collect()
    }
}

/// A recorded gap between two keystrokes.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PauseSample {
    /// Time of the keystroke that ended the gap
    pub at: DateTime<Utc>,
    /// Gap length in milliseconds
    pub duration_ms: f64,
}

/// Classification of a closed run of deletions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RevisionKind {
    /// A single deleted character
    Correction,
    /// Two to four deleted characters
    WordRevision,
    /// Five or more deleted characters
    SentenceRestructuring,
}

impl RevisionKind {
    pub fn from_run_length(length: u32) -> Self {
        match length {
            0 | 1 => RevisionKind::Correction,
            2..=4 => RevisionKind::WordRevision,
            _ => RevisionKind::SentenceRestructuring,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            RevisionKind::Correction => "correction",
            RevisionKind::WordRevision => "word_revision",
            RevisionKind::SentenceRestructuring => "sentence_restructuring",
        }
    }
}

/// A deletion run, recorded when the next non-deleting key arrives.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RevisionEvent {
    pub at: DateTime<Utc>,
    pub kind: RevisionKind,
    /// Number of consecutive backspaces in the run
    pub length: u32,
}

/// The raw signal buffers and counters of one tracking session.
#[derive(Debug, Clone, PartialEq)]
pub struct SignalBuffers {
    /// Keystroke times
    pub timestamps: SlidingWindow<DateTime<Utc>>,
    /// Gaps above the pause threshold
    pub pauses: SlidingWindow<PauseSample>,
    /// Every inter-keystroke interval in milliseconds
    pub rhythm: SlidingWindow<f64>,
    /// Placeholder pressure samples in [0, 1]
    pub pressure: SlidingWindow<f64>,
    /// Closed deletion runs
    pub revisions: SlidingWindow<RevisionEvent>,
    /// Total keystrokes seen this session
    pub total_keystrokes: u64,
    /// Total backspaces seen this session
    pub backspace_count: u64,
}

impl SignalBuffers {
    pub fn new(raw_capacity: usize, revision_capacity: usize) -> Self {
        Self {
            timestamps: SlidingWindow::new(raw_capacity),
            pauses: SlidingWindow::new(raw_capacity),
            rhythm: SlidingWindow::new(raw_capacity),
            pressure: SlidingWindow::new(raw_capacity),
            revisions: SlidingWindow::new(revision_capacity),
            total_keystrokes: 0,
            backspace_count: 0,
        }
    }

    /// Share of keystrokes that were backspaces (0 before any keystroke).
    pub fn backspace_frequency(&self) -> f64 {
        if self.total_keystrokes == 0 {
            0.0
        } else {
            self.backspace_count as f64 / self.total_keystrokes as f64
        }
    }

    /// Inter-keystroke intervals over the `n` most recent timestamps.
    pub fn recent_intervals(&self, n: usize) -> Vec<f64> {
        let recent: Vec<&DateTime<Utc>> = self.timestamps.recent(n).collect();
        recent
            .windows(2)
            .map(|pair| millis_between(*pair[0], *pair[1]))
            .collect()
    }

    /// Whether nothing has been recorded yet.
    pub fn is_empty(&self) -> bool {
        self.total_keystrokes == 0
            && self.timestamps.is_empty()
            && self.pauses.is_empty()
            && self.rhythm.is_empty()
            && self.pressure.is_empty()
            && self.revisions.is_empty()
    }
}

/// Signed milliseconds from `earlier` to `later`, with sub-millisecond precision.
pub fn millis_between(earlier: DateTime<Utc>, later: DateTime<Utc>) -> f64 {
    let delta = later - earlier;
    match delta.num_microseconds() {
        Some(micros) => micros as f64 / 1000.0,
        None => delta.num_milliseconds() as f64,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_sliding_window_evicts_oldest() {
        let mut window = SlidingWindow::new(3);
        for i in 0..5 {
            window.push(i);
        }
        assert_eq!(window.len(), 3);
        assert_eq!(window.to_vec(), vec![2, 3, 4]);
        assert_eq!(window.last(), Some(&4));
    }

    #[test]
    fn test_sliding_window_never_exceeds_capacity() {
        let mut window = SlidingWindow::new(100);
        for i in 0..1_000 {
            window.push(i);
            assert!(window.len() <= window.capacity());
        }
    }

    #[test]
    fn test_recent_slice() {
        let mut window = SlidingWindow::new(10);
        for i in 0..6 {
            window.push(i);
        }
        assert_eq!(window.recent(2).copied().collect::<Vec<_>>(), vec![4, 5]);
        assert_eq!(window.recent(50).count(), 6);
    }

    #[test]
    fn test_backspace_frequency_guards_zero() {
        let mut buffers = SignalBuffers::new(100, 100);
        assert_eq!(buffers.backspace_frequency(), 0.0);

        buffers.total_keystrokes = 10;
        buffers.backspace_count = 3;
        assert!((buffers.backspace_frequency() - 0.3).abs() < f64::EPSILON);
    }

    #[test]
    fn test_recent_intervals() {
        let mut buffers = SignalBuffers::new(100, 100);
        let start = Utc::now();
        for offset in [0, 100, 250, 450] {
            buffers.timestamps.push(start + Duration::milliseconds(offset));
        }
        assert_eq!(buffers.recent_intervals(3), vec![150.0, 200.0]);
    }

    #[test]
    fn test_revision_kind_from_run_length() {
        assert_eq!(RevisionKind::from_run_length(1), RevisionKind::Correction);
        assert_eq!(RevisionKind::from_run_length(3), RevisionKind::WordRevision);
        assert_eq!(
            RevisionKind::from_run_length(7),
            RevisionKind::SentenceRestructuring
        );
    }
}
