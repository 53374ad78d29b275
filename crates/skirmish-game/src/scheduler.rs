use std::cmp::{Ordering, Reverse};
use std::collections::BinaryHeap;
use std::time::Duration;

use skirmish_core::player::PeerId;

use crate::weapon::WeaponKind;

/// Deferred session actions.
#[derive(Debug, Clone, PartialEq)]
pub enum TimerAction {
    /// Enough players joined; start the first round.
    MatchStart,
    /// Intermission is over; set up the next round.
    NextRound,
    /// The deciding round's delay elapsed.
    GameOver { won: bool },
    ReloadComplete(WeaponKind),
    MeleeSwingReset,
    /// Hide a dead mirror's body.
    HideMirror(PeerId),
    /// Drop a dead bot's body.
    RemoveBotBody(u32),
}

/// Seconds from config or frame timing as a delay. Negative, NaN and
/// overflowing values collapse to zero.
pub fn secs(value: f32) -> Duration {
    Duration::try_from_secs_f32(value).unwrap_or_default()
}

#[derive(Debug)]
struct Entry {
    fires_at: Duration,
    seq: u64,
    action: TimerAction,
}

impl PartialEq for Entry {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Entry {}

impl PartialOrd for Entry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Entry {
    fn cmp(&self, other: &Self) -> Ordering {
        (self.fires_at, self.seq).cmp(&(other.fires_at, other.seq))
    }
}

/// Min-heap of `{fires_at, action}` entries, checked once per tick.
///
/// Entries are not individually cancellable; handlers re-check state when
/// they fire. Entries due at the same instant fire in scheduling order.
#[derive(Debug, Default)]
pub struct Scheduler {
    heap: BinaryHeap<Reverse<Entry>>,
    next_seq: u64,
}

impl Scheduler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn schedule(&mut self, fires_at: Duration, action: TimerAction) {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.heap.push(Reverse(Entry {
            fires_at,
            seq,
            action,
        }));
    }

    /// Remove and return every action due at or before `now`, earliest first.
    pub fn pop_due(&mut self, now: Duration) -> Vec<TimerAction> {
        let mut due = Vec::new();
        while self.heap.peek().is_some_and(|Reverse(e)| e.fires_at <= now) {
            if let Some(Reverse(entry)) = self.heap.pop() {
                due.push(entry.action);
            }
        }
        due
    }

    /// True if an action matching `pred` is still pending.
    pub fn contains(&self, pred: impl Fn(&TimerAction) -> bool) -> bool {
        self.heap.iter().any(|Reverse(e)| pred(&e.action))
    }

    pub fn clear(&mut self) {
        self.heap.clear();
    }

    pub fn len(&self) -> usize {
        self.heap.len()
    }

    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }
}
