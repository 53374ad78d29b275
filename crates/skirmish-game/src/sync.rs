use std::time::Duration;

use skirmish_core::player::PeerId;
use smallvec::SmallVec;

/// Recipients of one outgoing frame. Rooms hold at most six peers.
pub type Targets = SmallVec<[PeerId; 6]>;

/// One data link, in the order it was accepted or requested.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Link {
    pub peer: PeerId,
    pub open: bool,
}

/// The session's data links. A host holds one per client; a client holds
/// exactly one, to the host.
///
/// Order matters: the host derives team assignments from a link's index
/// at the moment it opens.
#[derive(Debug, Clone, Default)]
pub struct LinkTable {
    links: Vec<Link>,
}

impl LinkTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Track a new, not yet open link. Returns its index.
    pub fn add(&mut self, peer: &PeerId) -> usize {
        if let Some(idx) = self.index_of(peer) {
            return idx;
        }
        self.links.push(Link {
            peer: peer.clone(),
            open: false,
        });
        self.links.len() - 1
    }

    /// Mark a tracked link open. Returns its index, or `None` if the peer
    /// is not tracked.
    pub fn mark_open(&mut self, peer: &PeerId) -> Option<usize> {
        let idx = self.index_of(peer)?;
        self.links[idx].open = true;
        Some(idx)
    }

    pub fn remove(&mut self, peer: &PeerId) -> bool {
        match self.index_of(peer) {
            Some(idx) => {
                self.links.remove(idx);
                true
            },
            None => false,
        }
    }

    pub fn index_of(&self, peer: &PeerId) -> Option<usize> {
        self.links.iter().position(|l| &l.peer == peer)
    }

    pub fn contains(&self, peer: &PeerId) -> bool {
        self.index_of(peer).is_some()
    }

    pub fn is_open(&self, peer: &PeerId) -> bool {
        self.links.iter().any(|l| &l.peer == peer && l.open)
    }

    pub fn len(&self) -> usize {
        self.links.len()
    }

    pub fn is_empty(&self) -> bool {
        self.links.is_empty()
    }

    pub fn peers(&self) -> impl Iterator<Item = &PeerId> {
        self.links.iter().map(|l| &l.peer)
    }

    /// Every open link.
    pub fn broadcast_targets(&self) -> Targets {
        self.links
            .iter()
            .filter(|l| l.open)
            .map(|l| l.peer.clone())
            .collect()
    }

    /// Every open link except the ones a relayed frame came from.
    pub fn relay_targets(&self, exclude: &[&PeerId]) -> Targets {
        self.links
            .iter()
            .filter(|l| l.open && !exclude.contains(&&l.peer))
            .map(|l| l.peer.clone())
            .collect()
    }

    /// The first open link; for a client, the host.
    pub fn first_open(&self) -> Option<&PeerId> {
        self.links.iter().find(|l| l.open).map(|l| &l.peer)
    }

    pub fn clear(&mut self) {
        self.links.clear();
    }
}

/// Fixed-rate gate for position broadcasts, independent of frame rate.
#[derive(Debug, Clone)]
pub struct SyncClock {
    interval: Duration,
    last: Option<Duration>,
}

impl SyncClock {
    pub fn new(rate_hz: f32) -> Self {
        Self {
            interval: Duration::from_secs_f32(1.0 / rate_hz.max(f32::EPSILON)),
            last: None,
        }
    }

    /// True at most once per interval; a `true` restarts the interval.
    pub fn due(&mut self, now: Duration) -> bool {
        if self
            .last
            .is_some_and(|last| now.saturating_sub(last) < self.interval)
        {
            return false;
        }
        self.last = Some(now);
        true
    }

    pub fn reset(&mut self) {
        self.last = None;
    }
}

#[cfg(test)]
mod tests {
    use skirmish_core::test_helpers::peer;

    use super::*;

    #[test]
    fn links_keep_insertion_order() {
        let mut links = LinkTable::new();
        assert_eq!(links.add(&peer("a")), 0);
        assert_eq!(links.add(&peer("b")), 1);
        assert_eq!(links.add(&peer("a")), 0);
        assert_eq!(links.len(), 2);
        links.remove(&peer("a"));
        assert_eq!(links.index_of(&peer("b")), Some(0));
    }

    #[test]
    fn only_open_links_receive_frames() {
        let mut links = LinkTable::new();
        links.add(&peer("a"));
        links.add(&peer("b"));
        links.add(&peer("c"));
        links.mark_open(&peer("a"));
        links.mark_open(&peer("c"));
        assert_eq!(links.broadcast_targets().to_vec(), vec![peer("a"), peer("c")]);
        assert_eq!(links.first_open(), Some(&peer("a")));
        assert!(links.mark_open(&peer("zzz")).is_none());
    }

    #[test]
    fn relay_skips_sender() {
        let mut links = LinkTable::new();
        for id in ["a", "b", "c"] {
            links.add(&peer(id));
            links.mark_open(&peer(id));
        }
        assert_eq!(links.relay_targets(&[&peer("b")]).to_vec(), vec![peer("a"), peer("c")]);
        assert_eq!(
            links.relay_targets(&[&peer("b"), &peer("c")]).to_vec(),
            vec![peer("a")]
        );
    }

    #[test]
    fn sync_clock_caps_rate_regardless_of_frame_rate() {
        let mut clock = SyncClock::new(30.0);
        let frame = Duration::from_secs_f64(1.0 / 144.0);
        let mut now = Duration::ZERO;
        let mut sends = 0;
        for _ in 0..144 {
            now += frame;
            if clock.due(now) {
                sends += 1;
            }
        }
        assert!((28..=31).contains(&sends), "sent {sends} times in one second");
    }

    #[test]
    fn sync_clock_fires_immediately_after_reset() {
        let mut clock = SyncClock::new(30.0);
        assert!(clock.due(Duration::from_millis(5)));
        assert!(!clock.due(Duration::from_millis(10)));
        clock.reset();
        assert!(clock.due(Duration::from_millis(11)));
    }
}
