use serde::Serialize;

/// Where the match is in its round cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum RoundPhase {
    /// No round has started yet.
    Idle,
    /// Accepting damage and round-ending triggers.
    Active,
    /// Resolved; waiting out the intermission or the game-over delay.
    Resolving { won: bool },
    /// Terminal. Input stays locked.
    GameOver { won: bool },
}

/// Round wins per side. `opponent` counts bot wins offline and the other
/// team's wins online.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Tally {
    pub own: u32,
    pub opponent: u32,
}

/// What follows a resolved round.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Followup {
    NextRound,
    /// A side reached the threshold.
    GameOver { won: bool },
}

/// Outcome of asking to start a round.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoundStart {
    Started { round: u32 },
    /// The threshold was already reached; the match is over.
    MatchOver { won: bool },
}

/// Round lifecycle and win tally.
#[derive(Debug, Clone)]
pub struct RoundState {
    phase: RoundPhase,
    tally: Tally,
    round: u32,
    win_threshold: u32,
}

impl RoundState {
    pub fn new(win_threshold: u32) -> Self {
        Self {
            phase: RoundPhase::Idle,
            tally: Tally::default(),
            round: 0,
            win_threshold,
        }
    }

    pub fn phase(&self) -> RoundPhase {
        self.phase
    }

    pub fn tally(&self) -> Tally {
        self.tally
    }

    /// Number of the current or most recent round, starting at 1.
    pub fn round(&self) -> u32 {
        self.round
    }

    pub fn is_active(&self) -> bool {
        self.phase == RoundPhase::Active
    }

    pub fn is_game_over(&self) -> bool {
        matches!(self.phase, RoundPhase::GameOver { .. })
    }

    pub fn has_started(&self) -> bool {
        self.phase != RoundPhase::Idle
    }

    fn threshold_reached(&self) -> Option<bool> {
        if self.tally.own >= self.win_threshold || self.tally.opponent >= self.win_threshold {
            Some(self.tally.own >= self.win_threshold)
        } else {
            None
        }
    }

    /// Enter a new round, unless a side already reached the threshold, in
    /// which case the match ends instead. No-op once the game is over.
    pub fn begin(&mut self) -> RoundStart {
        if let RoundPhase::GameOver { won } = self.phase {
            return RoundStart::MatchOver { won };
        }
        if let Some(won) = self.threshold_reached() {
            self.phase = RoundPhase::GameOver { won };
            return RoundStart::MatchOver { won };
        }
        self.round += 1;
        self.phase = RoundPhase::Active;
        RoundStart::Started { round: self.round }
    }

    /// Resolve the active round. Only the first trigger per round counts;
    /// anything while not active returns `None` and changes nothing.
    pub fn resolve(&mut self, won: bool) -> Option<Followup> {
        if !self.is_active() {
            return None;
        }
        self.phase = RoundPhase::Resolving { won };
        if won {
            self.tally.own += 1;
        } else {
            self.tally.opponent += 1;
        }
        Some(match self.threshold_reached() {
            Some(won) => Followup::GameOver { won },
            None => Followup::NextRound,
        })
    }

    /// Enter the terminal state.
    pub fn finish(&mut self, won: bool) {
        self.phase = RoundPhase::GameOver { won };
    }

    /// Back to a fresh match.
    pub fn reset(&mut self) {
        self.phase = RoundPhase::Idle;
        self.tally = Tally::default();
        self.round = 0;
    }
}
