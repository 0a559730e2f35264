/// Why a refresh cycle did not run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    Inactive,
    InFlight,
}

/// Result of one refresh cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleOutcome {
    Applied { prices: usize, alerts_raised: usize },
    Skipped(SkipReason),
    /// The cycle finished after monitoring was stopped or the baseline
    /// was replaced; nothing was written.
    Discarded,
}

/// Identifies the activation and baseline a cycle was started under.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct CycleToken {
    activation: u64,
    baseline: u64,
}

/// Poller state machine. Lives inside the session lock so every transition
/// and every commit check happens under the same mutex.
#[derive(Debug, Default)]
pub(crate) struct PollState {
    active: bool,
    in_flight: bool,
    activation: u64,
    baseline: u64,
}

impl PollState {
    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn activation(&self) -> u64 {
        self.activation
    }

    /// Starts a new activation and returns its number.
    pub fn activate(&mut self) -> u64 {
        self.active = true;
        self.activation += 1;
        self.activation
    }

    /// Returns false if monitoring was already off.
    pub fn deactivate(&mut self) -> bool {
        if !self.active {
            return false;
        }
        self.active = false;
        self.in_flight = false;
        self.activation += 1;
        true
    }

    pub fn new_baseline(&mut self) {
        self.baseline += 1;
    }

    pub fn is_current(&self, activation: u64) -> bool {
        self.active && self.activation == activation
    }

    pub fn begin_cycle(&mut self, activation: u64) -> Result<CycleToken, SkipReason> {
        if !self.is_current(activation) {
            return Err(SkipReason::Inactive);
        }
        if self.in_flight {
            return Err(SkipReason::InFlight);
        }
        self.in_flight = true;
        Ok(CycleToken {
            activation,
            baseline: self.baseline,
        })
    }

    /// Whether results of the cycle may still be written.
    pub fn accepts(&self, token: CycleToken) -> bool {
        self.is_current(token.activation) && self.baseline == token.baseline
    }

    pub fn finish_cycle(&mut self, token: CycleToken) {
        if self.activation == token.activation {
            self.in_flight = false;
        }
    }
}
