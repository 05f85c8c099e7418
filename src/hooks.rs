//! Runtime callbacks connecting a population to its environment.

/// Maps a network's output to a reward delta: `(network index, output) -> delta`
pub type RewardFn = Box<dyn FnMut(usize, &[f64]) -> f64>;

/// Receives the final output of a presentation; returns `false` to kill the network
pub type UpdateFn = Box<dyn FnMut(usize, &[f64]) -> bool>;

/// Reward and update callbacks supplied by the consumer
pub struct Hooks {
    pub reward: RewardFn,
    pub update: UpdateFn,
}

impl Hooks {
    pub fn new<R, U>(reward: R, update: U) -> Self
    where
        R: FnMut(usize, &[f64]) -> f64 + 'static,
        U: FnMut(usize, &[f64]) -> bool + 'static,
    {
        Self {
            reward: Box::new(reward),
            update: Box::new(update),
        }
    }

    /// Reward hook only; every network stays alive
    pub fn reward_only<R>(reward: R) -> Self
    where
        R: FnMut(usize, &[f64]) -> f64 + 'static,
    {
        Self::new(reward, |_, _| true)
    }
}

impl Default for Hooks {
    fn default() -> Self {
        Self::new(|_, _| 0.0, |_, _| true)
    }
}

impl std::fmt::Debug for Hooks {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("Hooks { .. }")
    }
}
