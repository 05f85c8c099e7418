//! Population lifecycle and generational reproduction.

use crate::config::Config;
use crate::entropy::{Entropy, SeededEntropy};
use crate::error::{EvoError, Result};
use crate::evolution::{draw_parents, selection_weights, GenerationStats};
use crate::hooks::Hooks;
use crate::identity::IdRegistry;
use crate::neural::Network;

/// Lifecycle state of a population
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum State {
    Stopped,
    Idle,
    Running,
}

/// A generation of networks plus everything needed to breed the next one.
///
/// Transitions take a `safe` flag: in safe mode an invalid transition
/// returns `Ok(false)` instead of [`EvoError::InvalidState`].
pub struct Population<E: Entropy = SeededEntropy> {
    config: Config,
    hooks: Hooks,
    entropy: E,
    ids: IdRegistry,
    networks: Vec<Network>,
    state: State,
    generation: u64,
    history: Vec<GenerationStats>,
}

impl Population<SeededEntropy> {
    /// Population backed by seeded ChaCha8 entropy
    pub fn with_seed(config: Config, hooks: Hooks, seed: u64) -> Result<Self> {
        Self::new(config, hooks, SeededEntropy::new(seed))
    }
}

impl<E: Entropy> Population<E> {
    /// Create a stopped population. Networks are built by [`Population::start`].
    pub fn new(config: Config, hooks: Hooks, entropy: E) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            hooks,
            entropy,
            ids: IdRegistry::new(),
            networks: Vec::new(),
            state: State::Stopped,
            generation: 0,
            history: Vec::new(),
        })
    }

    pub fn state(&self) -> State {
        self.state
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn size(&self) -> usize {
        self.config.population.size
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn networks(&self) -> &[Network] {
        &self.networks
    }

    pub fn network(&self, index: usize) -> Option<&Network> {
        self.networks.get(index)
    }

    pub fn network_mut(&mut self, index: usize) -> Option<&mut Network> {
        self.networks.get_mut(index)
    }

    pub fn ids(&self) -> &IdRegistry {
        &self.ids
    }

    pub fn hooks_mut(&mut self) -> &mut Hooks {
        &mut self.hooks
    }

    /// Highest-scoring network and its index
    pub fn best(&self) -> Option<(usize, &Network)> {
        self.networks.iter().enumerate().max_by(|(_, a), (_, b)| {
            a.score()
                .partial_cmp(&b.score())
                .unwrap_or(std::cmp::Ordering::Equal)
        })
    }

    /// Statistics of every replaced generation, oldest first
    pub fn stats(&self) -> &[GenerationStats] {
        &self.history
    }

    pub fn alive(&self) -> usize {
        self.networks.iter().filter(|n| !n.is_dead()).count()
    }

    fn reject(&self, safe: bool, transition: &str) -> Result<bool> {
        log::debug!("rejected {} in state {:?}", transition, self.state);
        if safe {
            Ok(false)
        } else {
            Err(EvoError::InvalidState(format!(
                "cannot {} a population in state {:?}",
                transition, self.state
            )))
        }
    }

    /// Stopped -> Running: build `size` fresh networks and mutate each once
    pub fn start(&mut self, safe: bool) -> Result<bool> {
        if self.state != State::Stopped {
            return self.reject(safe, "start");
        }
        self.destroy_networks()?;

        let size = self.config.population.size;
        let mut fresh = Vec::with_capacity(size);
        for _ in 0..size {
            match self.spawn(None) {
                Ok(network) => fresh.push(network),
                Err(e) => {
                    self.discard(fresh);
                    return Err(e);
                }
            }
        }

        self.networks = fresh;
        self.generation = 0;
        self.history.clear();
        self.state = State::Running;
        log::info!("population started: {} networks", self.networks.len());
        Ok(true)
    }

    /// Running -> Idle
    pub fn pause(&mut self, safe: bool) -> Result<bool> {
        if self.state != State::Running {
            return self.reject(safe, "pause");
        }
        self.state = State::Idle;
        log::info!("population paused at generation {}", self.generation);
        Ok(true)
    }

    /// Idle -> Running
    pub fn resume(&mut self, safe: bool) -> Result<bool> {
        if self.state != State::Idle {
            return self.reject(safe, "resume");
        }
        self.state = State::Running;
        log::info!("population resumed at generation {}", self.generation);
        Ok(true)
    }

    /// Idle -> Stopped -> Running
    pub fn restart(&mut self, safe: bool) -> Result<bool> {
        if self.state != State::Idle {
            return self.reject(safe, "restart");
        }
        self.stop(safe)?;
        self.start(safe)
    }

    /// Any non-stopped state -> Stopped, destroying every network
    pub fn stop(&mut self, safe: bool) -> Result<bool> {
        if self.state == State::Stopped {
            return self.reject(safe, "stop");
        }
        self.destroy_networks()?;
        self.state = State::Stopped;
        log::info!("population stopped at generation {}", self.generation);
        Ok(true)
    }

    /// Breed the next generation: weighted parent draws, clone, mutate, replace.
    ///
    /// On failure the partially built generation is released and the current
    /// one stays in place.
    pub fn evolve(&mut self, safe: bool) -> Result<bool> {
        if self.state != State::Running {
            return self.reject(safe, "evolve");
        }
        self.state = State::Idle;

        let scores: Vec<f64> = self.networks.iter().map(Network::score).collect();
        let weights = selection_weights(&scores, self.config.population.equality);
        let parents = draw_parents(&weights, self.config.population.size, &mut self.entropy);

        let mut next = Vec::with_capacity(parents.len());
        for parent in parents {
            match self.spawn(Some(parent)) {
                Ok(child) => next.push(child),
                Err(e) => {
                    self.discard(next);
                    self.state = State::Running;
                    return Err(e);
                }
            }
        }

        let stats = GenerationStats::collect(self.generation, &self.networks);
        log::info!("{}", stats);
        self.history.push(stats);

        let released = self.destroy_networks();
        self.networks = next;
        self.generation += 1;
        self.state = State::Running;
        released?;
        Ok(true)
    }

    /// Present one input vector to every alive network.
    ///
    /// `generator` receives the network index. Each output is rewarded
    /// (adapting on regression) and handed to the update hook, which decides
    /// whether the network survives. Returns the number still alive.
    pub fn input<G>(&mut self, mut generator: G) -> Result<usize>
    where
        G: FnMut(usize) -> Vec<f64>,
    {
        if self.state != State::Running {
            return Err(EvoError::InvalidState(format!(
                "input requires a running population, state is {:?}",
                self.state
            )));
        }

        let mut alive = 0;
        for (index, network) in self.networks.iter_mut().enumerate() {
            if network.is_dead() {
                continue;
            }
            let values = generator(index);
            let output = network.input(&values)?;
            let output = network.reinforce(
                index,
                output,
                &self.config,
                self.hooks.reward.as_mut(),
                &mut self.entropy,
            )?;
            if (self.hooks.update)(index, &output) {
                alive += 1;
            } else {
                network.kill();
                log::debug!("network {} died at generation {}", network.id(), self.generation);
            }
        }
        Ok(alive)
    }

    /// Build one network, cloned from `parent` when given, and mutate it once
    fn spawn(&mut self, parent: Option<usize>) -> Result<Network> {
        let mut network = match parent {
            Some(index) => {
                let reference = self.networks.get(index).ok_or_else(|| {
                    EvoError::NotFound(format!("parent network at index {}", index))
                })?;
                Network::clone_of(reference, &mut self.ids)
            }
            None => Network::new(&self.config, &mut self.ids)?,
        };
        if let Err(e) = network.evolve(&self.config, &mut self.entropy, &mut self.ids) {
            network.release(&mut self.ids)?;
            return Err(e);
        }
        Ok(network)
    }

    fn discard(&mut self, networks: Vec<Network>) {
        for network in networks {
            if let Err(e) = network.release(&mut self.ids) {
                log::warn!("failed to release discarded network: {}", e);
            }
        }
    }

    fn destroy_networks(&mut self) -> Result<()> {
        let networks = std::mem::take(&mut self.networks);
        networks
            .into_iter()
            .try_for_each(|network| network.release(&mut self.ids))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entropy::ScriptedEntropy;
    use crate::identity::{NETWORK_SCOPE, NEURON_SCOPE};

    fn small_config() -> Config {
        let mut config = Config::default();
        config.population.size = 6;
        config
    }

    fn population() -> Population {
        Population::with_seed(small_config(), Hooks::default(), 1).unwrap()
    }

    #[test]
    fn test_lifecycle() {
        let mut pop = population();
        assert_eq!(pop.state(), State::Stopped);

        assert!(pop.start(false).unwrap());
        assert_eq!(pop.state(), State::Running);
        assert_eq!(pop.networks().len(), 6);

        assert!(pop.pause(false).unwrap());
        assert_eq!(pop.state(), State::Idle);
        assert!(pop.resume(false).unwrap());
        assert!(pop.pause(false).unwrap());
        assert!(pop.restart(false).unwrap());
        assert_eq!(pop.state(), State::Running);

        assert!(pop.stop(false).unwrap());
        assert_eq!(pop.state(), State::Stopped);
        assert!(pop.networks().is_empty());
        assert_eq!(pop.ids().live(NEURON_SCOPE), 0);
        assert_eq!(pop.ids().live(NETWORK_SCOPE), 0);
    }

    #[test]
    fn test_invalid_transitions() {
        let mut pop = population();
        assert!(matches!(pop.pause(false), Err(EvoError::InvalidState(_))));
        assert!(!pop.pause(true).unwrap());
        assert!(!pop.resume(true).unwrap());
        assert!(!pop.restart(true).unwrap());
        assert!(!pop.stop(true).unwrap());
        assert!(!pop.evolve(true).unwrap());
        assert!(matches!(pop.input(|_| vec![0.0, 0.0]), Err(EvoError::InvalidState(_))));

        pop.start(false).unwrap();
        assert!(!pop.start(true).unwrap());
        assert!(!pop.resume(true).unwrap());
        assert!(!pop.restart(true).unwrap());
        pop.pause(false).unwrap();
        assert!(!pop.evolve(true).unwrap());
        assert!(matches!(pop.input(|_| vec![0.0, 0.0]), Err(EvoError::InvalidState(_))));
    }

    #[test]
    fn test_evolve_replaces_generation() {
        let mut pop = population();
        pop.start(false).unwrap();
        let before: Vec<_> = pop.networks().iter().map(Network::id).collect();

        assert!(pop.evolve(false).unwrap());
        assert_eq!(pop.state(), State::Running);
        assert_eq!(pop.generation(), 1);
        assert_eq!(pop.networks().len(), 6);
        assert_eq!(pop.stats().len(), 1);
        for id in before {
            assert!(!pop.ids().contains(NETWORK_SCOPE, id));
        }
        let neurons: usize = pop.networks().iter().map(Network::neuron_count).sum();
        assert_eq!(pop.ids().live(NEURON_SCOPE), neurons);
        assert_eq!(pop.ids().live(NETWORK_SCOPE), 6);
    }

    #[test]
    fn test_input_counts_alive() {
        let hooks = Hooks::new(|_, _| 1.0, |index, _| index % 2 == 0);
        let mut pop = Population::with_seed(small_config(), hooks, 3).unwrap();
        pop.start(false).unwrap();

        assert_eq!(pop.input(|_| vec![0.5, 0.5]).unwrap(), 3);
        assert_eq!(pop.alive(), 3);
        // Dead networks are skipped and keep their score
        assert_eq!(pop.input(|_| vec![0.1, 0.9]).unwrap(), 3);
        assert_eq!(pop.network(0).unwrap().score(), 2.0);
        assert_eq!(pop.network(1).unwrap().score(), 1.0);
    }

    #[test]
    fn test_generator_receives_index() {
        let mut config = small_config();
        config.network.inputs = 1;
        let mut pop = Population::with_seed(config, Hooks::default(), 4).unwrap();
        pop.start(false).unwrap();

        let mut seen = Vec::new();
        pop.input(|index| {
            seen.push(index);
            vec![index as f64]
        })
        .unwrap();
        assert_eq!(seen, vec![0, 1, 2, 3, 4, 5]);
    }

    #[test]
    fn test_best_network() {
        let hooks = Hooks::reward_only(|index, _| index as f64);
        let mut pop = Population::with_seed(small_config(), hooks, 5).unwrap();
        pop.start(false).unwrap();
        pop.input(|_| vec![0.0, 0.0]).unwrap();
        assert_eq!(pop.best().map(|(i, _)| i), Some(5));
    }

    #[test]
    fn test_scripted_entropy_population() {
        let pop = Population::new(small_config(), Hooks::default(), ScriptedEntropy::constant(0.5));
        let mut pop = pop.unwrap();
        pop.start(false).unwrap();
        pop.evolve(false).unwrap();
        assert_eq!(pop.networks().len(), 6);
    }
}
