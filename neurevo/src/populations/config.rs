use crate::populations::EvolutionError;

use serde::{Deserialize, Serialize};

use std::num::NonZeroUsize;

/// Policy used to pick each parent among a species' survivors.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ParentSelection {
    /// Uniformly random.
    Uniform,
    /// Probability proportional to fitness (min-shifted so that
    /// negative fitness values are handled).
    FitnessProportional,
    /// Best of `size` uniformly drawn candidates.
    Tournament(NonZeroUsize),
}

/// Configuration data for population generation and evolution.
///
/// # Note
/// All quantities expressing fractions should be in the
/// range [0.0, 1.0]; [`validate`] rejects anything else.
///
/// [`validate`]: PopulationConfig::validate
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PopulationConfig {
    /// Size of the population, invariant across generations.
    pub size: NonZeroUsize,
    /// Compatibility distance threshold, beyond which genomes
    /// are considered as belonging to different species.
    pub distance_threshold: f32,
    /// Fraction of each species copied gene-for-gene into the
    /// next generation.
    pub elitism_fraction: f32,
    /// Top fraction of each species eligible as parents.
    pub survival_fraction: f32,
    /// How parents are drawn from the eligible members.
    pub parent_selection: ParentSelection,
    /// Number of non-improving generations after which a species
    /// is removed from reproduction.
    pub stagnation_limit: NonZeroUsize,
    /// Minimum fitness gain over a species' historical best that
    /// counts as an improvement.
    pub improvement_epsilon: f32,
    /// Fitness assigned to every genome before evaluation.
    pub fitness_baseline: f32,
    /// Champion fitness at which a run terminates as `Converged`.
    pub fitness_target: Option<f32>,
    /// Number of generations after which a run terminates as
    /// `Exhausted`. `None` runs indefinitely.
    pub max_generations: Option<usize>,
    /// Seed for the population's RNG. Two runs with identical
    /// configurations and seeds produce identical populations.
    pub rng_seed: u64,
}

impl PopulationConfig {
    /// Returns a "zero-valued" default configuration.
    /// All values are 0, `None`, or in the case of
    /// `NonZeroUsize`s, 1.
    ///
    /// # Note
    /// This value is not suitable for use in most experiments.
    /// It is meant as a way to abbreviate configuration
    /// instantiation, or to fill in unused values.
    ///
    /// # Examples
    /// ```
    /// use neurevo::PopulationConfig;
    ///
    /// let cfg = PopulationConfig {
    ///     distance_threshold: 3.0,
    ///     ..PopulationConfig::zero()
    /// };
    /// ```
    pub const fn zero() -> PopulationConfig {
        PopulationConfig {
            // SAFETY: 1 is a valid NonZeroUsize. Replace this with
            // NonZeroUsize::new(1).unwrap() once const Option::unwrap
            // becomes stable.
            size: unsafe { NonZeroUsize::new_unchecked(1) },
            distance_threshold: 0.0,
            elitism_fraction: 0.0,
            survival_fraction: 0.0,
            parent_selection: ParentSelection::Uniform,
            // SAFETY: as above.
            stagnation_limit: unsafe { NonZeroUsize::new_unchecked(1) },
            improvement_epsilon: 0.0,
            fitness_baseline: 0.0,
            fitness_target: None,
            max_generations: None,
            rng_seed: 0,
        }
    }

    /// Checks the configuration for nonsensical values.
    ///
    /// # Errors
    /// Returns [`EvolutionError::InvalidConfig`] naming the first
    /// offending field.
    pub fn validate(&self) -> Result<(), EvolutionError> {
        fn fraction(name: &str, value: f32) -> Result<(), EvolutionError> {
            if (0.0..=1.0).contains(&value) {
                Ok(())
            } else {
                Err(EvolutionError::InvalidConfig(format!(
                    "{} must be within [0.0, 1.0], got {}",
                    name, value
                )))
            }
        }

        fraction("elitism_fraction", self.elitism_fraction)?;
        fraction("survival_fraction", self.survival_fraction)?;
        if !(self.distance_threshold >= 0.0) {
            return Err(EvolutionError::InvalidConfig(format!(
                "distance_threshold must be non-negative, got {}",
                self.distance_threshold
            )));
        }
        if !(self.improvement_epsilon >= 0.0) {
            return Err(EvolutionError::InvalidConfig(format!(
                "improvement_epsilon must be non-negative, got {}",
                self.improvement_epsilon
            )));
        }
        if !self.fitness_baseline.is_finite() {
            return Err(EvolutionError::InvalidConfig(format!(
                "fitness_baseline must be finite, got {}",
                self.fitness_baseline
            )));
        }
        if let Some(target) = self.fitness_target {
            if !target.is_finite() {
                return Err(EvolutionError::InvalidConfig(format!(
                    "fitness_target must be finite, got {}",
                    target
                )));
            }
        }
        Ok(())
    }
}
