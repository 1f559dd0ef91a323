use crate::genomics::GeneticConfig;
use crate::Innovation;

use rand::prelude::{Rng, RngCore};
use serde::{Deserialize, Serialize};

use std::fmt;

/// Genes are the principal components of genomes.
/// They are created between two nodes, and become
/// network connections in the genome's phenotype.
/// Disabled genes are carried in the genome but not
/// expressed in the phenotype.
#[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
pub struct Gene {
    id: Innovation,
    input: Innovation,
    output: Innovation,
    weight: f32,
    enabled: bool,
}

impl Gene {
    /// Returns a new enabled gene with the specified parameters.
    ///
    /// # Examples
    /// ```
    /// use neurevo_nn::genomics::Gene;
    ///
    /// let gene = Gene::new(42, 3, 9, 2.0);
    /// ```
    pub fn new(id: Innovation, input: Innovation, output: Innovation, weight: f32) -> Gene {
        Gene {
            id,
            input,
            output,
            weight,
            enabled: true,
        }
    }

    /// Returns a random weight, drawn uniformly from the range
    /// ±`config.weight_bound`.
    pub(super) fn random_weight(config: &GeneticConfig, rng: &mut dyn RngCore) -> f32 {
        rng.gen_range(-config.weight_bound..=config.weight_bound)
    }

    /// Replaces the gene's weight with a random value drawn
    /// uniformly from the range ±[`weight_bound`].
    ///
    /// [`weight_bound`]: crate::genomics::GeneticConfig::weight_bound
    pub fn randomize_weight(&mut self, config: &GeneticConfig, rng: &mut dyn RngCore) {
        self.weight = Self::random_weight(config, rng);
    }

    /// Nudges the gene's weight by a random amount drawn uniformly
    /// from the range ±[`weight_mutation_power`]. If the weight's
    /// magnitude would exceed the [`weight_bound`], it is clamped
    /// to the bound with the same sign.
    ///
    /// [`weight_mutation_power`]: crate::genomics::GeneticConfig::weight_mutation_power
    /// [`weight_bound`]: crate::genomics::GeneticConfig::weight_bound
    pub fn nudge_weight(&mut self, config: &GeneticConfig, rng: &mut dyn RngCore) {
        self.weight +=
            rng.gen_range(-config.weight_mutation_power..=config.weight_mutation_power);
        self.weight = self.weight.clamp(-config.weight_bound, config.weight_bound);
    }

    /// Returns the gene's innovation number.
    pub fn innovation(&self) -> Innovation {
        self.id
    }

    /// Returns the gene's input node's innovation number.
    pub fn input(&self) -> Innovation {
        self.input
    }

    /// Returns the gene's output node's innovation number.
    pub fn output(&self) -> Innovation {
        self.output
    }

    /// Returns the gene's weight.
    pub fn weight(&self) -> f32 {
        self.weight
    }

    /// Sets the gene's weight.
    pub fn set_weight(&mut self, w: f32) {
        self.weight = w;
    }

    /// Returns whether the gene is expressed in the phenotype.
    pub fn enabled(&self) -> bool {
        self.enabled
    }

    /// Sets whether the gene is expressed in the phenotype.
    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    /// Returns the gene's input and output's innovation numbers.
    pub(super) fn endpoints(&self) -> (Innovation, Innovation) {
        (self.input, self.output)
    }
}

impl fmt::Display for Gene {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}{:?}[{:?}->{:?}, {:.3}]{}",
            if self.enabled { "" } else { "(" },
            self.id,
            self.input,
            self.output,
            self.weight,
            if self.enabled { "" } else { ")" },
        )
    }
}
