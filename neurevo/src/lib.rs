//! A population-based evolutionary search engine over user-defined
//! genomic structures, in the style of NeuroEvolution of Augmenting
//! Topologies (<http://nn.cs.utexas.edu/keyword?stanley:ec02>).
//!
//! The engine is generic over the [`Genome`] trait and knows nothing
//! about any scoring domain: fitness comes from a caller-supplied
//! batch callback, and genome decoding is left to the genome crate.
//! A neural network-based genome representation is supplied by the
//! `neurevo-nn` crate.
//!
//! All engine randomness flows from a single seeded RNG owned by the
//! [`Population`] and serialized with it, so runs are reproducible
//! and checkpoints resume exactly where the run left off.
//!
//! # Example usage: evolution of an XOR function approximator
//! ```no_run
//! use neurevo::{Genome, ParentSelection, Population, PopulationConfig};
//! use neurevo_nn::{
//!     genomics::{ActivationType, GeneticConfig, InnovationLog, NNGenome},
//!     networks::FeedForwardNetwork,
//! };
//! use std::num::NonZeroUsize;
//!
//! fn main() {
//!     let genetic_config = GeneticConfig {
//!         input_count: NonZeroUsize::new(2).unwrap(),
//!         output_count: NonZeroUsize::new(1).unwrap(),
//!         activation_types: vec![ActivationType::Sigmoid],
//!         output_activation_types: vec![ActivationType::Sigmoid],
//!         initial_expression_chance: 1.0,
//!         weight_bound: 5.0,
//!         weight_reset_chance: 0.1,
//!         weight_nudge_chance: 0.8,
//!         weight_mutation_power: 0.5,
//!         node_addition_mutation_chance: 0.03,
//!         gene_addition_mutation_chance: 0.05,
//!         max_gene_addition_mutation_attempts: 20,
//!         excess_gene_factor: 1.0,
//!         disjoint_gene_factor: 1.0,
//!         common_weight_factor: 0.4,
//!         ..GeneticConfig::zero()
//!     };
//!
//!     let population_config = PopulationConfig {
//!         size: NonZeroUsize::new(150).unwrap(),
//!         distance_threshold: 3.0,
//!         elitism_fraction: 0.1,
//!         survival_fraction: 0.2,
//!         parent_selection: ParentSelection::FitnessProportional,
//!         stagnation_limit: NonZeroUsize::new(15).unwrap(),
//!         fitness_target: Some(3.9),
//!         max_generations: Some(100),
//!         rng_seed: 42,
//!         ..PopulationConfig::zero()
//!     };
//!
//!     let mut population =
//!         Population::<_, InnovationLog, NNGenome>::new(population_config, genetic_config)
//!             .unwrap();
//!     let report = population
//!         .run(
//!             |batch| {
//!                 for (_, genome) in batch {
//!                     let mut network = FeedForwardNetwork::try_from(&**genome)?;
//!                     let mut fitness = 4.0;
//!                     for (input, expected) in [
//!                         ([0.0, 0.0], 0.0),
//!                         ([0.0, 1.0], 1.0),
//!                         ([1.0, 0.0], 1.0),
//!                         ([1.0, 1.0], 0.0),
//!                     ] {
//!                         let output = network.activate(&input)[0];
//!                         fitness -= (output - expected) * (output - expected);
//!                     }
//!                     genome.set_fitness(fitness);
//!                 }
//!                 Ok(())
//!             },
//!             None,
//!             None,
//!         )
//!         .unwrap();
//!     println!("{:?}: best fitness {}", report.state, report.champion.1.fitness());
//! }
//! ```

mod checkpoint;
mod genome;
mod populations;

pub use checkpoint::*;
pub use genome::*;
pub use populations::*;
