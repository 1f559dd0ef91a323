//! Tic-tac-toe legal move finder.
//!
//! Evolves a network that maps a board (-1 for the opponent's
//! marks, +1 for the program's, 0 for blanks) to a legal-move
//! matrix with 1 in every blank cell and 0 everywhere else.

use neurevo::{CheckpointStore, ParentSelection, Population, PopulationConfig};
use neurevo_nn::genomics::{ActivationType, GeneticConfig, InnovationLog, NNGenome};
use neurevo_nn::networks::FeedForwardNetwork;

use rand::prelude::{Rng, SeedableRng};
use rand::rngs::StdRng;
use rayon::prelude::*;

use std::convert::TryFrom;
use std::num::NonZeroUsize;

const BOARD_CELLS: usize = 9;
const TRAINING_BOARDS: usize = 10;

struct TrainingBoard {
    cells: [f32; BOARD_CELLS],
    legal: [f32; BOARD_CELLS],
}

fn generate_training_set(rng: &mut StdRng) -> Vec<TrainingBoard> {
    (0..TRAINING_BOARDS)
        .map(|_| {
            let mut cells = [0.0; BOARD_CELLS];
            for cell in cells.iter_mut() {
                *cell = [-1.0, 0.0, 1.0][rng.gen_range(0..3)];
            }
            let mut legal = [0.0; BOARD_CELLS];
            for (l, c) in legal.iter_mut().zip(&cells) {
                *l = if *c == 0.0 { 1.0 } else { 0.0 };
            }
            TrainingBoard { cells, legal }
        })
        .collect()
}

/// The fitness is 1 minus the sum over all boards of the squared
/// difference between each output cell and the correct cell,
/// divided by nine. A perfect genome scores exactly 1; every
/// decodable genome scores strictly above `1 - boards.len()`.
fn evaluate(genome: &NNGenome, boards: &[TrainingBoard]) -> f32 {
    // Gene addition can close a cycle; such genomes have no
    // feed-forward phenotype and score below every decodable one.
    let mut network = match FeedForwardNetwork::try_from(genome) {
        Ok(network) => network,
        Err(_) => return 1.0 - boards.len() as f32,
    };
    let mut fitness = 1.0;
    for board in boards {
        let output = network.activate(&board.cells);
        for (expected, actual) in board.legal.iter().zip(&output) {
            fitness -= (expected - actual).powi(2) / BOARD_CELLS as f32;
        }
    }
    fitness
}

fn genetic_config() -> GeneticConfig {
    GeneticConfig {
        input_count: NonZeroUsize::new(BOARD_CELLS).unwrap(),
        output_count: NonZeroUsize::new(BOARD_CELLS).unwrap(),
        activation_types: vec![ActivationType::Sigmoid],
        output_activation_types: vec![ActivationType::Sigmoid; BOARD_CELLS],
        initial_expression_chance: 1.0,
        weight_bound: 5.0,
        weight_reset_chance: 0.1,
        weight_nudge_chance: 0.8,
        weight_mutation_power: 0.5,
        bias_nudge_chance: 0.7,
        bias_mutation_power: 0.5,
        node_addition_mutation_chance: 0.03,
        gene_addition_mutation_chance: 0.05,
        gene_toggle_mutation_chance: 0.01,
        max_gene_addition_mutation_attempts: 20,
        recursion_chance: 0.0,
        excess_gene_factor: 1.0,
        disjoint_gene_factor: 1.0,
        common_weight_factor: 0.4,
        ..GeneticConfig::zero()
    }
}

fn main() {
    let population_config = PopulationConfig {
        size: NonZeroUsize::new(150).unwrap(),
        distance_threshold: 3.0,
        elitism_fraction: 0.1,
        survival_fraction: 0.2,
        parent_selection: ParentSelection::FitnessProportional,
        stagnation_limit: NonZeroUsize::new(15).unwrap(),
        fitness_target: Some(0.99),
        max_generations: Some(1000),
        rng_seed: 42,
        ..PopulationConfig::zero()
    };

    let mut training_rng = StdRng::seed_from_u64(1234);
    let boards = generate_training_set(&mut training_rng);

    let checkpoints = CheckpointStore::new(
        "checkpoints",
        "tictactoe",
        NonZeroUsize::new(100).unwrap(),
    );

    let mut population =
        Population::<_, InnovationLog, NNGenome>::new(population_config, genetic_config())
            .expect("invalid configuration");

    let report = population
        .run(
            |batch| {
                batch.par_iter_mut().for_each(|(_, genome)| {
                    let fitness = evaluate(&**genome, &boards);
                    genome.set_fitness(fitness);
                });
                Ok(())
            },
            Some(&checkpoints),
            None,
        )
        .expect("evolution failed");

    println!(
        "\n{:?} after {} generations",
        report.state,
        report.generations.len()
    );

    let (_, winner) = report.champion;
    println!("\nBest genome:\n{}", winner);

    let mut network = FeedForwardNetwork::try_from(&winner).expect("champion failed to decode");
    println!("\nOutput:");
    for board in &boards {
        let output = network.activate(&board.cells);
        println!(
            "input {:?}, expected output {:?}, got {:?}",
            board.cells, board.legal, output
        );
    }
    println!("\nfitness: {:.4}", winner.fitness());
}
