//! A Population is a collection of genomes. These are grouped into
//! species, which can be evolved using a genome evaluation callback
//! as the source of selective pressure.
mod config;
mod errors;
mod log;
mod offspring_factory;
mod species;

use crate::checkpoint::CheckpointStore;
use crate::{Genome, InnovationRecord};
pub use config::{ParentSelection, PopulationConfig};
pub use errors::{EvaluationError, EvolutionError};
pub use log::{GenerationSummary, RunReport, Stats};
use offspring_factory::OffspringFactory;
pub use species::{GenomeId, Member, Species, SpeciesID};

use ::log::{debug, info};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

use std::sync::atomic::{AtomicBool, Ordering};

/// The phases of a run's generation loop, plus its terminal states.
///
/// A run cycles `Evaluating → Speciating → CullingStagnant →
/// Reproducing` until it reaches `Converged` (champion fitness at or
/// above the configured target), `Exhausted` (generation limit hit,
/// or stop flag observed), or `Failed` (extinction or evaluator
/// error; reported through [`EvolutionError`] with the last complete
/// generation left inspectable).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum RunState {
    Initializing,
    Evaluating,
    Speciating,
    CullingStagnant,
    Reproducing,
    Converged,
    Exhausted,
    Failed,
}

/// A population of genomes, partitioned into species.
///
/// The population exclusively owns one generation's genomes at a
/// time; [`evolve`] replaces them wholesale. All randomness flows
/// from a single seeded RNG owned by the population, which is
/// serialized along with everything else, so a restored checkpoint
/// continues exactly as the uninterrupted run would have.
///
/// [`evolve`]: Population::evolve
#[derive(Serialize, Deserialize)]
pub struct Population<C, R, G> {
    species: Vec<Species<G>>,
    record: R,
    generation: usize,
    historical_species_count: usize,
    next_genome_id: u64,
    population_config: PopulationConfig,
    genetic_config: C,
    rng: ChaCha8Rng,
}

impl<C, R, G> Population<C, R, G>
where
    G: Genome<InnovationRecord = R, Config = C> + Clone,
{
    /// Creates a new population of minimal-topology genomes using
    /// the passed configurations, all grouped into a single species.
    ///
    /// The type of `genetic_config` depends on the implementation
    /// of [`Genome`], and is effectively opaque to the population.
    ///
    /// # Errors
    /// Fails with [`EvolutionError::InvalidConfig`] if the
    /// population configuration does not validate.
    ///
    /// [`Genome`]: crate::Genome
    pub fn new(
        population_config: PopulationConfig,
        genetic_config: C,
    ) -> Result<Population<C, R, G>, EvolutionError>
    where
        R: InnovationRecord<Config = C>,
    {
        population_config.validate()?;

        let mut rng = ChaCha8Rng::seed_from_u64(population_config.rng_seed);
        let mut next_genome_id = 0;
        let mut members: Vec<Member<G>> = (0..population_config.size.get())
            .map(|_| Member {
                id: {
                    let id = GenomeId(next_genome_id);
                    next_genome_id += 1;
                    id
                },
                genome: G::new(&genetic_config, &mut rng),
            })
            .collect();

        let mut s0 = Species::new(SpeciesID(0, 0), members.remove(0));
        for member in members {
            s0.add_member(member);
        }

        Ok(Population {
            species: vec![s0],
            record: R::new(&genetic_config),
            generation: 0,
            historical_species_count: 1,
            next_genome_id,
            population_config,
            genetic_config,
            rng,
        })
    }

    /// Evaluates the fitness of the current generation using the
    /// passed callback.
    ///
    /// Every genome's fitness is first reset to the configured
    /// baseline; the callback is then invoked exactly once with the
    /// complete population as `(id, genome)` pairs in stable
    /// (species creation, then member) order, and must assign each
    /// genome a finite fitness. Fitness evaluation of individual
    /// genomes is free of shared state and may be parallelized
    /// inside the callback at the caller's discretion.
    ///
    /// # Errors
    /// A callback error, or any non-finite fitness left behind by
    /// it, is fatal; the population remains at the last fully
    /// evaluated generation.
    pub fn evaluate_fitness<E>(&mut self, mut evaluator: E) -> Result<(), EvolutionError>
    where
        E: FnMut(&mut [(GenomeId, &mut G)]) -> Result<(), EvaluationError>,
    {
        let baseline = self.population_config.fitness_baseline;
        let mut batch: Vec<(GenomeId, &mut G)> = self
            .species
            .iter_mut()
            .flat_map(|s| s.members.iter_mut())
            .map(|m| {
                m.genome.set_fitness(baseline);
                (m.id, &mut m.genome)
            })
            .collect();

        evaluator(&mut batch).map_err(EvolutionError::Evaluator)?;

        for (id, genome) in &batch {
            if !genome.fitness().is_finite() {
                return Err(EvolutionError::NonFiniteFitness(*id));
            }
        }
        Ok(())
    }

    /// Advances the population by one generation: re-speciates the
    /// evaluated genomes, updates stagnation records, culls stagnant
    /// species, and fills the next generation with each surviving
    /// species' elites and offspring.
    ///
    /// The next generation has exactly the configured size, and
    /// every member carries a fresh [`GenomeId`] and baseline
    /// fitness.
    ///
    /// # Errors
    /// Returns [`EvolutionError::Extinction`] if culling removes
    /// every species; no offspring are generated, and the last
    /// evaluated generation's genomes remain inspectable.
    pub fn evolve(&mut self) -> Result<(), EvolutionError> {
        self.speciate();
        for species in &mut self.species {
            species.update_stagnation(self.population_config.improvement_epsilon);
        }
        self.cull_stagnant()?;
        let allotted_offspring = self.allot_offspring();
        self.generate_offspring(&allotted_offspring);
        self.remove_empty_species();
        self.generation += 1;
        Ok(())
    }

    /// Runs the generation loop to a terminal state: evaluation,
    /// convergence/exhaustion checks, then [`evolve`], with an
    /// optional checkpoint write after each generation (write
    /// failures are logged and never interrupt the run) and an
    /// optional cooperative stop flag checked before each
    /// evaluation phase.
    ///
    /// # Errors
    /// An evaluator failure or total extinction ends the run in the
    /// `Failed` state, reported as the corresponding
    /// [`EvolutionError`]; the population remains inspectable at
    /// the last complete generation.
    ///
    /// [`evolve`]: Population::evolve
    pub fn run<E>(
        &mut self,
        mut evaluator: E,
        checkpoints: Option<&CheckpointStore>,
        stop: Option<&AtomicBool>,
    ) -> Result<RunReport<G>, EvolutionError>
    where
        E: FnMut(&mut [(GenomeId, &mut G)]) -> Result<(), EvaluationError>,
        Self: Serialize,
    {
        self.population_config.validate()?;
        let mut summaries = Vec::new();

        loop {
            if stop.map_or(false, |flag| flag.load(Ordering::Relaxed)) {
                return Ok(self.report(RunState::Exhausted, summaries));
            }

            self.evaluate_fitness(&mut evaluator)?;

            let summary = self.summary();
            info!(
                "generation {}: best {:.4}, mean {:.4}, {} species",
                summary.generation,
                summary.fitness.maximum,
                summary.fitness.mean,
                summary.species_count
            );
            summaries.push(summary);

            if let Some(target) = self.population_config.fitness_target {
                if self.champion().genome.fitness() >= target {
                    return Ok(self.report(RunState::Converged, summaries));
                }
            }
            if let Some(max_generations) = self.population_config.max_generations {
                if self.generation + 1 >= max_generations {
                    return Ok(self.report(RunState::Exhausted, summaries));
                }
            }

            self.evolve()?;

            if let Some(store) = checkpoints {
                store.save_if_due(self);
            }
        }
    }

    fn report(&self, state: RunState, generations: Vec<GenerationSummary>) -> RunReport<G> {
        let champion = self.champion();
        RunReport {
            state,
            champion: (champion.id, champion.genome.clone()),
            generations,
        }
    }

    /// Reassigns every genome to a species by compatibility
    /// distance to species representatives. Assignment checks
    /// species in creation order and the first within the threshold
    /// wins; genomes compatible with none found a new species.
    fn speciate(&mut self) {
        let mut incompatible = Vec::new();
        for species in &mut self.species {
            let mut i = 0;
            while i < species.members.len() {
                if G::distance(
                    &species.members[i].genome,
                    species.representative(),
                    &self.genetic_config,
                ) >= self.population_config.distance_threshold
                {
                    incompatible.push(species.members.remove(i));
                } else {
                    i += 1;
                }
            }
        }

        let mut new_species_count = 0;
        for member in incompatible {
            if self.assign_to_species(
                member,
                SpeciesID(self.historical_species_count, new_species_count),
            ) {
                new_species_count += 1;
            }
        }
        if new_species_count > 0 {
            debug!("speciation founded {} new species", new_species_count);
            self.historical_species_count += 1;
        }
        self.remove_empty_species();
    }

    /// Assigns a member to the first compatible species, or founds
    /// a new one with it as representative. Returns whether a new
    /// species was created.
    fn assign_to_species(&mut self, member: Member<G>, new_species_id: SpeciesID) -> bool {
        for species in &mut self.species {
            if G::distance(&member.genome, species.representative(), &self.genetic_config)
                < self.population_config.distance_threshold
            {
                species.add_member(member);
                return false;
            }
        }
        self.species.push(Species::new(new_species_id, member));
        true
    }

    /// Removes species stagnated beyond the configured limit. The
    /// species holding the population's best genome is always kept.
    fn cull_stagnant(&mut self) -> Result<(), EvolutionError> {
        let limit = self.population_config.stagnation_limit.get();
        let best_species = self.champion_species_id();
        let before = self.species.len();
        self.species
            .retain(|s| s.time_stagnated() <= limit || s.id() == best_species);
        if self.species.len() < before {
            debug!("culled {} stagnant species", before - self.species.len());
        }
        if self.species.is_empty() {
            return Err(EvolutionError::Extinction);
        }
        Ok(())
    }

    fn champion_species_id(&self) -> SpeciesID {
        self.species
            .iter()
            .max_by(|s1, s2| {
                s1.champion()
                    .genome
                    .fitness()
                    .partial_cmp(&s2.champion().genome.fitness())
                    .unwrap_or_else(|| panic!("uncomparable fitness value detected"))
            })
            .expect("empty population has no champion")
            .id()
    }

    /// Allots the number of offspring for each species. Shares are
    /// proportional to mean member fitness shifted by the population
    /// minimum (so negative fitness is handled), rounded by
    /// largest-remainder apportionment; the champion's species is
    /// floored at one offspring.
    fn allot_offspring(&self) -> Vec<usize> {
        let size = self.population_config.size.get();
        let min_fitness = self
            .members()
            .map(|m| m.genome.fitness())
            .fold(f32::INFINITY, f32::min);
        let shares: Vec<f32> = self
            .species
            .iter()
            .map(|s| s.mean_fitness() - min_fitness)
            .collect();
        let share_sum: f32 = shares.iter().sum();

        let raw: Vec<f32> = if share_sum > 0.0 {
            shares
                .iter()
                .map(|share| share / share_sum * size as f32)
                .collect()
        } else {
            // Every species is equally (un)fit.
            vec![size as f32 / self.species.len() as f32; self.species.len()]
        };
        let mut allotted = round_retain_sum(&raw);

        let best_species = self.champion_species_id();
        let best_index = self
            .species
            .iter()
            .position(|s| s.id() == best_species)
            .expect("champion species not in species table");
        if allotted[best_index] == 0 {
            let donor = allotted
                .iter()
                .enumerate()
                .max_by_key(|(_, n)| **n)
                .map(|(i, _)| i)
                .expect("empty allotment");
            allotted[donor] -= 1;
            allotted[best_index] = 1;
        }
        allotted
    }

    /// Generates each species' assigned offspring, keeping the
    /// species' elite and crossing the top performers.
    fn generate_offspring(&mut self, allotted_offspring: &[usize]) {
        self.sort_members_by_decreasing_fitness();

        let offspring_of_species = OffspringFactory::new(
            &self.species,
            &mut self.record,
            &self.genetic_config,
            &self.population_config,
        )
        .generate_offspring(allotted_offspring, &mut self.next_genome_id, &mut self.rng);

        for (species, offspring) in self.species.iter_mut().zip(offspring_of_species) {
            species.members = offspring;
        }
    }

    /// Sorts each species' members by fitness in descending order.
    fn sort_members_by_decreasing_fitness(&mut self) {
        for species in &mut self.species {
            species.members.sort_unstable_by(|m1, m2| {
                m2.genome
                    .fitness()
                    .partial_cmp(&m1.genome.fitness())
                    .unwrap_or_else(|| panic!("uncomparable fitness value detected"))
            });
        }
    }

    /// Removes all species left without members, and keeps the
    /// species table in creation order.
    fn remove_empty_species(&mut self) {
        self.species.retain(|s| s.members().next().is_some());
        self.species.sort_unstable_by_key(|s| s.id());
    }

    /// Returns the current best-performing member.
    ///
    /// # Panics
    /// Panics if the population is empty or contains NaN fitness
    /// values; neither can arise through the public API.
    pub fn champion(&self) -> &Member<G> {
        self.members()
            .max_by(|m1, m2| {
                m1.genome
                    .fitness()
                    .partial_cmp(&m2.genome.fitness())
                    .unwrap_or_else(|| panic!("uncomparable fitness value detected"))
            })
            .expect("empty population has no champion")
    }

    /// Returns an iterator over all current members, in stable
    /// (species creation, then member) order.
    pub fn members(&self) -> impl Iterator<Item = &Member<G>> {
        self.species.iter().flat_map(|s| s.members.iter())
    }

    /// Returns an iterator over all current species.
    pub fn species(&self) -> impl Iterator<Item = &Species<G>> {
        self.species.iter()
    }

    /// Returns the current generation number.
    pub fn generation(&self) -> usize {
        self.generation
    }

    /// Returns the population's innovation record.
    pub fn record(&self) -> &R {
        &self.record
    }

    /// Returns the population's configuration.
    pub fn population_config(&self) -> &PopulationConfig {
        &self.population_config
    }

    /// Returns summary statistics for the current generation.
    pub fn summary(&self) -> GenerationSummary {
        GenerationSummary {
            generation: self.generation,
            fitness: Stats::from(self.members().map(|m| m.genome.fitness())),
            species_count: self.species.len(),
        }
    }
}

/// Rounds all values to whole numbers while preserving their order
/// and sum, assuming it is also whole. Rounding is done in the
/// manner that minimizes the average error to the original set of
/// values (largest-remainder apportionment).
fn round_retain_sum(values: &[f32]) -> Vec<usize> {
    let total_sum = values.iter().sum::<f32>().round() as usize;
    let mut truncated: Vec<(usize, usize, f32)> = values
        .iter()
        .enumerate()
        .map(|(i, f)| {
            let u = f.floor();
            let e = f - u;
            (i, u as usize, e)
        })
        .collect();
    let truncated_sum: usize = truncated.iter().map(|(_, u, _)| *u).sum();
    let remainder: usize = total_sum - truncated_sum;
    // Sort in decreasing order of error
    truncated.sort_unstable_by(|a, b| b.2.partial_cmp(&a.2).unwrap());
    for (_, u, _) in truncated.iter_mut().take(remainder) {
        *u += 1;
    }
    truncated.sort_by_key(|(i, ..)| *i);
    truncated.iter().map(|(_, u, _)| *u).collect()
}
