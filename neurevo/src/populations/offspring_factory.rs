use super::*;

use rand::prelude::{Rng, RngCore, SliceRandom};

/// Auxiliary type for offspring generation. Handles the tasks of
/// producing a species' allotted offspring according to the
/// configured elitism, survival and parent-selection policies.
pub(super) struct OffspringFactory<'a, C, R, G> {
    species: &'a [Species<G>],
    record: &'a mut R,
    genetic_config: &'a C,
    population_config: &'a PopulationConfig,
}

impl<'a, C, R, G> OffspringFactory<'a, C, R, G>
where
    G: Genome<InnovationRecord = R, Config = C> + Clone,
{
    pub(super) fn new(
        species: &'a [Species<G>],
        record: &'a mut R,
        genetic_config: &'a C,
        population_config: &'a PopulationConfig,
    ) -> OffspringFactory<'a, C, R, G> {
        OffspringFactory {
            species,
            record,
            genetic_config,
            population_config,
        }
    }

    /// Generates the allotted offspring for each species, in
    /// species order. Members must already be sorted by decreasing
    /// fitness. Every offspring receives a fresh id and the
    /// configured baseline fitness.
    pub(super) fn generate_offspring(
        &mut self,
        allotted_offspring: &[usize],
        next_genome_id: &mut u64,
        rng: &mut dyn RngCore,
    ) -> Vec<Vec<Member<G>>> {
        let mut offspring_of_species = Vec::with_capacity(self.species.len());

        for (species_index, &allotted) in allotted_offspring.iter().enumerate() {
            let species = &self.species[species_index];
            let elite = species
                .count_elite(self.population_config)
                .min(allotted);

            let mut offspring = Vec::with_capacity(allotted);
            self.add_species_elite(&mut offspring, species, elite, next_genome_id);
            self.add_crossed_offspring(
                &mut offspring,
                species,
                allotted - elite,
                next_genome_id,
                rng,
            );
            offspring_of_species.push(offspring);
        }

        offspring_of_species
    }

    /// Copies the top `elite` members of the species into the
    /// offspring, gene-for-gene, with fresh ids and reset fitness.
    fn add_species_elite(
        &self,
        offspring: &mut Vec<Member<G>>,
        species: &Species<G>,
        elite: usize,
        next_genome_id: &mut u64,
    ) {
        for member in &species.members[..elite] {
            let mut genome = member.genome.clone();
            genome.set_fitness(self.population_config.fitness_baseline);
            offspring.push(Member {
                id: fresh_id(next_genome_id),
                genome,
            });
        }
    }

    /// Selects parent pairs among the species' survivors and
    /// crosses and mutates them into children.
    fn add_crossed_offspring(
        &mut self,
        offspring: &mut Vec<Member<G>>,
        species: &Species<G>,
        count: usize,
        next_genome_id: &mut u64,
        rng: &mut dyn RngCore,
    ) {
        let survivors = species.count_survivors(self.population_config);
        let eligible = &species.members[..survivors.min(species.members.len())];

        for _ in 0..count {
            let parent1 = self.select_parent(eligible, species.id(), rng);
            let parent2 = self.select_parent(eligible, species.id(), rng);
            let mut child =
                G::crossover(&parent1.genome, &parent2.genome, self.genetic_config, rng);
            child.mutate(self.record, self.genetic_config, rng);
            child.set_fitness(self.population_config.fitness_baseline);
            offspring.push(Member {
                id: fresh_id(next_genome_id),
                genome: child,
            });
        }
    }

    fn select_parent<'b>(
        &self,
        eligible: &'b [Member<G>],
        species_id: SpeciesID,
        rng: &mut dyn RngCore,
    ) -> &'b Member<G> {
        match self.population_config.parent_selection {
            ParentSelection::Uniform => eligible
                .choose(rng)
                .unwrap_or_else(|| panic!("no eligible parents in species {:?}", species_id)),
            ParentSelection::FitnessProportional => {
                // Shift by the minimum so negative fitness values
                // remain usable as weights.
                let min = eligible
                    .iter()
                    .map(|m| m.genome.fitness())
                    .fold(f32::INFINITY, f32::min);
                match eligible.choose_weighted(rng, |m| m.genome.fitness() - min) {
                    Ok(member) => member,
                    // All weights zero: every survivor is equally fit.
                    Err(_) => eligible.choose(rng).unwrap_or_else(|| {
                        panic!("no eligible parents in species {:?}", species_id)
                    }),
                }
            }
            ParentSelection::Tournament(size) => (0..size.get())
                .map(|_| rng.gen_range(0..eligible.len()))
                .map(|i| &eligible[i])
                .max_by(|m1, m2| {
                    m1.genome
                        .fitness()
                        .partial_cmp(&m2.genome.fitness())
                        .unwrap_or_else(|| panic!("uncomparable fitness value detected"))
                })
                .unwrap_or_else(|| panic!("no eligible parents in species {:?}", species_id)),
        }
    }
}

fn fresh_id(next_genome_id: &mut u64) -> GenomeId {
    let id = GenomeId(*next_genome_id);
    *next_genome_id += 1;
    id
}
