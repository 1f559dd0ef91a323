use crate::populations::PopulationConfig;
use crate::Genome;

use serde::{Deserialize, Serialize};

/// Engine-assigned genome identifier, unique within a run. Every
/// member of every generation receives a fresh id, elites included.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct GenomeId(pub u64);

/// Species identifier. Specifies the speciation round in which the
/// species was born, and the count of other species founded in the
/// _same round_ before the one identified (i.e. the third species
/// born in round 5 is species [5, 2]).
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SpeciesID(pub usize, pub usize);

/// A genome together with its run-unique id.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Member<G> {
    pub id: GenomeId,
    pub genome: G,
}

/// Species are collections of reproductively compatible (within a
/// certain [compatibility distance]) genomes. Membership is
/// determined by distance to a _representative_: the founding
/// genome, which is retained for the species' whole lifetime.
///
/// A species records the best fitness any of its members has ever
/// reached; [`stagnation_limit`] generations without improving on
/// it mark the species for removal from reproduction.
///
/// [compatibility distance]: PopulationConfig::distance_threshold
/// [`stagnation_limit`]: PopulationConfig::stagnation_limit
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Species<G> {
    id: SpeciesID,
    pub(super) members: Vec<Member<G>>,
    representative: G,
    best_fitness: Option<f32>,
    stagnation: usize,
}

impl<G: Genome + Clone> Species<G> {
    /// Creates a new species with the specified ID and founding
    /// member. A clone of the founder doubles as representative.
    pub(super) fn new(id: SpeciesID, founder: Member<G>) -> Species<G> {
        Species {
            id,
            representative: founder.genome.clone(),
            members: vec![founder],
            best_fitness: None,
            stagnation: 0,
        }
    }

    /// Returns the species' ID.
    pub fn id(&self) -> SpeciesID {
        self.id
    }

    /// Returns the species' representative.
    pub fn representative(&self) -> &G {
        &self.representative
    }

    pub(super) fn add_member(&mut self, member: Member<G>) {
        self.members.push(member);
    }

    /// Returns an iterator over the species' members.
    pub fn members(&self) -> impl Iterator<Item = &Member<G>> {
        self.members.iter()
    }

    /// Returns the species' currently best-performing member.
    pub fn champion(&self) -> &Member<G> {
        self.members
            .iter()
            .max_by(|m1, m2| {
                m1.genome
                    .fitness()
                    .partial_cmp(&m2.genome.fitness())
                    .unwrap_or_else(|| panic!("uncomparable fitness value detected"))
            })
            .expect("empty species has no champion")
    }

    /// Returns the mean fitness of the species' members, the basis
    /// of fitness-shared offspring apportionment.
    pub fn mean_fitness(&self) -> f32 {
        self.members
            .iter()
            .map(|m| m.genome.fitness())
            .sum::<f32>()
            / self.members.len() as f32
    }

    /// Returns the number of consecutive generations the species
    /// has gone without improving on its best fitness.
    pub fn time_stagnated(&self) -> usize {
        self.stagnation
    }

    /// Folds the current generation's best fitness into the
    /// species' record. An improvement of more than `epsilon` over
    /// the historical best resets the stagnation counter; anything
    /// less increments it.
    pub(super) fn update_stagnation(&mut self, epsilon: f32) {
        let best = self.champion().genome.fitness();
        match self.best_fitness {
            Some(previous) if best > previous + epsilon => {
                self.best_fitness = Some(best);
                self.stagnation = 0;
            }
            Some(previous) => {
                // Sub-epsilon gains still move the record, they
                // just don't count as improvement.
                if best > previous {
                    self.best_fitness = Some(best);
                }
                self.stagnation += 1;
            }
            None => {
                self.best_fitness = Some(best);
            }
        }
    }

    pub(super) fn count_elite(&self, config: &PopulationConfig) -> usize {
        (self.members.len() as f32 * config.elitism_fraction).ceil() as usize
    }

    pub(super) fn count_survivors(&self, config: &PopulationConfig) -> usize {
        ((self.members.len() as f32 * config.survival_fraction).ceil() as usize).max(1)
    }
}
