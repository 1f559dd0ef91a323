use rand::RngCore;

/// An interface for genomes that can be evolved by the engine.
///
/// The engine is agnostic to the genome's encoding: it only needs
/// to create, compare, recombine and mutate genomes, and to read
/// and write their fitness. All stochastic operations draw from the
/// RNG passed in by the engine, so that a run is fully reproducible
/// from its seed and can be resumed bit-for-bit from a checkpoint.
pub trait Genome {
    type Config;
    type InnovationRecord: InnovationRecord<Config = Self::Config>;

    /// Returns a new minimal-topology genome.
    fn new(config: &Self::Config, rng: &mut dyn RngCore) -> Self;

    /// Recombines two parent genomes into a child genome.
    ///
    /// Crossover must be separable from mutation: crossing a genome
    /// with itself yields a structurally identical genome.
    fn crossover(
        first: &Self,
        second: &Self,
        config: &Self::Config,
        rng: &mut dyn RngCore,
    ) -> Self;

    /// Applies the configured mutations to the genome. Structural
    /// innovations are registered in `record` so that identical
    /// mutations arising independently share innovation ids.
    fn mutate(
        &mut self,
        record: &mut Self::InnovationRecord,
        config: &Self::Config,
        rng: &mut dyn RngCore,
    );

    /// Returns the compatibility distance between two genomes,
    /// used by the engine to partition the population into species.
    fn distance(first: &Self, second: &Self, config: &Self::Config) -> f32;

    /// Sets the genome's fitness value.
    fn set_fitness(&mut self, fitness: f32);

    /// Returns the genome's fitness value.
    fn fitness(&self) -> f32;
}

/// Per-run bookkeeping of structural innovations.
///
/// An innovation record is owned by exactly one [`Population`] and
/// lives for the duration of one evolutionary run; it is never
/// process-global, so concurrent runs do not interfere.
///
/// [`Population`]: crate::Population
pub trait InnovationRecord {
    type Config;

    fn new(config: &Self::Config) -> Self;
}
