//! Genomes are the focus of evolution in NEAT.
//! They are a collection of genes and nodes that can be instantiated
//! as a phenotype (a neural network). Genomes can be progressively mutated,
//! thus adding complexity and functionality.
//!
//! All gene and node arenas are ordered by innovation number, so
//! that iteration, and therefore the sequence of random draws made
//! by genetic operations, is identical across runs and across
//! serialization round trips.

mod config;
mod errors;
mod genes;
mod history;
mod nodes;

pub use config::GeneticConfig;
pub use errors::{CorruptGenomeError, GeneViabilityError, MutationError, NodeViabilityError};
pub use genes::Gene;
pub use history::InnovationLog;
pub use nodes::{ActivationType, Node, NodeType};

use crate::Innovation;

use rand::prelude::{IteratorRandom, Rng, RngCore, SliceRandom};
use serde::{Deserialize, Serialize};

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

/// A mutable collection of genes and nodes.
///
/// Supports Serde for convenient genome saving and loading.
#[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
pub struct NNGenome {
    genes: BTreeMap<Innovation, Gene>,
    nodes: BTreeMap<Innovation, Node>,
    node_pairings: BTreeSet<(Innovation, Innovation)>,
    fitness: f32,
}

impl NNGenome {
    /// Create a new genome with the specified configuration.
    ///
    /// Initially generated genes are given the innovation number
    /// `o + i ⨯ output_count`, where `i` is the innovation number
    /// of their input node and `o` is the index of their output node.
    /// Thus, genes created through mutation start at innovation
    /// number `input_count ⨯ output_count`.
    ///
    /// # Examples
    /// ```
    /// use neurevo_nn::genomics::{GeneticConfig, NNGenome, NodeType};
    /// use std::num::NonZeroUsize;
    ///
    /// let config = GeneticConfig {
    ///     input_count: NonZeroUsize::new(3).unwrap(),
    ///     output_count: NonZeroUsize::new(2).unwrap(),
    ///     initial_expression_chance: 1.0,
    ///     weight_bound: 5.0,
    ///     ..GeneticConfig::zero()
    /// };
    ///
    /// let genome = NNGenome::new(&config, &mut rand::thread_rng());
    ///
    /// // As configured, the genome has 3 sensors + 2 actuators,
    /// // and a gene for every pair of nodes.
    /// assert_eq!(genome.nodes().count(), 3 + 2);
    /// assert_eq!(genome.genes().count(), 3 * 2);
    /// assert!(genome.genes().all(|g| g.weight().abs() <= config.weight_bound));
    /// ```
    pub fn new(config: &GeneticConfig, rng: &mut dyn RngCore) -> NNGenome {
        let mut genome = NNGenome {
            genes: BTreeMap::new(),
            nodes: Self::generate_nodes(config),
            node_pairings: BTreeSet::new(),
            fitness: 0.0,
        };
        genome.generate_initial_genes(config, rng);
        genome
    }

    fn generate_nodes(config: &GeneticConfig) -> BTreeMap<Innovation, Node> {
        let input_count = config.input_count.get();
        let output_count = config.output_count.get();

        let mut nodes = BTreeMap::new();

        for i in 0..input_count {
            nodes.insert(i, Node::new(i, NodeType::Sensor, ActivationType::Identity));
        }

        for o in 0..output_count {
            nodes.insert(
                o + input_count,
                Node::new(
                    o + input_count,
                    NodeType::Actuator,
                    *config
                        .output_activation_types
                        .get(o)
                        .unwrap_or(&ActivationType::Sigmoid),
                ),
            );
        }

        nodes
    }

    fn generate_initial_genes(&mut self, config: &GeneticConfig, rng: &mut dyn RngCore) {
        if config.initial_expression_chance == 0.0 {
            return;
        }
        let input_count = config.input_count.get();
        let output_count = config.output_count.get();
        for i in 0..input_count {
            for o in 0..output_count {
                if rng.gen::<f32>() < config.initial_expression_chance {
                    let id = o + i * output_count;
                    self.insert_gene_unchecked(Gene::new(
                        id,
                        i,
                        o + input_count,
                        Gene::random_weight(config, rng),
                    ));
                }
            }
        }
    }

    /// Add a new gene to the genome.
    /// Returns a reference to the new gene.
    ///
    /// # Errors
    /// Fails if a gene with the same ID or the same endpoints
    /// already exists in the genome, if either endpoint does not
    /// correspond to a node present in the genome, or if
    /// `output_id` corresponds to a sensor node.
    ///
    /// # Examples
    /// ```
    /// use neurevo_nn::genomics::{GeneticConfig, NNGenome};
    /// use std::num::NonZeroUsize;
    ///
    /// let config = GeneticConfig {
    ///     input_count: NonZeroUsize::new(3).unwrap(),
    ///     output_count: NonZeroUsize::new(2).unwrap(),
    ///     ..GeneticConfig::zero()
    /// };
    ///
    /// let mut genome = NNGenome::new(&config, &mut rand::thread_rng());
    /// assert_eq!(genome.genes().count(), 0);
    ///
    /// let gene = genome.add_gene(42, 2, 4, 2.5).unwrap();
    /// assert_eq!(gene.innovation(), 42);
    /// assert_eq!(gene.weight(), 2.5);
    ///
    /// // A second gene between the same endpoints is rejected.
    /// assert!(genome.add_gene(43, 2, 4, -3.0).is_err());
    /// ```
    pub fn add_gene(
        &mut self,
        gene_id: Innovation,
        input_id: Innovation,
        output_id: Innovation,
        weight: f32,
    ) -> Result<&mut Gene, GeneViabilityError> {
        self.check_gene_viability(gene_id, input_id, output_id)?;
        Ok(self.insert_gene_unchecked(Gene::new(gene_id, input_id, output_id, weight)))
    }

    /// Inserts a gene and registers it with its endpoint nodes.
    /// Assumes the gene has already been checked for viability.
    fn insert_gene_unchecked(&mut self, gene: Gene) -> &mut Gene {
        let (input_id, output_id) = gene.endpoints();
        let gene_id = gene.innovation();
        if let Some(node) = self.nodes.get_mut(&input_id) {
            node.add_output_gene(gene_id);
        }
        if let Some(node) = self.nodes.get_mut(&output_id) {
            node.add_input_gene(gene_id);
        }
        self.node_pairings.insert((input_id, output_id));
        self.genes.entry(gene_id).or_insert(gene)
    }

    fn check_gene_viability(
        &self,
        gene_id: Innovation,
        input_id: Innovation,
        output_id: Innovation,
    ) -> Result<(), GeneViabilityError> {
        use GeneViabilityError::*;
        if self.genes.contains_key(&gene_id) {
            Err(DuplicateGeneId(gene_id, input_id, output_id))
        } else if !(self.nodes.contains_key(&input_id) && self.nodes.contains_key(&output_id)) {
            Err(NonexistentEndpoints(input_id, output_id))
        } else if self.node_pairings.contains(&(input_id, output_id)) {
            Err(DuplicateEndpoints(gene_id, (input_id, output_id)))
        } else if self.nodes[&output_id].node_type() == NodeType::Sensor {
            Err(SensorEndpoint(output_id))
        } else {
            Ok(())
        }
    }

    /// Add a new hidden node to the genome.
    /// Returns a reference to the newly created node.
    ///
    /// # Errors
    /// Fails if a node with the same ID already exists in the genome.
    ///
    /// # Examples
    /// ```
    /// use neurevo_nn::genomics::{ActivationType, GeneticConfig, NNGenome, NodeType};
    ///
    /// let mut genome = NNGenome::new(&GeneticConfig::zero(), &mut rand::thread_rng());
    ///
    /// let node = genome.add_node(42, ActivationType::Sigmoid).unwrap();
    /// assert_eq!(node.node_type(), NodeType::Neuron);
    ///
    /// assert!(genome.add_node(42, ActivationType::Sigmoid).is_err());
    /// ```
    pub fn add_node(
        &mut self,
        node_id: Innovation,
        activation_type: ActivationType,
    ) -> Result<&mut Node, NodeViabilityError> {
        if self.nodes.contains_key(&node_id) {
            return Err(NodeViabilityError::DuplicateNodeId(node_id));
        }
        Ok(self
            .nodes
            .entry(node_id)
            .or_insert_with(|| Node::new(node_id, NodeType::Neuron, activation_type)))
    }

    /// Induces a _weight mutation_ in the genome.
    ///
    /// Each gene's weight is either reset to a random value in
    /// ±[`weight_bound`], nudged by a random amount in
    /// ±[`weight_mutation_power`], or left untouched, according to
    /// the configured chances. Each non-sensor node's bias is
    /// nudged by a random amount in ±[`bias_mutation_power`] with
    /// chance [`bias_nudge_chance`].
    ///
    /// [`weight_bound`]: GeneticConfig::weight_bound
    /// [`weight_mutation_power`]: GeneticConfig::weight_mutation_power
    /// [`bias_mutation_power`]: GeneticConfig::bias_mutation_power
    /// [`bias_nudge_chance`]: GeneticConfig::bias_nudge_chance
    pub fn mutate_weights(&mut self, config: &GeneticConfig, rng: &mut dyn RngCore) {
        let max_innovation = self.genes.keys().copied().max().unwrap_or_default().max(1) as f32;
        for gene in self.genes.values_mut() {
            // Older genes have a lower chance of being reset.
            if rng.gen::<f32>()
                < config.weight_reset_chance
                    * ((gene.innovation() + 1) as f32 / max_innovation).powf(2.0)
            {
                gene.randomize_weight(config, rng);
            } else if rng.gen::<f32>() < config.weight_nudge_chance {
                gene.nudge_weight(config, rng);
            }
        }

        for node in self
            .nodes
            .values_mut()
            .filter(|n| n.node_type() != NodeType::Sensor)
        {
            if rng.gen::<f32>() < config.bias_nudge_chance {
                node.nudge_bias(config, rng);
            }
        }
    }

    /// Flips the enable flag of a randomly chosen gene.
    /// Returns the toggled gene's innovation number, or `None`
    /// if the genome has no genes.
    pub fn mutate_toggle_enable(&mut self, rng: &mut dyn RngCore) -> Option<Innovation> {
        let id = self.genes.keys().copied().choose(rng)?;
        let gene = self.genes.get_mut(&id)?;
        gene.set_enabled(!gene.enabled());
        Some(id)
    }

    /// Induces a _gene mutation_ in the genome.
    /// If successful, returns the newly added gene.
    ///
    /// # Errors
    /// Returns an error if no viable pair of nodes
    /// exists or [too many] attempts have failed.
    ///
    /// [too many]: GeneticConfig::max_gene_addition_mutation_attempts
    pub fn mutate_add_gene(
        &mut self,
        log: &mut InnovationLog,
        config: &GeneticConfig,
        rng: &mut dyn RngCore,
    ) -> Result<&Gene, MutationError> {
        let non_sensor_nodes = self.select_non_sensor_nodes();
        let mut potential_inputs = self.select_potential_input_nodes(&non_sensor_nodes);

        if potential_inputs.is_empty() {
            return Err(MutationError::GenomeFullyConnected);
        }

        potential_inputs.shuffle(rng);

        match self.find_node_pair(&potential_inputs, &non_sensor_nodes, config, rng) {
            Some((source_node, dest_node)) => {
                let gene_id = log.next_gene_innovation(source_node, dest_node);
                log.add_gene_innovation(source_node, dest_node);
                let weight = Gene::random_weight(config, rng);
                Ok(self.insert_gene_unchecked(Gene::new(gene_id, source_node, dest_node, weight)))
            }
            None => Err(MutationError::NoEndpointPairFound),
        }
    }

    fn select_non_sensor_nodes(&self) -> BTreeSet<Innovation> {
        self.nodes
            .iter()
            .filter(|(_, n)| n.node_type() != NodeType::Sensor)
            .map(|(id, _)| *id)
            .collect()
    }

    fn select_potential_input_nodes(
        &self,
        non_sensor_nodes: &BTreeSet<Innovation>,
    ) -> Vec<Innovation> {
        self.nodes
            .iter()
            .filter(|(_, n)| n.output_genes().count() < non_sensor_nodes.len())
            .map(|(id, _)| *id)
            .collect()
    }

    fn choose_output_node_for(
        &self,
        candidate_input: Innovation,
        potential_outputs: &BTreeSet<Innovation>,
        config: &GeneticConfig,
        rng: &mut dyn RngCore,
    ) -> Option<Innovation> {
        let candidate_input = &self.nodes[&candidate_input];
        if candidate_input.node_type() != NodeType::Sensor
            && !self
                .node_pairings
                .contains(&(candidate_input.innovation(), candidate_input.innovation()))
            && rng.gen::<f32>() < config.recursion_chance
        {
            Some(candidate_input.innovation())
        } else {
            let connected = self.output_nodes_of(candidate_input);
            potential_outputs
                .iter()
                .filter(|id| !connected.contains(id) && **id != candidate_input.innovation())
                .choose(rng)
                .copied()
        }
    }

    fn output_nodes_of(&self, node: &Node) -> BTreeSet<Innovation> {
        node.output_genes()
            .map(|id| self.genes[id].output())
            .collect()
    }

    fn find_node_pair(
        &self,
        potential_inputs: &[Innovation],
        potential_outputs: &BTreeSet<Innovation>,
        config: &GeneticConfig,
        rng: &mut dyn RngCore,
    ) -> Option<(Innovation, Innovation)> {
        for input in potential_inputs
            .iter()
            .take(config.max_gene_addition_mutation_attempts)
        {
            if let Some(output) = self.choose_output_node_for(*input, potential_outputs, config, rng)
            {
                return Some((*input, output));
            }
        }
        None
    }

    /// Induces a _node mutation_ in the genome: a randomly chosen
    /// enabled gene is disabled and replaced with a new node and
    /// two bridging genes. The gene into the new node has weight
    /// 1.0, and the gene out of it inherits the split gene's
    /// weight, so the mutation initially preserves behaviour.
    ///
    /// If successful, returns the triplet
    /// (_in gene_, _new node_, _out gene_).
    ///
    /// # Errors
    /// Returns an error if the genome has no enabled genes to split.
    pub fn mutate_add_node(
        &mut self,
        log: &mut InnovationLog,
        config: &GeneticConfig,
        rng: &mut dyn RngCore,
    ) -> Result<(&Gene, &Node, &Gene), MutationError> {
        let gene_to_split = self
            .genes
            .iter()
            .filter(|(_, g)| g.enabled())
            .map(|(id, _)| *id)
            .choose(rng)
            .ok_or(MutationError::EmptyGenome)?;

        // A genome that already split this gene once must not
        // receive the same node id a second time.
        let (input_gene, new_node, output_gene) = {
            let (i, n, o) = log.next_node_innovation(gene_to_split, false);
            if self.nodes.contains_key(&n) {
                let triplet = log.next_node_innovation(gene_to_split, true);
                log.add_node_innovation(gene_to_split, true);
                triplet
            } else {
                log.add_node_innovation(gene_to_split, false);
                (i, n, o)
            }
        };

        let (input_node, output_node) = self.genes[&gene_to_split].endpoints();
        let split_weight = self.genes[&gene_to_split].weight();
        if let Some(gene) = self.genes.get_mut(&gene_to_split) {
            gene.set_enabled(false);
        }

        let activation_type = *config
            .activation_types
            .choose(rng)
            .unwrap_or(&ActivationType::Sigmoid);
        self.nodes
            .entry(new_node)
            .or_insert_with(|| Node::new(new_node, NodeType::Neuron, activation_type));
        self.insert_gene_unchecked(Gene::new(input_gene, input_node, new_node, 1.0));
        self.insert_gene_unchecked(Gene::new(output_gene, new_node, output_node, split_weight));

        Ok((
            &self.genes[&input_gene],
            &self.nodes[&new_node],
            &self.genes[&output_gene],
        ))
    }

    /// Combines two genomes and returns their _child_ genome.
    ///
    /// The child inherits the structure of the fitter parent.
    /// Genes common to both parents are copied whole, weight and
    /// enable flag included, from a coin-flipped parent. When both
    /// parents are equally fit, structure unique to either parent
    /// is inherited as well.
    ///
    /// Mutation is a separate step; crossing a genome with itself
    /// yields a structurally identical child.
    pub fn crossover(
        first: &NNGenome,
        second: &NNGenome,
        rng: &mut dyn RngCore,
    ) -> NNGenome {
        let (fitter, other) = if second.fitness > first.fitness {
            (second, first)
        } else {
            (first, second)
        };

        let mut child = fitter.clone();
        if (fitter.fitness - other.fitness).abs() < f32::EPSILON {
            child.add_noncommon_structure(other);
        }
        child.choose_common_genes(other, rng);
        child.fitness = 0.0;
        child
    }

    /// Adds all genes and nodes not common to both genomes to `self`.
    fn add_noncommon_structure(&mut self, other: &NNGenome) {
        for (id, node) in &other.nodes {
            if !self.nodes.contains_key(id) {
                let mut copy = Node::new(*id, node.node_type(), node.activation_type());
                copy.set_bias(node.bias());
                self.nodes.insert(*id, copy);
            }
        }

        for gene in other.genes.values() {
            if !self.node_pairings.contains(&gene.endpoints()) {
                self.insert_gene_unchecked(gene.clone());
            }
        }
    }

    /// Copies common genes whole from a randomly chosen parent.
    fn choose_common_genes(&mut self, other: &NNGenome, rng: &mut dyn RngCore) {
        for (id, others_gene) in &other.genes {
            if let Some(own_gene) = self.genes.get_mut(id) {
                if rng.gen::<bool>() {
                    own_gene.set_weight(others_gene.weight());
                    own_gene.set_enabled(others_gene.enabled());
                }
            }
        }
    }

    /// Calculates the _genetic distance_ between `self` and `other`,
    /// weighting excess genes, disjoint genes and common weight
    /// differences as specified in `config`.
    ///
    /// # Examples
    /// ```
    /// use neurevo_nn::genomics::{ActivationType, GeneticConfig, NNGenome};
    /// use std::num::NonZeroUsize;
    ///
    /// let config = GeneticConfig {
    ///     input_count: NonZeroUsize::new(2).unwrap(),
    ///     output_count: NonZeroUsize::new(1).unwrap(),
    ///     excess_gene_factor: 1.5,
    ///     disjoint_gene_factor: 0.5,
    ///     common_weight_factor: 0.333,
    ///     ..GeneticConfig::zero()
    /// };
    ///
    /// let mut rng = rand::thread_rng();
    /// let mut genome1 = NNGenome::new(&config, &mut rng);
    /// let mut genome2 = NNGenome::new(&config, &mut rng);
    ///
    /// genome1.add_node(3, ActivationType::Sigmoid).unwrap();
    /// genome2.add_node(3, ActivationType::Sigmoid).unwrap();
    ///
    /// // Common gene, weight difference of 2.0.
    /// genome1.add_gene(0, 0, 2, 1.0).unwrap();
    /// genome2.add_gene(0, 0, 2, -1.0).unwrap();
    ///
    /// // Disjoint genes.
    /// genome1.add_gene(1, 1, 2, 3.0).unwrap();
    /// genome2.add_gene(2, 1, 3, 1.0).unwrap();
    ///
    /// // Common gene, weight difference of 0.0.
    /// genome1.add_gene(3, 2, 3, 1.0).unwrap();
    /// genome2.add_gene(3, 2, 3, 1.0).unwrap();
    ///
    /// // Excess gene.
    /// genome1.add_gene(4, 2, 2, 3.0).unwrap();
    ///
    /// assert_eq!(
    ///     NNGenome::genetic_distance(&genome1, &genome2, &config),
    ///     0.5 * 2.0 + 1.5 * 1.0 + 0.333 * (2.0 + 0.0) / 2.0,
    /// );
    /// ```
    pub fn genetic_distance(first: &NNGenome, second: &NNGenome, config: &GeneticConfig) -> f32 {
        let (common_innovations, common_weight_pairs) =
            Self::common_innovations_and_weights(first, second);

        let common_weight_diff = Self::weight_diff_average(&common_weight_pairs);

        let disjoint_gene_count_first = first.count_disjoint_genes(&common_innovations);
        let disjoint_gene_count_second = second.count_disjoint_genes(&common_innovations);
        let disjoint_gene_count = disjoint_gene_count_first + disjoint_gene_count_second;

        let excess_gene_count =
            (first.genes.len() - common_innovations.len() - disjoint_gene_count_first)
                + (second.genes.len() - common_innovations.len() - disjoint_gene_count_second);

        config.disjoint_gene_factor * disjoint_gene_count as f32
            + config.excess_gene_factor * excess_gene_count as f32
            + config.common_weight_factor * common_weight_diff
    }

    fn common_innovations_and_weights(
        g1: &NNGenome,
        g2: &NNGenome,
    ) -> (BTreeSet<Innovation>, Vec<(f32, f32)>) {
        g1.genes
            .keys()
            .filter(|id| g2.genes.contains_key(id))
            .map(|id| (*id, (g1.genes[id].weight(), g2.genes[id].weight())))
            .unzip()
    }

    fn weight_diff_average(weight_pairs: &[(f32, f32)]) -> f32 {
        if weight_pairs.is_empty() {
            return 0.0;
        }
        weight_pairs
            .iter()
            .map(|(w1, w2)| (w1 - w2).abs())
            .sum::<f32>()
            / weight_pairs.len() as f32
    }

    fn count_disjoint_genes(&self, common_innovations: &BTreeSet<Innovation>) -> usize {
        let common_innovation_max = common_innovations.iter().max().cloned().unwrap_or_default();
        self.genes
            .keys()
            .filter(|id| !common_innovations.contains(id) && **id < common_innovation_max)
            .count()
    }

    /// Returns an iterator over the genome's genes,
    /// in innovation order.
    pub fn genes(&self) -> impl Iterator<Item = &Gene> {
        self.genes.values()
    }

    /// Returns an iterator over the genome's nodes,
    /// in innovation order.
    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.nodes.values()
    }

    /// Sets the genome's fitness to the value passed.
    pub fn set_fitness(&mut self, fitness: f32) {
        self.fitness = fitness;
    }

    /// Returns the genome's current fitness.
    pub fn fitness(&self) -> f32 {
        self.fitness
    }
}

impl neurevo::Genome for NNGenome {
    type Config = GeneticConfig;
    type InnovationRecord = InnovationLog;

    fn new(config: &GeneticConfig, rng: &mut dyn RngCore) -> NNGenome {
        NNGenome::new(config, rng)
    }

    fn crossover(
        first: &NNGenome,
        second: &NNGenome,
        _config: &GeneticConfig,
        rng: &mut dyn RngCore,
    ) -> NNGenome {
        NNGenome::crossover(first, second, rng)
    }

    fn mutate(
        &mut self,
        record: &mut InnovationLog,
        config: &GeneticConfig,
        rng: &mut dyn RngCore,
    ) {
        self.mutate_weights(config, rng);
        if rng.gen::<f32>() < config.gene_toggle_mutation_chance {
            let _ = self.mutate_toggle_enable(rng);
        }
        if rng.gen::<f32>() < config.node_addition_mutation_chance {
            let _ = self.mutate_add_node(record, config, rng);
        }
        if rng.gen::<f32>() < config.gene_addition_mutation_chance {
            let _ = self.mutate_add_gene(record, config, rng);
        }
    }

    fn distance(first: &NNGenome, second: &NNGenome, config: &GeneticConfig) -> f32 {
        NNGenome::genetic_distance(first, second, config)
    }

    fn set_fitness(&mut self, fitness: f32) {
        NNGenome::set_fitness(self, fitness)
    }

    fn fitness(&self) -> f32 {
        NNGenome::fitness(self)
    }
}

impl fmt::Display for NNGenome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NNGenome")
            .field("Genes", &self.genes.values().collect::<Vec<_>>())
            .field("Nodes", &self.nodes.values().collect::<Vec<_>>())
            .field("Fitness", &self.fitness)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    use std::num::NonZeroUsize;

    fn rng() -> ChaCha8Rng {
        ChaCha8Rng::seed_from_u64(0xBADCAFE)
    }

    #[test]
    fn new_fully_connected() {
        for input_count in 1..6 {
            for output_count in 1..6 {
                let mut config = GeneticConfig::zero();
                config.initial_expression_chance = 1.0;
                config.weight_bound = 5.0;
                config.input_count = NonZeroUsize::new(input_count).unwrap();
                config.output_count = NonZeroUsize::new(output_count).unwrap();

                let genome = NNGenome::new(&config, &mut rng());
                assert_eq!(genome.genes.len(), input_count * output_count);
                assert_eq!(
                    genome
                        .nodes
                        .values()
                        .filter(|n| n.node_type() == NodeType::Sensor)
                        .count(),
                    input_count
                );
                assert_eq!(
                    genome
                        .nodes
                        .values()
                        .filter(|n| n.node_type() == NodeType::Actuator)
                        .count(),
                    output_count
                );
                for g in genome.genes.values() {
                    assert_eq!(
                        g.innovation(),
                        g.input() * output_count + (g.output() - input_count),
                    );
                    assert!(g.weight().abs() <= config.weight_bound);
                    assert!(genome
                        .nodes
                        .get(&g.input())
                        .unwrap()
                        .output_genes()
                        .any(|id| *id == g.innovation()));
                    assert!(genome
                        .nodes
                        .get(&g.output())
                        .unwrap()
                        .input_genes()
                        .any(|id| *id == g.innovation()));
                }
            }
        }
    }

    #[test]
    fn new_unconnected() {
        let mut config = GeneticConfig::zero();
        config.initial_expression_chance = 0.0;

        let genome = NNGenome::new(&config, &mut rng());
        assert_eq!(genome.genes.len(), 0);
    }

    #[test]
    fn add_gene() {
        let config = GeneticConfig::zero();
        let mut genome = NNGenome::new(&config, &mut rng());
        let gene = genome.add_gene(631, 0, 1, 3.0).unwrap();

        assert_eq!(gene.innovation(), 631);
        assert_eq!(gene.input(), 0);
        assert_eq!(gene.output(), 1);
        assert_eq!(gene.weight(), 3.0);
        assert!(gene.enabled());
        assert_eq!(genome.genes.len(), 1);
    }

    #[test]
    fn add_gene_duplicate_id() {
        let mut config = GeneticConfig::zero();
        config.initial_expression_chance = 1.0;

        let mut genome = NNGenome::new(&config, &mut rng());
        assert_eq!(
            genome.add_gene(0, 0, 1, 3.0),
            Err(GeneViabilityError::DuplicateGeneId(0, 0, 1)),
        );
    }

    #[test]
    fn add_gene_duplicate_endpoints() {
        let mut config = GeneticConfig::zero();
        config.initial_expression_chance = 1.0;
        config.weight_bound = 1.0;

        let mut genome = NNGenome::new(&config, &mut rng());
        assert_eq!(
            genome.add_gene(555, 0, 1, 3.0),
            Err(GeneViabilityError::DuplicateEndpoints(555, (0, 1))),
        );
    }

    #[test]
    fn add_gene_invalid_endpoints() {
        let mut genome = NNGenome::new(&GeneticConfig::zero(), &mut rng());
        assert_eq!(
            genome.add_gene(631, 500, 1, 3.0),
            Err(GeneViabilityError::NonexistentEndpoints(500, 1)),
        );
        assert_eq!(
            genome.add_gene(631, 0, 500, 3.0),
            Err(GeneViabilityError::NonexistentEndpoints(0, 500)),
        );
    }

    #[test]
    fn add_gene_sensor_output() {
        let mut config = GeneticConfig::zero();
        config.input_count = NonZeroUsize::new(2).unwrap();

        let mut genome = NNGenome::new(&config, &mut rng());
        assert_eq!(
            genome.add_gene(631, 0, 1, 3.0),
            Err(GeneViabilityError::SensorEndpoint(1)),
        );
    }

    #[test]
    fn add_node_duplicate() {
        let mut genome = NNGenome::new(&GeneticConfig::zero(), &mut rng());
        genome.add_node(42, ActivationType::Gaussian).unwrap();
        assert_eq!(
            genome.add_node(42, ActivationType::Gaussian).map(|_| ()),
            Err(NodeViabilityError::DuplicateNodeId(42)),
        );
    }

    #[test]
    fn mutate_weights_reset() {
        let mut config = GeneticConfig::zero();
        config.initial_expression_chance = 1.0;
        config.weight_reset_chance = 1.0;
        config.weight_bound = 3.0;

        let mut r = rng();
        let mut genome = NNGenome::new(&config, &mut r);
        let initial_weight = genome.genes[&0].weight();
        genome.mutate_weights(&config, &mut r);
        assert_ne!(initial_weight, genome.genes[&0].weight());
        assert!(genome.genes[&0].weight().abs() <= config.weight_bound);
    }

    #[test]
    fn mutate_weights_nudge() {
        let mut config = GeneticConfig::zero();
        config.initial_expression_chance = 1.0;
        config.weight_nudge_chance = 1.0;
        config.weight_mutation_power = 3.0;
        config.weight_bound = 5.0;

        let mut r = rng();
        let mut genome = NNGenome::new(&config, &mut r);
        let initial_weight = genome.genes[&0].weight();
        genome.mutate_weights(&config, &mut r);
        let new_weight = genome.genes[&0].weight();
        assert_ne!(initial_weight, new_weight);
        assert!((new_weight - initial_weight).abs() <= config.weight_mutation_power);
    }

    #[test]
    fn mutate_weights_none() {
        let mut config = GeneticConfig::zero();
        config.initial_expression_chance = 1.0;
        config.weight_bound = 5.0;

        let mut r = rng();
        let mut genome = NNGenome::new(&config, &mut r);
        let initial_weight = genome.genes[&0].weight();
        genome.mutate_weights(&config, &mut r);
        assert_eq!(initial_weight, genome.genes[&0].weight());
    }

    #[test]
    fn mutate_bias_nudge() {
        let mut config = GeneticConfig::zero();
        config.bias_nudge_chance = 1.0;
        config.bias_mutation_power = 1.0;
        config.weight_bound = 5.0;

        let mut r = rng();
        let mut genome = NNGenome::new(&config, &mut r);
        genome.mutate_weights(&config, &mut r);
        let output_node = genome.nodes().find(|n| n.node_type() == NodeType::Actuator);
        assert_ne!(output_node.unwrap().bias(), 0.0);
    }

    #[test]
    fn mutate_toggle_enable() {
        let mut config = GeneticConfig::zero();
        config.initial_expression_chance = 1.0;

        let mut r = rng();
        let mut genome = NNGenome::new(&config, &mut r);
        let toggled = genome.mutate_toggle_enable(&mut r).unwrap();
        assert!(!genome.genes[&toggled].enabled());
        let toggled = genome.mutate_toggle_enable(&mut r).unwrap();
        assert!(genome.genes[&toggled].enabled());
    }

    #[test]
    fn mutate_gene_addition() {
        let mut config = GeneticConfig::zero();
        config.initial_expression_chance = 1.0;
        config.weight_bound = 3.0;
        config.max_gene_addition_mutation_attempts = 20;

        let mut r = rng();
        let mut log = InnovationLog::new(&config);
        let mut genome = NNGenome::new(&config, &mut r);
        genome.add_node(2, ActivationType::Sigmoid).unwrap();

        let gene = genome.mutate_add_gene(&mut log, &config, &mut r).unwrap();
        assert!((0..=2).contains(&gene.input()));
        assert!((1..=2).contains(&gene.output()));
    }

    #[test]
    fn mutate_gene_addition_identical_mutations_share_innovation() {
        let mut config = GeneticConfig::zero();
        config.input_count = NonZeroUsize::new(2).unwrap();
        config.max_gene_addition_mutation_attempts = 20;

        let mut r = rng();
        let mut log = InnovationLog::new(&config);

        // Two empty genomes with a single possible new gene each.
        let mut first = NNGenome::new(&config, &mut r);
        first.add_gene(0, 0, 2, 1.0).unwrap();
        first.add_gene(2, 2, 2, 1.0).unwrap();
        let mut second = first.clone();

        let a = first
            .mutate_add_gene(&mut log, &config, &mut r)
            .unwrap()
            .innovation();
        let b = second
            .mutate_add_gene(&mut log, &config, &mut r)
            .unwrap()
            .innovation();
        assert_eq!(a, b);
    }

    #[test]
    fn mutate_gene_addition_fully_connected() {
        let mut config = GeneticConfig::zero();
        config.initial_expression_chance = 1.0;
        config.recursion_chance = 1.0;
        config.max_gene_addition_mutation_attempts = 20;

        let mut r = rng();
        let mut log = InnovationLog::new(&config);
        let mut genome = NNGenome::new(&config, &mut r);
        // Saturate the only remaining pair (the actuator's self-loop).
        genome.mutate_add_gene(&mut log, &config, &mut r).unwrap();

        assert_eq!(
            genome
                .mutate_add_gene(&mut log, &config, &mut r)
                .map(|_| ()),
            Err(MutationError::GenomeFullyConnected),
        );
    }

    #[test]
    fn mutate_node_addition() {
        let mut config = GeneticConfig::zero();
        config.initial_expression_chance = 1.0;
        config.activation_types = vec![ActivationType::Sigmoid];

        let mut r = rng();
        let mut log = InnovationLog::new(&config);
        let mut genome = NNGenome::new(&config, &mut r);
        let split_weight = genome.genes[&0].weight();

        let (in_gene, node, out_gene) = genome.mutate_add_node(&mut log, &config, &mut r).unwrap();

        assert_eq!(in_gene.output(), node.innovation());
        assert_eq!(in_gene.weight(), 1.0);
        assert_eq!(out_gene.input(), node.innovation());
        assert_eq!(out_gene.weight(), split_weight);
        assert_eq!(node.node_type(), NodeType::Neuron);

        assert_eq!(genome.genes.len(), 1 + 2);
        assert_eq!(genome.nodes.len(), 1 + 1 + 1);
        assert!(!genome.genes[&0].enabled());
    }

    #[test]
    fn mutate_node_addition_empty() {
        let mut config = GeneticConfig::zero();
        config.initial_expression_chance = 0.0;

        let mut r = rng();
        let mut log = InnovationLog::new(&config);
        let mut genome = NNGenome::new(&config, &mut r);
        assert_eq!(
            genome
                .mutate_add_node(&mut log, &config, &mut r)
                .map(|_| ()),
            Err(MutationError::EmptyGenome),
        );
    }

    #[test]
    fn mutate_node_addition_repeated_split_gets_fresh_ids() {
        let mut config = GeneticConfig::zero();
        config.initial_expression_chance = 1.0;
        config.activation_types = vec![ActivationType::Sigmoid];

        let mut r = rng();
        let mut log = InnovationLog::new(&config);
        let mut genome = NNGenome::new(&config, &mut r);

        let first_node = {
            let (_, node, _) = genome.mutate_add_node(&mut log, &config, &mut r).unwrap();
            node.innovation()
        };
        // Re-enable and split the same gene again; the genome
        // already holds the recorded node id, so new ids are used.
        genome.genes.get_mut(&0).unwrap().set_enabled(true);
        let second_node = {
            let (_, node, _) = genome.mutate_add_node(&mut log, &config, &mut r).unwrap();
            node.innovation()
        };
        assert_ne!(first_node, second_node);
    }

    #[test]
    fn crossover_with_self_is_identity() {
        let mut config = GeneticConfig::zero();
        config.input_count = NonZeroUsize::new(3).unwrap();
        config.output_count = NonZeroUsize::new(2).unwrap();
        config.initial_expression_chance = 1.0;
        config.weight_bound = 5.0;

        let mut r = rng();
        let mut parent = NNGenome::new(&config, &mut r);
        parent.set_fitness(3.5);

        let child = NNGenome::crossover(&parent, &parent, &mut r);
        assert_eq!(
            child.genes().collect::<Vec<_>>(),
            parent.genes().collect::<Vec<_>>(),
        );
        assert_eq!(
            child.nodes().collect::<Vec<_>>(),
            parent.nodes().collect::<Vec<_>>(),
        );
        assert_eq!(child.fitness(), 0.0);
    }

    #[test]
    fn crossover_keeps_fitter_parent_structure() {
        let mut config = GeneticConfig::zero();
        config.input_count = NonZeroUsize::new(2).unwrap();

        let mut r = rng();
        let mut weak = NNGenome::new(&config, &mut r);
        weak.add_gene(0, 0, 2, 1.0).unwrap();
        weak.set_fitness(1.0);

        let mut strong = NNGenome::new(&config, &mut r);
        strong.add_gene(1, 1, 2, -1.0).unwrap();
        strong.add_node(3, ActivationType::Sigmoid).unwrap();
        strong.add_gene(5, 2, 3, 0.5).unwrap();
        strong.set_fitness(2.0);

        let child = NNGenome::crossover(&weak, &strong, &mut r);
        assert_eq!(
            child.genes().map(|g| g.innovation()).collect::<Vec<_>>(),
            vec![1, 5],
        );
        assert!(child.nodes.contains_key(&3));
    }

    #[test]
    fn crossover_equal_fitness_merges_structure() {
        let mut config = GeneticConfig::zero();
        config.input_count = NonZeroUsize::new(2).unwrap();

        let mut r = rng();
        let mut first = NNGenome::new(&config, &mut r);
        first.add_gene(0, 0, 2, 1.0).unwrap();
        let mut second = NNGenome::new(&config, &mut r);
        second.add_gene(1, 1, 2, -1.0).unwrap();

        let child = NNGenome::crossover(&first, &second, &mut r);
        assert_eq!(
            child.genes().map(|g| g.innovation()).collect::<Vec<_>>(),
            vec![0, 1],
        );
    }

    #[test]
    fn genetic_distance_disjoint_excess_and_weights() {
        let mut config = GeneticConfig::zero();
        config.input_count = NonZeroUsize::new(2).unwrap();
        config.excess_gene_factor = 1.5;
        config.disjoint_gene_factor = 0.5;
        config.common_weight_factor = 0.25;

        let mut r = rng();
        let mut genome1 = NNGenome::new(&config, &mut r);
        let mut genome2 = NNGenome::new(&config, &mut r);
        genome1.add_node(3, ActivationType::Sigmoid).unwrap();
        genome2.add_node(3, ActivationType::Sigmoid).unwrap();

        genome1.add_gene(0, 0, 2, 1.0).unwrap();
        genome2.add_gene(0, 0, 2, -1.0).unwrap();
        genome1.add_gene(1, 1, 2, 3.0).unwrap();
        genome2.add_gene(2, 1, 3, 1.0).unwrap();
        genome1.add_gene(3, 2, 3, 1.0).unwrap();
        genome2.add_gene(3, 2, 3, 1.0).unwrap();
        genome1.add_gene(4, 2, 2, 3.0).unwrap();

        assert_eq!(
            NNGenome::genetic_distance(&genome1, &genome2, &config),
            0.5 * 2.0 + 1.5 * 1.0 + 0.25 * (2.0 + 0.0) / 2.0,
        );
    }

    #[test]
    fn genetic_distance_identical_is_zero() {
        let mut config = GeneticConfig::zero();
        config.initial_expression_chance = 1.0;
        config.weight_bound = 5.0;
        config.excess_gene_factor = 1.0;
        config.disjoint_gene_factor = 1.0;
        config.common_weight_factor = 1.0;

        let genome = NNGenome::new(&config, &mut rng());
        assert_eq!(NNGenome::genetic_distance(&genome, &genome, &config), 0.0);
    }

    #[test]
    fn serde_round_trip() {
        let mut config = GeneticConfig::zero();
        config.input_count = NonZeroUsize::new(3).unwrap();
        config.output_count = NonZeroUsize::new(2).unwrap();
        config.initial_expression_chance = 1.0;
        config.weight_bound = 5.0;

        let genome = NNGenome::new(&config, &mut rng());
        let json = serde_json::to_string(&genome).unwrap();
        let restored: NNGenome = serde_json::from_str(&json).unwrap();
        assert_eq!(genome, restored);
    }
}
