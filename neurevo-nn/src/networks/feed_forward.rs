use super::connection::Connection;
use super::{apply_activation, partition_nodes};
use crate::genomics::{ActivationType, CorruptGenomeError, NNGenome};

use ahash::RandomState;

use std::collections::{BTreeSet, HashMap};
use std::convert::TryFrom;
use std::fmt;

/// An acyclic neural network, evaluated in a single pass.
///
/// Nodes are evaluated in topological order, so each
/// activation maps inputs to outputs instantaneously,
/// with no state carried between activations.
#[derive(Clone, Debug)]
pub struct FeedForwardNetwork {
    input_count: usize,
    output_count: usize,
    values: Box<[f32]>,
    biases: Box<[f32]>,
    activation_functions: Box<[ActivationType]>,
    incoming: Box<[Box<[Connection]>]>,
    evaluation_order: Box<[usize]>,
}

impl FeedForwardNetwork {
    /// Computes the network's outputs for the passed inputs.
    ///
    /// A node with no incoming connections, an actuator
    /// included, activates on its bias alone.
    ///
    /// # Panics
    /// Panics if the length of the passed slice is not
    /// equal to the number of inputs in the network.
    ///
    /// # Examples
    /// ```
    /// use neurevo_nn::genomics::{GeneticConfig, NNGenome};
    /// use neurevo_nn::networks::FeedForwardNetwork;
    /// use std::convert::TryFrom;
    ///
    /// let mut genome = NNGenome::new(&GeneticConfig::zero(), &mut rand::thread_rng());
    /// genome.add_gene(0, 0, 1, 1.0).unwrap();
    ///
    /// let mut network = FeedForwardNetwork::try_from(&genome).unwrap();
    /// let outputs = network.activate(&[1.0]);
    ///
    /// assert_eq!(outputs[0], 1.0 / (1.0 + (-4.9f32).exp()));
    /// ```
    pub fn activate(&mut self, inputs: &[f32]) -> Vec<f32> {
        self.values[..self.input_count].copy_from_slice(inputs);
        for i in 0..self.evaluation_order.len() {
            let node = self.evaluation_order[i];
            let input_sum: f32 = self.incoming[node]
                .iter()
                .map(|connection| self.values[connection.node] * connection.weight)
                .sum();
            self.values[node] =
                apply_activation(input_sum + self.biases[node], self.activation_functions[node]);
        }
        self.values[self.input_count..self.input_count + self.output_count].to_vec()
    }

    /// Returns the number of network inputs.
    pub fn input_count(&self) -> usize {
        self.input_count
    }

    /// Returns the number of network outputs.
    pub fn output_count(&self) -> usize {
        self.output_count
    }
}

impl TryFrom<&NNGenome> for FeedForwardNetwork {
    type Error = CorruptGenomeError;

    /// Generates a new network from the passed genome.
    ///
    /// # Errors
    /// Fails if a gene references a node the genome does
    /// not contain, or if the genome's enabled genes form
    /// a cycle, self-connections included.
    fn try_from(genome: &NNGenome) -> Result<FeedForwardNetwork, CorruptGenomeError> {
        let (node_ids, biases, activation_functions, input_count, output_count) =
            partition_nodes(genome);
        let total_node_count = node_ids.len();

        let node_index_from_id: HashMap<_, _, RandomState> = node_ids
            .iter()
            .enumerate()
            .map(|(i, id)| (*id, i))
            .collect();

        let mut incoming = vec![vec![]; total_node_count];
        let mut outgoing = vec![vec![]; total_node_count];
        let mut in_degrees = vec![0usize; total_node_count];

        for gene in genome.genes().filter(|g| g.enabled()) {
            let gene_input_index = super::node_index(&node_index_from_id, gene.input(), gene)?;
            let gene_output_index = super::node_index(&node_index_from_id, gene.output(), gene)?;
            incoming[gene_output_index].push(Connection::new(gene_input_index, gene.weight()));
            outgoing[gene_input_index].push(gene_output_index);
            in_degrees[gene_output_index] += 1;
        }

        // Kahn's algorithm. The ready set is ordered so the
        // resulting evaluation order is deterministic.
        let mut ready: BTreeSet<usize> = in_degrees
            .iter()
            .enumerate()
            .filter(|(_, d)| **d == 0)
            .map(|(i, _)| i)
            .collect();
        let mut evaluation_order = Vec::with_capacity(total_node_count - input_count);
        let mut visited = 0;
        while let Some(node) = ready.iter().next().copied() {
            ready.remove(&node);
            visited += 1;
            if node >= input_count {
                evaluation_order.push(node);
            }
            for &successor in &outgoing[node] {
                in_degrees[successor] -= 1;
                if in_degrees[successor] == 0 {
                    ready.insert(successor);
                }
            }
        }
        if visited < total_node_count {
            return Err(CorruptGenomeError::FeedForwardCycle);
        }

        Ok(FeedForwardNetwork {
            input_count,
            output_count,
            values: vec![0.0; total_node_count].into(),
            biases: biases.into(),
            activation_functions: activation_functions.into(),
            incoming: incoming
                .into_iter()
                .map(|v| v.into())
                .collect(),
            evaluation_order: evaluation_order.into(),
        })
    }
}

impl fmt::Display for FeedForwardNetwork {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        (self as &dyn fmt::Debug).fmt(f)
    }
}
