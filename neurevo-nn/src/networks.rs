//! A network is a simple near-isomorphism of a genome,
//! generated as the phenotype of said genome, with
//! disabled genes being ignored. Genes are converted
//! into weighted connections, and genome nodes into
//! network nodes carrying their bias and activation
//! function.
//!
//! The [`RecurrentNetwork`] type is best suited for
//! control tasks with a notion of time: inputs are set
//! for each activation, and signals take one time-step
//! per connection to propagate, so cycles are legal.
//!
//! For an instantaneous input-to-output mapping, such as
//! board evaluation, the [`FeedForwardNetwork`] type is
//! more appropriate.

mod connection;
mod feed_forward;

pub use feed_forward::FeedForwardNetwork;

use crate::genomics::{ActivationType, CorruptGenomeError, Gene, NNGenome, NodeType};
use crate::Innovation;
use connection::Connection;

use ahash::RandomState;

use std::collections::HashMap;
use std::convert::TryFrom;
use std::fmt;

/// An arbitrarily-structured neural network,
/// activated one time-step at a time.
#[derive(Clone, Debug)]
pub struct RecurrentNetwork {
    input_count: usize,
    output_count: usize,
    node_ids: Box<[Innovation]>,
    input_sums: Box<[f32]>,
    activation_levels: Box<[f32]>,
    biases: Box<[f32]>,
    activation_functions: Box<[ActivationType]>,
    connections: Box<[Box<[Connection]>]>,
}

impl RecurrentNetwork {
    /// Fires all nodes, propagating all activations
    /// (including set inputs), and then computing
    /// new activation levels.
    ///
    /// # Examples
    /// ```
    /// use neurevo_nn::genomics::{ActivationType, GeneticConfig, NNGenome};
    /// use neurevo_nn::networks::RecurrentNetwork;
    /// use std::convert::TryFrom;
    /// use std::num::NonZeroUsize;
    ///
    /// let mut genome = NNGenome::new(
    ///     &GeneticConfig {
    ///         input_count: NonZeroUsize::new(2).unwrap(),
    ///         output_count: NonZeroUsize::new(1).unwrap(),
    ///         output_activation_types: vec![ActivationType::ReLU],
    ///         ..GeneticConfig::zero()
    ///     },
    ///     &mut rand::thread_rng(),
    /// );
    /// genome.add_gene(0, 0, 2, 2.5).unwrap();
    /// genome.add_gene(1, 1, 2, -2.5).unwrap();
    ///
    /// let mut network = RecurrentNetwork::try_from(&genome).unwrap();
    /// network.set_inputs(&[0.5, 1.0]);
    ///
    /// network.activate();
    ///
    /// assert_eq!(network.outputs()[0], ((0.5 * 2.5 + 1.0 * (-2.5)) as f32).max(0.0));
    /// ```
    pub fn activate(&mut self) {
        self.fire_nodes();
        self.compute_activations();
    }

    /// Propagates each node's signal through all its
    /// outgoing connections.
    fn fire_nodes(&mut self) {
        for (activation, output_connections) in self
            .activation_levels
            .iter_mut()
            .zip(self.connections.iter())
        {
            for connection in output_connections.iter() {
                self.input_sums[connection.node] += *activation * connection.weight;
            }
        }
    }

    /// Computes each node's activation level,
    /// based on input sum and bias.
    fn compute_activations(&mut self) {
        for (((input_sum, activation_level), activation_function), bias) in self.input_sums
            [self.input_count..]
            .iter_mut()
            .zip(&mut self.activation_levels[self.input_count..])
            .zip(&self.activation_functions[self.input_count..])
            .zip(&self.biases[self.input_count..])
        {
            *activation_level = apply_activation(*input_sum + *bias, *activation_function);
            *input_sum = 0.0;
        }
    }

    /// Clears the activation state of all nodes.
    pub fn clear_state(&mut self) {
        for (input_sum, activation) in self
            .input_sums
            .iter_mut()
            .zip(self.activation_levels.iter_mut())
        {
            *input_sum = 0.0;
            *activation = 0.0;
        }
    }

    /// Sets the activation level of each input node
    /// to the corresponding value in the passed slice.
    ///
    /// # Panics
    /// Panics if the length of the passed slice is not
    /// equal to the number of inputs in the network.
    pub fn set_inputs(&mut self, values: &[f32]) {
        self.activation_levels[..self.input_count].copy_from_slice(values);
    }

    /// Returns the current output node activation levels
    /// as a vector.
    pub fn outputs(&self) -> Vec<f32> {
        self.activation_levels[self.input_count..self.input_count + self.output_count].to_vec()
    }
}

impl TryFrom<&NNGenome> for RecurrentNetwork {
    type Error = CorruptGenomeError;

    /// Generates a new network from the passed genome.
    ///
    /// # Errors
    /// Fails if a gene in the genome references a node
    /// the genome does not contain, which can happen
    /// when loading a hand-edited or corrupted genome.
    fn try_from(genome: &NNGenome) -> Result<RecurrentNetwork, CorruptGenomeError> {
        let (node_ids, biases, activation_functions, input_count, output_count) =
            partition_nodes(genome);
        let total_node_count = node_ids.len();

        let node_index_from_id: HashMap<_, _, RandomState> = node_ids
            .iter()
            .enumerate()
            .map(|(i, id)| (*id, i))
            .collect();
        let mut connections = vec![vec![]; total_node_count];

        for gene in genome.genes().filter(|g| g.enabled()) {
            let gene_input_index = node_index(&node_index_from_id, gene.input(), gene)?;
            let gene_output_index = node_index(&node_index_from_id, gene.output(), gene)?;
            connections[gene_input_index].push(Connection::new(gene_output_index, gene.weight()));
        }

        Ok(RecurrentNetwork {
            input_count,
            output_count,
            node_ids: node_ids.into(),
            input_sums: vec![0.0; total_node_count].into(),
            activation_levels: vec![0.0; total_node_count].into(),
            biases: biases.into(),
            activation_functions: activation_functions.into(),
            connections: connections.into_iter().map(|v| v.into()).collect(),
        })
    }
}

/// Partitions a genome's nodes into sensor, actuator and
/// hidden groups, each sorted by innovation number, and
/// returns their ids, biases and activation functions in
/// that concatenated order.
///
/// Sorting by id makes the resulting network deterministic,
/// independently of node iteration order.
fn partition_nodes(genome: &NNGenome) -> (Vec<Innovation>, Vec<f32>, Vec<ActivationType>, usize, usize) {
    let mut input_nodes = vec![];
    let mut output_nodes = vec![];
    let mut hidden_nodes = vec![];

    for node in genome.nodes() {
        match node.node_type() {
            NodeType::Sensor => &mut input_nodes,
            NodeType::Actuator => &mut output_nodes,
            NodeType::Neuron => &mut hidden_nodes,
        }
        .push((node.innovation(), node.bias(), node.activation_type()));
    }
    input_nodes.sort_unstable_by_key(|(id, _, _)| *id);
    output_nodes.sort_unstable_by_key(|(id, _, _)| *id);
    hidden_nodes.sort_unstable_by_key(|(id, _, _)| *id);

    let input_count = input_nodes.len();
    let output_count = output_nodes.len();

    let mut node_ids = Vec::with_capacity(input_count + output_count + hidden_nodes.len());
    let mut biases = Vec::with_capacity(node_ids.capacity());
    let mut activation_functions = Vec::with_capacity(node_ids.capacity());
    for (id, bias, activation) in input_nodes
        .into_iter()
        .chain(output_nodes)
        .chain(hidden_nodes)
    {
        node_ids.push(id);
        biases.push(bias);
        activation_functions.push(activation);
    }

    (node_ids, biases, activation_functions, input_count, output_count)
}

fn node_index(
    node_index_from_id: &HashMap<Innovation, usize, RandomState>,
    node: Innovation,
    gene: &Gene,
) -> Result<usize, CorruptGenomeError> {
    node_index_from_id
        .get(&node)
        .copied()
        .ok_or(CorruptGenomeError::DanglingEndpoint {
            gene: gene.innovation(),
            node,
        })
}

// Applies one of the available functions to the input and returns the output as the result
fn apply_activation(input_sum: f32, activation_function: ActivationType) -> f32 {
    match activation_function {
        ActivationType::Sigmoid => 1.0 / (1.0 + (-4.9 * input_sum).exp()),
        ActivationType::Identity => input_sum,
        ActivationType::ReLU => input_sum.max(0.0),
        ActivationType::Gaussian => (-input_sum.powf(2.0)).exp(),
        ActivationType::Sinusoidal => (input_sum * std::f32::consts::PI).sin(),
    }
}

impl fmt::Display for RecurrentNetwork {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        (self as &dyn fmt::Debug).fmt(f)
    }
}
