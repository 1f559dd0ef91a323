use crate::genomics::GeneticConfig;
use crate::Innovation;

use rand::prelude::{Rng, RngCore};
use serde::{Deserialize, Serialize};

use std::collections::BTreeSet;
use std::fmt;

/// An ActivationType represents the type
/// of activation function the node's network
/// equivalent will use.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[non_exhaustive]
pub enum ActivationType {
    // 1 / (1 + exp(-4.9x))
    Sigmoid,
    // x
    Identity,
    // 0   if x < 0
    // x   if x ≥ 0
    ReLU,
    // exp(-x²)
    Gaussian,
    // sin(πx)
    Sinusoidal,
}

/// A NodeType indicates the function of
/// the node's network equivalent.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum NodeType {
    /// Input nodes.
    Sensor,
    /// Hidden nodes.
    Neuron,
    /// Output nodes.
    Actuator,
}

/// Nodes are the structural elements of genomes
/// between which genes are created. Each non-sensor
/// node carries a bias term added to its input sum
/// before activation.
///
/// Incident gene sets are kept in innovation order so
/// that genome operations consume randomness in a
/// reproducible sequence.
#[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
pub struct Node {
    id: Innovation,
    bias: f32,
    inputs: BTreeSet<Innovation>,
    outputs: BTreeSet<Innovation>,
    node_type: NodeType,
    activation_type: ActivationType,
}

impl Node {
    /// Generate a new node with the passed parameters
    /// and a zero bias.
    ///
    /// # Examples
    /// ```
    /// use neurevo_nn::genomics::{ActivationType, Node, NodeType};
    ///
    /// let node = Node::new(5, NodeType::Neuron, ActivationType::Sigmoid);
    /// ```
    pub fn new(id: Innovation, node_type: NodeType, activation_type: ActivationType) -> Node {
        Node {
            id,
            bias: 0.0,
            inputs: BTreeSet::new(),
            outputs: BTreeSet::new(),
            node_type,
            activation_type,
        }
    }

    /// Adds the passed innovation number to the node's
    /// set of input genes.
    pub(super) fn add_input_gene(&mut self, gene_id: Innovation) {
        self.inputs.insert(gene_id);
    }

    /// Adds the passed innovation number to the node's
    /// set of output genes.
    pub(super) fn add_output_gene(&mut self, gene_id: Innovation) {
        self.outputs.insert(gene_id);
    }

    /// Nudges the node's bias by a random amount drawn uniformly
    /// from the range ±[`bias_mutation_power`], clamped to
    /// ±[`weight_bound`].
    ///
    /// [`bias_mutation_power`]: crate::genomics::GeneticConfig::bias_mutation_power
    /// [`weight_bound`]: crate::genomics::GeneticConfig::weight_bound
    pub fn nudge_bias(&mut self, config: &GeneticConfig, rng: &mut dyn RngCore) {
        self.bias += rng.gen_range(-config.bias_mutation_power..=config.bias_mutation_power);
        self.bias = self.bias.clamp(-config.weight_bound, config.weight_bound);
    }

    /// Returns the node's innovation number.
    pub fn innovation(&self) -> Innovation {
        self.id
    }

    /// Returns the node's bias.
    pub fn bias(&self) -> f32 {
        self.bias
    }

    /// Sets the node's bias.
    pub fn set_bias(&mut self, bias: f32) {
        self.bias = bias;
    }

    /// Returns an iterator over the node's input genes,
    /// in innovation order.
    pub fn input_genes(&self) -> impl Iterator<Item = &Innovation> {
        self.inputs.iter()
    }

    /// Returns an iterator over the node's output genes,
    /// in innovation order.
    pub fn output_genes(&self) -> impl Iterator<Item = &Innovation> {
        self.outputs.iter()
    }

    /// Returns the node's node type.
    pub fn node_type(&self) -> NodeType {
        self.node_type
    }

    /// Returns the node's activation type.
    pub fn activation_type(&self) -> ActivationType {
        self.activation_type
    }
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:?}[{:?}, {:?}, b: {:.3}, IN: {:?}, OUT: {:?}]",
            self.id, self.node_type, self.activation_type, self.bias, self.inputs, self.outputs,
        )
    }
}
