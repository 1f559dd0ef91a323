use crate::Innovation;

use thiserror::Error;

/// The gene being added is a duplicate or otherwise
/// invalid for the genome.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum GeneViabilityError {
    /// The gene's ID is already present in the genome.
    #[error("duplicate gene insertion with id {0} between endpoints {1} -> {2}")]
    DuplicateGeneId(Innovation, Innovation, Innovation),
    /// One or both of the gene's endpoints do not exist.
    #[error("gene insertion between nonexistent endpoint(s) {0} -> {1}")]
    NonexistentEndpoints(Innovation, Innovation),
    /// Another gene with the same endpoints already exists.
    #[error("gene insertion with id {0} shadows gene with same endpoints {1:?}")]
    DuplicateEndpoints(Innovation, (Innovation, Innovation)),
    /// The gene's output is a sensor node, which is not allowed.
    #[error("gene insertion with sensor node {0} as output")]
    SensorEndpoint(Innovation),
}

/// The node being added is a duplicate.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum NodeViabilityError {
    #[error("duplicate node insertion with id {0}")]
    DuplicateNodeId(Innovation),
}

/// A structural mutation could not be carried out on
/// the genome.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum MutationError {
    /// Every node is already connected to every viable target.
    #[error("gene mutation on fully-connected genome")]
    GenomeFullyConnected,
    /// No viable input-output pair was found within the
    /// configured number of attempts.
    #[error("no viable input-output pair found for gene mutation")]
    NoEndpointPairFound,
    /// The genome has no genes to split.
    #[error("node mutation on empty genome")]
    EmptyGenome,
}

/// The genome cannot be decoded into a network.
///
/// Checked genome construction maintains referential
/// integrity, so this is only expected from snapshots
/// edited or corrupted outside the library.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum CorruptGenomeError {
    /// A gene refers to a node absent from the genome.
    #[error("gene {gene} refers to nonexistent node {node}")]
    DanglingEndpoint { gene: Innovation, node: Innovation },
    /// The genome's enabled genes form a cycle, which a
    /// feed-forward network cannot express.
    #[error("enabled genes form a cycle, and cannot be decoded feed-forward")]
    FeedForwardCycle,
}
