use crate::populations::GenomeId;

use thiserror::Error;

/// The error type fitness evaluators report failures with.
pub type EvaluationError = Box<dyn std::error::Error + Send + Sync>;

/// Fatal errors surfaced by the evolution loop.
#[derive(Debug, Error)]
pub enum EvolutionError {
    /// The configuration failed validation. Raised before any
    /// generation executes.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    /// Stagnation culling would remove every species. The run
    /// terminates; the last complete generation remains inspectable.
    #[error("all species were removed by stagnation culling")]
    Extinction,
    /// The fitness evaluator returned an error. The population is
    /// left at the last fully-evaluated generation.
    #[error("fitness evaluator failed: {0}")]
    Evaluator(#[source] Box<dyn std::error::Error + Send + Sync>),
    /// The evaluator returned without assigning a finite fitness
    /// to every genome.
    #[error("evaluator produced a non-finite fitness for genome {0:?}")]
    NonFiniteFitness(GenomeId),
}
