//! A neural network-based implementation of the `neurevo` crate's
//! `Genome` trait.
//!
//! Provides a [`NNGenome`] type usable in `neurevo` `Population`s,
//! along with two network phenotypes decodable from an [`NNGenome`]:
//! - [`FeedForwardNetwork`]: evaluates acyclic genomes in a single
//!   pass per input, in topological node order.
//! - [`RecurrentNetwork`]: time-stepped activation supporting
//!   arbitrary (including cyclic) genome topologies.
//!
//! [`NNGenome`]: crate::genomics::NNGenome
//! [`FeedForwardNetwork`]: crate::networks::FeedForwardNetwork
//! [`RecurrentNetwork`]: crate::networks::RecurrentNetwork

pub mod genomics;
pub mod networks;

/// Identifier type used to designate historically
/// identical mutations for the purposes of
/// genome comparison and genetic tracking.
pub type Innovation = usize;
