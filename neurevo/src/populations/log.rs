use crate::populations::{GenomeId, RunState};

use serde::{Deserialize, Serialize};

/// A struct for reporting basic statistical data.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Stats {
    pub maximum: f32,
    pub minimum: f32,
    pub mean: f32,
    pub std_dev: f32,
}

impl Stats {
    /// Returns statistics about numbers in a sequence.
    ///
    /// # Examples
    /// ```
    /// use neurevo::Stats;
    ///
    /// let stats = Stats::from([2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0].iter().copied());
    /// assert_eq!(stats.maximum, 9.0);
    /// assert_eq!(stats.minimum, 2.0);
    /// assert_eq!(stats.mean, 5.0);
    /// assert_eq!(stats.std_dev, 2.0);
    /// ```
    pub fn from(data: impl Iterator<Item = f32>) -> Stats {
        let data: Vec<f32> = data.collect();
        let (mut max, mut min, mut sum) = (f32::MIN, f32::MAX, 0.0);
        for d in &data {
            max = d.max(max);
            min = d.min(min);
            sum += d;
        }
        let mean = sum / data.len() as f32;
        let variance =
            data.iter().map(|d| (d - mean).powi(2)).sum::<f32>() / data.len() as f32;
        Stats {
            maximum: max,
            minimum: min,
            mean,
            std_dev: variance.sqrt(),
        }
    }
}

/// Summary statistics for one evaluated generation, suitable for
/// external plotting tooling.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct GenerationSummary {
    pub generation: usize,
    pub fitness: Stats,
    pub species_count: usize,
}

/// The outcome of a [`Population::run`] call: the terminal state,
/// the champion of the final evaluated generation, and one summary
/// row per generation.
///
/// [`Population::run`]: crate::Population::run
#[derive(Clone, Debug)]
pub struct RunReport<G> {
    pub state: RunState,
    pub champion: (GenomeId, G),
    pub generations: Vec<GenerationSummary>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stats_of_constant_sequence() {
        let stats = Stats::from([3.0; 7].iter().copied());
        assert_eq!(stats.maximum, 3.0);
        assert_eq!(stats.minimum, 3.0);
        assert_eq!(stats.mean, 3.0);
        assert_eq!(stats.std_dev, 0.0);
    }

    #[test]
    fn stats_handles_negative_values() {
        let stats = Stats::from([-2.0, -1.0, 0.5, 1.0, 1.5].iter().copied());
        assert_eq!(stats.maximum, 1.5);
        assert_eq!(stats.minimum, -2.0);
        assert_eq!(stats.mean, 0.0);
    }
}
