//! Neural network implementation for agent brains.
//!
//! Implements a multi-layer perceptron (MLP) with tanh activation and supports
//! genetic algorithm operations (mutation and crossover). All randomness comes
//! from a caller-supplied RNG so runs are reproducible.

use ndarray::{Array1, Array2};
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::simulation::decision::DecisionFunction;

/// A single layer of a multi-layer perceptron.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Mlp {
    /// Weight matrix (`output_size` × `input_size`).
    pub weights: Array2<f32>,
    /// Bias vector (`output_size`).
    pub biases: Array1<f32>,
}

impl Mlp {
    /// Creates a new layer with weights and biases uniform in `[-scale, scale]`.
    pub fn new_random<R: Rng>(
        input_size: usize,
        output_size: usize,
        scale: f32,
        rng: &mut R,
    ) -> Self {
        Self {
            weights: Array2::from_shape_fn((output_size, input_size), |_| {
                rng.random_range(-scale..=scale)
            }),
            biases: Array1::from_shape_fn(output_size, |_| rng.random_range(-scale..=scale)),
        }
    }

    /// Performs forward pass with tanh activation.
    #[inline]
    pub fn forward(&self, inputs: &Array1<f32>) -> Array1<f32> {
        let mut output = self.weights.dot(inputs);
        output += &self.biases;
        output.mapv_inplace(f32::tanh);
        output
    }

    /// Mutates weights and biases by adding uniform noise.
    pub fn mutate<R: Rng>(&mut self, mutation_scale: f32, rng: &mut R) {
        self.weights
            .mapv_inplace(|w| w + rng.random_range(-mutation_scale..=mutation_scale));
        self.biases
            .mapv_inplace(|b| b + rng.random_range(-mutation_scale..=mutation_scale));
    }

    /// Creates a new layer by weighted averaging two parent layers.
    pub fn crossover_weighted(parent1: &Mlp, parent2: &Mlp, weight1: f32) -> Self {
        let weight2 = 1.0 - weight1;
        Self {
            weights: &parent1.weights * weight1 + &parent2.weights * weight2,
            biases: &parent1.biases * weight1 + &parent2.biases * weight2,
        }
    }
}

/// A multi-layer perceptron used as an agent's decision function.
///
/// Takes `[agent_y, gap_x, gap_top, gap_bottom]` and produces a single output
/// in `(-1, 1)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Brain {
    /// Ordered layers from input to output.
    pub layers: Vec<Mlp>,
}

impl Brain {
    /// Creates a new brain with random weights.
    pub fn new<R: Rng>(layer_sizes: &[usize], scale: f32, rng: &mut R) -> Self {
        let layers = layer_sizes
            .windows(2)
            .map(|pair| Mlp::new_random(pair[0], pair[1], scale, rng))
            .collect();

        Self { layers }
    }

    /// Runs a forward pass through all layers.
    #[inline]
    pub fn think(&self, inputs: &Array1<f32>) -> Array1<f32> {
        let mut output = inputs.clone();
        for layer in &self.layers {
            output = layer.forward(&output);
        }
        output
    }

    /// Creates a new brain by weighted averaging two parent brains.
    /// `weight1` is the share of `parent1`.
    pub fn crossover_weighted(parent1: &Brain, parent2: &Brain, weight1: f32) -> Self {
        let layers = parent1
            .layers
            .iter()
            .zip(&parent2.layers)
            .map(|(layer1, layer2)| Mlp::crossover_weighted(layer1, layer2, weight1))
            .collect();
        Self { layers }
    }

    /// Mutates all layers in the brain.
    pub fn mutate<R: Rng>(&mut self, mutation_scale: f32, rng: &mut R) {
        for layer in &mut self.layers {
            layer.mutate(mutation_scale, rng);
        }
    }

    /// Layer dimensions from input to output, e.g. `[4, 6, 1]`.
    pub fn layer_sizes(&self) -> Vec<usize> {
        let mut sizes: Vec<usize> = self
            .layers
            .first()
            .map(|layer| layer.weights.ncols())
            .into_iter()
            .collect();
        sizes.extend(self.layers.iter().map(|layer| layer.weights.nrows()));
        sizes
    }
}

impl DecisionFunction for Brain {
    fn activate(&self, inputs: &[f32; 4]) -> f32 {
        let outputs = self.think(&Array1::from_iter(inputs.iter().copied()));
        outputs.first().copied().unwrap_or(f32::NAN)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    /// Euclidean distance between two brains of equal shape.
    fn distance(brain1: &Brain, brain2: &Brain) -> f32 {
        let mut sum_sq = 0.0;
        for (layer1, layer2) in brain1.layers.iter().zip(&brain2.layers) {
            for (w1, w2) in layer1.weights.iter().zip(layer2.weights.iter()) {
                let diff = w1 - w2;
                sum_sq += diff * diff;
            }
            for (b1, b2) in layer1.biases.iter().zip(layer2.biases.iter()) {
                let diff = b1 - b2;
                sum_sq += diff * diff;
            }
        }
        sum_sq.sqrt()
    }

    #[test]
    fn shape_follows_layer_sizes() {
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let brain = Brain::new(&[4, 6, 1], 0.1, &mut rng);
        assert_eq!(brain.layers.len(), 2);
        assert_eq!(brain.layers[0].weights.dim(), (6, 4));
        assert_eq!(brain.layer_sizes(), vec![4, 6, 1]);
    }

    #[test]
    fn output_is_bounded_by_tanh() {
        let mut rng = ChaCha8Rng::seed_from_u64(2);
        let brain = Brain::new(&[4, 6, 1], 1.0, &mut rng);
        let out = brain.activate(&[256.0, 300.0, 100.0, 260.0]);
        assert!((-1.0..=1.0).contains(&out));
    }

    #[test]
    fn same_seed_same_brain() {
        let a = Brain::new(&[4, 3, 1], 0.5, &mut ChaCha8Rng::seed_from_u64(9));
        let b = Brain::new(&[4, 3, 1], 0.5, &mut ChaCha8Rng::seed_from_u64(9));
        assert_eq!(a, b);
    }

    #[test]
    fn crossover_with_full_weight_copies_parent() {
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        let a = Brain::new(&[4, 3, 1], 0.5, &mut rng);
        let b = Brain::new(&[4, 3, 1], 0.5, &mut rng);
        let child = Brain::crossover_weighted(&a, &b, 1.0);
        assert!(distance(&child, &a) < 1e-6);
    }

    #[test]
    fn mutation_moves_weights() {
        let mut rng = ChaCha8Rng::seed_from_u64(4);
        let original = Brain::new(&[4, 3, 1], 0.5, &mut rng);
        let mut mutated = original.clone();
        mutated.mutate(0.1, &mut rng);
        let moved = distance(&original, &mutated);
        assert!(moved > 0.0);
    }
}
