use rand::Rng;
use rand_distr::StandardNormal;

/// Initial weights are clamped to `[-WEIGHT_INIT_BOUND, WEIGHT_INIT_BOUND]`.
pub const WEIGHT_INIT_BOUND: f32 = 1.0;

/// One unit of a layer.
///
/// `weights[j]` is the weight of the edge coming from neuron `j` of the
/// previous layer; input neurons have no weights.
#[derive(Debug, Clone, PartialEq)]
pub struct Neuron {
    /// Post-activation output.
    pub value: f32,
    /// Pre-activation sum `Σ w·x + b`, kept for the derivative.
    pub sum: f32,
    pub bias: f32,
    /// Error signal δ, valid after a backward pass.
    pub error: f32,
    pub weights: Vec<f32>,
}

impl Neuron {
    /// A neuron without incoming edges (input layer).
    pub fn input() -> Neuron {
        Neuron {
            value: 0.0,
            sum: 0.0,
            bias: 0.0,
            error: 0.0,
            weights: Vec::new(),
        }
    }

    /// A neuron with `fan_in` randomized incoming weights and a randomized bias,
    /// drawn from N(0, 1/sqrt(fan_in)) and clamped.
    pub fn random<R: Rng + ?Sized>(fan_in: usize, rng: &mut R) -> Neuron {
        let std_dev = (1.0 / fan_in.max(1) as f32).sqrt();
        let mut sample = || {
            let z: f32 = rng.sample(StandardNormal);
            (z * std_dev).clamp(-WEIGHT_INIT_BOUND, WEIGHT_INIT_BOUND)
        };

        let weights = (0..fan_in).map(|_| sample()).collect();
        let bias = sample();
        Neuron {
            value: 0.0,
            sum: 0.0,
            bias,
            error: 0.0,
            weights,
        }
    }

    /// A neuron with explicit weights and bias (model import).
    pub fn with_weights(weights: Vec<f32>, bias: f32) -> Neuron {
        Neuron {
            value: 0.0,
            sum: 0.0,
            bias,
            error: 0.0,
            weights,
        }
    }

    /// `Σ_j weights[j] · inputs[j] + bias`.
    pub fn weighted_sum(&self, inputs: &[Neuron]) -> f32 {
        debug_assert_eq!(self.weights.len(), inputs.len());
        self.weights
            .iter()
            .zip(inputs)
            .map(|(w, n)| w * n.value)
            .sum::<f32>()
            + self.bias
    }
}
