use crate::layers::Layer;
use crate::optim::optimizer::{for_each_connected_layer, Optimizer, OptimizerKind};

pub const DEFAULT_BETA1: f32 = 0.9;
pub const DEFAULT_BETA2: f32 = 0.999;
pub const DEFAULT_EPSILON: f32 = 1e-8;

/// First and second moment estimates of one layer, flattened as
/// `neuron_index * fan_in + weight_index`.
#[derive(Debug, Clone, Default)]
struct LayerMoments {
    m_weights: Vec<f32>,
    v_weights: Vec<f32>,
    m_biases: Vec<f32>,
    v_biases: Vec<f32>,
}

impl LayerMoments {
    fn zeros(weights: usize, biases: usize) -> LayerMoments {
        LayerMoments {
            m_weights: vec![0.0; weights],
            v_weights: vec![0.0; weights],
            m_biases: vec![0.0; biases],
            v_biases: vec![0.0; biases],
        }
    }

    fn fits(&self, weights: usize, biases: usize) -> bool {
        self.m_weights.len() == weights && self.m_biases.len() == biases
    }
}

/// Adam (bias-corrected).
///
/// The time step `t` is shared by the whole network and advances once per
/// `update_weights_and_biases` call. Moments are keyed by layer position.
#[derive(Debug, Clone)]
pub struct Adam {
    pub beta1: f32,
    pub beta2: f32,
    pub epsilon: f32,
    t: u64,
    /// When set, moments and `t` restart after this many steps.
    reset_interval: Option<u64>,
    moments: Vec<LayerMoments>,
}

impl Default for Adam {
    fn default() -> Self {
        Adam::new()
    }
}

impl Adam {
    pub fn new() -> Adam {
        Adam::with_hyperparameters(DEFAULT_BETA1, DEFAULT_BETA2, DEFAULT_EPSILON)
    }

    pub fn with_hyperparameters(beta1: f32, beta2: f32, epsilon: f32) -> Adam {
        Adam {
            beta1,
            beta2,
            epsilon,
            t: 0,
            reset_interval: None,
            moments: Vec::new(),
        }
    }

    pub fn with_reset_interval(mut self, interval: Option<u64>) -> Adam {
        self.reset_interval = interval.filter(|&n| n > 0);
        self
    }

    fn reset(&mut self) {
        log::debug!("adam: resetting moments after {} steps", self.t);
        self.t = 0;
        self.moments.clear();
    }

    fn ensure_state(&mut self, layers: &[Layer]) {
        if self.moments.len() != layers.len() {
            self.moments.resize_with(layers.len(), LayerMoments::default);
        }
        for (moments, layer) in self.moments.iter_mut().zip(layers) {
            let weights = layer.size() * layer.fan_in();
            if !moments.fits(weights, layer.size()) {
                *moments = LayerMoments::zeros(weights, layer.size());
            }
        }
    }
}

impl Optimizer for Adam {
    fn update_weights_and_biases(&mut self, layers: &mut [Layer], learning_rate: f32) {
        if let Some(interval) = self.reset_interval {
            if self.t >= interval {
                self.reset();
            }
        }
        self.ensure_state(layers);
        self.t += 1;

        let (beta1, beta2, epsilon) = (self.beta1, self.beta2, self.epsilon);
        let correction1 = 1.0 - beta1.powf(self.t as f32);
        let correction2 = 1.0 - beta2.powf(self.t as f32);
        let moments = &mut self.moments;

        let adam_delta = |g: f32, m: &mut f32, v: &mut f32| -> f32 {
            *m = beta1 * *m + (1.0 - beta1) * g;
            *v = beta2 * *v + (1.0 - beta2) * g * g;
            let m_hat = *m / correction1;
            let v_hat = *v / correction2;
            learning_rate * m_hat / (v_hat.sqrt() + epsilon)
        };

        for_each_connected_layer(layers, |previous, layer, l| {
            let state = &mut moments[l];
            let fan_in = previous.size();
            for (i, neuron) in layer.neurons.iter_mut().enumerate() {
                let delta = neuron.error;
                for (j, w) in neuron.weights.iter_mut().enumerate() {
                    let k = i * fan_in + j;
                    let g = previous.neurons[j].value * delta;
                    *w -= adam_delta(g, &mut state.m_weights[k], &mut state.v_weights[k]);
                }
                neuron.bias -= adam_delta(delta, &mut state.m_biases[i], &mut state.v_biases[i]);
            }
        });
    }

    fn kind(&self) -> OptimizerKind {
        OptimizerKind::Adam
    }

    fn time_step(&self) -> Option<u64> {
        Some(self.t)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::activation::{Activation, ActivationFunction};
    use crate::layers::{LayerKind, Neuron};
    use approx::assert_abs_diff_eq;

    fn two_layers() -> Vec<Layer> {
        let mut input = Layer::input(2);
        input.set_input_values(&[1.0, -1.0]);
        let mut out = Layer::from_neurons(
            LayerKind::Output {
                activation: Activation::new(ActivationFunction::Sigmoid, 0.0),
                target_outputs: Vec::new(),
            },
            vec![Neuron::with_weights(vec![0.3, -0.3], 0.0)],
        );
        out.neurons[0].error = 0.4;
        vec![input, out]
    }

    #[test]
    fn time_step_counts_every_call() {
        let mut layers = two_layers();
        let mut adam = Adam::new();
        for _ in 0..25 {
            adam.update_weights_and_biases(&mut layers, 0.01);
        }
        assert_eq!(adam.time_step(), Some(25));
    }

    #[test]
    fn first_step_moves_by_learning_rate() {
        // With bias correction, m̂/√v̂ = sign(g) on the first step.
        let mut layers = two_layers();
        let mut adam = Adam::new();
        adam.update_weights_and_biases(&mut layers, 0.01);
        let n = &layers[1].neurons[0];
        assert_abs_diff_eq!(n.weights[0], 0.3 - 0.01, epsilon = 1e-5);
        assert_abs_diff_eq!(n.weights[1], -0.3 + 0.01, epsilon = 1e-5);
        assert_abs_diff_eq!(n.bias, -0.01, epsilon = 1e-5);
    }

    #[test]
    fn reset_interval_restarts_time_step() {
        let mut layers = two_layers();
        let mut adam = Adam::new().with_reset_interval(Some(3));
        for _ in 0..4 {
            adam.update_weights_and_biases(&mut layers, 0.01);
        }
        assert_eq!(adam.time_step(), Some(1));
    }
}
