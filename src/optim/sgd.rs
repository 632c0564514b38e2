use crate::layers::Layer;
use crate::optim::optimizer::{for_each_connected_layer, Optimizer, OptimizerKind};

/// Plain gradient descent: `w -= lr · prev.value · δ`, `b -= lr · δ`.
#[derive(Debug, Clone, Default)]
pub struct Sgd;

impl Sgd {
    pub fn new() -> Sgd {
        Sgd
    }
}

impl Optimizer for Sgd {
    fn update_weights_and_biases(&mut self, layers: &mut [Layer], learning_rate: f32) {
        for_each_connected_layer(layers, |previous, layer, _| {
            for neuron in &mut layer.neurons {
                let delta = neuron.error;
                for (w, source) in neuron.weights.iter_mut().zip(&previous.neurons) {
                    *w -= learning_rate * source.value * delta;
                }
                neuron.bias -= learning_rate * delta;
            }
        });
    }

    fn kind(&self) -> OptimizerKind {
        OptimizerKind::Sgd
    }
}
