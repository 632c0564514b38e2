use crate::data::Record;
use crate::error::{MlpError, Result};
use crate::layers::{Layer, LayerKind};
use crate::network::params::NetworkParameters;
use crate::optim::{Optimizer, OptimizerKind};

/// A multilayer perceptron: one input layer, one or more hidden layers and
/// one output layer, plus the optimizer that trains it.
///
/// A `Network` only exists in the built state: it is produced by
/// [`Network::build`] (fresh random weights) or by model import.
#[derive(Debug)]
pub struct Network {
    params: NetworkParameters,
    layers: Vec<Layer>,
    optimizer: Box<dyn Optimizer>,
}

impl Network {
    /// Builds a network with randomized weights from its hyperparameters.
    pub fn build(params: NetworkParameters, optimizer: OptimizerKind) -> Result<Network> {
        params.validate()?;
        let mut rng = rand::thread_rng();

        let mut layers = Vec::with_capacity(params.hiddens_count + 2);
        layers.push(Layer::input(params.input_size));
        let mut fan_in = params.input_size;
        for _ in 0..params.hiddens_count {
            layers.push(Layer::hidden(params.hidden_size, fan_in, params.hidden_activation(), &mut rng));
            fan_in = params.hidden_size;
        }
        layers.push(Layer::output(params.output_size, fan_in, params.output_activation(), &mut rng));

        log::debug!(
            "built network {}-{}x{}-{} ({} / {}), optimizer {:?}",
            params.input_size,
            params.hiddens_count,
            params.hidden_size,
            params.output_size,
            params.hidden_activation_function,
            params.output_activation_function,
            optimizer
        );

        Ok(Network { params, layers, optimizer: optimizer.build() })
    }

    /// Assembles a network from imported layers, checking the structural invariants.
    pub fn from_layers(
        params: NetworkParameters,
        layers: Vec<Layer>,
        optimizer: OptimizerKind,
    ) -> Result<Network> {
        params.validate()?;
        check_shape(&layers)?;
        Ok(Network { params, layers, optimizer: optimizer.build() })
    }

    pub fn parameters(&self) -> &NetworkParameters {
        &self.params
    }

    pub fn layers(&self) -> &[Layer] {
        &self.layers
    }

    pub fn optimizer(&self) -> &dyn Optimizer {
        self.optimizer.as_ref()
    }

    /// Replaces the optimizer; its state starts from scratch.
    pub fn set_optimizer(&mut self, optimizer: Box<dyn Optimizer>) {
        self.optimizer = optimizer;
    }

    pub fn input_size(&self) -> usize {
        self.layers[0].size()
    }

    pub fn output_size(&self) -> usize {
        self.output_layer().size()
    }

    fn output_layer(&self) -> &Layer {
        &self.layers[self.layers.len() - 1]
    }

    /// Values currently held by the output layer.
    pub fn outputs(&self) -> Vec<f32> {
        self.output_layer().values()
    }

    /// Forward propagation, layer by layer in topological order.
    ///
    /// # Panics
    /// Panics if `inputs.len()` differs from the input layer size.
    pub fn forward_propagation(&mut self, inputs: &[f32]) {
        self.layers[0].set_input_values(inputs);
        for l in 1..self.layers.len() {
            let (before, rest) = self.layers.split_at_mut(l);
            rest[0].forward_from(&before[l - 1]);
        }
    }

    /// Runs forward propagation and returns the outputs.
    pub fn forward(&mut self, inputs: &[f32]) -> Vec<f32> {
        self.forward_propagation(inputs);
        self.outputs()
    }

    /// Computes every error signal, output layer first, from `targets`.
    ///
    /// Must follow a forward pass on the same sample.
    pub fn backward_propagation(&mut self, targets: &[f32]) {
        let last = self.layers.len() - 1;
        self.layers[last].set_target_outputs(targets);
        self.layers[last].compute_output_errors();
        for l in (1..last).rev() {
            let (upto, after) = self.layers.split_at_mut(l + 1);
            upto[l].compute_hidden_errors(&after[0]);
        }
    }

    /// Lets the optimizer apply one update from the current error signals.
    pub fn update_weights_and_biases(&mut self) {
        let learning_rate = self.params.learning_rate;
        self.optimizer.update_weights_and_biases(&mut self.layers, learning_rate);
    }

    /// One online training step: forward, backward, update.
    pub fn train_sample(&mut self, record: &Record) -> Vec<f32> {
        self.forward_propagation(&record.inputs);
        let outputs = self.outputs();
        self.backward_propagation(&record.outputs);
        self.update_weights_and_biases();
        outputs
    }

    /// Forward pass for inference.
    pub fn predict(&mut self, inputs: &[f32]) -> Vec<f32> {
        self.forward(inputs)
    }
}

/// Checks the structural invariants of a layer sequence: input first,
/// hidden layers in between (at least one), output last, and every
/// neuron's weight count equal to the previous layer's size.
pub fn check_shape(layers: &[Layer]) -> Result<()> {
    let (first, last) = match (layers.first(), layers.last()) {
        (Some(first), Some(last)) if layers.len() >= 3 => (first, last),
        _ => {
            return Err(MlpError::InvalidModelTopology(format!(
                "expected at least 3 layers, found {}",
                layers.len()
            )))
        }
    };
    if !matches!(first.kind(), LayerKind::Input) {
        return Err(MlpError::InvalidFirstLayerType(first.type_name().to_owned()));
    }
    if !matches!(last.kind(), LayerKind::Output { .. }) {
        return Err(MlpError::InvalidLastLayerType(last.type_name().to_owned()));
    }
    for (index, layer) in layers.iter().enumerate().take(layers.len() - 1).skip(1) {
        if !matches!(layer.kind(), LayerKind::Hidden { .. }) {
            return Err(MlpError::InvalidHiddenLayerType {
                index,
                found: layer.type_name().to_owned(),
            });
        }
    }
    for l in 1..layers.len() {
        let expected = layers[l - 1].size();
        for (n, neuron) in layers[l].neurons.iter().enumerate() {
            if neuron.weights.len() != expected {
                return Err(MlpError::InvalidModelWeights {
                    layer: l,
                    neuron: n,
                    reason: format!("{} weights instead of {}", neuron.weights.len(), expected),
                });
            }
        }
    }
    Ok(())
}
