use rand::Rng;

use crate::activation::Activation;
use crate::layers::neuron::Neuron;
use crate::loss::mse::MseLoss;

/// Role of a layer in the network.
///
/// Only output layers carry training targets; input layers carry no
/// activation because their values are assigned directly.
#[derive(Debug, Clone, PartialEq)]
pub enum LayerKind {
    Input,
    Hidden { activation: Activation },
    Output { activation: Activation, target_outputs: Vec<f32> },
}

impl LayerKind {
    /// Name used in model files.
    pub fn type_name(&self) -> &'static str {
        match self {
            LayerKind::Input => "InputLayer",
            LayerKind::Hidden { .. } => "HiddenLayer",
            LayerKind::Output { .. } => "OutputLayer",
        }
    }
}

/// An ordered set of neurons plus the layer's role and activation.
///
/// Neuron order is significant: neuron `j` of this layer feeds weight `j`
/// of every neuron in the next layer.
#[derive(Debug, Clone, PartialEq)]
pub struct Layer {
    kind: LayerKind,
    pub neurons: Vec<Neuron>,
}

impl Layer {
    pub fn input(size: usize) -> Layer {
        Layer {
            kind: LayerKind::Input,
            neurons: (0..size).map(|_| Neuron::input()).collect(),
        }
    }

    pub fn hidden<R: Rng + ?Sized>(
        size: usize,
        fan_in: usize,
        activation: Activation,
        rng: &mut R,
    ) -> Layer {
        Layer {
            kind: LayerKind::Hidden { activation },
            neurons: (0..size).map(|_| Neuron::random(fan_in, rng)).collect(),
        }
    }

    pub fn output<R: Rng + ?Sized>(
        size: usize,
        fan_in: usize,
        activation: Activation,
        rng: &mut R,
    ) -> Layer {
        Layer {
            kind: LayerKind::Output { activation, target_outputs: Vec::new() },
            neurons: (0..size).map(|_| Neuron::random(fan_in, rng)).collect(),
        }
    }

    /// Assembles a layer from already-initialised neurons (model import).
    pub fn from_neurons(kind: LayerKind, neurons: Vec<Neuron>) -> Layer {
        Layer { kind, neurons }
    }

    pub fn kind(&self) -> &LayerKind {
        &self.kind
    }

    pub fn type_name(&self) -> &'static str {
        self.kind.type_name()
    }

    pub fn is_input(&self) -> bool {
        matches!(self.kind, LayerKind::Input)
    }

    pub fn activation(&self) -> Option<Activation> {
        match &self.kind {
            LayerKind::Input => None,
            LayerKind::Hidden { activation } | LayerKind::Output { activation, .. } => {
                Some(*activation)
            }
        }
    }

    pub fn size(&self) -> usize {
        self.neurons.len()
    }

    pub fn values(&self) -> Vec<f32> {
        self.neurons.iter().map(|n| n.value).collect()
    }

    /// Number of incoming weights per neuron (zero for input layers).
    pub fn fan_in(&self) -> usize {
        self.neurons.first().map(|n| n.weights.len()).unwrap_or(0)
    }

    /// Input-layer forward propagation: plain assignment.
    ///
    /// # Panics
    /// Panics if called on a non-input layer or with a wrong-sized vector.
    pub fn set_input_values(&mut self, inputs: &[f32]) {
        assert!(self.is_input(), "set_input_values called on a {}", self.type_name());
        assert_eq!(
            inputs.len(),
            self.neurons.len(),
            "input vector has {} values, input layer has {} neurons",
            inputs.len(),
            self.neurons.len()
        );
        for (neuron, &x) in self.neurons.iter_mut().zip(inputs) {
            neuron.value = x;
            neuron.sum = x;
        }
    }

    /// Computes every neuron's value from the previous layer's current values.
    pub fn forward_from(&mut self, previous: &Layer) {
        let activation = match &self.kind {
            LayerKind::Input => panic!("an input layer has no predecessor to propagate from"),
            LayerKind::Hidden { activation } | LayerKind::Output { activation, .. } => *activation,
        };
        for neuron in &mut self.neurons {
            neuron.sum = neuron.weighted_sum(&previous.neurons);
            neuron.value = activation.apply(neuron.sum);
        }
    }

    pub fn set_target_outputs(&mut self, targets: &[f32]) {
        match &mut self.kind {
            LayerKind::Output { target_outputs, .. } => {
                target_outputs.clear();
                target_outputs.extend_from_slice(targets);
            }
            other => panic!("target outputs set on a {}", other.type_name()),
        }
    }

    pub fn target_outputs(&self) -> &[f32] {
        match &self.kind {
            LayerKind::Output { target_outputs, .. } => target_outputs,
            _ => &[],
        }
    }

    /// Output-layer error signal: `δ_i = (output_i − target_i) · f'(sum_i)`.
    pub fn compute_output_errors(&mut self) {
        let (activation, targets) = match &self.kind {
            LayerKind::Output { activation, target_outputs } => (*activation, target_outputs),
            other => panic!("output errors computed on a {}", other.type_name()),
        };
        assert_eq!(
            targets.len(),
            self.neurons.len(),
            "{} target values for {} output neurons",
            targets.len(),
            self.neurons.len()
        );
        let outputs: Vec<f32> = self.values();
        let gradient = MseLoss::derivative(&outputs, targets);
        for (neuron, g) in self.neurons.iter_mut().zip(gradient) {
            neuron.error = g * activation.derivative(neuron.sum);
        }
    }

    /// Hidden-layer error signal, given `next` already holds its δ:
    /// `δ_i = f'(sum_i) · Σ_k next.weights_k[i] · next.δ_k`.
    pub fn compute_hidden_errors(&mut self, next: &Layer) {
        let activation = match &self.kind {
            LayerKind::Hidden { activation } => *activation,
            other => panic!("hidden errors computed on a {}", other.type_name()),
        };
        for (i, neuron) in self.neurons.iter_mut().enumerate() {
            let propagated: f32 = next
                .neurons
                .iter()
                .map(|k| k.weights[i] * k.error)
                .sum();
            neuron.error = activation.derivative(neuron.sum) * propagated;
        }
    }
}
