use std::fmt;

use clap::ValueEnum;
use serde::{Serialize, Deserialize};

use crate::layers::Layer;
use crate::optim::{adam::Adam, sgd::Sgd};

/// A weight-update strategy.
///
/// `update_weights_and_biases` must be called after a backward pass has
/// populated every neuron's error signal and before the next forward pass.
pub trait Optimizer: fmt::Debug + Send {
    fn update_weights_and_biases(&mut self, layers: &mut [Layer], learning_rate: f32);

    fn kind(&self) -> OptimizerKind;

    /// Number of updates applied so far, for optimizers that keep one.
    fn time_step(&self) -> Option<u64> {
        None
    }
}

/// Selects which [`Optimizer`] a network trains with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum OptimizerKind {
    /// Plain gradient descent.
    #[default]
    Sgd,
    /// Adam with default hyperparameters.
    Adam,
}

impl OptimizerKind {
    /// Constructs a fresh optimizer (new Adam state starts at t = 0).
    pub fn build(self) -> Box<dyn Optimizer> {
        match self {
            OptimizerKind::Sgd => Box::new(Sgd::new()),
            OptimizerKind::Adam => Box::new(Adam::new()),
        }
    }
}

/// Calls `f(previous, layer, layer_index)` for every layer that has a predecessor.
pub(crate) fn for_each_connected_layer<F>(layers: &mut [Layer], mut f: F)
where
    F: FnMut(&Layer, &mut Layer, usize),
{
    for l in 1..layers.len() {
        let (before, rest) = layers.split_at_mut(l);
        f(&before[l - 1], &mut rest[0], l);
    }
}
