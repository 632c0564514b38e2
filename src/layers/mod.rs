pub mod layer;
pub mod neuron;

pub use layer::{Layer, LayerKind};
pub use neuron::Neuron;
