use serde::{Serialize, Deserialize};

use crate::activation::{Activation, ActivationFunction};
use crate::error::{MlpError, Result};

/// Hyperparameters that fully determine a network's topology.
///
/// Serialized as the `parameters` object of a model file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NetworkParameters {
    pub input_size: usize,
    pub hidden_size: usize,
    pub output_size: usize,
    pub hiddens_count: usize,
    pub learning_rate: f32,
    pub hidden_activation_function: ActivationFunction,
    pub hidden_activation_alpha: f32,
    pub output_activation_function: ActivationFunction,
    pub output_activation_alpha: f32,
}

impl Default for NetworkParameters {
    fn default() -> Self {
        NetworkParameters {
            input_size: 0,
            hidden_size: 10,
            output_size: 1,
            hiddens_count: 1,
            learning_rate: 0.01,
            hidden_activation_function: ActivationFunction::Sigmoid,
            hidden_activation_alpha: 0.01,
            output_activation_function: ActivationFunction::Sigmoid,
            output_activation_alpha: 0.01,
        }
    }
}

impl NetworkParameters {
    pub fn hidden_activation(&self) -> Activation {
        Activation::new(self.hidden_activation_function, self.hidden_activation_alpha)
    }

    pub fn output_activation(&self) -> Activation {
        Activation::new(self.output_activation_function, self.output_activation_alpha)
    }

    /// Number of values a training/testing CSV line must hold.
    pub fn columns(&self) -> usize {
        self.input_size + self.output_size
    }

    pub fn validate(&self) -> Result<()> {
        if self.input_size == 0 {
            return Err(MlpError::parameter("input_size", "must be at least 1"));
        }
        if self.hidden_size == 0 {
            return Err(MlpError::parameter("hidden_size", "must be at least 1"));
        }
        if self.output_size == 0 {
            return Err(MlpError::parameter("output_size", "must be at least 1"));
        }
        if self.hiddens_count == 0 {
            return Err(MlpError::parameter("hiddens_count", "must be at least 1"));
        }
        if !(self.learning_rate.is_finite() && self.learning_rate > 0.0) {
            return Err(MlpError::parameter(
                "learning_rate",
                format!("must be finite and > 0, got {}", self.learning_rate),
            ));
        }
        for (name, alpha) in [
            ("hidden_activation_alpha", self.hidden_activation_alpha),
            ("output_activation_alpha", self.output_activation_alpha),
        ] {
            if !alpha.is_finite() {
                return Err(MlpError::parameter(name, "must be finite"));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_need_an_input_size() {
        let params = NetworkParameters::default();
        assert!(matches!(
            params.validate(),
            Err(MlpError::InvalidParameter { name, .. }) if name == "input_size"
        ));
        let params = NetworkParameters { input_size: 4, ..Default::default() };
        assert!(params.validate().is_ok());
        assert_eq!(params.columns(), 5);
    }

    #[test]
    fn rejects_bad_learning_rate() {
        let params = NetworkParameters {
            input_size: 2,
            learning_rate: 0.0,
            ..Default::default()
        };
        assert!(params.validate().is_err());
    }
}
