use serde::{Serialize, Deserialize};
use std::f32::consts::E;
use std::fmt;
use std::str::FromStr;

use crate::error::MlpError;

/// Slope used by `LeakyReLU` for negative inputs.
pub const LEAKY_RELU_SLOPE: f32 = 0.01;

/// The closed set of activation functions a layer can use.
///
/// `PReLU` and `ELU` read their alpha from the owning layer's [`Activation`];
/// the other variants ignore it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ActivationFunction {
    Sigmoid,
    Tanh,
    ReLU,
    LeakyReLU,
    PReLU,
    ELU,
}

impl ActivationFunction {
    pub const ALL: [ActivationFunction; 6] = [
        ActivationFunction::Sigmoid,
        ActivationFunction::Tanh,
        ActivationFunction::ReLU,
        ActivationFunction::LeakyReLU,
        ActivationFunction::PReLU,
        ActivationFunction::ELU,
    ];

    /// Element-wise activation of the pre-activation input `x`.
    pub fn function(&self, x: f32, alpha: f32) -> f32 {
        match self {
            ActivationFunction::Sigmoid => 1.0 / (1.0 + E.powf(-x)),
            ActivationFunction::Tanh => x.tanh(),
            ActivationFunction::ReLU => x.max(0.0),
            ActivationFunction::LeakyReLU => (LEAKY_RELU_SLOPE * x).max(x),
            ActivationFunction::PReLU => (alpha * x).max(x),
            ActivationFunction::ELU => {
                if x >= 0.0 { x } else { alpha * (E.powf(x) - 1.0) }
            }
        }
    }

    /// Derivative with respect to the pre-activation input `x`.
    pub fn derivative(&self, x: f32, alpha: f32) -> f32 {
        match self {
            ActivationFunction::Sigmoid => {
                let fx = self.function(x, alpha);
                fx * (1.0 - fx)
            }
            ActivationFunction::Tanh => {
                let t = x.tanh();
                1.0 - t * t
            }
            ActivationFunction::ReLU => if x > 0.0 { 1.0 } else { 0.0 },
            ActivationFunction::LeakyReLU => if x > 0.0 { 1.0 } else { LEAKY_RELU_SLOPE },
            ActivationFunction::PReLU => if x > 0.0 { 1.0 } else { alpha },
            ActivationFunction::ELU => {
                if x >= 0.0 { 1.0 } else { alpha * E.powf(x) }
            }
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            ActivationFunction::Sigmoid => "Sigmoid",
            ActivationFunction::Tanh => "Tanh",
            ActivationFunction::ReLU => "ReLU",
            ActivationFunction::LeakyReLU => "LeakyReLU",
            ActivationFunction::PReLU => "PReLU",
            ActivationFunction::ELU => "ELU",
        }
    }

    /// Whether the function reads the layer's alpha.
    pub fn uses_alpha(&self) -> bool {
        matches!(self, ActivationFunction::PReLU | ActivationFunction::ELU)
    }
}

impl fmt::Display for ActivationFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Accepts the canonical names case-insensitively, plus the numeric codes
/// 0..=5 used by older model files.
impl FromStr for ActivationFunction {
    type Err = MlpError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if let Ok(code) = trimmed.parse::<usize>() {
            return ActivationFunction::ALL
                .get(code)
                .copied()
                .ok_or_else(|| MlpError::UnimplementedActivationFunction(trimmed.to_owned()));
        }
        ActivationFunction::ALL
            .iter()
            .find(|f| f.name().eq_ignore_ascii_case(trimmed))
            .copied()
            .ok_or_else(|| MlpError::UnimplementedActivationFunction(trimmed.to_owned()))
    }
}

/// A layer's activation: the function plus its alpha parameter.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Activation {
    pub function: ActivationFunction,
    pub alpha: f32,
}

impl Activation {
    pub fn new(function: ActivationFunction, alpha: f32) -> Activation {
        Activation { function, alpha }
    }

    pub fn apply(&self, x: f32) -> f32 {
        self.function.function(x, self.alpha)
    }

    pub fn derivative(&self, x: f32) -> f32 {
        self.function.derivative(x, self.alpha)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn activation_table() {
        assert_abs_diff_eq!(ActivationFunction::Sigmoid.function(0.0, 0.0), 0.5);
        assert_abs_diff_eq!(ActivationFunction::Tanh.function(0.0, 0.0), 0.0);
        assert_abs_diff_eq!(ActivationFunction::ReLU.function(-1.0, 0.0), 0.0);
        assert_abs_diff_eq!(ActivationFunction::ReLU.function(2.5, 0.0), 2.5);
        assert_abs_diff_eq!(ActivationFunction::LeakyReLU.function(-2.0, 0.0), -0.02);
        assert_abs_diff_eq!(ActivationFunction::PReLU.function(-2.0, 0.25), -0.5);
        assert_abs_diff_eq!(
            ActivationFunction::ELU.function(-1.0, 0.1),
            -0.063_212,
            epsilon = 1e-5
        );
    }

    #[test]
    fn derivatives() {
        assert_abs_diff_eq!(ActivationFunction::Sigmoid.derivative(0.0, 0.0), 0.25);
        assert_abs_diff_eq!(ActivationFunction::Tanh.derivative(0.0, 0.0), 1.0);
        assert_abs_diff_eq!(ActivationFunction::ReLU.derivative(-3.0, 0.0), 0.0);
        assert_abs_diff_eq!(ActivationFunction::ReLU.derivative(3.0, 0.0), 1.0);
        assert_abs_diff_eq!(ActivationFunction::LeakyReLU.derivative(-3.0, 0.0), 0.01);
        assert_abs_diff_eq!(ActivationFunction::PReLU.derivative(-3.0, 0.2), 0.2);
        assert_abs_diff_eq!(ActivationFunction::ELU.derivative(0.0, 0.1), 1.0);
        assert_abs_diff_eq!(
            ActivationFunction::ELU.derivative(-1.0, 0.1),
            0.1 * (-1.0f32).exp(),
            epsilon = 1e-6
        );
    }

    #[test]
    fn parses_names_and_codes() {
        assert_eq!("sigmoid".parse::<ActivationFunction>().unwrap(), ActivationFunction::Sigmoid);
        assert_eq!("ELU".parse::<ActivationFunction>().unwrap(), ActivationFunction::ELU);
        assert_eq!("3".parse::<ActivationFunction>().unwrap(), ActivationFunction::LeakyReLU);
        assert!(matches!(
            "Softmax".parse::<ActivationFunction>(),
            Err(MlpError::UnimplementedActivationFunction(name)) if name == "Softmax"
        ));
        assert!("6".parse::<ActivationFunction>().is_err());
    }
}
