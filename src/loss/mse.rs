/// Squared-error loss over the output units of one sample.
pub struct MseLoss;

impl MseLoss {
    /// Scalar MSE: mean((predicted - expected)²)
    pub fn loss(predicted: &[f32], expected: &[f32]) -> f32 {
        if predicted.is_empty() {
            return 0.0;
        }
        let n = predicted.len() as f32;
        predicted.iter().zip(expected.iter())
            .map(|(a, b)| (a - b).powi(2))
            .sum::<f32>() / n
    }

    /// Per-output gradient of ½·Σ(predicted - expected)²: predicted - expected
    pub fn derivative(predicted: &[f32], expected: &[f32]) -> Vec<f32> {
        predicted.iter().zip(expected.iter())
            .map(|(a, b)| a - b)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn loss_is_mean_of_squares() {
        assert_abs_diff_eq!(MseLoss::loss(&[1.0, 0.0], &[0.0, 0.0]), 0.5);
        assert_abs_diff_eq!(MseLoss::loss(&[], &[]), 0.0);
    }

    #[test]
    fn derivative_is_difference() {
        assert_eq!(MseLoss::derivative(&[0.75, 0.25], &[1.0, 0.0]), vec![-0.25, 0.25]);
    }
}
