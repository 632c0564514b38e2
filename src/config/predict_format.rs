use serde::{Serialize, Deserialize};

/// How predicted outputs are written, one line per record.
///
/// - `Csv`         : inputs followed by outputs, comma-separated
/// - `NumberAndRaw`: `rounded (raw)` for every output
/// - `NumberOnly`  : rounded outputs only
/// - `RawOnly`     : raw outputs, comma-separated
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum PredictOutputFormat {
    Csv,
    #[default]
    NumberAndRaw,
    NumberOnly,
    RawOnly,
}

impl PredictOutputFormat {
    pub fn format(&self, inputs: &[f32], outputs: &[f32]) -> String {
        match self {
            PredictOutputFormat::Csv => inputs
                .iter()
                .chain(outputs)
                .map(|v| v.to_string())
                .collect::<Vec<_>>()
                .join(","),
            PredictOutputFormat::NumberAndRaw => outputs
                .iter()
                .map(|&v| format!("{} ({})", rounded(v), v))
                .collect::<Vec<_>>()
                .join(", "),
            PredictOutputFormat::NumberOnly => outputs
                .iter()
                .map(|&v| rounded(v).to_string())
                .collect::<Vec<_>>()
                .join(","),
            PredictOutputFormat::RawOnly => outputs
                .iter()
                .map(|v| v.to_string())
                .collect::<Vec<_>>()
                .join(","),
        }
    }
}

// `+ 0.0` folds -0 into 0 so that "-0" is never printed.
fn rounded(v: f32) -> f32 {
    v.round() + 0.0
}
