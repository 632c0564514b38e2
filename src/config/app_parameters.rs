use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use serde::{Serialize, Deserialize};

use crate::config::predict_format::PredictOutputFormat;
use crate::data::ColumnLayout;
use crate::error::{MlpError, Result};
use crate::network::NetworkParameters;
use crate::optim::OptimizerKind;

/// What a [`Session`](crate::session::Session) run does.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum Mode {
    /// Forward-only over input records, writing formatted outputs.
    Predict,
    /// Train over the whole file.
    TrainOnly,
    /// Test the whole file with an imported model.
    TestOnly,
    /// Test the suffix after every epoch and track one output per line.
    TrainTestMonitored,
    /// Train every epoch, then test the suffix once.
    #[default]
    TrainThenTest,
}

impl Mode {
    pub fn trains(&self) -> bool {
        matches!(self, Mode::TrainOnly | Mode::TrainTestMonitored | Mode::TrainThenTest)
    }

    /// Modes that only make sense with an imported model.
    pub fn needs_model(&self) -> bool {
        matches!(self, Mode::Predict | Mode::TestOnly)
    }
}

/// Application parameters: a JSON config file, overridden by command-line flags.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppParameters {
    pub mode: Mode,
    /// Dataset file. Predict reads stdin when unset.
    pub input_file: Option<PathBuf>,
    pub import_model: Option<PathBuf>,
    pub export_model: Option<PathBuf>,
    pub num_epochs: usize,
    pub training_ratio: f32,
    /// Explicit training-ratio line, used instead of `training_ratio`.
    pub training_ratio_line: Option<usize>,
    pub column_layout: ColumnLayout,
    pub output_index_to_monitor: usize,
    pub predict_output_format: PredictOutputFormat,
    pub optimizer: OptimizerKind,
    pub network: NetworkParameters,
    pub verbose: bool,
}

impl Default for AppParameters {
    fn default() -> Self {
        AppParameters {
            mode: Mode::default(),
            input_file: None,
            import_model: None,
            export_model: None,
            num_epochs: 10,
            training_ratio: 0.7,
            training_ratio_line: None,
            column_layout: ColumnLayout::default(),
            output_index_to_monitor: 0,
            predict_output_format: PredictOutputFormat::default(),
            optimizer: OptimizerKind::default(),
            network: NetworkParameters::default(),
            verbose: false,
        }
    }
}

impl AppParameters {
    /// Reads parameters from a JSON file; absent fields keep their defaults.
    pub fn load_json(path: impl AsRef<Path>) -> Result<AppParameters> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(MlpError::FileNotFound(path.to_path_buf()));
        }
        let file = File::open(path).map_err(|source| MlpError::FileOpen { path: path.to_path_buf(), source })?;
        let params = serde_json::from_reader(BufReader::new(file))?;
        log::debug!("loaded parameters from {}", path.display());
        Ok(params)
    }

    pub fn validate(&self) -> Result<()> {
        if !(self.training_ratio > 0.0 && self.training_ratio <= 1.0) {
            return Err(MlpError::InvalidTrainingRatio(self.training_ratio));
        }
        if self.mode.trains() && self.num_epochs == 0 {
            return Err(MlpError::parameter("num_epochs", "must be at least 1"));
        }

        match &self.input_file {
            Some(path) if !path.is_file() => return Err(MlpError::FileNotFound(path.clone())),
            None if self.mode != Mode::Predict => {
                return Err(MlpError::parameter("input_file", format!("required in {:?} mode", self.mode)))
            }
            _ => {}
        }

        match &self.import_model {
            Some(path) if !path.is_file() => return Err(MlpError::FileNotFound(path.clone())),
            None if self.mode.needs_model() => {
                return Err(MlpError::parameter("import_model", format!("required in {:?} mode", self.mode)))
            }
            // Without an import the network is built from these.
            None => self.network.validate()?,
            _ => {}
        }

        if let Some(dir) = self
            .export_model
            .as_deref()
            .and_then(Path::parent)
            .filter(|d| !d.as_os_str().is_empty())
        {
            if !dir.is_dir() {
                return Err(MlpError::InvalidDirectory(dir.to_path_buf()));
            }
        }
        Ok(())
    }
}
