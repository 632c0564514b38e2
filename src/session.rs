//! The session: one set of [`AppParameters`] plus the network they act on.
//!
//! A session starts without a network. [`Session::prepare`] builds one from
//! the parameters or imports the configured model; [`Session::run`] then
//! executes the configured [`Mode`]. The HTTP front-end keeps a single
//! session behind a mutex and calls the line-oriented helpers
//! (`train_lines`, `test_lines`, `predict_lines`) on it.

use std::fs::File;
use std::io::{self, BufRead, BufReader, Cursor, Write};
use std::path::Path;

use crate::config::{AppParameters, Mode};
use crate::data::{FileParser, LineParser, RecordSource, StreamParser};
use crate::error::{MlpError, Result};
use crate::network::Network;
use crate::train::{
    test_file_pass, test_records, train_loop, train_one_epoch_pass, EpochStats, PassLoss, Stat,
    TestReport, TrainConfig,
};

/// What a [`Session::run`] produced.
#[derive(Debug, Clone, Default)]
pub struct RunSummary {
    pub epochs: Vec<EpochStats>,
    pub stat: Option<Stat>,
    pub predictions: usize,
}

#[derive(Debug)]
pub struct Session {
    params: AppParameters,
    network: Option<Network>,
}

impl Session {
    pub fn new(params: AppParameters) -> Session {
        Session { params, network: None }
    }

    /// A session around an already built network.
    pub fn with_network(mut params: AppParameters, network: Network) -> Session {
        params.network = network.parameters().clone();
        Session { params, network: Some(network) }
    }

    pub fn params(&self) -> &AppParameters {
        &self.params
    }

    pub fn is_initialized(&self) -> bool {
        self.network.is_some()
    }

    /// # Panics
    /// Panics if no network was built or imported.
    pub fn network(&self) -> &Network {
        self.network
            .as_ref()
            .unwrap_or_else(|| panic!("network used before it was built or imported"))
    }

    /// # Panics
    /// Panics if no network was built or imported.
    pub fn network_mut(&mut self) -> &mut Network {
        self.network
            .as_mut()
            .unwrap_or_else(|| panic!("network used before it was built or imported"))
    }

    /// Builds a fresh network with random weights from the parameters.
    pub fn build_network(&mut self) -> Result<()> {
        let network = Network::build(self.params.network.clone(), self.params.optimizer)?;
        self.network = Some(network);
        Ok(())
    }

    /// Replaces the network with the model at `path`. The imported
    /// hyperparameters replace the configured ones.
    pub fn import_network(&mut self, path: impl AsRef<Path>) -> Result<()> {
        let network = Network::import_model(path, self.params.optimizer)?;
        self.params.network = network.parameters().clone();
        self.network = Some(network);
        Ok(())
    }

    pub fn export_network(&self, path: impl AsRef<Path>) -> Result<()> {
        self.network().export_model(path)
    }

    /// Imports the configured model, or builds a new network when none is set.
    pub fn prepare(&mut self) -> Result<()> {
        match self.params.import_model.clone() {
            Some(path) => self.import_network(path),
            None => self.build_network(),
        }
    }

    fn line_parser(&self) -> LineParser {
        let net = self.network();
        LineParser::new(net.input_size(), net.output_size(), self.params.column_layout)
            .predict_mode(self.params.mode == Mode::Predict)
    }

    fn file_parser(&self, ratio: f32, line_override: Option<usize>) -> Result<FileParser> {
        let path = self
            .params
            .input_file
            .as_ref()
            .ok_or_else(|| MlpError::parameter("input_file", "no dataset file configured"))?;
        let mut parser = FileParser::new(path, self.line_parser()).with_training_ratio(ratio, line_override);
        parser.open()?;
        Ok(parser)
    }

    // -----------------------------------------------------------------------
    // Modes
    // -----------------------------------------------------------------------

    /// Validates the parameters, prepares the network if needed and runs the
    /// configured mode. Predictions go to stdout.
    pub fn run(&mut self) -> Result<RunSummary> {
        self.params.validate()?;
        if !self.is_initialized() {
            self.prepare()?;
        }
        log::info!("running {:?}", self.params.mode);

        let summary = match self.params.mode {
            Mode::Predict => {
                let stdout = io::stdout();
                let mut out = stdout.lock();
                let predictions = match self.params.input_file.clone() {
                    Some(path) => {
                        let file = File::open(&path).map_err(|source| MlpError::FileOpen { path, source })?;
                        self.predict(BufReader::new(file), &mut out)?
                    }
                    None => self.predict(io::stdin().lock(), &mut out)?,
                };
                RunSummary { predictions, ..Default::default() }
            }
            Mode::TestOnly => {
                let mut parser = self.file_parser(self.params.training_ratio, Some(0))?;
                let mut report = TestReport::new(None);
                let tested = test_file_pass(self.network_mut(), &mut parser, 1, &mut report);
                parser.close();
                tested?;
                RunSummary { stat: Some(report.stat()), ..Default::default() }
            }
            Mode::TrainOnly => self.train(TrainConfig::new(self.params.num_epochs), 1.0)?,
            Mode::TrainThenTest => {
                self.train(TrainConfig::then_test(self.params.num_epochs), self.params.training_ratio)?
            }
            Mode::TrainTestMonitored => self.train(
                TrainConfig::monitored(self.params.num_epochs, self.params.output_index_to_monitor),
                self.params.training_ratio,
            )?,
        };

        if self.params.mode.trains() {
            if let Some(path) = self.params.export_model.clone() {
                self.export_network(path)?;
            }
        }
        Ok(summary)
    }

    fn train(&mut self, config: TrainConfig, ratio: f32) -> Result<RunSummary> {
        let mut parser = self.file_parser(ratio, self.params.training_ratio_line)?;
        log::info!(
            "training on lines 1..={} of {}",
            parser.training_ratio_line()?,
            parser.path().display()
        );
        let outcome = train_loop(self.network_mut(), &mut parser, &config);
        parser.close();
        let outcome = outcome?;
        Ok(RunSummary {
            stat: outcome.report.map(|r| r.stat()),
            epochs: outcome.epochs,
            predictions: 0,
        })
    }

    /// Predicts every record of `reader`, writing one formatted line per record.
    pub fn predict<R: BufRead, W: Write>(&mut self, reader: R, writer: &mut W) -> Result<usize> {
        let parser = LineParser::new(self.network().input_size(), self.network().output_size(), self.params.column_layout)
            .predict_mode(true);
        let format = self.params.predict_output_format;
        let mut source = StreamParser::new(reader, parser);
        let mut count = 0;
        while let Some(record) = source.next_record()? {
            let outputs = self.network_mut().predict(&record.inputs);
            writeln!(writer, "{}", format.format(&record.inputs, &outputs))?;
            count += 1;
        }
        log::debug!("predicted {} records", count);
        Ok(count)
    }

    // -----------------------------------------------------------------------
    // Line-oriented requests
    // -----------------------------------------------------------------------

    /// Predicts each line of `text`; returns the formatted outputs.
    pub fn predict_lines(&mut self, text: &str) -> Result<String> {
        let mut out = Vec::new();
        self.predict(Cursor::new(text.trim_end()), &mut out)?;
        Ok(String::from_utf8_lossy(&out).into_owned())
    }

    /// One online update per line of `text`.
    pub fn train_lines(&mut self, text: &str) -> Result<PassLoss> {
        let parser = self.training_parser();
        let mut source = StreamParser::new(Cursor::new(text.trim_end()), parser);
        train_one_epoch_pass(self.network_mut(), &mut source, None)
    }

    /// Tests every line of `text` without updating the network.
    pub fn test_lines(&mut self, text: &str) -> Result<Stat> {
        let parser = self.training_parser();
        let mut source = StreamParser::new(Cursor::new(text.trim_end()), parser);
        test_records(self.network_mut(), &mut source)
    }

    fn training_parser(&self) -> LineParser {
        let net = self.network();
        LineParser::new(net.input_size(), net.output_size(), self.params.column_layout)
    }
}
