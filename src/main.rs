use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use env_logger::Env;

use ferrite_mlp::{
    ActivationFunction, AppParameters, ColumnLayout, Mode, OptimizerKind, PredictOutputFormat, Session,
};

/// Train, test and run a multilayer perceptron on CSV datasets.
///
/// Flags override the values of the `--config` JSON file.
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// JSON parameters file
    #[arg(short, long)]
    config: Option<PathBuf>,

    #[arg(short, long, value_enum)]
    mode: Option<Mode>,

    /// Dataset CSV (predict reads stdin when absent)
    #[arg(short, long)]
    input: Option<PathBuf>,

    /// Model JSON to load
    #[arg(long)]
    import_model: Option<PathBuf>,

    /// Model JSON to write after training
    #[arg(long)]
    export_model: Option<PathBuf>,

    #[arg(short, long)]
    epochs: Option<usize>,

    /// Share of the dataset used for training, in (0, 1]
    #[arg(long)]
    training_ratio: Option<f32>,

    /// First testing line, overriding --training-ratio
    #[arg(long)]
    training_ratio_line: Option<usize>,

    #[arg(long, value_enum)]
    column_layout: Option<ColumnLayout>,

    /// Output tracked per epoch in train-test-monitored mode
    #[arg(long)]
    monitor: Option<usize>,

    #[arg(long, value_enum)]
    output_format: Option<PredictOutputFormat>,

    #[arg(long, value_enum)]
    optimizer: Option<OptimizerKind>,

    #[arg(long)]
    input_size: Option<usize>,

    #[arg(long)]
    hidden_size: Option<usize>,

    #[arg(long)]
    output_size: Option<usize>,

    /// Number of hidden layers
    #[arg(long)]
    hiddens_count: Option<usize>,

    #[arg(long)]
    learning_rate: Option<f32>,

    /// Sigmoid, Tanh, ReLU, LeakyReLU, PReLU or ELU
    #[arg(long)]
    hidden_activation: Option<ActivationFunction>,

    #[arg(long)]
    hidden_alpha: Option<f32>,

    #[arg(long)]
    output_activation: Option<ActivationFunction>,

    #[arg(long)]
    output_alpha: Option<f32>,

    /// Debug logging
    #[arg(short, long)]
    verbose: bool,
}

impl Args {
    fn into_parameters(self) -> ferrite_mlp::Result<AppParameters> {
        let mut p = match &self.config {
            Some(path) => AppParameters::load_json(path)?,
            None => AppParameters::default(),
        };
        macro_rules! set {
            ($($field:expr => $value:expr),* $(,)?) => {
                $(if let Some(v) = $value { $field = v; })*
            };
        }
        set! {
            p.mode => self.mode,
            p.num_epochs => self.epochs,
            p.training_ratio => self.training_ratio,
            p.column_layout => self.column_layout,
            p.output_index_to_monitor => self.monitor,
            p.predict_output_format => self.output_format,
            p.optimizer => self.optimizer,
            p.network.input_size => self.input_size,
            p.network.hidden_size => self.hidden_size,
            p.network.output_size => self.output_size,
            p.network.hiddens_count => self.hiddens_count,
            p.network.learning_rate => self.learning_rate,
            p.network.hidden_activation_function => self.hidden_activation,
            p.network.hidden_activation_alpha => self.hidden_alpha,
            p.network.output_activation_function => self.output_activation,
            p.network.output_activation_alpha => self.output_alpha,
        }
        if self.input.is_some() {
            p.input_file = self.input;
        }
        if self.import_model.is_some() {
            p.import_model = self.import_model;
        }
        if self.export_model.is_some() {
            p.export_model = self.export_model;
        }
        if self.training_ratio_line.is_some() {
            p.training_ratio_line = self.training_ratio_line;
        }
        p.verbose |= self.verbose;
        Ok(p)
    }
}

fn main() -> ExitCode {
    let args = Args::parse();
    let verbose = args.verbose;

    let params = match args.into_parameters() {
        Ok(p) => p,
        Err(e) => {
            eprintln!("error: {e}");
            return ExitCode::FAILURE;
        }
    };

    let level = if verbose || params.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(Env::default().default_filter_or(level)).init();

    let mut session = Session::new(params);
    match session.run() {
        Ok(summary) => {
            if let Some(last) = summary.epochs.last() {
                println!("trained {} epochs, final loss {:.6}", last.epoch, last.train_loss);
            }
            if let Some(stat) = summary.stat {
                println!("{stat}");
            }
            ExitCode::SUCCESS
        }
        Err(e) => {
            log::error!("{:?} error: {}", e.kind(), e);
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}
