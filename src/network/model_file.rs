//! Model files: a JSON document with the version, hyperparameters and layer
//! list, plus a companion CSV (same stem, `.csv`) with one row of weights per
//! neuron.
//!
//! Weights CSV layout:
//!
//! ```text
//! Layer,Neuron,Weight1,...,WeightN,Bias
//! 0,0,,,...,
//! 1,0,0.12,-0.4,...,0.05
//! ```
//!
//! `N` is the largest weight count of any neuron; shorter rows are padded
//! with empty cells. Files without the `Bias` column load with zero biases.

use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use serde::{Serialize, Deserialize};

use crate::activation::{Activation, ActivationFunction};
use crate::error::{MlpError, Result};
use crate::layers::{Layer, LayerKind, Neuron};
use crate::network::network::Network;
use crate::network::params::NetworkParameters;
use crate::optim::OptimizerKind;

pub const INPUT_LAYER: &str = "InputLayer";
pub const HIDDEN_LAYER: &str = "HiddenLayer";
pub const OUTPUT_LAYER: &str = "OutputLayer";

/// Version written into exported models.
pub const MODEL_VERSION: &str = env!("CARGO_PKG_VERSION");

// ---------------------------------------------------------------------------
// On-disk types
// ---------------------------------------------------------------------------

/// An activation as stored on disk: its name, or a numeric code from older files.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
enum StoredActivation {
    Name(String),
    Code(u64),
}

impl StoredActivation {
    fn resolve(&self) -> Result<ActivationFunction> {
        match self {
            StoredActivation::Name(name) => name.parse(),
            StoredActivation::Code(code) => code.to_string().parse(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct StoredParameters {
    input_size: usize,
    hidden_size: usize,
    output_size: usize,
    hiddens_count: usize,
    learning_rate: f32,
    hidden_activation_function: StoredActivation,
    hidden_activation_alpha: f32,
    output_activation_function: StoredActivation,
    output_activation_alpha: f32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct StoredLayer {
    #[serde(rename = "type")]
    layer_type: String,
    neurons: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct ModelFile {
    version: String,
    parameters: StoredParameters,
    layers: Vec<StoredLayer>,
}

impl From<&NetworkParameters> for StoredParameters {
    fn from(p: &NetworkParameters) -> Self {
        StoredParameters {
            input_size: p.input_size,
            hidden_size: p.hidden_size,
            output_size: p.output_size,
            hiddens_count: p.hiddens_count,
            learning_rate: p.learning_rate,
            hidden_activation_function: StoredActivation::Name(p.hidden_activation_function.name().to_owned()),
            hidden_activation_alpha: p.hidden_activation_alpha,
            output_activation_function: StoredActivation::Name(p.output_activation_function.name().to_owned()),
            output_activation_alpha: p.output_activation_alpha,
        }
    }
}

impl StoredParameters {
    fn into_parameters(self) -> Result<NetworkParameters> {
        Ok(NetworkParameters {
            input_size: self.input_size,
            hidden_size: self.hidden_size,
            output_size: self.output_size,
            hiddens_count: self.hiddens_count,
            learning_rate: self.learning_rate,
            hidden_activation_function: self.hidden_activation_function.resolve()?,
            hidden_activation_alpha: self.hidden_activation_alpha,
            output_activation_function: self.output_activation_function.resolve()?,
            output_activation_alpha: self.output_activation_alpha,
        })
    }
}

/// Path of the weights CSV that accompanies `json_path`.
pub fn weights_path(json_path: &Path) -> PathBuf {
    json_path.with_extension("csv")
}

// ---------------------------------------------------------------------------
// Export
// ---------------------------------------------------------------------------

/// Writes `network` to `path` (JSON) and its companion weights CSV.
pub fn export(network: &Network, path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        if !dir.is_dir() {
            return Err(MlpError::InvalidDirectory(dir.to_path_buf()));
        }
    }

    let model = ModelFile {
        version: MODEL_VERSION.to_owned(),
        parameters: network.parameters().into(),
        layers: network
            .layers()
            .iter()
            .map(|l| StoredLayer { layer_type: l.type_name().to_owned(), neurons: l.size() })
            .collect(),
    };
    let file = File::create(path).map_err(|source| MlpError::FileOpen { path: path.to_path_buf(), source })?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, &model)?;
    writer.flush()?;

    let csv_path = weights_path(path);
    export_weights(network, &csv_path)?;

    log::info!("exported model to {} and {}", path.display(), csv_path.display());
    Ok(())
}

fn export_weights(network: &Network, path: &Path) -> Result<()> {
    let max_weights = network
        .layers()
        .iter()
        .flat_map(|l| l.neurons.iter().map(|n| n.weights.len()))
        .max()
        .unwrap_or(0);

    let file = File::create(path).map_err(|source| MlpError::FileOpen { path: path.to_path_buf(), source })?;
    let mut writer = csv::Writer::from_writer(BufWriter::new(file));

    let mut header = vec!["Layer".to_owned(), "Neuron".to_owned()];
    header.extend((1..=max_weights).map(|i| format!("Weight{i}")));
    header.push("Bias".to_owned());
    writer.write_record(&header)?;

    for (l, layer) in network.layers().iter().enumerate() {
        for (n, neuron) in layer.neurons.iter().enumerate() {
            let mut row = Vec::with_capacity(header.len());
            row.push(l.to_string());
            row.push(n.to_string());
            row.extend(neuron.weights.iter().map(|w| w.to_string()));
            row.resize(2 + max_weights, String::new());
            row.push(if layer.is_input() { String::new() } else { neuron.bias.to_string() });
            writer.write_record(&row)?;
        }
    }
    writer.flush()?;
    Ok(())
}

// ---------------------------------------------------------------------------
// Import
// ---------------------------------------------------------------------------

/// Loads a network from `path` (JSON) and its companion weights CSV.
///
/// Structural errors abort the load; no partially-built network is returned.
/// A version different from the running binary's is only a warning.
pub fn import(path: impl AsRef<Path>, optimizer: OptimizerKind) -> Result<Network> {
    let path = path.as_ref();
    let model = read_model_file(path)?;
    check_version(&model.version)?;

    let kinds = check_layer_types(&model.layers)?;
    let params = model.parameters.into_parameters()?;
    params.validate()?;
    check_topology(&params, &model.layers)?;

    let csv_path = weights_path(path);
    if !csv_path.exists() {
        return Err(MlpError::FileNotFound(csv_path));
    }
    let sizes: Vec<usize> = model.layers.iter().map(|l| l.neurons).collect();
    let neurons = read_weights(&csv_path, &sizes)?;

    let hidden = params.hidden_activation();
    let output = params.output_activation();
    let layers = kinds
        .into_iter()
        .zip(neurons)
        .map(|(kind, neurons)| Layer::from_neurons(layer_kind(kind, hidden, output), neurons))
        .collect();

    let network = Network::from_layers(params, layers, optimizer)?;
    log::info!("imported model from {}", path.display());
    Ok(network)
}

fn read_model_file(path: &Path) -> Result<ModelFile> {
    if !path.exists() {
        return Err(MlpError::FileNotFound(path.to_path_buf()));
    }
    let file = File::open(path).map_err(|source| MlpError::FileOpen { path: path.to_path_buf(), source })?;
    Ok(serde_json::from_reader(BufReader::new(file))?)
}

fn check_version(version: &str) -> Result<()> {
    let valid = !version.is_empty()
        && version.split('.').count() <= 3
        && version.split('.').all(|part| !part.is_empty() && part.chars().all(|c| c.is_ascii_digit()));
    if !valid {
        return Err(MlpError::InvalidJsonVersion(version.to_owned()));
    }
    if version != MODEL_VERSION {
        log::warn!(
            "Model version {} differs from current version {}",
            version,
            MODEL_VERSION
        );
    }
    Ok(())
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum StoredKind {
    Input,
    Hidden,
    Output,
}

fn layer_kind(kind: StoredKind, hidden: Activation, output: Activation) -> LayerKind {
    match kind {
        StoredKind::Input => LayerKind::Input,
        StoredKind::Hidden => LayerKind::Hidden { activation: hidden },
        StoredKind::Output => LayerKind::Output { activation: output, target_outputs: Vec::new() },
    }
}

fn check_layer_types(layers: &[StoredLayer]) -> Result<Vec<StoredKind>> {
    let kinds = layers
        .iter()
        .map(|l| match l.layer_type.as_str() {
            INPUT_LAYER => Ok(StoredKind::Input),
            HIDDEN_LAYER => Ok(StoredKind::Hidden),
            OUTPUT_LAYER => Ok(StoredKind::Output),
            other => Err(MlpError::UnimplementedLayerType(other.to_owned())),
        })
        .collect::<Result<Vec<_>>>()?;

    if layers.len() < 3 {
        return Err(MlpError::InvalidModelTopology(format!(
            "expected at least 3 layers, found {}",
            layers.len()
        )));
    }
    if kinds[0] != StoredKind::Input {
        return Err(MlpError::InvalidFirstLayerType(layers[0].layer_type.clone()));
    }
    let last = layers.len() - 1;
    if kinds[last] != StoredKind::Output {
        return Err(MlpError::InvalidLastLayerType(layers[last].layer_type.clone()));
    }
    for index in 1..last {
        if kinds[index] != StoredKind::Hidden {
            return Err(MlpError::InvalidHiddenLayerType {
                index,
                found: layers[index].layer_type.clone(),
            });
        }
    }
    Ok(kinds)
}

fn check_topology(params: &NetworkParameters, layers: &[StoredLayer]) -> Result<()> {
    let hidden_layers = &layers[1..layers.len() - 1];
    let mismatch = |what: &str, found: usize, expected: usize| {
        MlpError::InvalidModelTopology(format!("{what}: layers list says {found}, parameters say {expected}"))
    };
    if layers[0].neurons != params.input_size {
        return Err(mismatch("input size", layers[0].neurons, params.input_size));
    }
    if layers[layers.len() - 1].neurons != params.output_size {
        return Err(mismatch("output size", layers[layers.len() - 1].neurons, params.output_size));
    }
    if hidden_layers.len() != params.hiddens_count {
        return Err(mismatch("hidden layer count", hidden_layers.len(), params.hiddens_count));
    }
    if let Some(l) = hidden_layers.iter().find(|l| l.neurons != params.hidden_size) {
        return Err(mismatch("hidden size", l.neurons, params.hidden_size));
    }
    Ok(())
}

/// Reads the weights CSV into one neuron list per layer.
fn read_weights(path: &Path, sizes: &[usize]) -> Result<Vec<Vec<Neuron>>> {
    let file = File::open(path).map_err(|source| MlpError::FileOpen { path: path.to_path_buf(), source })?;
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(BufReader::new(file));

    let headers = reader.headers()?.clone();
    let weight_columns: Vec<usize> = headers
        .iter()
        .enumerate()
        .filter(|(_, h)| h.trim().starts_with("Weight"))
        .map(|(i, _)| i)
        .collect();
    let bias_column = headers.iter().position(|h| h.trim() == "Bias");

    let mut grid: Vec<Vec<Option<Neuron>>> = sizes.iter().map(|&n| vec![None; n]).collect();

    for row in reader.records() {
        let row = row?;
        let layer = parse_index(row.get(0), "layer")?;
        let neuron = parse_index(row.get(1), "neuron")?;
        let invalid = |reason: String| MlpError::InvalidModelWeights { layer, neuron, reason };

        if layer >= sizes.len() || neuron >= sizes[layer] {
            return Err(invalid("no such neuron in the model".into()));
        }

        // Weight j lives in the j-th weight column; the columns after the
        // neuron's fan-in must be empty.
        let expected = if layer == 0 { 0 } else { sizes[layer - 1] };
        if weight_columns.len() < expected {
            return Err(invalid(format!(
                "{} weight columns for {} weights",
                weight_columns.len(),
                expected
            )));
        }
        let cell = |c: usize| row.get(c).map(str::trim).unwrap_or("");
        let weights = weight_columns[..expected]
            .iter()
            .enumerate()
            .map(|(j, &c)| match cell(c) {
                "" => Err(invalid(format!("Weight{} is empty", j + 1))),
                text => text.parse::<f32>().map_err(|_| invalid(format!("'{text}' is not a valid weight"))),
            })
            .collect::<Result<Vec<f32>>>()?;
        if let Some(j) = weight_columns[expected..].iter().position(|&c| !cell(c).is_empty()) {
            return Err(invalid(format!(
                "Weight{} is set but the neuron has {} weights",
                expected + j + 1,
                expected
            )));
        }

        let bias = match bias_column.and_then(|c| row.get(c)).map(str::trim) {
            Some(cell) if !cell.is_empty() => cell
                .parse::<f32>()
                .map_err(|_| invalid(format!("'{cell}' is not a valid bias")))?,
            _ => 0.0,
        };

        grid[layer][neuron] = Some(if layer == 0 { Neuron::input() } else { Neuron::with_weights(weights, bias) });
    }

    grid.into_iter()
        .enumerate()
        .map(|(layer, neurons)| {
            neurons
                .into_iter()
                .enumerate()
                .map(|(neuron, n)| {
                    n.ok_or_else(|| MlpError::InvalidModelWeights {
                        layer,
                        neuron,
                        reason: "missing row in weights file".into(),
                    })
                })
                .collect()
        })
        .collect()
}

fn parse_index(cell: Option<&str>, what: &str) -> Result<usize> {
    let cell = cell.unwrap_or("").trim();
    cell.parse::<usize>().map_err(|_| MlpError::InvalidModelTopology(format!(
        "weights file: '{cell}' is not a valid {what} index"
    )))
}

impl Network {
    /// See [`export`].
    pub fn export_model(&self, path: impl AsRef<Path>) -> Result<()> {
        export(self, path)
    }

    /// See [`import`].
    pub fn import_model(path: impl AsRef<Path>, optimizer: OptimizerKind) -> Result<Network> {
        import(path, optimizer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn network() -> Network {
        let params = NetworkParameters {
            input_size: 3,
            hidden_size: 4,
            output_size: 2,
            hiddens_count: 2,
            learning_rate: 0.05,
            hidden_activation_function: ActivationFunction::ELU,
            hidden_activation_alpha: 0.1,
            output_activation_function: ActivationFunction::Sigmoid,
            output_activation_alpha: 0.01,
        };
        Network::build(params, OptimizerKind::Sgd).unwrap()
    }

    #[test]
    fn round_trip_preserves_everything() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("model.json");
        let mut original = network();
        original.export_model(&path).unwrap();
        assert!(dir.path().join("model.csv").exists());

        let mut loaded = Network::import_model(&path, OptimizerKind::Sgd).unwrap();
        assert_eq!(loaded.parameters(), original.parameters());
        assert_eq!(loaded.layers().len(), original.layers().len());
        for (a, b) in loaded.layers().iter().zip(original.layers()) {
            assert_eq!(a.kind(), b.kind());
            assert_eq!(a.size(), b.size());
            for (na, nb) in a.neurons.iter().zip(&b.neurons) {
                assert_eq!(na.weights, nb.weights);
                assert_eq!(na.bias, nb.bias);
            }
        }
        let x = [0.1, -0.5, 0.9];
        assert_eq!(loaded.forward(&x), original.forward(&x));
    }

    #[test]
    fn weights_header_and_padding() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("m.json");
        network().export_model(&path).unwrap();
        let csv = fs::read_to_string(dir.path().join("m.csv")).unwrap();
        let mut lines = csv.lines();
        assert_eq!(lines.next().unwrap(), "Layer,Neuron,Weight1,Weight2,Weight3,Weight4,Bias");
        assert_eq!(lines.next().unwrap(), "0,0,,,,,");
        // 3 input + 4 + 4 hidden + 2 output neurons
        assert_eq!(csv.lines().count(), 1 + 3 + 4 + 4 + 2);
    }

    #[test]
    fn json_layout() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("m.json");
        network().export_model(&path).unwrap();
        let json: serde_json::Value = serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(json["version"], MODEL_VERSION);
        assert_eq!(json["parameters"]["hiddens_count"], 2);
        assert_eq!(json["parameters"]["hidden_activation_function"], "ELU");
        assert_eq!(json["layers"][0]["type"], "InputLayer");
        assert_eq!(json["layers"][3]["type"], "OutputLayer");
        assert_eq!(json["layers"][3]["neurons"], 2);
    }

    fn rewrite_json(path: &Path, edit: impl FnOnce(&mut serde_json::Value)) {
        let mut json: serde_json::Value = serde_json::from_str(&fs::read_to_string(path).unwrap()).unwrap();
        edit(&mut json);
        fs::write(path, serde_json::to_string(&json).unwrap()).unwrap();
    }

    #[test]
    fn structural_errors_abort_import() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("m.json");
        network().export_model(&path).unwrap();

        rewrite_json(&path, |j| j["layers"][0]["type"] = "HiddenLayer".into());
        assert!(matches!(
            import(&path, OptimizerKind::Sgd),
            Err(MlpError::InvalidFirstLayerType(t)) if t == "HiddenLayer"
        ));

        rewrite_json(&path, |j| {
            j["layers"][0]["type"] = "InputLayer".into();
            j["layers"][3]["type"] = "HiddenLayer".into();
        });
        assert!(matches!(import(&path, OptimizerKind::Sgd), Err(MlpError::InvalidLastLayerType(_))));

        rewrite_json(&path, |j| j["layers"][3]["type"] = "ConvLayer".into());
        assert!(matches!(import(&path, OptimizerKind::Sgd), Err(MlpError::UnimplementedLayerType(_))));
    }

    #[test]
    fn unknown_activation_fails_at_import() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("m.json");
        network().export_model(&path).unwrap();
        rewrite_json(&path, |j| j["parameters"]["output_activation_function"] = "Softmax".into());
        assert!(matches!(
            import(&path, OptimizerKind::Sgd),
            Err(MlpError::UnimplementedActivationFunction(_))
        ));
        rewrite_json(&path, |j| j["parameters"]["output_activation_function"] = 1.into());
        let net = import(&path, OptimizerKind::Sgd).unwrap();
        assert_eq!(net.parameters().output_activation_function, ActivationFunction::Tanh);
    }

    #[test]
    fn version_mismatch_is_not_fatal() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("m.json");
        network().export_model(&path).unwrap();
        rewrite_json(&path, |j| j["version"] = "0.0.1".into());
        assert!(import(&path, OptimizerKind::Sgd).is_ok());
        rewrite_json(&path, |j| j["version"] = "latest".into());
        assert!(matches!(import(&path, OptimizerKind::Sgd), Err(MlpError::InvalidJsonVersion(_))));
    }

    #[test]
    fn short_weight_row_is_rejected() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("m.json");
        network().export_model(&path).unwrap();
        let csv_path = dir.path().join("m.csv");
        let csv = fs::read_to_string(&csv_path).unwrap();
        let broken: Vec<String> = csv
            .lines()
            .map(|l| if l.starts_with("1,0,") { "1,0,0.5,,,,0.1".to_owned() } else { l.to_owned() })
            .collect();
        fs::write(&csv_path, broken.join("\n")).unwrap();
        assert!(matches!(
            import(&path, OptimizerKind::Sgd),
            Err(MlpError::InvalidModelWeights { layer: 1, neuron: 0, .. })
        ));
    }

    #[test]
    fn weights_are_read_by_column_position() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("m.json");
        network().export_model(&path).unwrap();
        let csv_path = dir.path().join("m.csv");
        let original = fs::read_to_string(&csv_path).unwrap();
        let replace_row = |prefix: &str, row: &str| {
            let lines: Vec<String> = original
                .lines()
                .map(|l| if l.starts_with(prefix) { row.to_owned() } else { l.to_owned() })
                .collect();
            fs::write(&csv_path, lines.join("\n")).unwrap();
        };

        // Hole at Weight2 of a 3-weight neuron, extra value at Weight4.
        replace_row("1,0,", "1,0,0.5,,0.7,0.9,0.1");
        assert!(matches!(
            import(&path, OptimizerKind::Sgd),
            Err(MlpError::InvalidModelWeights { layer: 1, neuron: 0, reason }) if reason.contains("Weight2")
        ));

        // Values past the neuron's fan-in.
        replace_row("1,0,", "1,0,0.5,0.6,0.7,0.9,0.1");
        assert!(matches!(
            import(&path, OptimizerKind::Sgd),
            Err(MlpError::InvalidModelWeights { layer: 1, neuron: 0, reason }) if reason.contains("Weight4")
        ));

        replace_row("1,0,", "1,0,0.5,0.6,0.7,,0.1");
        let net = import(&path, OptimizerKind::Sgd).unwrap();
        assert_eq!(net.layers()[1].neurons[0].weights, vec![0.5, 0.6, 0.7]);
        assert_eq!(net.layers()[1].neurons[0].bias, 0.1);
    }

    #[test]
    fn export_writes_complete_json() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("m.json");
        let net = network();
        export(&net, &path).unwrap();
        let text = fs::read_to_string(&path).unwrap();
        assert!(text.trim_end().ends_with('}'));
        let json: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(json["layers"].as_array().unwrap().len(), net.layers().len());
    }

    #[test]
    fn missing_files_and_directories() {
        let dir = TempDir::new().unwrap();
        assert!(matches!(
            import(dir.path().join("none.json"), OptimizerKind::Sgd),
            Err(MlpError::FileNotFound(_))
        ));
        assert!(matches!(
            export(&network(), dir.path().join("no/such/dir/m.json")),
            Err(MlpError::InvalidDirectory(_))
        ));
    }
}
