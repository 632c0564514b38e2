//! End-to-end checks through the public API: file-backed training and
//! testing, model files, and the session modes.

use std::fs;
use std::io::Write;

use approx::assert_abs_diff_eq;
use ferrite_mlp::{
    ActivationFunction, AppParameters, ColumnLayout, FileParser, LayerKind, LineParser, MlpError, Mode,
    Network, NetworkParameters, OptimizerKind, Session, TrainConfig,
};
use tempfile::{NamedTempFile, TempDir};

fn xor_dataset(repeats: usize) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    for _ in 0..repeats {
        for (a, b) in [(0, 0), (0, 1), (1, 0), (1, 1)] {
            writeln!(file, "{},{},{}", a, b, a ^ b).unwrap();
        }
    }
    file
}

fn xor_params() -> NetworkParameters {
    NetworkParameters {
        input_size: 2,
        hidden_size: 6,
        output_size: 1,
        hiddens_count: 1,
        learning_rate: 0.5,
        hidden_activation_function: ActivationFunction::Tanh,
        ..Default::default()
    }
}

#[test]
fn ratio_splits_ten_lines_six_and_four() {
    let data = xor_dataset(3);
    let lines: Vec<String> = fs::read_to_string(data.path()).unwrap().lines().take(10).map(String::from).collect();
    fs::write(data.path(), lines.join("\n") + "\n").unwrap();

    let mut net = Network::build(xor_params(), OptimizerKind::Sgd).unwrap();
    let mut parser = FileParser::new(data.path(), LineParser::new(2, 1, ColumnLayout::InputFirst))
        .with_training_ratio(0.6, None);
    parser.open().unwrap();
    assert_eq!(parser.total_lines().unwrap(), 10);
    assert_eq!(parser.training_ratio_line().unwrap(), 6);

    let outcome = ferrite_mlp::train_loop(&mut net, &mut parser, &TrainConfig::then_test(1)).unwrap();
    assert_eq!(outcome.epochs[0].samples, 6);
    assert_eq!(outcome.report.unwrap().stat().total_samples, 4);
}

#[test]
fn wrong_column_count_names_the_line() {
    let mut file = NamedTempFile::new().unwrap();
    let full: Vec<String> = (0..21).map(|i| (i % 2).to_string()).collect();
    writeln!(file, "{}", full.join(",")).unwrap();
    writeln!(file, "{}", full.join(",")).unwrap();
    writeln!(file, "{}", full[..20].join(",")).unwrap();

    let params = NetworkParameters { input_size: 20, output_size: 1, ..Default::default() };
    let mut net = Network::build(params, OptimizerKind::Sgd).unwrap();
    let mut parser = FileParser::new(file.path(), LineParser::new(20, 1, ColumnLayout::InputFirst))
        .with_training_ratio(1.0, None);
    parser.open().unwrap();

    let err = ferrite_mlp::train_loop(&mut net, &mut parser, &TrainConfig::new(1)).unwrap_err();
    assert!(matches!(err, MlpError::CsvParsingErrorColumnsSize { line: 3, found: 20, expected: 21 }));
    assert!(err.to_string().contains("found 20 columns instead of 21"));
}

#[test]
fn model_round_trip_keeps_weights_and_predictions() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("xor.json");
    let data = xor_dataset(4);

    let mut session = Session::new(AppParameters {
        mode: Mode::TrainOnly,
        input_file: Some(data.path().to_path_buf()),
        export_model: Some(path.clone()),
        num_epochs: 5,
        network: xor_params(),
        ..Default::default()
    });
    session.run().unwrap();

    let mut loaded = Network::import_model(&path, OptimizerKind::Sgd).unwrap();
    let original = session.network_mut();
    assert_eq!(loaded.parameters(), original.parameters());
    for (a, b) in loaded.layers().iter().zip(original.layers()) {
        assert_eq!(a.type_name(), b.type_name());
        for (na, nb) in a.neurons.iter().zip(&b.neurons) {
            assert_eq!(na.weights, nb.weights);
            assert_eq!(na.bias, nb.bias);
        }
    }
    for x in [[0.0, 0.0], [0.0, 1.0], [1.0, 0.0], [1.0, 1.0]] {
        assert_eq!(loaded.forward(&x), original.forward(&x));
    }
}

#[test]
fn imported_network_keeps_layer_order() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("m.json");
    let params = NetworkParameters { hiddens_count: 3, ..xor_params() };
    Network::build(params, OptimizerKind::Sgd).unwrap().export_model(&path).unwrap();

    let net = Network::import_model(&path, OptimizerKind::Adam).unwrap();
    let layers = net.layers();
    assert_eq!(layers.len(), 5);
    assert_eq!(layers[0].kind(), &LayerKind::Input);
    assert!(matches!(layers[4].kind(), LayerKind::Output { .. }));
    assert!(layers[1..4].iter().all(|l| matches!(l.kind(), LayerKind::Hidden { .. })));
    for w in layers.windows(2) {
        assert!(w[1].neurons.iter().all(|n| n.weights.len() == w[0].size()));
    }
    assert_eq!(net.optimizer().time_step(), Some(0));
}

#[test]
fn xor_learns_with_adam() {
    let data = xor_dataset(50);
    let mut session = Session::new(AppParameters {
        mode: Mode::TrainOnly,
        input_file: Some(data.path().to_path_buf()),
        num_epochs: 40,
        optimizer: OptimizerKind::Adam,
        network: NetworkParameters { learning_rate: 0.01, ..xor_params() },
        ..Default::default()
    });
    let summary = session.run().unwrap();
    let first = summary.epochs.first().unwrap().train_loss;
    let last = summary.epochs.last().unwrap().train_loss;
    assert!(last < first, "loss went from {first} to {last}");
    assert_eq!(session.network().optimizer().time_step(), Some(40 * 200));
}

#[test]
fn output_first_layout_reads_targets_first() {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(file, "1,0,1").unwrap();
    writeln!(file, "0,1,1").unwrap();
    let mut session = Session::new(AppParameters {
        mode: Mode::TrainOnly,
        input_file: Some(file.path().to_path_buf()),
        column_layout: ColumnLayout::OutputFirst,
        num_epochs: 1,
        network: xor_params(),
        ..Default::default()
    });
    let summary = session.run().unwrap();
    assert_eq!(summary.epochs[0].samples, 2);

    let stat = session.test_lines("1,0,1\n").unwrap();
    assert_eq!(stat.total_samples, 1);
    assert_abs_diff_eq!(
        stat.mean_squared_error,
        {
            let out = session.network_mut().forward(&[0.0, 1.0])[0];
            (1.0 - out) * (1.0 - out)
        },
        epsilon = 1e-6
    );
}

#[test]
fn test_only_needs_a_model() {
    let data = xor_dataset(1);
    let mut session = Session::new(AppParameters {
        mode: Mode::TestOnly,
        input_file: Some(data.path().to_path_buf()),
        network: xor_params(),
        ..Default::default()
    });
    assert!(matches!(session.run(), Err(MlpError::InvalidParameter { .. })));
    assert!(!session.is_initialized());
}
