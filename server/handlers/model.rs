use serde_json::json;

use crate::routes::{busy, error_response, json_response, text_response, HttpResponse};
use crate::state::SharedState;

/// `GET /model`
///
/// Topology, hyperparameters and optimizer step of the served network.
pub fn handle_get(state: &SharedState) -> HttpResponse {
    let Some(session) = state.lock_session() else { return busy() };
    let network = session.network();
    let layers: Vec<_> = network
        .layers()
        .iter()
        .map(|l| json!({ "type": l.type_name(), "neurons": l.size() }))
        .collect();
    json_response(&json!({
        "parameters": network.parameters(),
        "layers": layers,
        "optimizer": network.optimizer().kind(),
        "time_step": network.optimizer().time_step(),
    }))
}

/// `POST /export`
///
/// Writes the model to the configured export path.
pub fn handle_export(state: &SharedState) -> HttpResponse {
    let Some(session) = state.lock_session() else { return busy() };
    let Some(path) = session.params().export_model.clone() else {
        return text_response(400, "no export path configured\n");
    };
    match session.export_network(&path) {
        Ok(()) => text_response(200, format!("exported to {}\n", path.display())),
        Err(e) => error_response(&e),
    }
}
