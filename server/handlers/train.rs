use serde_json::json;
use tiny_http::Request;

use crate::routes::{busy, error_response, json_response, read_body, HttpResponse};
use crate::state::SharedState;

/// `POST /train`
///
/// Body: one CSV record per line, inputs and expected outputs. Each line is
/// one online update of the served network.
pub fn handle(request: &mut Request, state: &SharedState) -> HttpResponse {
    let body = match read_body(request) {
        Ok(body) => body,
        Err(resp) => return resp,
    };
    let Some(mut session) = state.lock_session() else { return busy() };
    match session.train_lines(&body) {
        Ok(loss) => json_response(&json!({
            "samples": loss.samples,
            "mean_loss": loss.mean(),
        })),
        Err(e) => error_response(&e),
    }
}
