use tiny_http::Request;

use crate::routes::{busy, error_response, read_body, text_response, HttpResponse};
use crate::state::SharedState;

/// `POST /predict`
///
/// Body: one CSV record per line. Answers one formatted output line per record.
pub fn handle(request: &mut Request, state: &SharedState) -> HttpResponse {
    let body = match read_body(request) {
        Ok(body) => body,
        Err(resp) => return resp,
    };
    let Some(mut session) = state.lock_session() else { return busy() };
    match session.predict_lines(&body) {
        Ok(out) => text_response(200, out),
        Err(e) => error_response(&e),
    }
}
