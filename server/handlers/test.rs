use tiny_http::Request;

use crate::routes::{busy, error_response, json_response, read_body, HttpResponse};
use crate::state::SharedState;

/// `POST /test`
///
/// Body: one CSV record per line. Answers the statistics as JSON; the
/// network is not updated.
pub fn handle(request: &mut Request, state: &SharedState) -> HttpResponse {
    let body = match read_body(request) {
        Ok(body) => body,
        Err(resp) => return resp,
    };
    let Some(mut session) = state.lock_session() else { return busy() };
    match session.test_lines(&body) {
        Ok(stat) => json_response(&stat),
        Err(e) => error_response(&e),
    }
}
