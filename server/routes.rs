use std::io::{Cursor, Read};
use serde::Serialize;
use tiny_http::{Header, Method, Request, Response, StatusCode};

use ferrite_mlp::{ErrorKind, MlpError};

use crate::handlers;
use crate::state::SharedState;

pub type HttpResponse = Response<Cursor<Vec<u8>>>;

// ---------------------------------------------------------------------------
// Response helpers
// ---------------------------------------------------------------------------

fn response(status: u16, content_type: &[u8], body: Vec<u8>) -> HttpResponse {
    let len = body.len();
    let mut headers = Vec::new();
    if let Ok(h) = Header::from_bytes(&b"Content-Type"[..], content_type) {
        headers.push(h);
    }
    Response::new(StatusCode(status), headers, Cursor::new(body), Some(len), None)
}

pub fn text_response(status: u16, body: impl Into<String>) -> HttpResponse {
    response(status, b"text/plain; charset=utf-8", body.into().into_bytes())
}

pub fn json_response<T: Serialize>(value: &T) -> HttpResponse {
    match serde_json::to_vec_pretty(value) {
        Ok(bytes) => response(200, b"application/json", bytes),
        Err(e) => text_response(500, format!("cannot serialize response: {e}")),
    }
}

/// Maps an engine error to a status code by kind.
pub fn error_response(err: &MlpError) -> HttpResponse {
    let status = match err.kind() {
        ErrorKind::Configuration | ErrorKind::Parse => 400,
        ErrorKind::Structural => 422,
        ErrorKind::Io => 500,
    };
    log::warn!("request failed: {err}");
    text_response(status, format!("{err}\n"))
}

pub fn busy() -> HttpResponse {
    text_response(503, "session busy, try again later\n")
}

pub fn not_found() -> HttpResponse {
    text_response(404, "404 Not Found\n")
}

pub fn read_body(request: &mut Request) -> Result<String, HttpResponse> {
    let mut body = String::new();
    request
        .as_reader()
        .read_to_string(&mut body)
        .map_err(|e| text_response(400, format!("cannot read request body: {e}\n")))?;
    Ok(body)
}

// ---------------------------------------------------------------------------
// Request dispatcher
// ---------------------------------------------------------------------------

/// Routes one request and sends its response.
pub fn dispatch(mut request: Request, state: SharedState) {
    let method = request.method().clone();
    let path = request.url().split('?').next().unwrap_or("").to_owned();
    log::debug!("{} {}", method, path);

    let response = match (method, path.as_str()) {
        (Method::Get,  "/health")  => text_response(200, "ok\n"),
        (Method::Get,  "/model")   => handlers::model::handle_get(&state),
        (Method::Post, "/export")  => handlers::model::handle_export(&state),
        (Method::Post, "/predict") => handlers::predict::handle(&mut request, &state),
        (Method::Post, "/train")   => handlers::train::handle(&mut request, &state),
        (Method::Post, "/test")    => handlers::test::handle(&mut request, &state),
        _ => not_found(),
    };

    if let Err(e) = request.respond(response) {
        log::warn!("cannot send response: {e}");
    }
}
