use axum::{
    body::{to_bytes, Body},
    extract::{FromRequest, Multipart, Path, Request},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::post,
    Form, Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tokio::net::TcpListener;

/// What the server received for a POST it did not treat as a reserved path.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Invocation {
    pub service: String,
    pub path: String,
    pub encoding: String,
    pub fields: Vec<(String, String)>,
    /// Undecoded request body for form posts, empty for multipart.
    #[serde(default)]
    pub raw: String,
}

pub fn app() -> Router {
    Router::new().route("/{service}/{*path}", post(invoke))
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    axum::serve(listener, app()).await
}

/// Reserved trailing paths script the response; everything else is echoed.
///
/// - `status/{code}`: reply with that status and `{"status": code}`
/// - `null`: reply with the JSON literal `null`
/// - `garbage`: reply with a non-JSON body
/// - `binary`: reply with bytes that are not UTF-8
/// - `empty`: reply 200 with no body
async fn invoke(Path((service, path)): Path<(String, String)>, request: Request) -> Response {
    let segments: Vec<&str> = path.split('/').collect();
    match segments.as_slice() {
        ["status", code] => match code.parse::<u16>().ok().and_then(|c| StatusCode::from_u16(c).ok()) {
            Some(status) => (status, Json(json!({ "status": status.as_u16() }))).into_response(),
            None => StatusCode::BAD_REQUEST.into_response(),
        },
        ["null"] => (
            [(header::CONTENT_TYPE, "application/json")],
            "null",
        )
            .into_response(),
        ["garbage"] => "<html>not json</html>".into_response(),
        ["binary"] => (
            [(header::CONTENT_TYPE, "application/json")],
            &b"\xff\xfe{}"[..],
        )
            .into_response(),
        ["empty"] => StatusCode::OK.into_response(),
        _ => echo(service, path, request).await,
    }
}

async fn echo(service: String, path: String, request: Request) -> Response {
    let is_multipart = request
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|ct| ct.starts_with("multipart/form-data"));

    let (encoding, fields, raw) = if is_multipart {
        match multipart_fields(request).await {
            Ok(fields) => ("multipart", fields, String::new()),
            Err(response) => return response,
        }
    } else {
        let (parts, body) = request.into_parts();
        let bytes = match to_bytes(body, usize::MAX).await {
            Ok(bytes) => bytes,
            Err(_) => return StatusCode::BAD_REQUEST.into_response(),
        };
        let raw = String::from_utf8_lossy(&bytes).into_owned();
        let request = Request::from_parts(parts, Body::from(bytes));
        match Form::<Vec<(String, String)>>::from_request(request, &()).await {
            Ok(Form(fields)) => ("form", fields, raw),
            Err(rejection) => return rejection.into_response(),
        }
    };

    tracing::info!(%service, %path, encoding, fields = fields.len(), "invocation");
    Json(Invocation {
        service,
        path,
        encoding: encoding.to_string(),
        fields,
        raw,
    })
    .into_response()
}

async fn multipart_fields(request: Request) -> Result<Vec<(String, String)>, Response> {
    let mut multipart = Multipart::from_request(request, &())
        .await
        .map_err(IntoResponse::into_response)?;
    let mut fields = Vec::new();
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(IntoResponse::into_response)?
    {
        let name = field.name().unwrap_or_default().to_string();
        let text = field.text().await.map_err(IntoResponse::into_response)?;
        fields.push((name, text));
    }
    Ok(fields)
}
