use crate::{
    error::{ProxyError, Result},
    gemini::UpstreamReply,
    models::ImageResponse,
};
use serde_json::Value;

/// Turns the upstream reply into the client-facing result. Only
/// `error.message` and the first candidate's parts are looked at.
pub fn map_upstream_reply(reply: UpstreamReply) -> Result<ImageResponse> {
    let body = reply.body.clone().unwrap_or(Value::Null);

    if !reply.is_success() {
        let message = non_empty_str(body.pointer("/error/message")).map(String::from);
        return Err(ProxyError::Upstream {
            status: reply.status,
            message,
        });
    }

    let parts = first_candidate_parts(&body);

    // The first part carrying inline data decides; if it has no data we fall
    // back to text rather than scanning further.
    let image = parts
        .iter()
        .find(|part| is_truthy(part.get("inlineData")))
        .and_then(|part| non_empty_str(part.pointer("/inlineData/data")));

    match image {
        Some(data) => Ok(ImageResponse::from_png_base64(data)),
        None => {
            let text = parts
                .iter()
                .find(|part| is_truthy(part.get("text")))
                .and_then(|part| non_empty_str(part.get("text")))
                .map(String::from);
            Err(ProxyError::NoImageData(text))
        }
    }
}

fn first_candidate_parts(body: &Value) -> &[Value] {
    body.pointer("/candidates/0/content/parts")
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or(&[])
}

fn non_empty_str(value: Option<&Value>) -> Option<&str> {
    value.and_then(Value::as_str).filter(|s| !s.is_empty())
}

// JavaScript truthiness.
fn is_truthy(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => false,
        Some(Value::Bool(b)) => *b,
        Some(Value::Number(n)) => n.as_f64().map_or(false, |n| n != 0.0),
        Some(Value::String(s)) => !s.is_empty(),
        Some(Value::Array(_)) | Some(Value::Object(_)) => true,
    }
}
