use super::GenerationRequest;
use crate::stream::ConfigField;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION, CONTENT_TYPE};
use reqwest::Url;
use serde::Serialize;

#[derive(Debug, Serialize)]
struct ChatCompletionsBody<'a> {
    model: &'a str,
    messages: [Message<'a>; 1],
    stream: bool,
}

#[derive(Debug, Serialize)]
struct Message<'a> {
    role: &'a str,
    content: &'a str,
}

fn headers(req: &GenerationRequest) -> Result<HeaderMap, ConfigField> {
    let mut h = HeaderMap::new();
    h.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    h.insert(ACCEPT, HeaderValue::from_static("text/event-stream"));

    let mut auth = HeaderValue::from_str(&format!("Bearer {}", req.credential.expose()))
        .map_err(|_| ConfigField::Credential)?;
    auth.set_sensitive(true);
    h.insert(AUTHORIZATION, auth);
    Ok(h)
}

/// Build the streaming chat-completions POST for one attempt.
///
/// An endpoint that is not a URL, or a key that cannot be a header value, is
/// reported as invalid configuration before anything goes on the wire.
pub fn build_request(
    http: &reqwest::Client,
    req: &GenerationRequest,
) -> Result<reqwest::RequestBuilder, ConfigField> {
    let url = Url::parse(req.endpoint.trim()).map_err(|_| ConfigField::Endpoint)?;

    let body = ChatCompletionsBody {
        model: &req.model,
        messages: [Message {
            role: "user",
            content: &req.prompt,
        }],
        stream: true,
    };

    Ok(http.post(url).headers(headers(req)?).json(&body))
}
