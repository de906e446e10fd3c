//! Shared HTTP plumbing for the backends.

use std::path::Path;

use reqwest::{Body, Client, Response};
use serde_json::Value;
use tokio_util::io::ReaderStream;

use reelcut_models::transcript::sort_segments;
use reelcut_models::TranscriptSegment;

use crate::config::TranscriberConfig;
use crate::error::{TranscribeError, TranscribeResult};

pub(crate) fn build_client(config: &TranscriberConfig) -> TranscribeResult<Client> {
    Client::builder()
        .timeout(config.request_timeout)
        .connect_timeout(std::time::Duration::from_secs(10))
        .user_agent(concat!("reelcut-transcribe/", env!("CARGO_PKG_VERSION")))
        .build()
        .map_err(TranscribeError::Network)
}

/// Stream a file as a request body, returning it with its length.
pub(crate) async fn file_body(path: &Path) -> TranscribeResult<(Body, u64)> {
    let file = tokio::fs::File::open(path).await?;
    let len = file.metadata().await?.len();
    Ok((Body::wrap_stream(ReaderStream::new(file)), len))
}

/// Turn a non-success response into a backend error.
///
/// The message is taken from the JSON body (`error.message` or a bare
/// `error` string); `fallback` is used when the body carries neither.
pub(crate) async fn backend_error(response: Response, fallback: &str) -> TranscribeError {
    let status = response.status().as_u16();
    let body = response.text().await.unwrap_or_default();
    TranscribeError::backend(Some(status), error_message(&body).unwrap_or_else(|| fallback.to_string()))
}

fn error_message(body: &str) -> Option<String> {
    let json: Value = serde_json::from_str(body).ok()?;
    let error = json.get("error")?;
    error
        .get("message")
        .and_then(Value::as_str)
        .or_else(|| error.as_str())
        .filter(|m| !m.is_empty())
        .map(str::to_string)
}

/// Sort timed segments, or synthesize one covering `[0, duration)` when
/// the backend returned no timing at all.
pub(crate) fn finish_segments(
    mut segments: Vec<TranscriptSegment>,
    full_text: Option<&str>,
    duration: f64,
) -> Vec<TranscriptSegment> {
    if segments.is_empty() {
        let end = if duration.is_finite() && duration > 0.0 { duration } else { 0.0 };
        return vec![TranscriptSegment::new(0.0, end, full_text.unwrap_or("").trim())];
    }
    sort_segments(&mut segments);
    segments
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_message_shapes() {
        assert_eq!(
            error_message(r#"{"error":{"message":"Invalid file format.","type":"invalid_request_error"}}"#),
            Some("Invalid file format.".to_string())
        );
        assert_eq!(
            error_message(r#"{"error":"Authentication error, API token missing/invalid"}"#),
            Some("Authentication error, API token missing/invalid".to_string())
        );
        assert_eq!(error_message("<html>bad gateway</html>"), None);
        assert_eq!(error_message(r#"{"error":{}}"#), None);
    }

    #[test]
    fn test_finish_segments_fallback() {
        let segments = finish_segments(vec![], Some(" hello world "), 42.5);
        assert_eq!(segments, vec![TranscriptSegment::new(0.0, 42.5, "hello world")]);
    }

    #[test]
    fn test_finish_segments_sorts() {
        let segments = finish_segments(
            vec![
                TranscriptSegment::new(4.0, 5.0, "b"),
                TranscriptSegment::new(1.0, 2.0, "a"),
            ],
            None,
            10.0,
        );
        assert_eq!(segments[0].text, "a");
        assert_eq!(segments[1].text, "b");
    }
}
