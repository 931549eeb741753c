//! One streaming chat-completions attempt at a time, observable and cancellable.
//!
//! [`StreamConsumer::start`] drives an attempt through
//! `Requesting -> Streaming -> Completed | Aborted | Failed` and publishes a
//! [`StreamSnapshot`] on a `watch` channel after every chunk. [`stop`] and
//! [`clear`] may be called from any task while `start` is suspended.
//!
//! Every attempt gets a fresh [`CancellationToken`] and a new attempt id.
//! Publications are tagged with that id, so an attempt that has been
//! superseded (by a new `start` or by `clear`) can no longer write into the
//! published state.
//!
//! [`stop`]: StreamConsumer::stop
//! [`clear`]: StreamConsumer::clear

use super::decoder::LineDecoder;
use super::error::{ConfigField, FailureKind, StreamError};
use super::frame::{parse_line, Frame};
use crate::provider::{openai, GenerationRequest};
use futures_core::Stream;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};
use tokio::sync::watch;
use tokio_stream::StreamExt;
use tokio_util::sync::CancellationToken;

/// Text shown in place of the output once an attempt is stopped.
pub const ABORTED_MARKER: &str = "Request aborted.";

/// Text shown in place of the output once an attempt fails.
pub const ERROR_MARKER: &str = "Error occurred while generating.";

/// How much of an error response body is kept for the log.
const ERROR_BODY_LIMIT: usize = 512;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Phase {
    #[default]
    Idle,
    Requesting,
    Streaming,
    Completed,
    Aborted,
    Failed(FailureKind),
}

impl Phase {
    pub fn is_in_flight(self) -> bool {
        matches!(self, Phase::Requesting | Phase::Streaming)
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, Phase::Completed | Phase::Aborted | Phase::Failed(_))
    }
}

/// Published state of a consumer.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StreamSnapshot {
    /// Id of the attempt this snapshot belongs to. Bumped by `start` and `clear`.
    pub attempt: u64,
    pub phase: Phase,
    pub text: String,

    /// Number of frames that carried non-empty content. This approximates
    /// the token count; it is not a tokenizer.
    pub token_count: u64,

    /// Wall-clock time of the last finished attempt, zero until one finishes.
    pub elapsed: Duration,

    /// Lines skipped because they did not parse as a frame.
    pub malformed_frames: u64,
}

impl StreamSnapshot {
    pub fn is_generating(&self) -> bool {
        self.phase.is_in_flight()
    }

    pub fn tokens_per_second(&self) -> Option<f64> {
        let secs = self.elapsed.as_secs_f64();
        (secs > 0.0).then(|| self.token_count as f64 / secs)
    }
}

struct Active {
    attempt: u64,
    cancel: CancellationToken,
}

#[derive(Default)]
struct Control {
    last_attempt: u64,
    active: Option<Active>,
}

pub struct StreamConsumer {
    http: reqwest::Client,
    state: watch::Sender<StreamSnapshot>,
    control: Mutex<Control>,
}

impl StreamConsumer {
    pub fn new(http: reqwest::Client) -> Self {
        let (state, _) = watch::channel(StreamSnapshot::default());
        Self {
            http,
            state,
            control: Mutex::new(Control::default()),
        }
    }

    /// Receive every published snapshot.
    pub fn subscribe(&self) -> watch::Receiver<StreamSnapshot> {
        self.state.subscribe()
    }

    pub fn snapshot(&self) -> StreamSnapshot {
        self.state.borrow().clone()
    }

    /// Run one attempt to a terminal phase and return that phase.
    ///
    /// An attempt already in flight is aborted first. Invalid input ends in
    /// `Failed(InvalidConfiguration)` without touching the network.
    pub async fn start(&self, request: GenerationRequest) -> Phase {
        let builder = match request
            .validate()
            .and_then(|()| openai::build_request(&self.http, &request))
        {
            Ok(builder) => builder,
            Err(field) => return self.reject(field),
        };

        let cancel = CancellationToken::new();
        let attempt = self.begin(Phase::Requesting, Some(cancel.clone()));
        tracing::debug!(
            attempt,
            model = %request.model,
            endpoint = %request.endpoint,
            "starting generation"
        );

        let mut settle = Settle {
            consumer: self,
            attempt,
            started: Instant::now(),
            phase: Phase::Aborted,
        };

        settle.phase = match self.run(attempt, &cancel, builder).await {
            Ok(()) => Phase::Completed,
            Err(err) => match err.failure_kind() {
                Some(kind) => {
                    tracing::warn!(attempt, error = %err, "generation failed");
                    Phase::Failed(kind)
                }
                None => {
                    tracing::debug!(attempt, "generation aborted");
                    Phase::Aborted
                }
            },
        };
        settle.phase
    }

    /// Abort the attempt in flight, if any. Never publishes by itself; the
    /// attempt publishes `Aborted` once it observes the cancellation.
    pub fn stop(&self) {
        let control = self.lock();
        if let Some(active) = &control.active {
            tracing::debug!(attempt = active.attempt, "stop requested");
            active.cancel.cancel();
        }
    }

    /// Reset the published state to `Idle`. An attempt in flight is aborted
    /// and can no longer publish.
    pub fn clear(&self) {
        let mut control = self.lock();
        if let Some(active) = control.active.take() {
            tracing::debug!(attempt = active.attempt, "clear aborts attempt in flight");
            active.cancel.cancel();
        }
        control.last_attempt += 1;
        let attempt = control.last_attempt;
        self.state.send_replace(StreamSnapshot {
            attempt,
            ..StreamSnapshot::default()
        });
    }

    fn lock(&self) -> MutexGuard<'_, Control> {
        self.control.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Open a new attempt: supersede the previous one and publish a fresh
    /// snapshot in `phase`.
    fn begin(&self, phase: Phase, cancel: Option<CancellationToken>) -> u64 {
        let mut control = self.lock();
        control.last_attempt += 1;
        let attempt = control.last_attempt;

        let next = cancel.map(|cancel| Active { attempt, cancel });
        if let Some(prev) = std::mem::replace(&mut control.active, next) {
            tracing::debug!(superseded = prev.attempt, attempt, "aborting previous attempt");
            prev.cancel.cancel();
        }

        self.state.send_replace(StreamSnapshot {
            attempt,
            phase,
            ..StreamSnapshot::default()
        });
        attempt
    }

    fn reject(&self, field: ConfigField) -> Phase {
        let err = StreamError::InvalidConfiguration(field);
        tracing::warn!(error = %err, "not starting generation");
        let phase = Phase::Failed(FailureKind::InvalidConfiguration(field));
        self.begin(phase, None);
        phase
    }

    /// Apply `update` if `attempt` still owns the published state.
    fn publish(&self, attempt: u64, update: impl FnOnce(&mut StreamSnapshot)) {
        self.state.send_if_modified(|s| {
            if s.attempt != attempt {
                return false;
            }
            update(s);
            true
        });
    }

    fn finish(&self, attempt: u64, phase: Phase, elapsed: Duration) {
        self.publish(attempt, |s| {
            s.phase = phase;
            s.elapsed = elapsed;
            match phase {
                Phase::Aborted => s.text = ABORTED_MARKER.to_string(),
                Phase::Failed(_) => s.text = ERROR_MARKER.to_string(),
                _ => {}
            }
        });

        let mut control = self.lock();
        if control.active.as_ref().is_some_and(|a| a.attempt == attempt) {
            if let Some(active) = control.active.take() {
                active.cancel.cancel();
            }
        }
    }

    async fn run(
        &self,
        attempt: u64,
        cancel: &CancellationToken,
        builder: reqwest::RequestBuilder,
    ) -> Result<(), StreamError> {
        let resp = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(StreamError::Cancelled),
            resp = builder.send() => resp?,
        };

        let status = resp.status();
        if !status.is_success() {
            let body = tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(StreamError::Cancelled),
                body = resp.text() => body.unwrap_or_default(),
            };
            return Err(StreamError::Status {
                status,
                body: body.chars().take(ERROR_BODY_LIMIT).collect(),
            });
        }
        if status == reqwest::StatusCode::NO_CONTENT || resp.content_length() == Some(0) {
            return Err(StreamError::EmptyResponseBody);
        }

        self.publish(attempt, |s| s.phase = Phase::Streaming);
        self.consume(attempt, cancel, resp.bytes_stream()).await
    }

    async fn consume<S, B, E>(
        &self,
        attempt: u64,
        cancel: &CancellationToken,
        body: S,
    ) -> Result<(), StreamError>
    where
        S: Stream<Item = Result<B, E>>,
        B: AsRef<[u8]>,
        E: Into<StreamError>,
    {
        tokio::pin!(body);
        let mut lines = LineDecoder::new();

        loop {
            let next = tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(StreamError::Cancelled),
                next = body.next() => next,
            };

            match next {
                Some(Ok(chunk)) => {
                    if self.apply(attempt, lines.push(chunk.as_ref())) {
                        return Ok(());
                    }
                }
                Some(Err(e)) => return Err(e.into()),
                None => {
                    self.apply(attempt, lines.finish());
                    return Ok(());
                }
            }
        }
    }

    /// Fold one chunk's lines into the snapshot with a single publication.
    /// Returns true once the `[DONE]` sentinel is seen.
    fn apply(&self, attempt: u64, lines: Vec<String>) -> bool {
        let mut text = String::new();
        let mut tokens = 0u64;
        let mut malformed = 0u64;
        let mut ended = false;

        for line in lines {
            match parse_line(&line) {
                None => {}
                Some(Frame::ContentDelta { text: delta }) => {
                    if !delta.is_empty() {
                        text.push_str(&delta);
                        tokens += 1;
                    }
                }
                Some(Frame::StreamEnd) => {
                    ended = true;
                    break;
                }
                Some(Frame::Malformed { raw_line }) => {
                    malformed += 1;
                    let err = StreamError::MalformedFrame { line: raw_line };
                    tracing::warn!(attempt, error = %err, "skipping frame");
                }
            }
        }

        if tokens > 0 || malformed > 0 {
            self.publish(attempt, |s| {
                s.text.push_str(&text);
                s.token_count += tokens;
                s.malformed_frames += malformed;
            });
        }
        ended
    }
}

/// Publishes the terminal phase when an attempt ends, including when the
/// `start` future is dropped mid-flight (which settles as `Aborted`).
struct Settle<'a> {
    consumer: &'a StreamConsumer,
    attempt: u64,
    started: Instant,
    phase: Phase,
}

impl Drop for Settle<'_> {
    fn drop(&mut self) {
        self.consumer
            .finish(self.attempt, self.phase, self.started.elapsed());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::Credential;
    use crate::stream::test_server::{self, Hold};
    use std::sync::Arc;
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const WAIT: Duration = Duration::from_secs(5);

    fn request(endpoint: impl Into<String>) -> GenerationRequest {
        GenerationRequest {
            endpoint: endpoint.into(),
            credential: Credential::new("sk-test"),
            model: "gpt-4".into(),
            prompt: "sys\nhi".into(),
        }
    }

    fn frame(content: &str) -> String {
        format!(
            "data: {}\n",
            serde_json::json!({"choices": [{"delta": {"content": content}}]})
        )
    }

    fn consumer() -> Arc<StreamConsumer> {
        let http = reqwest::Client::builder()
            .no_proxy()
            .build()
            .expect("http client");
        Arc::new(StreamConsumer::new(http))
    }

    fn spawn_start(
        c: &Arc<StreamConsumer>,
        req: GenerationRequest,
    ) -> tokio::task::JoinHandle<Phase> {
        let c = c.clone();
        tokio::spawn(async move { c.start(req).await })
    }

    /// Distinct phases published on `rx`, from the current one up to the
    /// first terminal phase.
    async fn phases_until_terminal(mut rx: watch::Receiver<StreamSnapshot>) -> Vec<Phase> {
        let mut seen = vec![rx.borrow_and_update().phase];
        while !seen.last().is_some_and(|p| p.is_terminal()) {
            if rx.changed().await.is_err() {
                break;
            }
            let phase = rx.borrow_and_update().phase;
            if seen.last() != Some(&phase) {
                seen.push(phase);
            }
        }
        seen
    }

    async fn sse_server(body: String) -> MockServer {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .respond_with(ResponseTemplate::new(200).set_body_raw(body, "text/event-stream"))
            .mount(&server)
            .await;
        server
    }

    fn endpoint(server: &MockServer) -> String {
        format!("{}/v1/chat/completions", server.uri())
    }

    #[tokio::test]
    async fn hello_scenario_completes() {
        let url = test_server::serve(
            vec![
                frame("Hel").into_bytes(),
                frame("lo").into_bytes(),
                b"data: [DONE]\n".to_vec(),
            ],
            Duration::from_millis(20),
            Hold::Close,
        )
        .await;

        let c = consumer();
        let rx = c.subscribe();
        let task = spawn_start(&c, request(url));

        let seen = tokio::time::timeout(WAIT, phases_until_terminal(rx))
            .await
            .expect("terminal phase");
        assert_eq!(
            seen,
            vec![Phase::Idle, Phase::Requesting, Phase::Streaming, Phase::Completed]
        );
        assert_eq!(task.await.expect("join"), Phase::Completed);

        let snap = c.snapshot();
        assert_eq!(snap.phase, Phase::Completed);
        assert_eq!(snap.text, "Hello");
        assert_eq!(snap.token_count, 2);
        assert!(!snap.is_generating());
        assert!(snap.elapsed > Duration::ZERO);
        assert!(snap.tokens_per_second().is_some());
    }

    #[tokio::test]
    async fn sends_bearer_auth_and_streaming_body() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .and(header("authorization", "Bearer sk-test"))
            .and(header("content-type", "application/json"))
            .and(body_json(serde_json::json!({
                "model": "gpt-4",
                "messages": [{"role": "user", "content": "sys\nhi"}],
                "stream": true,
            })))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_raw(format!("{}data: [DONE]\n", frame("ok")), "text/event-stream"),
            )
            .expect(1)
            .mount(&server)
            .await;

        let c = consumer();
        assert_eq!(c.start(request(endpoint(&server))).await, Phase::Completed);
        assert_eq!(c.snapshot().text, "ok");
    }

    #[tokio::test]
    async fn counts_only_content_bearing_frames() {
        let body = [frame("a"), frame("bb"), frame("")].concat();
        let server = sse_server(body).await;

        let c = consumer();
        assert_eq!(c.start(request(endpoint(&server))).await, Phase::Completed);

        let snap = c.snapshot();
        assert_eq!(snap.text, "abb");
        assert_eq!(snap.token_count, 2);
    }

    #[tokio::test]
    async fn malformed_line_is_skipped() {
        let body = format!("{}data: {{oops\n{}data: [DONE]\n", frame("one "), frame("two"));
        let server = sse_server(body).await;

        let c = consumer();
        assert_eq!(c.start(request(endpoint(&server))).await, Phase::Completed);

        let snap = c.snapshot();
        assert_eq!(snap.text, "one two");
        assert_eq!(snap.token_count, 2);
        assert_eq!(snap.malformed_frames, 1);
    }

    #[tokio::test]
    async fn multibyte_char_split_across_chunks() {
        let line = frame("café").into_bytes();
        // Split inside the two-byte encoding of 'é'.
        let split = line
            .windows(2)
            .position(|w| w == "é".as_bytes())
            .expect("é in frame")
            + 1;

        let url = test_server::serve(
            vec![line[..split].to_vec(), line[split..].to_vec()],
            Duration::from_millis(20),
            Hold::Close,
        )
        .await;

        let c = consumer();
        assert_eq!(c.start(request(url)).await, Phase::Completed);
        assert_eq!(c.snapshot().text, "café");
        assert_eq!(c.snapshot().token_count, 1);
    }

    #[tokio::test]
    async fn frame_split_mid_json_is_reassembled() {
        let line = frame("joined");
        let (a, b) = line.split_at(line.len() / 2);
        let url = test_server::serve(
            vec![a.as_bytes().to_vec(), b.as_bytes().to_vec()],
            Duration::from_millis(20),
            Hold::Close,
        )
        .await;

        let c = consumer();
        assert_eq!(c.start(request(url)).await, Phase::Completed);
        assert_eq!(c.snapshot().text, "joined");
        assert_eq!(c.snapshot().malformed_frames, 0);
    }

    #[tokio::test]
    async fn stop_while_streaming_aborts() {
        let url = test_server::serve(
            vec![frame("Hel").into_bytes()],
            Duration::ZERO,
            Hold::Open,
        )
        .await;

        let c = consumer();
        let mut rx = c.subscribe();
        let task = spawn_start(&c, request(url));

        rx.wait_for(|s| s.text == "Hel").await.expect("first chunk");
        assert_eq!(c.snapshot().phase, Phase::Streaming);
        assert!(c.snapshot().is_generating());

        c.stop();
        let phase = tokio::time::timeout(WAIT, task)
            .await
            .expect("aborted promptly")
            .expect("task");
        assert_eq!(phase, Phase::Aborted);

        let snap = c.snapshot();
        assert_eq!(snap.phase, Phase::Aborted);
        assert_eq!(snap.text, ABORTED_MARKER);
        assert_eq!(snap.token_count, 1);
        assert!(!snap.is_generating());

        rx.borrow_and_update();
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(!rx.has_changed().expect("sender alive"));
        assert_eq!(c.snapshot(), snap);
    }

    #[tokio::test]
    async fn stop_while_requesting_aborts() {
        let url = test_server::silent().await;

        let c = consumer();
        let mut rx = c.subscribe();
        let task = spawn_start(&c, request(url));

        rx.wait_for(|s| s.phase == Phase::Requesting)
            .await
            .expect("requesting");
        c.stop();

        let phase = tokio::time::timeout(WAIT, task)
            .await
            .expect("aborted promptly")
            .expect("task");
        assert_eq!(phase, Phase::Aborted);
        assert_eq!(c.snapshot().text, ABORTED_MARKER);
    }

    #[tokio::test]
    async fn stop_while_idle_is_noop() {
        let c = consumer();
        let rx = c.subscribe();

        c.stop();
        c.stop();

        assert!(!rx.has_changed().expect("sender alive"));
        assert_eq!(c.snapshot(), StreamSnapshot::default());
    }

    #[tokio::test]
    async fn clear_after_completed_resets() {
        let server = sse_server(frame("done")).await;
        let c = consumer();
        assert_eq!(c.start(request(endpoint(&server))).await, Phase::Completed);

        c.clear();
        let snap = c.snapshot();
        assert_eq!(snap.phase, Phase::Idle);
        assert_eq!(snap.text, "");
        assert_eq!(snap.token_count, 0);
        assert_eq!(snap.elapsed, Duration::ZERO);
        assert_eq!(snap.malformed_frames, 0);
    }

    #[tokio::test]
    async fn clear_while_streaming_stops_and_stays_cleared() {
        let url = test_server::serve(
            vec![frame("partial").into_bytes()],
            Duration::ZERO,
            Hold::Open,
        )
        .await;

        let c = consumer();
        let mut rx = c.subscribe();
        let task = spawn_start(&c, request(url));
        rx.wait_for(|s| s.text == "partial").await.expect("chunk");

        c.clear();
        let phase = tokio::time::timeout(WAIT, task)
            .await
            .expect("aborted promptly")
            .expect("task");
        assert_eq!(phase, Phase::Aborted);

        let snap = c.snapshot();
        assert_eq!(snap.phase, Phase::Idle);
        assert_eq!(snap.text, "");
        assert_eq!(snap.token_count, 0);
    }

    #[tokio::test]
    async fn restart_aborts_previous_attempt() {
        let first = test_server::serve(
            vec![frame("first").into_bytes()],
            Duration::ZERO,
            Hold::Open,
        )
        .await;
        let second = sse_server(format!("{}data: [DONE]\n", frame("second"))).await;

        let c = consumer();
        let mut rx = c.subscribe();
        let old = spawn_start(&c, request(first));
        rx.wait_for(|s| s.text == "first").await.expect("first chunk");

        let new = spawn_start(&c, request(endpoint(&second)));
        let old_phase = tokio::time::timeout(WAIT, old)
            .await
            .expect("aborted promptly")
            .expect("task");
        let new_phase = tokio::time::timeout(WAIT, new)
            .await
            .expect("completed")
            .expect("task");

        assert_eq!(old_phase, Phase::Aborted);
        assert_eq!(new_phase, Phase::Completed);

        let snap = c.snapshot();
        assert_eq!(snap.attempt, 2);
        assert_eq!(snap.text, "second");
        assert_eq!(snap.token_count, 1);
    }

    #[tokio::test]
    async fn error_status_fails_with_marker() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(401).set_body_raw(
                r#"{"error":{"message":"bad key"}}"#,
                "application/json",
            ))
            .mount(&server)
            .await;

        let c = consumer();
        let phase = c.start(request(endpoint(&server))).await;
        assert_eq!(phase, Phase::Failed(FailureKind::Transport));

        let snap = c.snapshot();
        assert_eq!(snap.text, ERROR_MARKER);
        assert!(!snap.text.contains("bad key"));
        assert!(snap.elapsed > Duration::ZERO);
    }

    #[tokio::test]
    async fn no_content_is_empty_body() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(204))
            .mount(&server)
            .await;

        let c = consumer();
        assert_eq!(
            c.start(request(endpoint(&server))).await,
            Phase::Failed(FailureKind::EmptyResponseBody)
        );
        assert_eq!(c.snapshot().text, ERROR_MARKER);
    }

    #[tokio::test]
    async fn connection_refused_is_transport_failure() {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").expect("bind");
        let addr = listener.local_addr().expect("addr");
        drop(listener);

        let c = consumer();
        let phase = c
            .start(request(format!("http://{addr}/v1/chat/completions")))
            .await;
        assert_eq!(phase, Phase::Failed(FailureKind::Transport));
        assert_eq!(c.snapshot().text, ERROR_MARKER);
    }

    #[tokio::test]
    async fn connection_lost_while_streaming_fails() {
        let url = test_server::serve(
            vec![frame("Hi").into_bytes()],
            Duration::from_millis(20),
            Hold::Truncate,
        )
        .await;

        let c = consumer();
        let rx = c.subscribe();
        let task = spawn_start(&c, request(url));

        let seen = tokio::time::timeout(WAIT, phases_until_terminal(rx))
            .await
            .expect("terminal phase");
        assert_eq!(
            seen,
            vec![
                Phase::Idle,
                Phase::Requesting,
                Phase::Streaming,
                Phase::Failed(FailureKind::Transport),
            ]
        );
        assert_eq!(task.await.expect("join"), Phase::Failed(FailureKind::Transport));

        let snap = c.snapshot();
        assert_eq!(snap.text, ERROR_MARKER);
        assert_eq!(snap.token_count, 1);
        assert!(!snap.is_generating());
    }

    #[tokio::test]
    async fn invalid_configuration_makes_no_request() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let c = consumer();
        let mut req = request(endpoint(&server));
        req.credential = Credential::default();

        let phase = c.start(req).await;
        assert_eq!(
            phase,
            Phase::Failed(FailureKind::InvalidConfiguration(ConfigField::Credential))
        );

        let snap = c.snapshot();
        assert_eq!(snap.phase, phase);
        assert_eq!(snap.elapsed, Duration::ZERO);
        assert!(!snap.is_generating());
    }

    #[tokio::test]
    async fn dropped_start_future_settles_aborted() {
        let url = test_server::serve(
            vec![frame("x").into_bytes()],
            Duration::ZERO,
            Hold::Open,
        )
        .await;

        let c = consumer();
        let mut rx = c.subscribe();
        let task = spawn_start(&c, request(url));
        rx.wait_for(|s| s.text == "x").await.expect("chunk");

        task.abort();
        rx.wait_for(|s| s.phase == Phase::Aborted)
            .await
            .expect("settled");
        assert_eq!(c.snapshot().text, ABORTED_MARKER);
    }
}
