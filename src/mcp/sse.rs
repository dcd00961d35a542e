use crate::mcp::types::JSONRPC_VERSION;
use axum::http::header::{CACHE_CONTROL, CONNECTION};
use axum::response::sse::{Event, Sse};
use axum::response::{IntoResponse, Response};
use std::convert::Infallible;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{interval_at, Instant};
use tokio_stream::wrappers::IntervalStream;
use tokio_stream::{Stream, StreamExt};
use tracing::{debug, info};
use uuid::Uuid;

pub const CONNECTION_ESTABLISHED: &str = "connection.established";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Frame {
    /// A `data:` frame carrying a JSON payload.
    Message(String),
    /// A `: keepalive` comment.
    KeepAlive,
}

impl Frame {
    pub fn into_event(self) -> Event {
        match self {
            Frame::Message(data) => Event::default().data(data),
            Frame::KeepAlive => Event::default().comment("keepalive"),
        }
    }
}

/// Lives exactly as long as one event stream and tracks it in the shared gauge.
#[derive(Debug)]
pub struct SessionGuard {
    id: Uuid,
    active: Arc<AtomicUsize>,
}

impl SessionGuard {
    pub fn open(active: Arc<AtomicUsize>) -> Self {
        let id = Uuid::new_v4();
        let count = active.fetch_add(1, Ordering::SeqCst) + 1;
        info!(session = %id, active = count, "SSE client connected");
        Self { id, active }
    }

    fn keepalive(&self) {
        debug!(session = %self.id, "Sending keepalive");
    }
}

impl Drop for SessionGuard {
    fn drop(&mut self) {
        let count = self.active.fetch_sub(1, Ordering::SeqCst) - 1;
        info!(session = %self.id, active = count, "SSE client disconnected");
    }
}

/// The established notification followed by one keepalive per `period`,
/// the first a full period after open. Dropping the stream stops the timer
/// and closes the session.
pub fn session_frames(period: Duration, guard: SessionGuard) -> impl Stream<Item = Frame> + Send {
    let established = serde_json::json!({
        "jsonrpc": JSONRPC_VERSION,
        "method": CONNECTION_ESTABLISHED
    })
    .to_string();
    let opening = tokio_stream::once(Frame::Message(established));

    let ticks = IntervalStream::new(interval_at(Instant::now() + period, period)).map(move |_| {
        guard.keepalive();
        Frame::KeepAlive
    });

    opening.chain(ticks)
}

pub fn event_stream(period: Duration, active: Arc<AtomicUsize>) -> Response {
    let frames = session_frames(period, SessionGuard::open(active))
        .map(|frame| Ok::<_, Infallible>(frame.into_event()));

    (
        [(CACHE_CONTROL, "no-cache"), (CONNECTION, "keep-alive")],
        Sse::new(frames),
    )
        .into_response()
}
