//! Server-Sent Events for pass progress

use axum::{
    extract::State,
    response::sse::{Event, Sse},
};
use futures::stream::Stream;
use std::convert::Infallible;

use crate::AppState;

/// GET /events
///
/// Streams PassStarted, ProgressUpdate, ResolutionCompleted,
/// ApplyCompleted and PassFailed.
pub async fn event_stream(
    State(state): State<AppState>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    agp_common::sse::event_sse_stream(&state.event_bus, "agp-tagger")
}
