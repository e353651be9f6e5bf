use std::sync::Arc;

use log::{debug, warn};
use tokio::task::JoinHandle;

use crate::http::{shared_transport, RequestDescriptor, Transport};
use crate::parser::ResponseParser;
use crate::result::ApiResult;

static HEADER_ACCEPT: &str = "Accept";

/// Dispatches request descriptors through a transport and hands parsed
/// results to a completion callback.
///
/// The transport is shared and long-lived; the session owns no per-request
/// state beyond the handle each [`execute`](Session::execute) returns.
#[derive(Clone)]
pub struct Session {
    transport: Arc<dyn Transport>,
}

impl Session {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self { transport }
    }

    /// Dispatch `request` and deliver the parsed result to `on_complete`.
    ///
    /// Returns immediately; the callback runs on a runtime worker once the
    /// transport completes, exactly once unless the handle is cancelled
    /// first. Callers must not assume it runs on their own context.
    ///
    /// The parser's accept type, when present, replaces any `Accept` header
    /// already on the request.
    pub fn execute<P, F>(
        &self,
        mut request: RequestDescriptor,
        parser: P,
        on_complete: F,
    ) -> RequestHandle
    where
        P: ResponseParser + Send + 'static,
        F: FnOnce(ApiResult<P::Success, P::Rejection>) + Send + 'static,
    {
        if let Some(accept) = parser.accept_type() {
            request
                .headers
                .insert(HEADER_ACCEPT.to_string(), accept.to_string());
        }

        let transport = Arc::clone(&self.transport);
        let task = tokio::spawn(async move {
            debug!("executing {} {}", request.method, request.url);
            let outcome = transport.submit(request).await;
            if let Err(error) = &outcome {
                warn!("transport failed: {error}");
            }
            on_complete(parser.parse(outcome));
        });

        RequestHandle { task }
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new(shared_transport())
    }
}

/// Handle to an in-flight request. Dropping it does not cancel the request.
pub struct RequestHandle {
    task: JoinHandle<()>,
}

impl RequestHandle {
    /// Best-effort cancellation. Races with completion: when the transport
    /// already finished, this is a no-op and the callback may still fire.
    pub fn cancel(&self) {
        self.task.abort();
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}
