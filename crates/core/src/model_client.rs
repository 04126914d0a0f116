use std::future::poll_fn;
use std::pin::{Pin, pin};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use persona_chat_model::{
    ModelFinishReason, ModelProvider, ModelProviderError, ModelRequest,
    ModelResponse, ModelResponseEvent,
};
use tracing::Instrument;

use crate::retry::RetryPolicy;

type SendRequestResult = Result<Completion, Box<dyn ModelProviderError>>;
type BoxedSendRequestFuture =
    Pin<Box<dyn Future<Output = SendRequestResult> + Send>>;
type DeltaFn = Arc<dyn Fn(&str) + Send + Sync>;
#[rustfmt::skip]
type HandlerFn = Arc<
    dyn Fn(ModelRequest, DeltaFn) -> BoxedSendRequestFuture + Send + Sync
>;

/// A wrapper around a model provider that maintains an execution
/// environment for the provider and provides a type-erased interface
/// for the other modules.
#[derive(Clone)]
pub struct ModelClient {
    handler_fn: HandlerFn,
    retry_policy: Option<RetryPolicy>,
}

impl ModelClient {
    /// Creates a client sending requests to `provider`, without retries.
    #[inline]
    pub fn new<P: ModelProvider + 'static>(provider: P) -> Self {
        // We have to erase the type `P`, since `ModelClient` doesn't have a
        // generic parameter and we don't want it either.
        let handler_fn: HandlerFn =
            Arc::new(move |req: ModelRequest, on_delta: DeltaFn| {
                let fut = provider.send_request(&req);
                Box::pin(
                    async move {
                        trace!("got a request: {:?}", req);
                        let resp_or_err = fut.await;
                        handle_response::<P>(resp_or_err, on_delta).await
                    }
                    .instrument(trace_span!("model client req")),
                )
            });
        Self {
            handler_fn,
            retry_policy: None,
        }
    }

    /// Retries transient failures according to `policy`, or never when it
    /// is `None`.
    #[inline]
    pub fn with_retry_policy(mut self, policy: Option<RetryPolicy>) -> Self {
        self.retry_policy = policy;
        self
    }

    /// Sends a request and returns the completed response, reporting each
    /// text delta to `on_delta` as it arrives.
    ///
    /// An attempt is only retried if it failed before streaming anything,
    /// so `on_delta` never sees the same text twice.
    pub async fn send_request(
        &self,
        req: ModelRequest,
        on_delta: impl Fn(&str) + Send + Sync + 'static,
    ) -> SendRequestResult {
        let streamed = Arc::new(AtomicBool::new(false));
        let on_delta: DeltaFn = {
            let streamed = Arc::clone(&streamed);
            Arc::new(move |delta: &str| {
                streamed.store(true, Ordering::Relaxed);
                on_delta(delta);
            })
        };

        let Some(policy) = self.retry_policy else {
            return (self.handler_fn)(req, on_delta).await;
        };

        let attempt = || {
            let fut = (self.handler_fn)(req.clone(), Arc::clone(&on_delta));
            let streamed = Arc::clone(&streamed);
            async move {
                fut.await.map_err(|err| {
                    if err.kind().is_transient()
                        && !streamed.load(Ordering::Relaxed)
                    {
                        backoff::Error::transient(err)
                    } else {
                        backoff::Error::permanent(err)
                    }
                })
            }
        };
        backoff::future::retry_notify(
            policy.to_backoff(),
            attempt,
            |err: Box<dyn ModelProviderError>, delay: Duration| {
                warn!("model request failed, retrying in {delay:?}: {err}");
            },
        )
        .await
    }
}

/// A completely received response from the model client.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Completion {
    /// The full text, all deltas concatenated.
    pub text: String,
    /// The reason the model finished generating.
    pub finish_reason: Option<ModelFinishReason>,
}

async fn handle_response<P: ModelProvider + 'static>(
    resp_or_err: Result<P::Response, P::Error>,
    on_delta: DeltaFn,
) -> SendRequestResult {
    let resp = match resp_or_err {
        Ok(resp) => resp,
        Err(err) => {
            error!("got an error: {err:?}");
            return Err(Box::new(err));
        }
    };

    let mut text = String::new();
    let mut finish_reason = None;

    trace!("start receiving events");

    let mut pinned_resp = pin!(resp);
    loop {
        let event_or_err =
            poll_fn(|cx| pinned_resp.as_mut().poll_next_event(cx)).await;
        let event = match event_or_err {
            Ok(Some(event)) => event,
            Ok(None) => break,
            Err(err) => {
                error!("got an error: {err:?}");
                return Err(Box::new(err));
            }
        };
        trace!("got an event: {event:?}");

        match event {
            ModelResponseEvent::MessageDelta(delta) => {
                on_delta(&delta);
                text.push_str(&delta);
            }
            ModelResponseEvent::Completed(reason) => {
                finish_reason = Some(reason);
            }
        }
    }

    trace!("finished a request");

    Ok(Completion {
        text,
        finish_reason,
    })
}
