//! Fan-out dispatch with an all-outcomes barrier and all-or-nothing cleanup

use std::sync::Arc;

use futures::future::join_all;
use thiserror::Error;
use tracing::{debug, warn};

use crate::adapter::{AdapterError, AdapterRegistry, RegistryError};
use crate::assembler::StreamAssembler;
use crate::request::{AudioRequest, RequestTag};
use crate::stream::BoxedByteStream;

/// Errors surfaced by [`RequestDispatcher::submit`]
#[derive(Debug, Error)]
pub enum DispatchError {
    /// A batch must carry at least one request
    #[error("empty request batch")]
    EmptyBatch,

    #[error(transparent)]
    Registry(#[from] RegistryError),

    #[error(transparent)]
    Adapter(#[from] AdapterError),
}

/// Resolves a batch of requests against their providers concurrently and
/// hands the opened streams to the assembler.
pub struct RequestDispatcher {
    registry: Arc<AdapterRegistry>,
    assembler: StreamAssembler,
}

impl RequestDispatcher {
    pub fn new(registry: Arc<AdapterRegistry>, assembler: StreamAssembler) -> Self {
        Self {
            registry,
            assembler,
        }
    }

    /// Open every request concurrently and return one composite stream.
    ///
    /// All opens settle before any outcome is acted on; no sub-request's
    /// result is observable before every sibling has settled. On any failure
    /// each successful sibling stream is released exactly once (best-effort,
    /// a failing release is logged and suppressed) and the first failure by
    /// batch order is returned with its kind intact. Output order always
    /// matches batch order, independent of completion order.
    ///
    /// A batch consisting purely of no-op requests short-circuits to a single
    /// placeholder stream with no assembly and no padding.
    pub async fn submit(
        &self,
        requests: &[AudioRequest],
    ) -> Result<BoxedByteStream, DispatchError> {
        let Some(first) = requests.first() else {
            return Err(DispatchError::EmptyBatch);
        };

        if requests.iter().all(AudioRequest::is_no_op) {
            let noop = self.registry.resolve(RequestTag::NoOp)?;
            let stream = noop.open(first).await.map_err(DispatchError::Adapter)?;
            return Ok(stream);
        }

        // resolve every tag up front so configuration errors surface before
        // any provider is contacted
        let mut adapters = Vec::with_capacity(requests.len());
        for request in requests {
            adapters.push(self.registry.resolve(request.tag())?);
        }

        debug!(batch = requests.len(), "dispatching audio request batch");

        // the barrier: every open settles, success or failure, before any
        // outcome is acted on
        let outcomes = join_all(
            requests
                .iter()
                .zip(&adapters)
                .map(|(request, adapter)| adapter.open(request)),
        )
        .await;

        let mut streams = Vec::with_capacity(outcomes.len());
        let mut first_error: Option<AdapterError> = None;
        for outcome in outcomes {
            match outcome {
                Ok(stream) => streams.push(stream),
                Err(err) if first_error.is_none() => first_error = Some(err),
                Err(err) => debug!("suppressing sibling failure after the first: {err}"),
            }
        }

        match first_error {
            None => Ok(self.assembler.assemble(streams)),
            Some(err) => {
                // all-or-nothing: release every survivor before reporting
                for mut stream in streams {
                    if let Err(release_err) = stream.release() {
                        warn!("best-effort release of sibling stream failed: {release_err}");
                    }
                }
                Err(DispatchError::Adapter(err))
            }
        }
    }
}
