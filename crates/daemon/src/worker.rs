// SPDX-License-Identifier: MIT

//! Worker spawning and terminal events
//!
//! Workers do not share memory with the coordinator; they receive cloned
//! dependencies at spawn and communicate back through a single terminal
//! event. [`monitored`] guarantees exactly one event per worker, mapping
//! panics to an error exit.

use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::path::PathBuf;

use futures_util::future::BoxFuture;
use futures_util::FutureExt;
use thiserror::Error;
use tokio::sync::mpsc;

use gov_adapters::FsError;
use gov_core::WorkerId;
use gov_store::StoreError;

use crate::pipeline::PipelineResult;
use crate::sync::{DownloadResult, UploadResult};

/// Infrastructure failures inside a worker. Business failures travel in the
/// worker's structured result instead.
#[derive(Debug, Error)]
pub enum WorkerError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Fs(#[from] FsError),

    #[error("failed to parse {path}: {message}")]
    IndexParse { path: PathBuf, message: String },
}

/// Structured result of a finished worker.
#[derive(Debug)]
pub enum WorkerPayload {
    Upload(UploadResult),
    Change(PipelineResult),
    Download(DownloadResult),
}

/// The single terminal event a worker reports.
///
/// `payload` and `error` are mutually exclusive in practice; a worker that
/// reports neither is treated as the explicit `worker_no_result` failure.
#[derive(Debug)]
pub struct WorkerExit {
    pub worker_id: WorkerId,
    pub payload: Option<WorkerPayload>,
    pub error: Option<String>,
}

/// Wrap a worker body so it always reports exactly one terminal event.
pub(crate) fn monitored<F>(
    worker_id: WorkerId,
    exit_tx: mpsc::Sender<WorkerExit>,
    body: F,
) -> BoxFuture<'static, ()>
where
    F: Future<Output = Result<WorkerPayload, WorkerError>> + Send + 'static,
{
    async move {
        let exit = match AssertUnwindSafe(body).catch_unwind().await {
            Ok(Ok(payload)) => {
                WorkerExit { worker_id, payload: Some(payload), error: None }
            }
            Ok(Err(err)) => {
                WorkerExit { worker_id, payload: None, error: Some(err.to_string()) }
            }
            Err(_) => WorkerExit {
                worker_id,
                payload: None,
                error: Some("worker panicked".to_string()),
            },
        };
        if exit_tx.send(exit).await.is_err() {
            tracing::warn!("coordinator gone before worker exit could be delivered");
        }
    }
    .boxed()
}

#[cfg(test)]
#[path = "worker_tests.rs"]
mod tests;
