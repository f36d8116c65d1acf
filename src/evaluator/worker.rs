//! Dedicated evaluator thread reachable through an async message channel.

use std::panic::{AssertUnwindSafe, catch_unwind};
use std::thread;

use anyhow::{Context, Result};
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, warn};

use super::sandbox::{SandboxOptions, evaluate_manifest};
use crate::models::{WorkerRequest, WorkerResponse};

const WORKER_NAME: &str = "manifest-evaluator";
const WORKER_STACK_BYTES: usize = 32 * 1024 * 1024;
const QUEUE_DEPTH: usize = 16;

type Job = (WorkerRequest, oneshot::Sender<WorkerResponse>);

/// Cloneable handle to the evaluator thread.
///
/// Script values never leave the thread: only source text goes in and only the JSON
/// manifest or an error message comes out. The thread exits once every handle is dropped.
#[derive(Debug, Clone)]
pub struct EvaluatorHandle {
  sender: mpsc::Sender<Job>,
}

impl EvaluatorHandle {
  /// Start the evaluator thread.
  pub fn spawn(options: SandboxOptions) -> Result<Self> {
    let (sender, receiver) = mpsc::channel(QUEUE_DEPTH);
    thread::Builder::new()
      .name(WORKER_NAME.into())
      .stack_size(WORKER_STACK_BYTES)
      .spawn(move || run_worker(receiver, options))
      .context("failed to start the evaluator thread")?;
    Ok(Self { sender })
  }

  /// Evaluate `content` and wait for the single response to this request.
  pub async fn evaluate(&self, content: impl Into<String>) -> WorkerResponse {
    let request = WorkerRequest {
      content: content.into(),
    };
    let (reply, response) = oneshot::channel();
    if self.sender.send((request, reply)).await.is_err() {
      return WorkerResponse::failed("evaluator worker is not running");
    }
    response
      .await
      .unwrap_or_else(|_| WorkerResponse::failed("evaluator worker is not running"))
  }
}

fn run_worker(mut receiver: mpsc::Receiver<Job>, options: SandboxOptions) {
  debug!("evaluator worker started");
  while let Some((request, reply)) = receiver.blocking_recv() {
    let response = handle_request(&request, &options);
    if reply.send(response).is_err() {
      debug!("evaluation result dropped; requester went away");
    }
  }
  debug!("evaluator worker stopped");
}

fn handle_request(request: &WorkerRequest, options: &SandboxOptions) -> WorkerResponse {
  let outcome = catch_unwind(AssertUnwindSafe(|| evaluate_manifest(&request.content, options)));
  match outcome {
    Ok(Ok(manifest)) => WorkerResponse::Parsed { manifest },
    Ok(Err(error)) => {
      debug!(%error, "manifest evaluation failed");
      WorkerResponse::failed(error)
    }
    Err(_) => {
      warn!("manifest evaluation panicked");
      WorkerResponse::failed("evaluator crashed while running the manifest")
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use serde_json::json;

  fn worker() -> EvaluatorHandle {
    EvaluatorHandle::spawn(SandboxOptions::default()).expect("worker should start")
  }

  #[tokio::test]
  async fn answers_each_request_once() {
    let handle = worker();
    let response = handle
      .evaluate(r#"self.__BUILD_MANIFEST = { "/b": ["b.js"], "/a": ["a.js", "a.css"], "sortedPages": ["/a", "/b"] }"#)
      .await;
    let WorkerResponse::Parsed { manifest } = response else {
      panic!("expected a manifest, got {response:?}");
    };
    assert_eq!(manifest.get("/a"), Some(&json!(["a.js", "a.css"])));

    let response = handle.evaluate("self.__BUILD_MANIFEST = 42").await;
    assert_eq!(
      response,
      WorkerResponse::failed("Manifest did not evaluate to an object.")
    );
  }

  #[tokio::test]
  async fn evaluations_do_not_leak_into_each_other() {
    let handle = worker();
    let first = handle
      .evaluate("leaked = { '/x': [] }; self.__BUILD_MANIFEST = leaked")
      .await;
    assert!(first.is_ok());

    let second = handle.evaluate("self.__BUILD_MANIFEST = leaked").await;
    assert_eq!(
      second,
      WorkerResponse::failed("ReferenceError: leaked is not defined")
    );
  }

  #[tokio::test]
  async fn unbounded_recursion_fails_cleanly() {
    let handle = worker();
    let response = handle
      .evaluate("function f(n){ return f(n + 1) } self.__BUILD_MANIFEST = f(0)")
      .await;
    assert_eq!(
      response,
      WorkerResponse::failed("RangeError: Maximum call stack size exceeded")
    );

    // The worker survives and keeps answering.
    assert!(handle.evaluate("self.__BUILD_MANIFEST = {}").await.is_ok());
  }

  #[tokio::test]
  async fn concurrent_requests_each_get_their_own_reply() {
    let handle = worker();
    let (a, b) = tokio::join!(
      handle.evaluate(r#"self.__BUILD_MANIFEST = { "/a": [] }"#),
      handle.evaluate(r#"self.__BUILD_MANIFEST = { "/b": [] }"#),
    );
    let (WorkerResponse::Parsed { manifest: a }, WorkerResponse::Parsed { manifest: b }) = (a, b) else {
      panic!("both requests should succeed");
    };
    assert!(a.get("/a").is_some() && a.get("/b").is_none());
    assert!(b.get("/b").is_some() && b.get("/a").is_none());
  }

  #[tokio::test]
  async fn deeply_nested_manifests_fail_without_killing_the_worker() {
    let handle = worker();
    let depth = 100_000;
    let content = format!(
      "self.__BUILD_MANIFEST = {{'/a': {}{}}}",
      "[".repeat(depth),
      "]".repeat(depth)
    );
    assert_eq!(
      handle.evaluate(content).await,
      WorkerResponse::failed("RangeError: Maximum call stack size exceeded")
    );

    let nested = format!(
      "var a = []; {} self.__BUILD_MANIFEST = {{ '/a': a }}",
      "a = [a];".repeat(1_000)
    );
    assert_eq!(
      handle.evaluate(nested).await,
      WorkerResponse::failed(format!("manifest nests deeper than {} levels", crate::script::MAX_JSON_DEPTH))
    );

    assert!(handle.evaluate("self.__BUILD_MANIFEST = {}").await.is_ok());
  }
}
