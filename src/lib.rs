#![doc = include_str!("../README.md")]
#![warn(missing_docs)]

pub mod app;
pub mod cli;
pub mod clipboard;
pub mod config;
pub mod evaluator;
pub mod extract;
pub mod fetch;
pub mod models;
pub mod script;

pub use app::ManifestApp;
pub use config::InspectorConfig;
pub use evaluator::{EvaluatorHandle, evaluate_manifest};
pub use extract::{RouteRules, RouteTable};
pub use models::{Manifest, WorkerRequest, WorkerResponse};
