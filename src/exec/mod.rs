// src/exec/mod.rs

//! Execution contexts.
//!
//! - [`backend`] provides the [`Executor`] trait (background + foreground
//!   contexts) that the dispatcher is written against.
//! - [`executor_loop`] owns the serialized foreground loop.
//! - [`tokio_executor`] is the default [`TokioExecutor`] built on both.

pub mod backend;
pub mod executor_loop;
pub mod tokio_executor;

pub use backend::{Executor, Job};
pub use executor_loop::{on_foreground, spawn_foreground_loop};
pub use tokio_executor::TokioExecutor;
