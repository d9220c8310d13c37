//! Background construction of large containers.
//!
//! A loader job walks a snapshot of the container on the worker pool and
//! appends finished [`BuiltNode`]s to a buffer it shares with the model.
//! The model drains that buffer when a view asks for more rows; the job
//! never touches the node graph.
//!
//! Dropping a [`LoaderHandle`] detaches the job. The worker keeps its own
//! reference to the buffer and runs to completion; whatever it produces is
//! dropped with the last reference.

use std::sync::Arc;

use parking_lot::Mutex;
use variant_tree_core::logging::targets;
use variant_tree_core::{ContainerRef, Key, PerfSpan, TaskHandle, ThreadPool, Variant};

use super::row::{RowCache, RowContext};

/// A child prepared by a loader job.
#[derive(Debug, Clone)]
pub(crate) struct BuiltNode {
    pub key: Key,
    pub value: Variant,
    pub row: RowCache,
}

#[derive(Debug, Default)]
struct LoadBuffer {
    built: Vec<BuiltNode>,
    done: bool,
}

/// Result of one drain.
#[derive(Debug)]
pub(crate) struct Drained {
    pub nodes: Vec<BuiltNode>,
    /// The job finished and everything it built is in `nodes`.
    pub done: bool,
}

/// The model's side of an in-flight loader job.
#[derive(Debug)]
pub(crate) struct LoaderHandle {
    buffer: Arc<Mutex<LoadBuffer>>,
    task: TaskHandle<usize>,
    context: RowContext,
    total: usize,
}

impl LoaderHandle {
    /// Start building the children of `container`.
    ///
    /// Rows are computed with `context`; finished children are published in
    /// batches of `batch_size`.
    pub fn spawn(pool: &ThreadPool, container: Variant, context: RowContext, batch_size: usize) -> Self {
        let total = container.container_len().unwrap_or(0);
        let batch_size = batch_size.max(1);
        let buffer = Arc::new(Mutex::new(LoadBuffer::default()));
        let job_buffer = buffer.clone();

        let task = pool.spawn(move || {
            let _perf = PerfSpan::new("background_build");
            let entries = ContainerRef::new(&container)
                .map(|c| c.entries())
                .unwrap_or_default();

            let mut produced = 0;
            let mut batch = Vec::with_capacity(batch_size);
            for (key, child) in entries {
                let row = RowCache::compute(Some(&key), child, &context);
                batch.push(BuiltNode {
                    key,
                    value: child.clone(),
                    row,
                });
                if batch.len() == batch_size {
                    produced += batch.len();
                    job_buffer.lock().built.append(&mut batch);
                }
            }
            produced += batch.len();

            let mut buffer = job_buffer.lock();
            buffer.built.append(&mut batch);
            buffer.done = true;
            produced
        });

        tracing::debug!(target: targets::LOADER, task = task.id(), total, batch_size, "loader job started");
        Self {
            buffer,
            task,
            context,
            total,
        }
    }

    /// Take everything built so far.
    pub fn drain(&self) -> Drained {
        let mut buffer = self.buffer.lock();
        let nodes = std::mem::take(&mut buffer.built);
        let done = buffer.done;
        drop(buffer);

        if done {
            tracing::debug!(
                target: targets::LOADER,
                task = self.task.id(),
                produced = self.task.try_get(),
                total = self.total,
                "loader job complete"
            );
        } else if !nodes.is_empty() {
            tracing::trace!(target: targets::LOADER, task = self.task.id(), drained = nodes.len(), "drained batch");
        }
        Drained { nodes, done }
    }

    /// The row context the job computes rows with.
    pub fn context(&self) -> RowContext {
        self.context
    }
}

impl Drop for LoaderHandle {
    fn drop(&mut self) {
        if !self.buffer.lock().done {
            tracing::debug!(target: targets::LOADER, task = self.task.id(), "loader job detached");
        }
    }
}
