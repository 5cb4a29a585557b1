//! Ownership of simulation threads
//!
//! Whoever starts simulated objects keeps a [`SimThreads`] and joins it once
//! the objects have been stopped.

use anyhow::{bail, Context, Result};
use log::{error, warn};
use std::thread::{self, JoinHandle};

/// Handles of every thread spawned for the simulation
#[derive(Debug, Default)]
pub struct SimThreads {
    handles: Vec<(String, JoinHandle<()>)>,
}

impl SimThreads {
    pub fn new() -> Self {
        Self::default()
    }

    /// Spawn a named thread and keep its handle for joining
    pub fn spawn<F>(&mut self, name: impl Into<String>, f: F) -> Result<()>
    where
        F: FnOnce() + Send + 'static,
    {
        let name = name.into();
        let handle = thread::Builder::new()
            .name(name.clone())
            .spawn(f)
            .with_context(|| format!("Failed to spawn thread {name}"))?;
        self.handles.push((name, handle));
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.handles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }

    /// Join every thread, reporting the ones that panicked
    ///
    /// Blocks until all threads have finished, so stop the simulated objects
    /// first.
    pub fn join_all(&mut self) -> Result<()> {
        let mut panicked = Vec::new();
        for (name, handle) in self.handles.drain(..) {
            if handle.join().is_err() {
                error!("Thread {} panicked", name);
                panicked.push(name);
            }
        }

        if !panicked.is_empty() {
            bail!("{} thread(s) panicked: {}", panicked.len(), panicked.join(", "));
        }
        Ok(())
    }
}

impl Drop for SimThreads {
    fn drop(&mut self) {
        if !self.handles.is_empty() {
            warn!(
                "Detaching {} simulation thread(s) that were never joined",
                self.handles.len()
            );
        }
    }
}
