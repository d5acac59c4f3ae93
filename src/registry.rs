//! Per-thread client registry for code that does not want to pass a [`Client`] around.
//!
//! The registry is an ordinary value: create one where the application is wired up and
//! share it (for example in an `Arc`). Each OS thread lazily gets its own client. Trace
//! entry points return [`TraceHandle`]s, which degrade to no-op handles when no client can
//! be built, so tracing never breaks the caller.

use crate::client::Client;
use crate::config::{ClientOptions, Configuration};
use crate::error::Result;
use crate::observation::{TraceAttributes, TraceHandle};
use std::collections::HashMap;
use std::future::Future;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::thread::{self, ThreadId};
use tracing::{debug, warn};

type ClientFactory = Box<dyn Fn() -> Result<Client> + Send + Sync>;

pub struct ClientRegistry {
    factory: ClientFactory,
    clients: Mutex<HashMap<ThreadId, Client>>,
}

impl ClientRegistry {
    /// Clients are built from `options` layered over the environment and `configuration`.
    pub fn new(options: ClientOptions, configuration: Configuration) -> Self {
        Self::with_factory(move || Client::with_configuration(options.clone(), &configuration))
    }

    /// Clients are built by `factory`, called at most once per thread between resets.
    pub fn with_factory<F>(factory: F) -> Self
    where
        F: Fn() -> Result<Client> + Send + Sync + 'static,
    {
        Self {
            factory: Box::new(factory),
            clients: Mutex::new(HashMap::new()),
        }
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<ThreadId, Client>> {
        self.clients.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// The calling thread's client, building it on first use.
    pub fn client(&self) -> Result<Client> {
        let thread_id = thread::current().id();
        let mut clients = self.lock();
        if let Some(client) = clients.get(&thread_id) {
            return Ok(client.clone());
        }

        let client = (self.factory)()?;
        debug!(?thread_id, "Created client for thread");
        clients.insert(thread_id, client.clone());
        Ok(client)
    }

    /// Number of threads that currently have a client.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Forget every client. Pending events of dropped clients are not flushed.
    pub fn reset(&self) {
        self.lock().clear();
    }

    /// Flush the calling thread's client, if it has one.
    pub async fn flush(&self) -> Result<()> {
        let client = self.lock().get(&thread::current().id()).cloned();
        match client {
            Some(client) => client.flush().await,
            None => Ok(()),
        }
    }

    /// Shut down and remove every client. All clients are attempted; the first error is
    /// returned.
    pub async fn shutdown(&self) -> Result<()> {
        let clients: Vec<Client> = self.lock().drain().map(|(_, client)| client).collect();

        let mut first_error = None;
        for client in clients {
            if let Err(e) = client.shutdown().await {
                warn!(error = %e, "Client shutdown failed");
                first_error.get_or_insert(e);
            }
        }
        first_error.map_or(Ok(()), Err)
    }

    /// Start a trace on the calling thread's client, or a `Null` handle if the client
    /// cannot be built.
    pub fn trace(&self, attrs: TraceAttributes) -> TraceHandle {
        match self.client() {
            Ok(client) => TraceHandle::Live(client.trace(attrs)),
            Err(e) => {
                warn!(error = %e, "Langfuse unavailable, tracing disabled for this call");
                TraceHandle::Null
            }
        }
    }

    /// Run `f` with a trace handle, then flush the client that created the trace.
    ///
    /// Flush failures are logged and never reach the caller.
    pub async fn with_trace<F, Fut, T>(&self, attrs: TraceAttributes, f: F) -> T
    where
        F: FnOnce(TraceHandle) -> Fut,
        Fut: Future<Output = T>,
    {
        let client = match self.client() {
            Ok(client) => Some(client),
            Err(e) => {
                warn!(error = %e, "Langfuse unavailable, tracing disabled for this call");
                None
            }
        };
        let handle = client
            .as_ref()
            .map_or(TraceHandle::Null, |c| TraceHandle::Live(c.trace(attrs)));

        let result = f(handle).await;

        if let Some(client) = client {
            if let Err(e) = client.flush().await {
                warn!(error = %e, "Failed to flush after traced block");
            }
        }
        result
    }
}
