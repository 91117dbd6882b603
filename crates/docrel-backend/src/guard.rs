//! DDL/DML admission control.
//!
//! A schema handler requires full exclusivity: no open data transaction
//! and no other schema handler. Data transactions only require the absence
//! of schema handlers and run freely against each other; their mutual
//! isolation is the backend's business.
//!
//! The guard is a monitor: two counters behind one mutex, one condition
//! per predicate, and a predicate re-check after every wake so a stolen
//! wakeup can never admit a caller whose predicate does not hold. Both
//! admission calls take an explicit timeout and mutate nothing when it
//! expires. Admitted callers get a handle that owns the release
//! obligation; dropping one without closing it releases the admission and
//! logs a warning, the deterministic stand-in for a finalizer safety net.

use std::time::{Duration, Instant};

use docrel_error::{DocRelError, Result};
use parking_lot::{Condvar, Mutex};
use tracing::{debug, error, warn};

/// Guard tuning knobs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GuardConfig {
    /// Timeout used by the `_default`-suffixed admission helpers.
    pub default_timeout: Duration,
}

impl Default for GuardConfig {
    fn default() -> Self {
        Self {
            default_timeout: Duration::from_secs(30),
        }
    }
}

#[derive(Debug, Default)]
struct GuardState {
    open_transactions: u32,
    open_schemas: u32,
}

impl GuardState {
    const fn transaction_ready(&self) -> bool {
        self.open_schemas == 0
    }

    const fn schema_ready(&self) -> bool {
        self.open_transactions == 0 && self.open_schemas == 0
    }
}

/// Serializes schema mutations against concurrent data transactions.
#[derive(Debug, Default)]
pub struct ConcurrentServerGuard {
    config: GuardConfig,
    state: Mutex<GuardState>,
    /// Signalled when `open_schemas` drops to zero.
    transaction_ready: Condvar,
    /// Signalled when any counter drops to zero.
    schema_ready: Condvar,
}

impl ConcurrentServerGuard {
    /// Create a guard with default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a guard with explicit configuration.
    #[must_use]
    pub fn with_config(config: GuardConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    /// Open a data transaction, blocking up to `timeout` until no schema
    /// handler is open, then materializing the transaction object through
    /// `supplier`. A supplier failure rolls the admission back before the
    /// error propagates.
    pub fn create_transaction<T>(
        &self,
        timeout: Duration,
        supplier: impl FnOnce() -> Result<T>,
    ) -> Result<TransactionHandle<'_, T>> {
        let deadline = Instant::now() + timeout;
        {
            let mut state = self.state.lock();
            while !state.transaction_ready() {
                if self
                    .transaction_ready
                    .wait_until(&mut state, deadline)
                    .timed_out()
                    && !state.transaction_ready()
                {
                    warn!(timeout_ms = millis(timeout), "transaction admission timed out");
                    return Err(DocRelError::timeout("transaction", millis(timeout)));
                }
            }
            state.open_transactions += 1;
            debug!(open_transactions = state.open_transactions, "transaction opened");
        }

        match supplier() {
            Ok(inner) => Ok(TransactionHandle {
                guard: self,
                inner: Some(inner),
            }),
            Err(e) => {
                self.notify_transaction_closed()?;
                Err(e)
            }
        }
    }

    /// Open a data transaction with the configured default timeout.
    pub fn create_transaction_default<T>(
        &self,
        supplier: impl FnOnce() -> Result<T>,
    ) -> Result<TransactionHandle<'_, T>> {
        self.create_transaction(self.config.default_timeout, supplier)
    }

    /// Open a schema handler, blocking up to `timeout` until no data
    /// transaction and no other schema handler is open.
    pub fn create_schema_handler<T>(
        &self,
        timeout: Duration,
        supplier: impl FnOnce() -> Result<T>,
    ) -> Result<SchemaHandle<'_, T>> {
        let deadline = Instant::now() + timeout;
        {
            let mut state = self.state.lock();
            while !state.schema_ready() {
                if self
                    .schema_ready
                    .wait_until(&mut state, deadline)
                    .timed_out()
                    && !state.schema_ready()
                {
                    warn!(
                        timeout_ms = millis(timeout),
                        open_transactions = state.open_transactions,
                        "schema handler admission timed out"
                    );
                    return Err(DocRelError::timeout("schema handler", millis(timeout)));
                }
            }
            state.open_schemas += 1;
            debug!("schema handler opened");
        }

        match supplier() {
            Ok(inner) => Ok(SchemaHandle {
                guard: self,
                inner: Some(inner),
            }),
            Err(e) => {
                self.notify_schema_handler_closed()?;
                Err(e)
            }
        }
    }

    /// Open a schema handler with the configured default timeout.
    pub fn create_schema_handler_default<T>(
        &self,
        supplier: impl FnOnce() -> Result<T>,
    ) -> Result<SchemaHandle<'_, T>> {
        self.create_schema_handler(self.config.default_timeout, supplier)
    }

    /// Record a transaction as closed and wake blocked waiters. Fails with
    /// an illegal-state error when no transaction is open.
    pub fn notify_transaction_closed(&self) -> Result<()> {
        let mut state = self.state.lock();
        if state.open_transactions == 0 {
            return Err(DocRelError::illegal_state(
                "notify_transaction_closed with no open transaction",
            ));
        }
        state.open_transactions -= 1;
        debug!(open_transactions = state.open_transactions, "transaction closed");
        if state.schema_ready() {
            self.schema_ready.notify_all();
        }
        Ok(())
    }

    /// Record a schema handler as closed and wake blocked waiters. Fails
    /// with an illegal-state error when no schema handler is open.
    pub fn notify_schema_handler_closed(&self) -> Result<()> {
        let mut state = self.state.lock();
        if state.open_schemas == 0 {
            return Err(DocRelError::illegal_state(
                "notify_schema_handler_closed with no open schema handler",
            ));
        }
        state.open_schemas -= 1;
        debug!("schema handler closed");
        // Everyone's predicate may hold now.
        self.transaction_ready.notify_all();
        if state.schema_ready() {
            self.schema_ready.notify_all();
        }
        Ok(())
    }
}

fn millis(timeout: Duration) -> u64 {
    u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX)
}

/// An admitted data transaction. Owns the release obligation.
#[derive(Debug)]
pub struct TransactionHandle<'g, T> {
    guard: &'g ConcurrentServerGuard,
    inner: Option<T>,
}

impl<T> TransactionHandle<'_, T> {
    /// The transaction object produced by the supplier.
    #[must_use]
    pub fn get(&self) -> &T {
        self.inner.as_ref().expect("handle accessed after close")
    }

    /// The transaction object, mutably.
    pub fn get_mut(&mut self) -> &mut T {
        self.inner.as_mut().expect("handle accessed after close")
    }

    /// Release the admission and return the inner transaction object.
    pub fn close(mut self) -> Result<T> {
        let inner = self.inner.take().expect("handle closed twice");
        self.guard.notify_transaction_closed()?;
        Ok(inner)
    }
}

impl<T> Drop for TransactionHandle<'_, T> {
    fn drop(&mut self) {
        if self.inner.take().is_some() {
            warn!("transaction handle dropped without close; releasing admission");
            if let Err(e) = self.guard.notify_transaction_closed() {
                error!(error = %e, "transaction release on drop failed");
            }
        }
    }
}

/// An admitted schema handler. Owns the release obligation.
#[derive(Debug)]
pub struct SchemaHandle<'g, T> {
    guard: &'g ConcurrentServerGuard,
    inner: Option<T>,
}

impl<T> SchemaHandle<'_, T> {
    /// The schema handler object produced by the supplier.
    #[must_use]
    pub fn get(&self) -> &T {
        self.inner.as_ref().expect("handle accessed after close")
    }

    /// The schema handler object, mutably.
    pub fn get_mut(&mut self) -> &mut T {
        self.inner.as_mut().expect("handle accessed after close")
    }

    /// Release the admission and return the inner object.
    pub fn close(mut self) -> Result<T> {
        let inner = self.inner.take().expect("handle closed twice");
        self.guard.notify_schema_handler_closed()?;
        Ok(inner)
    }
}

impl<T> Drop for SchemaHandle<'_, T> {
    fn drop(&mut self) {
        if self.inner.take().is_some() {
            warn!("schema handle dropped without close; releasing admission");
            if let Err(e) = self.guard.notify_schema_handler_closed() {
                error!(error = %e, "schema release on drop failed");
            }
        }
    }
}
