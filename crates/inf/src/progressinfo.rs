//! Progress reporting for long running computations.
//! A computation calls [`ProgressNotification::reset`] with the amount of work and then
//! [`ProgressNotification::tick`] for every finished unit of work.
//! Returning an error from `tick` stops the computation.

use std::sync::atomic::{AtomicU64, Ordering};

use crate::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComputationStatus {
    Continue,
    Abort,
}

pub trait ProgressNotification {
    /// Start a new computation with the given amount of work units
    fn reset(&self, total: u64);
    /// Notify that a unit of work has been finished
    /// Returns [`Error::Cancelled`] when the computation should be stopped
    fn tick(&self) -> Result;
}

impl<T: ProgressNotification + ?Sized> ProgressNotification for &T {
    fn reset(&self, total: u64) {
        (**self).reset(total)
    }

    fn tick(&self) -> Result {
        (**self).tick()
    }
}

/// Progress that discards all notifications
#[derive(Debug, Default, Clone, Copy)]
pub struct DummyProgress;

impl ProgressNotification for DummyProgress {
    fn reset(&self, _total: u64) {}

    fn tick(&self) -> Result {
        Ok(())
    }
}

/// Progress that invokes a callback with the progress fraction in the [0, 1] range.
/// Block ticks carry no payload.
pub struct CallbackProgress<TPayload, F>
where
    F: Fn(f64, Option<&TPayload>) -> ComputationStatus,
{
    callback: F,
    current: AtomicU64,
    total: AtomicU64,
    _payload: std::marker::PhantomData<TPayload>,
}

impl<TPayload, F> CallbackProgress<TPayload, F>
where
    F: Fn(f64, Option<&TPayload>) -> ComputationStatus,
{
    pub fn with_cb(callback: F) -> Self {
        CallbackProgress {
            callback,
            current: AtomicU64::new(0),
            total: AtomicU64::new(0),
            _payload: std::marker::PhantomData,
        }
    }

    fn advance(&self) -> f64 {
        let current = self.current.fetch_add(1, Ordering::Relaxed) + 1;
        let total = self.total.load(Ordering::Relaxed);
        if total == 0 {
            return 1.0;
        }

        (current.min(total) as f64) / total as f64
    }

    fn notify(&self, fraction: f64) -> Result {
        match (self.callback)(fraction, None) {
            ComputationStatus::Continue => Ok(()),
            ComputationStatus::Abort => Err(Error::Cancelled),
        }
    }
}

impl<TPayload, F> ProgressNotification for CallbackProgress<TPayload, F>
where
    F: Fn(f64, Option<&TPayload>) -> ComputationStatus,
{
    fn reset(&self, total: u64) {
        self.current.store(0, Ordering::Relaxed);
        self.total.store(total, Ordering::Relaxed);
    }

    fn tick(&self) -> Result {
        let fraction = self.advance();
        self.notify(fraction)
    }
}
