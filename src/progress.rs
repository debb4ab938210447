//! Pipeline progress reporting and cancellation.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tracing::debug;

use crate::error::{Error, Result};

/// Where a pipeline invocation currently is.
///
/// `Idle -> Deriving -> {Encrypting | Decrypting} -> Verifying -> Done | Failed`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Idle,
    Deriving,
    Encrypting,
    Decrypting,
    Verifying,
    Done,
    Failed,
}

/// A checkpoint reached by the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Progress {
    pub stage: Stage,
    /// 0..=100
    pub percent: u8,
}

/// Shared flag checked by the pipeline between stages.
///
/// Cloning yields a handle to the same flag, so one clone can be handed to
/// another thread (or a signal handler) while the pipeline holds the other.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }

    /// Returns [`Error::Cancelled`] once [`cancel`](Self::cancel) was called.
    pub fn check(&self) -> Result<()> {
        if self.is_cancelled() {
            Err(Error::Cancelled)
        } else {
            Ok(())
        }
    }
}

pub(crate) type Callback<'a> = Box<dyn FnMut(Progress) + 'a>;

/// Per-invocation tracker: polls the token and forwards checkpoints.
pub(crate) struct Tracker<'p, 'a> {
    callback: Option<&'p mut Callback<'a>>,
    cancel: Option<&'p CancelToken>,
    last: Progress,
}

impl<'p, 'a> Tracker<'p, 'a> {
    pub(crate) fn new(callback: Option<&'p mut Callback<'a>>, cancel: Option<&'p CancelToken>) -> Self {
        Self {
            callback,
            cancel,
            last: Progress {
                stage: Stage::Idle,
                percent: 0,
            },
        }
    }

    fn notify(&mut self, progress: Progress) {
        self.last = progress;
        if let Some(cb) = self.callback.as_deref_mut() {
            cb(progress);
        }
    }

    /// Polls for cancellation, then reports `stage` at `percent`.
    pub(crate) fn enter(&mut self, stage: Stage, percent: u8) -> Result<()> {
        if let Some(token) = self.cancel {
            token.check()?;
        }
        debug!(?stage, percent, "pipeline stage");
        self.notify(Progress { stage, percent });
        Ok(())
    }

    pub(crate) fn done(&mut self) {
        self.notify(Progress {
            stage: Stage::Done,
            percent: 100,
        });
    }

    /// Reports `Failed` at the last reached percentage.
    pub(crate) fn fail(&mut self) {
        let percent = self.last.percent;
        self.notify(Progress {
            stage: Stage::Failed,
            percent,
        });
    }
}
