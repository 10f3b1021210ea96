// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Task queue for the UI-owning thread.
//
// Any thread may post through a `LooperHandle`; only the thread that owns the
// `UiLooper` runs the tasks, in posting order. The host either drains it from
// its own UI loop with `run_pending`, or gives it a dedicated thread with
// `UiLooper::spawn`. A host whose UI thread only runs on demand attaches a
// wake hook with `LooperHandle::with_wake`; it fires after every post.

use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;
use std::thread::JoinHandle;

use tokio::sync::mpsc;
use tracing::{debug, error};

use crate::panic_message;
use crate::traits::{UiScheduler, UiTask};

type Wake = Arc<dyn Fn() + Send + Sync>;

/// Posting side of the UI queue. Cheap to clone.
#[derive(Clone)]
pub struct LooperHandle {
    tx: mpsc::UnboundedSender<UiTask>,
    wake: Option<Wake>,
}

impl LooperHandle {
    /// Call `wake` after each task is queued, so the UI thread knows to run
    /// `run_pending`.
    pub fn with_wake(mut self, wake: impl Fn() + Send + Sync + 'static) -> Self {
        self.wake = Some(Arc::new(wake));
        self
    }
}

impl UiScheduler for LooperHandle {
    fn post(&self, task: UiTask) {
        if self.tx.send(task).is_err() {
            debug!("UI looper has shut down, dropping posted task");
            return;
        }
        if let Some(wake) = &self.wake {
            wake();
        }
    }
}

/// Receiving side of the UI queue, owned by the UI thread.
pub struct UiLooper {
    rx: mpsc::UnboundedReceiver<UiTask>,
}

impl UiLooper {
    pub fn new() -> (LooperHandle, UiLooper) {
        let (tx, rx) = mpsc::unbounded_channel();
        (LooperHandle { tx, wake: None }, UiLooper { rx })
    }

    /// Run a dedicated UI thread until every handle is dropped.
    pub fn spawn(name: &str) -> std::io::Result<(LooperHandle, JoinHandle<()>)> {
        let (handle, looper) = Self::new();
        let join = std::thread::Builder::new()
            .name(name.to_string())
            .spawn(move || looper.run())?;
        Ok((handle, join))
    }

    /// Run every task queued so far without waiting. Returns how many ran.
    pub fn run_pending(&mut self) -> usize {
        let mut ran = 0;
        while let Ok(task) = self.rx.try_recv() {
            run_task(task);
            ran += 1;
        }
        ran
    }

    /// Block on the queue until all handles are gone.
    ///
    /// Must not be called from inside an async runtime.
    pub fn run(mut self) {
        while let Some(task) = self.rx.blocking_recv() {
            run_task(task);
        }
        debug!("UI looper drained, all handles dropped");
    }
}

// A panicking task must not take the UI thread down with it.
fn run_task(task: UiTask) {
    if let Err(payload) = catch_unwind(AssertUnwindSafe(task)) {
        error!(panic = %panic_message(payload.as_ref()), "UI task panicked");
    }
}
