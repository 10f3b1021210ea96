// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>

//! pickbridge — file-acquisition bridge between a host UI and a native
//! runtime.
//!
//! Native code calls [`PickBridge::launch_file_picker`]; the host later hands
//! the picker's result to [`PickBridge::on_activity_result`], which copies the
//! chosen content into the app cache and sends the copy's path down the
//! native callback. Cancellation and failure both look like silence from the
//! native side.
//!
//! Host specifics sit behind the traits in [`traits`]: Android implements
//! them over JNI, desktop builds over the filesystem.

pub mod channel;
pub mod logging;
pub mod looper;
pub mod resolver;
pub mod session;
pub mod stub;
pub mod traits;
pub mod trigger;

#[cfg(target_os = "android")]
pub mod android;

#[cfg(feature = "desktop-dialog")]
pub mod desktop;

#[cfg(test)]
mod test_support;

use std::any::Any;
use std::sync::Arc;

use pickbridge_core::config::BridgeConfig;
use pickbridge_core::error::Result;
use pickbridge_core::types::{ActivityResult, ResolveOutcome, SessionId};

use crate::resolver::SelectionResolver;
use crate::session::{SessionSlot, UiSession};
use crate::traits::{NativeCallback, PickerPresenter, UiScheduler};
use crate::trigger::PickerTrigger;

/// The assembled bridge: one trigger and one resolver sharing a session slot.
pub struct PickBridge {
    config: BridgeConfig,
    sessions: Arc<SessionSlot>,
    trigger: PickerTrigger,
    resolver: SelectionResolver,
}

impl PickBridge {
    /// Wire a bridge around the host's UI scheduler and the native callback.
    pub fn new(
        config: BridgeConfig,
        scheduler: Arc<dyn UiScheduler>,
        callback: Arc<dyn NativeCallback>,
    ) -> Result<Self> {
        config.validate()?;
        let sessions = Arc::new(SessionSlot::new());
        let trigger = PickerTrigger::new(&config, sessions.clone(), scheduler);
        let resolver = SelectionResolver::new(&config, sessions.clone(), callback);
        tracing::debug!(request_code = config.request_code, "pick bridge created");
        Ok(Self {
            config,
            sessions,
            trigger,
            resolver,
        })
    }

    pub fn config(&self) -> &BridgeConfig {
        &self.config
    }

    pub fn sessions(&self) -> &Arc<SessionSlot> {
        &self.sessions
    }

    /// The host's UI came up.
    pub fn begin_session(&self, session: UiSession) -> SessionId {
        self.sessions.begin(session)
    }

    /// The host's UI went away.
    pub fn end_session(&self, id: SessionId) {
        self.sessions.end(id)
    }

    /// Native entry point: ask the user for a file.
    pub fn launch_file_picker(&self) {
        self.trigger.launch_file_picker()
    }

    /// Host entry point: a picker (or unrelated) activity finished.
    pub fn on_activity_result(&self, result: ActivityResult) -> ResolveOutcome {
        self.resolver.on_activity_result(result)
    }
}

/// The picker presenter for the target operating system.
pub fn platform_presenter() -> Result<Arc<dyn PickerPresenter>> {
    #[cfg(target_os = "android")]
    {
        // Android: startActivityForResult through jni-rs.
        Ok(Arc::new(android::AndroidPicker::from_context()?))
    }
    #[cfg(not(target_os = "android"))]
    {
        // DESKTOP/CI: nothing to present without a host UI.
        Ok(Arc::new(stub::StubPicker))
    }
}

/// Best-effort text of a caught panic payload.
pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}
