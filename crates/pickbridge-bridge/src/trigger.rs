// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Picker trigger: the native-facing call that asks for a file.

use std::sync::Arc;

use pickbridge_core::config::{BridgeConfig, PickerOptions};
use pickbridge_core::error::ErrorClass;
use tracing::{debug, error, info};

use crate::session::SessionSlot;
use crate::traits::UiScheduler;

/// Schedules the system file picker on the UI-owning thread.
pub struct PickerTrigger {
    request_code: i32,
    options: PickerOptions,
    sessions: Arc<SessionSlot>,
    scheduler: Arc<dyn UiScheduler>,
}

impl PickerTrigger {
    pub fn new(
        config: &BridgeConfig,
        sessions: Arc<SessionSlot>,
        scheduler: Arc<dyn UiScheduler>,
    ) -> Self {
        Self {
            request_code: config.request_code,
            options: config.picker.clone(),
            sessions,
            scheduler,
        }
    }

    /// Ask for the picker. Safe to call from any thread; never fails.
    ///
    /// With no live UI session this does nothing. Otherwise the presentation
    /// is posted to the UI thread and this returns immediately. The picker is
    /// shown by whichever session is live when the task runs.
    pub fn launch_file_picker(&self) {
        if self.sessions.current().is_none() {
            debug!("launch_file_picker with no UI session, ignoring");
            return;
        }

        let sessions = self.sessions.clone();
        let options = self.options.clone();
        let request_code = self.request_code;
        self.scheduler.post(Box::new(move || {
            let Some(session) = sessions.current() else {
                debug!("UI session ended before the picker could be shown");
                return;
            };
            match session.presenter.present(request_code, &options) {
                Ok(()) => info!(
                    session = %session.id,
                    request_code,
                    action = ?options.action,
                    "file picker presented"
                ),
                Err(e) => match e.class() {
                    ErrorClass::Diagnostic => debug!(error = %e, "file picker not presented"),
                    ErrorClass::Unexpected => error!(error = %e, "file picker not presented"),
                },
            }
        }));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::looper::UiLooper;
    use crate::test_support::{Host, RecordingPresenter};

    #[test]
    fn presentation_waits_for_the_ui_thread() {
        let host = Host::new();
        let (handle, mut looper) = UiLooper::new();
        let trigger = PickerTrigger::new(&BridgeConfig::default(), host.slot.clone(), Arc::new(handle));

        trigger.launch_file_picker();
        assert_eq!(host.presenter.count(), 0);

        looper.run_pending();
        let presented = host.presenter.presented.lock().expect("lock").clone();
        assert_eq!(presented.len(), 1);
        let (code, options) = &presented[0];
        assert_eq!(*code, 0xface);
        assert_eq!(options.mime_type, "*/*");
        assert!(options.openable);
        assert!(options.local_only);
    }

    #[test]
    fn no_session_is_a_silent_no_op() {
        let host = Host::new();
        let id = host.slot.current().expect("session").id;
        host.slot.end(id);
        let (handle, mut looper) = UiLooper::new();
        let trigger = PickerTrigger::new(&BridgeConfig::default(), host.slot.clone(), Arc::new(handle));

        trigger.launch_file_picker();

        assert_eq!(looper.run_pending(), 0);
        assert_eq!(host.presenter.count(), 0);
    }

    #[test]
    fn session_ending_before_the_task_runs() {
        let host = Host::new();
        let (handle, mut looper) = UiLooper::new();
        let trigger = PickerTrigger::new(&BridgeConfig::default(), host.slot.clone(), Arc::new(handle));

        trigger.launch_file_picker();
        let id = host.slot.current().expect("session").id;
        host.slot.end(id);

        assert_eq!(looper.run_pending(), 1);
        assert_eq!(host.presenter.count(), 0);
    }

    #[test]
    fn presenter_failure_is_swallowed() {
        let host = Host::with_presenter(RecordingPresenter {
            fail: true,
            ..RecordingPresenter::default()
        });
        let (handle, mut looper) = UiLooper::new();
        let trigger = PickerTrigger::new(&BridgeConfig::default(), host.slot.clone(), Arc::new(handle));

        trigger.launch_file_picker();
        assert_eq!(looper.run_pending(), 1);
        assert_eq!(host.presenter.count(), 1);
    }

    #[test]
    fn configured_request_code_is_used() {
        let host = Host::new();
        let (handle, mut looper) = UiLooper::new();
        let config = BridgeConfig {
            request_code: 42,
            ..BridgeConfig::default()
        };
        let trigger = PickerTrigger::new(&config, host.slot.clone(), Arc::new(handle));

        trigger.launch_file_picker();
        looper.run_pending();
        assert_eq!(host.presenter.presented.lock().expect("lock")[0].0, 42);
    }
}
