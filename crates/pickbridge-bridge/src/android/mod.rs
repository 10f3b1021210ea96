// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Android host glue via JNI.
//
// Requires the Android NDK and targets `aarch64-linux-android` or
// `armv7-linux-androideabi`. The hosting Activity comes from
// `ndk_context::android_context()`, which the NativeActivity glue sets up.
//
// ## Architecture notes
//
// The bridge needs three things from the Java side:
//
// - a `ContentResolver` for display names and input streams
//   (`AndroidContentResolver`),
// - `startActivityForResult` with a picker Intent (`AndroidPicker`),
// - the activity result. The host Activity declares
//   `native void nativeActivityResult(int requestCode, int resultCode, Intent data)`
//   and calls it from `onActivityResult`; `attach` registers the Rust
//   implementation on the Activity's class.
//
// UI work runs on the Java main thread, never on the `android_main` thread.
// `AndroidHost::ui_scheduler` queues tasks and then calls the Activity's
// `void requestUiDrain()`, which must do
// `new Handler(Looper.getMainLooper()).post(this::nativeDrainUi)`.
// `nativeDrainUi` is registered by `attach` and runs everything queued.

#![cfg(target_os = "android")]

use std::ffi::c_void;
use std::io::Read;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::path::PathBuf;
use std::sync::{Arc, Mutex, RwLock, Weak};

use jni::errors::Result as JniResult;
use jni::objects::{GlobalRef, JObject, JString, JValue};
use jni::sys::{JNI_TRUE, jint, jobject, jsize};
use jni::{JNIEnv, JavaVM, NativeMethod};

use pickbridge_core::config::PickerOptions;
use pickbridge_core::error::{PickBridgeError, Result};
use pickbridge_core::types::{ActivityOutcome, ActivityResult, SelectionHandle};

use crate::PickBridge;
use crate::looper::{LooperHandle, UiLooper};
use crate::session::{AppDirs, UiSession};
use crate::traits::{ContentResolver, PickerPresenter};

/// Name of the native method the host Activity declares.
pub const ACTIVITY_RESULT_METHOD: &str = "nativeActivityResult";
const ACTIVITY_RESULT_SIG: &str = "(IILandroid/content/Intent;)V";

/// Java method the host Activity implements by posting `nativeDrainUi` to
/// the main looper.
pub const REQUEST_UI_DRAIN_METHOD: &str = "requestUiDrain";
/// Native method that runs queued UI tasks on the Java main thread.
pub const UI_DRAIN_METHOD: &str = "nativeDrainUi";

/// `OpenableColumns.DISPLAY_NAME`.
const DISPLAY_NAME_COLUMN: &str = "_display_name";

/// Largest single `InputStream.read` we ask the JVM for.
const JAVA_READ_CHUNK: usize = 32 * 1024;

/// Bridge that receives `nativeActivityResult` calls. Held weakly so the
/// Java side cannot keep the bridge alive.
static BRIDGE: RwLock<Option<Weak<PickBridge>>> = RwLock::new(None);

/// Queue drained by `nativeDrainUi`. Replaced by each `ui_scheduler` call.
static UI_LOOPER: Mutex<Option<UiLooper>> = Mutex::new(None);

// ---------------------------------------------------------------------------
// JNI bootstrap helpers
// ---------------------------------------------------------------------------

/// Convenience: map any `jni::errors::Error` into `PickBridgeError::Bridge`.
fn jni_err(context: &str, e: jni::errors::Error) -> PickBridgeError {
    PickBridgeError::Bridge(format!("{context}: {e}"))
}

/// Clear a pending Java exception so the next JNI call is legal.
fn clear_exception(env: &mut JNIEnv<'_>) {
    if env.exception_check().unwrap_or(false) {
        let _ = env.exception_describe();
        let _ = env.exception_clear();
    }
}

/// Run `f` with an attached `JNIEnv` inside its own local reference frame.
///
/// Attaching is a no-op when the thread is already attached. The local frame
/// keeps long-lived native threads from accumulating local references.
fn with_env<R>(
    vm: &JavaVM,
    context: &str,
    f: impl FnOnce(&mut JNIEnv) -> JniResult<R>,
) -> Result<R> {
    let mut env = vm
        .attach_current_thread()
        .map_err(|e| jni_err("attach_current_thread", e))?;
    let result = env.with_local_frame(16, f);
    result.map_err(|e| {
        clear_exception(&mut env);
        jni_err(context, e)
    })
}

/// The `JavaVM` recorded by the NDK glue.
fn context_vm() -> Result<JavaVM> {
    let ctx = ndk_context::android_context();
    // SAFETY: `ctx.vm()` returns the `JavaVM*` set by the NDK glue code.
    // The pointer is valid for the lifetime of the process.
    unsafe { JavaVM::from_raw(ctx.vm().cast()) }.map_err(|e| jni_err("JavaVM::from_raw", e))
}

/// The hosting Activity as a raw `jobject`.
fn context_activity() -> Result<jobject> {
    let ptr = ndk_context::android_context().context();
    if ptr.is_null() {
        return Err(PickBridgeError::Bridge(
            "Android context is null — native activity not initialised".into(),
        ));
    }
    Ok(ptr.cast())
}

fn file_path(env: &mut JNIEnv<'_>, file: &JObject<'_>) -> JniResult<PathBuf> {
    let path = env
        .call_method(file, "getAbsolutePath", "()Ljava/lang/String;", &[])?
        .l()?;
    let path: String = env.get_string(&JString::from(path))?.into();
    Ok(PathBuf::from(path))
}

fn parse_uri<'local>(env: &mut JNIEnv<'local>, uri: &str) -> JniResult<JObject<'local>> {
    let j_uri = env.new_string(uri)?;
    env.call_static_method(
        "android/net/Uri",
        "parse",
        "(Ljava/lang/String;)Landroid/net/Uri;",
        &[JValue::Object(&j_uri)],
    )?
    .l()
}

// ---------------------------------------------------------------------------
// Host handle
// ---------------------------------------------------------------------------

/// The JVM plus a global reference to the hosting Activity.
pub struct AndroidHost {
    vm: Arc<JavaVM>,
    activity: GlobalRef,
}

impl AndroidHost {
    /// Build from the NDK context. Fails before the NativeActivity is up.
    pub fn from_context() -> Result<Self> {
        let vm = context_vm()?;
        let raw = context_activity()?;
        let activity = with_env(&vm, "NewGlobalRef(activity)", |env| {
            // SAFETY: the NDK guarantees this pointer is a valid global
            // jobject for the hosting Activity.
            let obj = unsafe { JObject::from_raw(raw) };
            env.new_global_ref(&obj)
        })?;
        Ok(Self {
            vm: Arc::new(vm),
            activity,
        })
    }

    /// `getCacheDir()` and `getFilesDir()` of the Activity.
    pub fn app_dirs(&self) -> Result<AppDirs> {
        let activity = &self.activity;
        with_env(&self.vm, "app dirs", |env| {
            let cache = env
                .call_method(activity, "getCacheDir", "()Ljava/io/File;", &[])?
                .l()?;
            let files = env
                .call_method(activity, "getFilesDir", "()Ljava/io/File;", &[])?
                .l()?;
            Ok(AppDirs {
                cache_dir: file_path(env, &cache)?,
                files_dir: file_path(env, &files)?,
            })
        })
    }

    pub fn content_resolver(&self) -> Result<AndroidContentResolver> {
        let activity = &self.activity;
        let resolver = with_env(&self.vm, "getContentResolver", |env| {
            let resolver = env
                .call_method(
                    activity,
                    "getContentResolver",
                    "()Landroid/content/ContentResolver;",
                    &[],
                )?
                .l()?;
            env.new_global_ref(&resolver)
        })?;
        if resolver.as_obj().is_null() {
            return Err(PickBridgeError::Bridge("activity has no ContentResolver".into()));
        }
        Ok(AndroidContentResolver {
            vm: self.vm.clone(),
            resolver,
        })
    }

    /// Scheduler that runs tasks on the Java main thread.
    ///
    /// Each post queues the task and calls the Activity's `requestUiDrain`,
    /// which bounces to the main thread and back into `nativeDrainUi`.
    pub fn ui_scheduler(&self) -> LooperHandle {
        let (handle, looper) = UiLooper::new();
        if let Ok(mut slot) = UI_LOOPER.lock() {
            *slot = Some(looper);
        }
        let vm = self.vm.clone();
        let activity = self.activity.clone();
        handle.with_wake(move || {
            let requested = with_env(&vm, "requestUiDrain", |env| {
                env.call_method(&activity, REQUEST_UI_DRAIN_METHOD, "()V", &[])
                    .map(|_| ())
            });
            if let Err(e) = requested {
                tracing::error!(error = %e, "Android: could not schedule UI drain");
            }
        })
    }

    pub fn picker(&self) -> AndroidPicker {
        AndroidPicker {
            vm: self.vm.clone(),
            activity: self.activity.clone(),
        }
    }

    /// A UI session backed by this Activity.
    pub fn session(&self) -> Result<UiSession> {
        Ok(UiSession::new(
            self.app_dirs()?,
            Arc::new(self.picker()),
            Arc::new(self.content_resolver()?),
        ))
    }
}

// ---------------------------------------------------------------------------
// ContentResolver — android.content.ContentResolver
// ---------------------------------------------------------------------------

/// Content resolution through the Activity's `ContentResolver`.
pub struct AndroidContentResolver {
    vm: Arc<JavaVM>,
    resolver: GlobalRef,
}

impl ContentResolver for AndroidContentResolver {
    /// `query(uri, [DISPLAY_NAME], null, null, null)` and read the first row.
    fn display_name(&self, handle: &SelectionHandle) -> Result<Option<String>> {
        let resolver = &self.resolver;
        with_env(&self.vm, "ContentResolver.query", |env| {
            let uri = parse_uri(env, handle.uri())?;
            let column = env.new_string(DISPLAY_NAME_COLUMN)?;
            let projection =
                env.new_object_array(1 as jsize, "java/lang/String", &column)?;
            let null = JObject::null();
            let cursor = env
                .call_method(
                    resolver,
                    "query",
                    "(Landroid/net/Uri;[Ljava/lang/String;Ljava/lang/String;[Ljava/lang/String;Ljava/lang/String;)Landroid/database/Cursor;",
                    &[
                        JValue::Object(&uri),
                        JValue::Object(&projection),
                        JValue::Object(&null),
                        JValue::Object(&null),
                        JValue::Object(&null),
                    ],
                )?
                .l()?;
            if cursor.is_null() {
                return Ok(None);
            }
            let name = first_string(env, &cursor);
            // The cursor is closed whether or not the read worked.
            let closed = env.call_method(&cursor, "close", "()V", &[]);
            let name = name?;
            closed?;
            Ok(name)
        })
    }

    /// `openInputStream(uri)`, wrapped as a blocking `Read`.
    fn open_read(&self, handle: &SelectionHandle) -> Result<Box<dyn Read + Send>> {
        let resolver = &self.resolver;
        let stream = with_env(&self.vm, "ContentResolver.openInputStream", |env| {
            let uri = parse_uri(env, handle.uri())?;
            let stream = env
                .call_method(
                    resolver,
                    "openInputStream",
                    "(Landroid/net/Uri;)Ljava/io/InputStream;",
                    &[JValue::Object(&uri)],
                )?
                .l()?;
            if stream.is_null() {
                return Ok(None);
            }
            Ok(Some(env.new_global_ref(&stream)?))
        })
        .map_err(|e| {
            tracing::debug!(uri = %handle, error = %e, "openInputStream failed");
            PickBridgeError::ContentUnavailable {
                uri: handle.uri().to_string(),
            }
        })?;

        let stream = stream.ok_or_else(|| PickBridgeError::ContentUnavailable {
            uri: handle.uri().to_string(),
        })?;
        Ok(Box::new(JavaInputStream {
            vm: self.vm.clone(),
            stream,
        }))
    }
}

fn first_string(env: &mut JNIEnv<'_>, cursor: &JObject<'_>) -> JniResult<Option<String>> {
    if !env.call_method(cursor, "moveToFirst", "()Z", &[])?.z()? {
        return Ok(None);
    }
    let value = env
        .call_method(cursor, "getString", "(I)Ljava/lang/String;", &[JValue::Int(0)])?
        .l()?;
    if value.is_null() {
        return Ok(None);
    }
    Ok(Some(env.get_string(&JString::from(value))?.into()))
}

/// A `java.io.InputStream` read from Rust. Closed on drop.
struct JavaInputStream {
    vm: Arc<JavaVM>,
    stream: GlobalRef,
}

impl Read for JavaInputStream {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        if buf.is_empty() {
            return Ok(0);
        }
        let want = buf.len().min(JAVA_READ_CHUNK) as jint;
        let stream = &self.stream;
        let chunk = with_env(&self.vm, "InputStream.read", |env| {
            let array = env.new_byte_array(want)?;
            let n = env
                .call_method(
                    stream,
                    "read",
                    "([BII)I",
                    &[JValue::Object(&array), JValue::Int(0), JValue::Int(want)],
                )?
                .i()?;
            // -1 is end of stream.
            if n <= 0 {
                return Ok(Vec::new());
            }
            let mut bytes = vec![0i8; n as usize];
            env.get_byte_array_region(&array, 0, &mut bytes)?;
            Ok(bytes)
        })
        .map_err(|e| std::io::Error::other(e.to_string()))?;

        for (dst, src) in buf.iter_mut().zip(&chunk) {
            *dst = *src as u8;
        }
        Ok(chunk.len())
    }
}

impl Drop for JavaInputStream {
    fn drop(&mut self) {
        let stream = &self.stream;
        if let Err(e) = with_env(&self.vm, "InputStream.close", |env| {
            env.call_method(stream, "close", "()V", &[]).map(|_| ())
        }) {
            tracing::debug!(error = %e, "failed to close content stream");
        }
    }
}

// ---------------------------------------------------------------------------
// PickerPresenter — Intent + startActivityForResult
// ---------------------------------------------------------------------------

/// Launches the system picker from the hosting Activity.
pub struct AndroidPicker {
    vm: Arc<JavaVM>,
    activity: GlobalRef,
}

impl AndroidPicker {
    pub fn from_context() -> Result<Self> {
        Ok(AndroidHost::from_context()?.picker())
    }
}

impl PickerPresenter for AndroidPicker {
    /// Build the picker Intent and dispatch it with `startActivityForResult`.
    ///
    /// The chosen URI arrives later through `nativeActivityResult`.
    fn present(&self, request_code: i32, options: &PickerOptions) -> Result<()> {
        let activity = &self.activity;
        tracing::info!(
            action = options.action.intent_action(),
            mime = %options.mime_type,
            "Android: launching file picker"
        );

        with_env(&self.vm, "startActivityForResult(picker)", |env| {
            let j_action = env.new_string(options.action.intent_action())?;
            let intent = env.new_object(
                "android/content/Intent",
                "(Ljava/lang/String;)V",
                &[JValue::Object(&j_action)],
            )?;

            let j_mime = env.new_string(&options.mime_type)?;
            env.call_method(
                &intent,
                "setType",
                "(Ljava/lang/String;)Landroid/content/Intent;",
                &[JValue::Object(&j_mime)],
            )?;

            if options.openable {
                let j_category = env.new_string("android.intent.category.OPENABLE")?;
                env.call_method(
                    &intent,
                    "addCategory",
                    "(Ljava/lang/String;)Landroid/content/Intent;",
                    &[JValue::Object(&j_category)],
                )?;
            }

            if options.local_only {
                let j_extra = env.new_string("android.intent.extra.LOCAL_ONLY")?;
                env.call_method(
                    &intent,
                    "putExtra",
                    "(Ljava/lang/String;Z)Landroid/content/Intent;",
                    &[JValue::Object(&j_extra), JValue::Bool(JNI_TRUE)],
                )?;
            }

            env.call_method(
                activity,
                "startActivityForResult",
                "(Landroid/content/Intent;I)V",
                &[JValue::Object(&intent), JValue::Int(request_code)],
            )?;
            Ok(())
        })?;

        tracing::info!(request_code, "Android: picker dispatched, awaiting onActivityResult");
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Activity result hook
// ---------------------------------------------------------------------------

/// Route the host Activity's `nativeActivityResult` into `bridge`.
///
/// Installs logging, registers `nativeActivityResult` and `nativeDrainUi` on
/// the Activity's class and remembers the bridge weakly. Calling it again
/// re-targets the hook.
pub fn attach(bridge: &Arc<PickBridge>, host: &AndroidHost) -> Result<()> {
    crate::logging::init();

    let activity = &host.activity;
    with_env(&host.vm, "RegisterNatives", |env| {
        let class = env.get_object_class(activity)?;
        let methods = [
            NativeMethod {
                name: ACTIVITY_RESULT_METHOD.into(),
                sig: ACTIVITY_RESULT_SIG.into(),
                fn_ptr: native_activity_result as *mut c_void,
            },
            NativeMethod {
                name: UI_DRAIN_METHOD.into(),
                sig: "()V".into(),
                fn_ptr: native_drain_ui as *mut c_void,
            },
        ];
        env.register_native_methods(&class, &methods)
    })?;

    if let Ok(mut slot) = BRIDGE.write() {
        *slot = Some(Arc::downgrade(bridge));
    }
    tracing::info!(method = ACTIVITY_RESULT_METHOD, "Android: activity result hook registered");
    Ok(())
}

fn attached_bridge() -> Option<Arc<PickBridge>> {
    BRIDGE
        .read()
        .ok()
        .and_then(|slot| slot.as_ref().and_then(Weak::upgrade))
}

/// `Intent.getData().toString()`, if there is one.
fn intent_uri(env: &mut JNIEnv<'_>, data: &JObject<'_>) -> JniResult<Option<String>> {
    if data.is_null() {
        return Ok(None);
    }
    let uri = env
        .call_method(data, "getData", "()Landroid/net/Uri;", &[])?
        .l()?;
    if uri.is_null() {
        return Ok(None);
    }
    let text = env
        .call_method(&uri, "toString", "()Ljava/lang/String;", &[])?
        .l()?;
    if text.is_null() {
        return Ok(None);
    }
    Ok(Some(env.get_string(&JString::from(text))?.into()))
}

extern "system" fn native_activity_result<'local>(
    mut env: JNIEnv<'local>,
    _this: JObject<'local>,
    request_code: jint,
    result_code: jint,
    data: JObject<'local>,
) {
    let uri = match intent_uri(&mut env, &data) {
        Ok(uri) => uri,
        Err(e) => {
            clear_exception(&mut env);
            tracing::debug!(error = %e, "could not read activity result data");
            None
        }
    };

    let Some(bridge) = attached_bridge() else {
        tracing::debug!(request_code, "activity result with no bridge attached");
        return;
    };

    let result = ActivityResult {
        request_code,
        outcome: ActivityOutcome::from_code(result_code),
        handle: uri.map(SelectionHandle::new),
    };
    // Unwinding into the JVM would abort the process.
    if catch_unwind(AssertUnwindSafe(|| bridge.on_activity_result(result))).is_err() {
        tracing::error!("activity result handler panicked");
    }
}

extern "system" fn native_drain_ui<'local>(_env: JNIEnv<'local>, _this: JObject<'local>) {
    // A drain requested from inside a running task finds the queue busy; the
    // outer drain picks the new task up before it returns.
    let drained = catch_unwind(|| match UI_LOOPER.try_lock() {
        Ok(mut slot) => slot.as_mut().map_or(0, UiLooper::run_pending),
        Err(_) => 0,
    });
    match drained {
        Ok(ran) => tracing::trace!(ran, "Android: UI queue drained"),
        Err(_) => tracing::error!("UI drain panicked"),
    }
}
