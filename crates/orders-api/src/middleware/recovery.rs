//! # Panic Recovery
//!
//! Catches a panic raised anywhere below this layer, logs it with the
//! panic-site backtrace, and answers `500`. The request is not replayed and
//! the worker keeps serving other connections.
//!
//! The backtrace is captured by a process-wide panic hook into a
//! thread-local slot. The panicking future is polled on the same thread as
//! `catch_unwind`, so the middleware reads the slot right after the unwind.

use std::any::Any;
use std::backtrace::Backtrace;
use std::cell::RefCell;
use std::error::Error as StdError;
use std::panic::AssertUnwindSafe;
use std::sync::Once;

use axum::extract::{Request, State};
use axum::http::StatusCode;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use axum::Json;
use futures::FutureExt;
use thiserror::Error;

use crate::error::ErrorBody;

/// How much of a recovered panic is disclosed to the client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RecoveryMode {
    /// Panic message and stack in `error.details`.
    Debug,
    /// Generic message only.
    #[default]
    Release,
}

/// A panic payload normalized into an error value.
#[derive(Error, Debug)]
pub enum RecoveredPanic {
    /// The handler panicked with an error value; passed through.
    #[error("{0}")]
    Error(Box<dyn StdError + Send + Sync + 'static>),

    #[error("panic: {0}")]
    Message(String),

    #[error("panic: <non-textual payload>")]
    Opaque,
}

impl RecoveredPanic {
    pub fn from_payload(payload: Box<dyn Any + Send + 'static>) -> Self {
        let payload = match payload.downcast::<Box<dyn StdError + Send + Sync + 'static>>() {
            Ok(err) => return Self::Error(*err),
            Err(other) => other,
        };
        let payload = match payload.downcast::<String>() {
            Ok(msg) => return Self::Message(*msg),
            Err(other) => other,
        };
        match payload.downcast::<&'static str>() {
            Ok(msg) => Self::Message((*msg).to_string()),
            Err(_) => Self::Opaque,
        }
    }
}

thread_local! {
    static PANIC_BACKTRACE: RefCell<Option<String>> = const { RefCell::new(None) };
}

static HOOK: Once = Once::new();

/// Install the backtrace-capturing panic hook. Idempotent. The previous
/// hook still runs afterwards.
pub fn install_panic_hook() {
    HOOK.call_once(|| {
        let previous = std::panic::take_hook();
        std::panic::set_hook(Box::new(move |info| {
            let trace = Backtrace::force_capture().to_string();
            PANIC_BACKTRACE.with(|slot| *slot.borrow_mut() = Some(trace));
            previous(info);
        }));
    });
}

fn take_backtrace() -> String {
    PANIC_BACKTRACE
        .with(|slot| slot.borrow_mut().take())
        .unwrap_or_else(|| Backtrace::force_capture().to_string())
}

/// Outermost handler-side layer: converts panics into `500` responses.
pub async fn recovery_middleware(
    State(mode): State<RecoveryMode>,
    request: Request,
    next: Next,
) -> Response {
    let method = request.method().clone();
    let path = request.uri().path().to_owned();

    match AssertUnwindSafe(next.run(request)).catch_unwind().await {
        Ok(response) => response,
        Err(payload) => {
            let err = RecoveredPanic::from_payload(payload);
            let stack = take_backtrace();
            tracing::error!(
                error = %err,
                stack_trace = %stack,
                path = %path,
                method = %method,
                "panic recovered in handler"
            );
            panic_response(mode, &err, stack)
        }
    }
}

fn panic_response(mode: RecoveryMode, err: &RecoveredPanic, stack: String) -> Response {
    let body = match mode {
        RecoveryMode::Debug => ErrorBody::new("INTERNAL_ERROR", "Internal Server Error - Debug Mode")
            .with_details(serde_json::json!({
                "panic": err.to_string(),
                "stack": stack,
            })),
        RecoveryMode::Release => ErrorBody::new("INTERNAL_ERROR", "Something went wrong on our end."),
    };
    (StatusCode::INTERNAL_SERVER_ERROR, Json(body)).into_response()
}
