//! Timed notification queue.
//!
//! Toasts with a non-zero duration are removed by a tokio timer task; a
//! zero duration keeps the toast until [`ToastQueue::dismiss`]. Renderers
//! follow the queue through [`ToastQueue::subscribe`].

use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::sync::watch;
use tracing::{debug, warn};

pub const DEFAULT_TOAST_DURATION: Duration = Duration::from_secs(5);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ToastKind {
    Success,
    Error,
    Warning,
    Info,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Toast {
    pub id: u64,
    pub kind: ToastKind,
    pub title: String,
    pub message: Option<String>,
    /// Zero means the toast stays until dismissed.
    pub duration: Duration,
}

impl Toast {
    pub fn is_sticky(&self) -> bool {
        self.duration.is_zero()
    }
}

struct Inner {
    next_id: AtomicU64,
    toasts: watch::Sender<Vec<Toast>>,
}

/// Cloneable handle to a shared toast list.
#[derive(Clone)]
pub struct ToastQueue {
    inner: Arc<Inner>,
}

impl Default for ToastQueue {
    fn default() -> Self {
        Self::new()
    }
}

impl ToastQueue {
    pub fn new() -> Self {
        let (toasts, _) = watch::channel(Vec::new());
        Self {
            inner: Arc::new(Inner {
                next_id: AtomicU64::new(1),
                toasts,
            }),
        }
    }

    /// Queue a toast and return its id.
    pub fn show(
        &self,
        kind: ToastKind,
        title: impl Into<String>,
        message: Option<String>,
        duration: Duration,
    ) -> u64 {
        let id = self.inner.next_id.fetch_add(1, Ordering::Relaxed);
        let toast = Toast {
            id,
            kind,
            title: title.into(),
            message,
            duration,
        };
        debug!(id, kind = ?toast.kind, title = %toast.title, "Showing toast");
        self.inner.toasts.send_modify(|toasts| toasts.push(toast));

        if !duration.is_zero() {
            self.schedule_removal(id, duration);
        }
        id
    }

    pub fn show_success(&self, title: impl Into<String>, message: Option<String>) -> u64 {
        self.show(ToastKind::Success, title, message, DEFAULT_TOAST_DURATION)
    }

    pub fn show_error(&self, title: impl Into<String>, message: Option<String>) -> u64 {
        self.show(ToastKind::Error, title, message, DEFAULT_TOAST_DURATION)
    }

    pub fn show_warning(&self, title: impl Into<String>, message: Option<String>) -> u64 {
        self.show(ToastKind::Warning, title, message, DEFAULT_TOAST_DURATION)
    }

    pub fn show_info(&self, title: impl Into<String>, message: Option<String>) -> u64 {
        self.show(ToastKind::Info, title, message, DEFAULT_TOAST_DURATION)
    }

    /// Remove a toast. Returns false if it was already gone.
    pub fn dismiss(&self, id: u64) -> bool {
        dismiss_in(&self.inner, id)
    }

    pub fn clear(&self) {
        self.inner.toasts.send_if_modified(|toasts| {
            let had_any = !toasts.is_empty();
            toasts.clear();
            had_any
        });
    }

    /// Toasts currently shown, oldest first.
    pub fn snapshot(&self) -> Vec<Toast> {
        self.inner.toasts.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<Vec<Toast>> {
        self.inner.toasts.subscribe()
    }

    fn schedule_removal(&self, id: u64, after: Duration) {
        let Ok(handle) = Handle::try_current() else {
            warn!(id, "No async runtime, toast will stay until dismissed");
            return;
        };
        let inner: Weak<Inner> = Arc::downgrade(&self.inner);
        handle.spawn(async move {
            tokio::time::sleep(after).await;
            if let Some(inner) = inner.upgrade() {
                dismiss_in(&inner, id);
            }
        });
    }
}

fn dismiss_in(inner: &Inner, id: u64) -> bool {
    inner.toasts.send_if_modified(|toasts| {
        let before = toasts.len();
        toasts.retain(|toast| toast.id != id);
        toasts.len() != before
    })
}
