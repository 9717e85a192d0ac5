use crate::engine::Timer;
use async_trait::async_trait;
use std::cell::RefCell;
use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

/// Never actually waits, keeps every requested delay in order
/// - `hook` runs on each sleep, i.e. at every suspension point
/// - `yielding` hands control back to the executor once per sleep
#[derive(Default)]
pub(crate) struct RecordingTimer {
    delays: RefCell<Vec<u32>>,
    hook: Option<Box<dyn Fn(u32)>>,
    yielding: bool,
}

impl RecordingTimer {
    pub(crate) fn with_hook(hook: impl Fn(u32) + 'static) -> Self {
        RecordingTimer {
            hook: Some(Box::new(hook)),
            ..RecordingTimer::default()
        }
    }

    /// Lets concurrently joined futures interleave at every sleep
    pub(crate) fn yielding() -> Self {
        RecordingTimer {
            yielding: true,
            ..RecordingTimer::default()
        }
    }

    pub(crate) fn delays(&self) -> Vec<u32> {
        self.delays.borrow().clone()
    }
}

#[async_trait(?Send)]
impl Timer for RecordingTimer {
    async fn sleep(&self, millis: u32) {
        self.delays.borrow_mut().push(millis);
        if let Some(hook) = &self.hook {
            hook(millis);
        }
        if self.yielding {
            YieldOnce(false).await;
        }
    }
}

/// Pending on the first poll, ready on the second
struct YieldOnce(bool);

impl Future for YieldOnce {
    type Output = ();

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<()> {
        if self.0 {
            return Poll::Ready(());
        }
        self.0 = true;
        cx.waker().wake_by_ref();
        Poll::Pending
    }
}
