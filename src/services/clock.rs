// ============================================================================
// CLOCK - Fuente de tiempo y sleeper inyectados en el núcleo de sync
// ============================================================================

use async_trait::async_trait;
use chrono::{DateTime, Duration as ChronoDuration, TimeZone, Utc};
use futures::future::{self, Either};
use std::cell::{Cell, RefCell};
use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};
use std::time::Duration;

use crate::error::ApiError;

#[async_trait(?Send)]
pub trait Clock {
    fn now(&self) -> DateTime<Utc>;

    async fn sleep(&self, duration: Duration);
}

/// Reloj real: timers del navegador en wasm, futures-timer en el resto
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

#[async_trait(?Send)]
impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }

    async fn sleep(&self, duration: Duration) {
        #[cfg(target_arch = "wasm32")]
        gloo_timers::future::sleep(duration).await;

        #[cfg(not(target_arch = "wasm32"))]
        futures_timer::Delay::new(duration).await;
    }
}

/// Reloj virtual para tests y simulaciones.
///
/// `sleep` avanza el tiempo virtual al instante y cede una vez, así una
/// llamada que compite con un timeout todavía puede terminar primero.
#[derive(Debug)]
pub struct ManualClock {
    now: Cell<DateTime<Utc>>,
    sleeps: RefCell<Vec<Duration>>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self::starting_at(Utc.timestamp_millis_opt(1_700_000_000_000).single().unwrap_or_default())
    }

    pub fn starting_at(now: DateTime<Utc>) -> Self {
        Self {
            now: Cell::new(now),
            sleeps: RefCell::new(Vec::new()),
        }
    }

    pub fn advance(&self, duration: Duration) {
        let step = ChronoDuration::from_std(duration).unwrap_or_else(|_| ChronoDuration::zero());
        self.now.set(self.now.get() + step);
    }

    /// Cada duración pasada a `sleep`, en orden de llamada
    pub fn sleeps(&self) -> Vec<Duration> {
        self.sleeps.borrow().clone()
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait(?Send)]
impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        self.now.get()
    }

    async fn sleep(&self, duration: Duration) {
        self.sleeps.borrow_mut().push(duration);
        self.advance(duration);
        YieldOnce::default().await;
    }
}

#[derive(Default)]
struct YieldOnce {
    yielded: bool,
}

impl Future for YieldOnce {
    type Output = ();

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<()> {
        if self.yielded {
            Poll::Ready(())
        } else {
            self.yielded = true;
            cx.waker().wake_by_ref();
            Poll::Pending
        }
    }
}

/// Compite `call` contra `clock.sleep(limit)`; en timeout la llamada se descarta
pub async fn with_timeout<T, F>(clock: &dyn Clock, limit: Duration, call: F) -> Result<T, ApiError>
where
    F: Future<Output = Result<T, ApiError>>,
{
    let call = Box::pin(call);
    let deadline = clock.sleep(limit);

    match future::select(call, deadline).await {
        Either::Left((result, _)) => result,
        Either::Right(((), _)) => Err(ApiError::Timeout(limit)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::executor::block_on;

    #[test]
    fn manual_clock_advances_on_sleep() {
        let clock = ManualClock::new();
        let start = clock.now();

        block_on(clock.sleep(Duration::from_millis(300)));

        assert_eq!(clock.now() - start, ChronoDuration::milliseconds(300));
        assert_eq!(clock.sleeps(), vec![Duration::from_millis(300)]);
    }

    #[test]
    fn ready_call_beats_timeout() {
        let clock = ManualClock::new();
        let result = block_on(with_timeout(&clock, Duration::from_secs(12), async {
            Ok::<_, ApiError>(5)
        }));
        assert_eq!(result, Ok(5));
    }

    #[test]
    fn stalled_call_times_out() {
        let clock = ManualClock::new();
        let result: Result<(), ApiError> = block_on(with_timeout(
            &clock,
            Duration::from_secs(12),
            future::pending(),
        ));
        assert_eq!(result, Err(ApiError::Timeout(Duration::from_secs(12))));
    }
}
