// Cancellable once-per-second countdown that fires a single expiry callback.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};

pub const TICK_PERIOD: Duration = Duration::from_secs(1);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Running { remaining: u32 },
    Cancelled,
    Expired,
}

pub struct Countdown;

/// Handle to a running countdown. Dropping it leaves the countdown running.
pub struct CountdownHandle {
    phase: Arc<Mutex<Phase>>,
    task: JoinHandle<()>,
}

impl Countdown {
    /// Starts counting down from `initial_seconds` on the current tokio runtime.
    ///
    /// `on_tick` receives every remaining value above zero; reaching zero calls
    /// `on_expire` instead. Callbacks run while the countdown lock is held, so
    /// they must not call back into the handle.
    pub fn start<T, E>(initial_seconds: u32, on_tick: T, on_expire: E) -> CountdownHandle
    where
        T: Fn(u32) + Send + 'static,
        E: FnOnce() + Send + 'static,
    {
        let phase = Arc::new(Mutex::new(Phase::Running {
            remaining: initial_seconds,
        }));
        let task = tokio::spawn(run(phase.clone(), on_tick, on_expire));

        CountdownHandle { phase, task }
    }
}

async fn run<T, E>(phase: Arc<Mutex<Phase>>, on_tick: T, on_expire: E)
where
    T: Fn(u32) + Send + 'static,
    E: FnOnce() + Send + 'static,
{
    let mut on_expire = Some(on_expire);

    // Zero means expire right away, without ticking.
    {
        let mut guard = lock(&phase);
        match *guard {
            Phase::Running { remaining: 0 } => {
                *guard = Phase::Expired;
                if let Some(on_expire) = on_expire.take() {
                    on_expire();
                }
                return;
            }
            Phase::Running { .. } => {}
            _ => return,
        }
    }

    let mut ticker = time::interval_at(Instant::now() + TICK_PERIOD, TICK_PERIOD);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        ticker.tick().await;
        if !advance(&phase, &on_tick, &mut on_expire) {
            return;
        }
    }
}

// One tick. The decrement and, at zero, the expiry happen under a single
// lock so a cancel lands either before the tick or after the expiry.
// Returns false once the countdown is finished.
fn advance<T, E>(phase: &Mutex<Phase>, on_tick: &T, on_expire: &mut Option<E>) -> bool
where
    T: Fn(u32),
    E: FnOnce(),
{
    let mut guard = lock(phase);
    let Phase::Running { remaining } = *guard else {
        return false;
    };

    let next = remaining.saturating_sub(1);
    if next == 0 {
        *guard = Phase::Expired;
        if let Some(on_expire) = on_expire.take() {
            on_expire();
        }
        return false;
    }

    *guard = Phase::Running { remaining: next };
    on_tick(next);
    true
}

fn lock(phase: &Mutex<Phase>) -> MutexGuard<'_, Phase> {
    phase.lock().unwrap_or_else(PoisonError::into_inner)
}

impl CountdownHandle {
    /// Stops the countdown. Returns true when this call prevented the expiry.
    pub fn cancel(&self) -> bool {
        let mut guard = lock(&self.phase);
        let cancelled = matches!(*guard, Phase::Running { .. });
        if cancelled {
            *guard = Phase::Cancelled;
        }
        drop(guard);
        self.task.abort();
        cancelled
    }

    /// Seconds left, or `None` once the countdown expired or was cancelled.
    pub fn remaining(&self) -> Option<u32> {
        match *lock(&self.phase) {
            Phase::Running { remaining } => Some(remaining),
            Phase::Cancelled | Phase::Expired => None,
        }
    }

    pub fn is_expired(&self) -> bool {
        *lock(&self.phase) == Phase::Expired
    }
}
