// Guest access state machine: read the code, look it up, then either show the
// reservation or count down to a redirect.

use std::sync::{Arc, Mutex, PoisonError};

use tokio::sync::watch;
use tracing::Instrument;
use url::Url;

use crate::domain::access_code::{AccessCode, access_code_param};
use crate::domain::errors::{FailureKind, LookupOutcome};
use crate::domain::ports::Navigator;
use crate::domain::reservation::ReservationRecord;
use crate::use_cases::countdown::{Countdown, CountdownHandle};
use crate::use_cases::directory::GuestDirectory;

pub const NOT_FOUND_REDIRECT_SECONDS: u32 = 3;
pub const ERROR_REDIRECT_SECONDS: u32 = 5;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AccessState {
    Idle,
    ParsingCode,
    // No code in the address; lookup is never attempted.
    NoCodeSupplied,
    InvalidFormat {
        raw: String,
        target: Url,
    },
    LookingUp {
        code: AccessCode,
    },
    Found(ReservationRecord),
    NotFoundRedirecting {
        code: AccessCode,
        message: String,
        seconds_remaining: u32,
    },
    ErrorRedirecting {
        kind: FailureKind,
        message: String,
        seconds_remaining: u32,
    },
    Redirected {
        target: Url,
    },
}

impl AccessState {
    /// True once no further transition can happen.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            AccessState::NoCodeSupplied
                | AccessState::InvalidFormat { .. }
                | AccessState::Found(_)
                | AccessState::Redirected { .. }
        )
    }

    /// Message shown to the guest while a redirect countdown is running.
    pub fn banner(&self) -> Option<String> {
        match self {
            AccessState::NotFoundRedirecting {
                message,
                seconds_remaining,
                ..
            }
            | AccessState::ErrorRedirecting {
                message,
                seconds_remaining,
                ..
            } => Some(countdown_banner(message, *seconds_remaining)),
            _ => None,
        }
    }

    fn set_seconds_remaining(&mut self, seconds: u32) {
        if let AccessState::NotFoundRedirecting {
            seconds_remaining, ..
        }
        | AccessState::ErrorRedirecting {
            seconds_remaining, ..
        } = self
        {
            *seconds_remaining = seconds;
        }
    }
}

fn countdown_banner(message: &str, seconds: u32) -> String {
    let unit = if seconds == 1 { "second" } else { "seconds" };
    format!("{message} Redirecting in {seconds} {unit}...")
}

/// Where failed lookups go and how long the guest sees the message first.
#[derive(Debug, Clone)]
pub struct RedirectPolicy {
    pub site_root: Url,
    pub not_found_seconds: u32,
    pub error_seconds: u32,
}

impl RedirectPolicy {
    pub fn new(site_root: Url) -> Self {
        Self {
            site_root,
            not_found_seconds: NOT_FOUND_REDIRECT_SECONDS,
            error_seconds: ERROR_REDIRECT_SECONDS,
        }
    }
}

/// One mounted guest view. Each instance runs at most one lookup and owns at
/// most one countdown.
pub struct AccessController {
    directory: GuestDirectory,
    navigator: Arc<dyn Navigator>,
    policy: RedirectPolicy,
    state_tx: Arc<watch::Sender<AccessState>>,
    unmounted_tx: watch::Sender<bool>,
    countdown: Mutex<Option<CountdownHandle>>,
}

impl AccessController {
    pub fn new(
        directory: GuestDirectory,
        navigator: Arc<dyn Navigator>,
        policy: RedirectPolicy,
    ) -> Self {
        let (state_tx, _state_rx) = watch::channel(AccessState::Idle);
        let (unmounted_tx, _unmounted_rx) = watch::channel(false);

        Self {
            directory,
            navigator,
            policy,
            state_tx: Arc::new(state_tx),
            unmounted_tx,
            countdown: Mutex::new(None),
        }
    }

    pub fn state(&self) -> AccessState {
        self.state_tx.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<AccessState> {
        self.state_tx.subscribe()
    }

    /// Runs the access flow for `address` and returns the state reached once
    /// the lookup resolved. A redirect countdown keeps running afterwards.
    pub async fn mount(&self, address: &Url) -> AccessState {
        let mount_id = uuid::Uuid::new_v4();
        let span = tracing::info_span!("access_mount", %mount_id);
        self.mount_inner(address).instrument(span).await
    }

    async fn mount_inner(&self, address: &Url) -> AccessState {
        if self.is_unmounted() {
            tracing::debug!("view already unmounted; skipping mount");
            return self.state();
        }
        self.publish(AccessState::ParsingCode);

        let Some(raw) = access_code_param(address) else {
            tracing::info!("no guest code supplied");
            return self.publish(AccessState::NoCodeSupplied);
        };

        let code = match AccessCode::parse(&raw) {
            Ok(code) => code,
            Err(err) => {
                tracing::info!(error = %err, "rejecting malformed guest code");
                let target = self.policy.site_root.clone();
                let state = self.publish(AccessState::InvalidFormat {
                    raw,
                    target: target.clone(),
                });
                self.navigator.navigate(&target);
                return state;
            }
        };

        self.publish(AccessState::LookingUp { code: code.clone() });

        let mut unmounted_rx = self.unmounted_tx.subscribe();
        let outcome = tokio::select! {
            biased;
            _ = unmounted_rx.wait_for(|unmounted| *unmounted) => {
                tracing::debug!(guest_id = %code, "view unmounted; discarding lookup result");
                return self.state();
            }
            outcome = self.directory.lookup(&code) => outcome,
        };

        match outcome {
            LookupOutcome::Found(record) => {
                tracing::info!(guest_id = %code, "guest found");
                self.publish(AccessState::Found(record))
            }
            LookupOutcome::NotFound => {
                tracing::info!(guest_id = %code, "guest not found");
                let seconds = self.policy.not_found_seconds;
                self.redirect_after(
                    AccessState::NotFoundRedirecting {
                        message: format!("Guest not found with ID: {code}."),
                        code,
                        seconds_remaining: seconds,
                    },
                    seconds,
                )
            }
            LookupOutcome::TransportError(err) => {
                let kind = FailureKind::of_transport(&err);
                tracing::error!(
                    guest_id = %code,
                    error = %err,
                    kind = kind.as_str(),
                    "guest lookup failed"
                );
                self.redirect_after_failure(kind)
            }
            LookupOutcome::ConfigurationError(reason) => {
                tracing::error!(guest_id = %code, %reason, "guest directory is not configured");
                self.redirect_after_failure(FailureKind::Configuration)
            }
        }
    }

    /// Drops interest in any pending lookup and stops the countdown.
    pub fn unmount(&self) {
        // Flag and slot change under the countdown lock so a redirect being
        // armed concurrently either sees the flag or gets cancelled here.
        let countdown = {
            let mut slot = self.countdown.lock().unwrap_or_else(PoisonError::into_inner);
            self.unmounted_tx.send_replace(true);
            slot.take()
        };
        if let Some(countdown) = countdown {
            countdown.cancel();
        }
    }

    fn redirect_after_failure(&self, kind: FailureKind) -> AccessState {
        let seconds = self.policy.error_seconds;
        self.redirect_after(
            AccessState::ErrorRedirecting {
                kind,
                message: kind.message().to_string(),
                seconds_remaining: seconds,
            },
            seconds,
        )
    }

    fn redirect_after(&self, state: AccessState, seconds: u32) -> AccessState {
        let mut slot = self.countdown.lock().unwrap_or_else(PoisonError::into_inner);
        if self.is_unmounted() {
            tracing::debug!("view unmounted; not arming redirect");
            return self.state();
        }
        let state = self.publish(state);

        let tick_tx = self.state_tx.clone();
        let expire_tx = self.state_tx.clone();
        let navigator = self.navigator.clone();
        let target = self.policy.site_root.clone();

        let countdown = Countdown::start(
            seconds,
            move |remaining| {
                tick_tx.send_modify(|state| state.set_seconds_remaining(remaining));
            },
            move || {
                tracing::info!(%target, "redirecting");
                expire_tx.send_replace(AccessState::Redirected {
                    target: target.clone(),
                });
                navigator.navigate(&target);
            },
        );

        if let Some(previous) = slot.replace(countdown) {
            previous.cancel();
        }

        state
    }

    fn take_countdown(&self) -> Option<CountdownHandle> {
        self.countdown
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
    }

    fn is_unmounted(&self) -> bool {
        *self.unmounted_tx.borrow()
    }

    fn publish(&self, state: AccessState) -> AccessState {
        // Ignore updates once the view has gone away.
        if self.is_unmounted() {
            return self.state();
        }
        self.state_tx.send_replace(state.clone());
        state
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::errors::DirectoryError;
    use crate::domain::ports::SheetReader;
    use crate::use_cases::test_support::{
        FakeReader, PendingReader, RecordingNavigator, guest_sheet,
    };
    use std::time::Duration;
    use tokio::time;

    const SITE_ROOT: &str = "https://invite.example.com/";

    fn controller(
        reader: Arc<dyn SheetReader>,
        navigator: &RecordingNavigator,
    ) -> AccessController {
        AccessController::new(
            GuestDirectory::new(reader),
            Arc::new(navigator.clone()),
            RedirectPolicy::new(Url::parse(SITE_ROOT).unwrap()),
        )
    }

    fn address(query: &str) -> Url {
        Url::parse(&format!("{SITE_ROOT}{query}")).unwrap()
    }

    #[tokio::test(start_paused = true)]
    async fn when_code_matches_then_state_is_found_and_no_countdown_starts() {
        let reader = FakeReader::with_rows(guest_sheet());
        let navigator = RecordingNavigator::default();
        let controller = controller(Arc::new(reader.clone()), &navigator);

        let state = controller.mount(&address("?GuestID=AAAAA")).await;

        assert_eq!(
            state,
            AccessState::Found(ReservationRecord {
                name: "Jane Doe".to_string(),
                guest_code: "AAAAA".to_string(),
                adult_seats: 2,
                child_seats: 1,
            })
        );
        assert!(controller.take_countdown().is_none());

        time::sleep(Duration::from_secs(10)).await;
        assert!(navigator.targets().is_empty());
        assert_eq!(controller.state(), state);
    }

    #[tokio::test(start_paused = true)]
    async fn when_code_is_lowercase_then_lookup_uses_canonical_code() {
        let reader = FakeReader::with_rows(guest_sheet());
        let navigator = RecordingNavigator::default();
        let controller = controller(Arc::new(reader), &navigator);

        let state = controller.mount(&address("?GuestID=bbbbb")).await;

        assert!(matches!(state, AccessState::Found(record) if record.name == "John Smith"));
    }

    #[tokio::test(start_paused = true)]
    async fn when_code_is_unknown_then_countdown_of_three_redirects_once() {
        let reader = FakeReader::with_rows(guest_sheet());
        let navigator = RecordingNavigator::default();
        let controller = controller(Arc::new(reader), &navigator);

        let state = controller.mount(&address("?GuestID=ZZZZZ")).await;

        assert!(matches!(
            &state,
            AccessState::NotFoundRedirecting { seconds_remaining: 3, .. }
        ));
        assert_eq!(
            state.banner().as_deref(),
            Some("Guest not found with ID: ZZZZZ. Redirecting in 3 seconds...")
        );

        time::sleep(Duration::from_millis(1_500)).await;
        assert_eq!(
            controller.state().banner().as_deref(),
            Some("Guest not found with ID: ZZZZZ. Redirecting in 2 seconds...")
        );
        assert!(navigator.targets().is_empty());

        time::sleep(Duration::from_millis(1_000)).await;
        assert_eq!(
            controller.state().banner().as_deref(),
            Some("Guest not found with ID: ZZZZZ. Redirecting in 1 second...")
        );

        time::sleep(Duration::from_secs(10)).await;
        assert_eq!(navigator.targets(), vec![Url::parse(SITE_ROOT).unwrap()]);
        assert_eq!(
            controller.state(),
            AccessState::Redirected {
                target: Url::parse(SITE_ROOT).unwrap()
            }
        );
    }

    #[tokio::test(start_paused = true)]
    async fn when_sheet_denies_access_then_permission_countdown_starts_at_five() {
        let reader = FakeReader::with_status(403);
        let navigator = RecordingNavigator::default();
        let controller = controller(Arc::new(reader), &navigator);

        let state = controller.mount(&address("?GuestID=AAAAA")).await;

        match &state {
            AccessState::ErrorRedirecting {
                kind,
                message,
                seconds_remaining,
            } => {
                assert_eq!(*kind, FailureKind::Permission);
                assert!(message.starts_with("Permission Error (403)"));
                assert_eq!(*seconds_remaining, 5);
            }
            other => panic!("expected error redirect, got {other:?}"),
        }

        time::sleep(Duration::from_millis(4_500)).await;
        assert!(navigator.targets().is_empty());

        time::sleep(Duration::from_secs(1)).await;
        assert_eq!(navigator.targets().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn when_directory_is_unconfigured_then_error_countdown_starts() {
        let reader =
            FakeReader::failing(DirectoryError::Configuration("missing key".to_string()));
        let navigator = RecordingNavigator::default();
        let controller = controller(Arc::new(reader), &navigator);

        let state = controller.mount(&address("?GuestID=AAAAA")).await;

        assert!(matches!(
            state,
            AccessState::ErrorRedirecting {
                kind: FailureKind::Configuration,
                seconds_remaining: 5,
                ..
            }
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn when_code_contains_digit_then_redirects_immediately_without_lookup() {
        let reader = FakeReader::with_rows(guest_sheet());
        let navigator = RecordingNavigator::default();
        let controller = controller(Arc::new(reader.clone()), &navigator);

        let state = controller.mount(&address("?GuestID=AB1DE")).await;

        assert!(matches!(state, AccessState::InvalidFormat { ref raw, .. } if raw == "AB1DE"));
        assert_eq!(navigator.targets(), vec![Url::parse(SITE_ROOT).unwrap()]);
        assert_eq!(reader.call_count(), 0);
        assert!(controller.take_countdown().is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn when_no_code_is_supplied_then_view_stays_neutral() {
        let reader = FakeReader::with_rows(guest_sheet());
        let navigator = RecordingNavigator::default();
        let controller = controller(Arc::new(reader.clone()), &navigator);

        let state = controller.mount(&address("")).await;

        assert_eq!(state, AccessState::NoCodeSupplied);
        assert_eq!(reader.call_count(), 0);
        assert!(navigator.targets().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn when_unmounted_during_countdown_then_navigation_never_fires() {
        let reader = FakeReader::with_rows(guest_sheet());
        let navigator = RecordingNavigator::default();
        let controller = controller(Arc::new(reader), &navigator);

        controller.mount(&address("?GuestID=ZZZZZ")).await;
        time::sleep(Duration::from_millis(1_500)).await;
        controller.unmount();

        time::sleep(Duration::from_secs(10)).await;
        assert!(navigator.targets().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn when_unmounted_during_lookup_then_result_is_discarded() {
        let navigator = RecordingNavigator::default();
        let controller = Arc::new(controller(Arc::new(PendingReader), &navigator));

        let mounted = controller.clone();
        let mount = tokio::spawn(async move {
            mounted.mount(&address("?GuestID=AAAAA")).await
        });

        time::sleep(Duration::from_millis(100)).await;
        assert!(matches!(controller.state(), AccessState::LookingUp { .. }));
        controller.unmount();

        let state = mount.await.expect("mount task should finish");
        assert!(matches!(state, AccessState::LookingUp { .. }));
        assert!(navigator.targets().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn when_unmounted_before_mount_then_no_lookup_or_redirect_happens() {
        for _ in 0..40 {
            let reader = FakeReader::with_rows(guest_sheet());
            let navigator = RecordingNavigator::default();
            let controller = controller(Arc::new(reader.clone()), &navigator);

            controller.unmount();
            let state = controller.mount(&address("?GuestID=ZZZZZ")).await;

            time::sleep(Duration::from_secs(10)).await;
            assert_eq!(state, AccessState::Idle);
            assert!(navigator.targets().is_empty());
            assert_eq!(reader.call_count(), 0);
            assert!(controller.take_countdown().is_none());
        }
    }

    #[tokio::test(start_paused = true)]
    async fn when_unmounted_before_malformed_code_is_read_then_no_redirect_happens() {
        let navigator = RecordingNavigator::default();
        let controller = controller(Arc::new(FakeReader::with_rows(guest_sheet())), &navigator);

        controller.unmount();
        controller.mount(&address("?GuestID=AB1DE")).await;

        assert!(navigator.targets().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn when_unmounted_after_lookup_then_redirect_is_not_armed() {
        let navigator = RecordingNavigator::default();
        let controller = controller(Arc::new(FakeReader::with_status(403)), &navigator);

        controller.unmount();
        let state = controller.redirect_after_failure(FailureKind::Permission);

        time::sleep(Duration::from_secs(10)).await;
        assert_eq!(state, AccessState::Idle);
        assert!(controller.take_countdown().is_none());
        assert!(navigator.targets().is_empty());
    }
}
