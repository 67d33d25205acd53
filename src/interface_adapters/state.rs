use crate::domain::ports::Navigator;
use crate::use_cases::{GuestDirectory, PageShell, RedirectPolicy};
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub shell: PageShell,
    pub directory: GuestDirectory,
    pub redirect: RedirectPolicy,
    // Arc<dyn Trait> so tests can swap in a recording navigator.
    pub navigator: Arc<dyn Navigator>,
}
