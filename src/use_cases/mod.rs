// Use cases layer: directory lookups, the access state machine and redirect timing.

pub mod access;
pub mod countdown;
pub mod directory;
pub mod shell;

#[cfg(test)]
pub(crate) mod test_support;

pub use access::{AccessController, AccessState, RedirectPolicy};
pub use countdown::{Countdown, CountdownHandle};
pub use directory::GuestDirectory;
pub use shell::{PageShell, ShellDecision};
