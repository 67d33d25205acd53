// Outer page check that runs before the guest view is mounted.

use url::Url;

use crate::domain::access_code::{ACCESS_CODE_PARAM, AccessCode, access_code_param};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShellDecision {
    // No code in the address: show the public landing page.
    Landing,
    // Code present but malformed: leave at once, no countdown.
    RedirectToRoot(Url),
    // Valid code reached through a non-canonical address.
    RedirectToCanonical(Url),
    Invitation(AccessCode),
}

#[derive(Debug, Clone)]
pub struct PageShell {
    canonical: Url,
}

impl PageShell {
    /// `canonical` is the published site address; it doubles as the redirect
    /// target for malformed codes.
    pub fn new(canonical: Url) -> Self {
        Self { canonical }
    }

    pub fn canonical(&self) -> &Url {
        &self.canonical
    }

    pub fn decide(&self, current: &Url) -> ShellDecision {
        let Some(raw) = access_code_param(current) else {
            return ShellDecision::Landing;
        };

        let code = match AccessCode::parse(&raw) {
            Ok(code) => code,
            Err(err) => {
                tracing::info!(error = %err, "invalid guest code; redirecting to site root");
                return ShellDecision::RedirectToRoot(self.canonical.clone());
            }
        };

        if !current.as_str().starts_with(self.canonical.as_str()) {
            // Keep the code as typed so the canonical page sees the same link.
            let mut target = self.canonical.clone();
            target
                .query_pairs_mut()
                .clear()
                .append_pair(ACCESS_CODE_PARAM, &raw);
            tracing::info!(%target, "redirecting to canonical address");
            return ShellDecision::RedirectToCanonical(target);
        }

        ShellDecision::Invitation(code)
    }
}
