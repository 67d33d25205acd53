use crate::domain::ports::Navigator;
use url::Url;

// Server-side navigator. The streamed `redirected` event is what moves the
// guest; this only records that the redirect happened.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingNavigator;

impl Navigator for TracingNavigator {
    fn navigate(&self, target: &Url) {
        tracing::info!(%target, "guest redirected");
    }
}
