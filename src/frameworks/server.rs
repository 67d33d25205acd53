// Framework bootstrap for the invitation server runtime.

use crate::domain::ports::SheetReader;
use crate::frameworks::config::{Settings, SheetsSettings};
use crate::interface_adapters::clients::{
    ApiKeySheetsClient, OAuthSheetsClient, SheetsClientConfig, UnconfiguredReader,
};
use crate::interface_adapters::navigation::TracingNavigator;
use crate::interface_adapters::routes;
use crate::interface_adapters::state::AppState;
use crate::use_cases::{GuestDirectory, PageShell, RedirectPolicy};
use std::net::SocketAddr;
use std::{io::Result, sync::Arc};

fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false);

    match std::env::var("LOG_FORMAT").as_deref() {
        Ok("json") => subscriber.json().with_current_span(true).init(),
        _ => subscriber.compact().init(),
    }
}

fn install_panic_logger() {
    std::panic::set_hook(Box::new(|info| {
        let backtrace = std::backtrace::Backtrace::capture();
        tracing::error!(%info, ?backtrace, "panic");
    }));
}

/// Serves the invitation routes on an already bound listener.
pub async fn run(listener: tokio::net::TcpListener, settings: Settings) -> Result<()> {
    let address = listener.local_addr()?;
    let state = build_state(&settings);

    tracing::info!(%address, site_root = %settings.site_root, "invitation server listening");

    axum::serve(listener, routes::app(state))
        .await
        .inspect_err(|e| tracing::error!(error = %e, "invitation server stopped"))
}

/// Loads `.env` and settings, installs logging, binds the configured port and serves.
pub async fn run_with_config() -> Result<()> {
    let _ = dotenvy::dotenv();
    init_tracing();
    install_panic_logger();

    let settings = Settings::load().map_err(|e| {
        tracing::error!(error = %e, "failed to load configuration");
        std::io::Error::other(e)
    })?;

    let address = SocketAddr::from(([127, 0, 0, 1], settings.port));
    let listener = match tokio::net::TcpListener::bind(address).await {
        Ok(listener) => listener,
        Err(e) => {
            tracing::error!(%address, error = %e, "failed to bind");
            return Err(e);
        }
    };

    run(listener, settings).await
}

pub fn build_state(settings: &Settings) -> Arc<AppState> {
    let directory = GuestDirectory::new(build_reader(&settings.sheets))
        .with_range(settings.sheets.range.clone())
        .with_header_row(settings.sheets.has_header_row);

    Arc::new(AppState {
        shell: PageShell::new(settings.site_root.clone()),
        directory,
        redirect: RedirectPolicy::new(settings.site_root.clone()),
        navigator: Arc::new(TracingNavigator),
    })
}

// Picks the API-key reader when a key is configured, the OAuth reader when
// only a token is, and otherwise a reader that reports the misconfiguration
// on every lookup.
fn build_reader(sheets: &SheetsSettings) -> Arc<dyn SheetReader> {
    tracing::debug!(
        sheet_id = presence(&sheets.spreadsheet_id),
        api_key = presence(&sheets.api_key),
        oauth_token = presence(&sheets.oauth_token),
        range = %sheets.range,
        "sheets configuration"
    );

    let config = SheetsClientConfig {
        api_url: sheets.api_url.clone(),
        spreadsheet_id: sheets.spreadsheet_id.clone().unwrap_or_default(),
        timeout: sheets.timeout,
    };

    let reader = match (&sheets.api_key, &sheets.oauth_token) {
        (Some(key), _) => ApiKeySheetsClient::new(config, key.clone())
            .map(|client| Arc::new(client) as Arc<dyn SheetReader>),
        (None, Some(token)) => OAuthSheetsClient::new(config, token.clone())
            .map(|client| Arc::new(client) as Arc<dyn SheetReader>),
        (None, None) => {
            tracing::error!("Google API key not configured; guest lookups will fail");
            return Arc::new(UnconfiguredReader::new("Google API configuration missing"));
        }
    };

    reader.unwrap_or_else(|err| {
        tracing::error!(error = %err, "guest lookups will fail");
        Arc::new(UnconfiguredReader::new(err.to_string()))
    })
}

fn presence(value: &Option<String>) -> &'static str {
    if value.is_some() { "present" } else { "missing" }
}
