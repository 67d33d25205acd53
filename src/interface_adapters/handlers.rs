use crate::interface_adapters::protocol::{
    AccessEvent, ErrorResponse, ReservationResponse, SearchQuery, ShellResponse,
};
use crate::interface_adapters::state::AppState;
use crate::use_cases::{AccessController, ShellDecision};
use axum::{
    Json,
    extract::{Query, State},
    http::{HeaderMap, StatusCode, Uri, header},
    response::{
        IntoResponse, Redirect, Response,
        sse::{Event, KeepAlive, Sse},
    },
};
use futures::stream::{self, Stream};
use std::convert::Infallible;
use std::sync::Arc;
use url::Url;

// Handler for the page shell: landing page, redirects, or the invitation view.
#[tracing::instrument(name = "page_shell", skip_all, fields(uri = %uri))]
pub async fn page_shell(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    uri: Uri,
) -> Result<Response, (StatusCode, Json<ErrorResponse>)> {
    let address = request_address(&headers, &uri)?;

    let response = match state.shell.decide(&address) {
        ShellDecision::Landing => Json(ShellResponse::landing()).into_response(),
        ShellDecision::RedirectToRoot(target) | ShellDecision::RedirectToCanonical(target) => {
            Redirect::to(target.as_str()).into_response()
        }
        ShellDecision::Invitation(code) => {
            tracing::info!(guest_id = %code, "serving invitation");
            Json(ShellResponse::invitation(&code)).into_response()
        }
    };

    Ok(response)
}

// Handler that mounts a guest view and streams its state changes.
#[tracing::instrument(name = "invitation_events", skip_all, fields(uri = %uri))]
pub async fn invitation_events(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    uri: Uri,
) -> Result<Sse<impl Stream<Item = Result<Event, Infallible>>>, (StatusCode, Json<ErrorResponse>)>
{
    let address = request_address(&headers, &uri)?;

    let controller = Arc::new(AccessController::new(
        state.directory.clone(),
        state.navigator.clone(),
        state.redirect.clone(),
    ));
    // Subscribe before mounting so no transition is missed.
    let states = controller.subscribe();

    let mounted = controller.clone();
    tokio::spawn(async move {
        mounted.mount(&address).await;
    });

    let guard = MountGuard(controller);
    let events = stream::unfold(Some((states, guard)), |slot| async move {
        let (mut states, guard) = slot?;
        states.changed().await.ok()?;
        let current = states.borrow_and_update().clone();

        let event = sse_event(&AccessEvent::from(&current));
        let next = if current.is_terminal() {
            None
        } else {
            Some((states, guard))
        };
        Some((Ok::<Event, Infallible>(event), next))
    });

    Ok(Sse::new(events).keep_alive(KeepAlive::default()))
}

// Handler for looking a reservation up by (part of) a guest name or code.
#[tracing::instrument(name = "search_guests", skip_all, fields(term = %query.name))]
pub async fn search_guests(
    State(state): State<Arc<AppState>>,
    Query(query): Query<SearchQuery>,
) -> Result<Json<ReservationResponse>, (StatusCode, Json<ErrorResponse>)> {
    let term = query.name.trim();
    if term.is_empty() {
        return Err(error_response(
            StatusCode::BAD_REQUEST,
            "Please enter a name to search",
        ));
    }

    let found = state.directory.find_by_name(term).await.map_err(|e| {
        tracing::error!(error = %e, "guest search failed");
        error_response(
            StatusCode::BAD_GATEWAY,
            "Error searching for guest. Please try again.",
        )
    })?;

    match found {
        Some(record) => Ok(Json(record.into())),
        None => Err(error_response(
            StatusCode::NOT_FOUND,
            &format!(
                "No reservation found for \"{term}\". Please check the spelling or contact us."
            ),
        )),
    }
}

// Unmounts the guest view when the event stream is dropped, including when
// the client disconnects mid-lookup.
struct MountGuard(Arc<AccessController>);

impl Drop for MountGuard {
    fn drop(&mut self) {
        self.0.unmount();
    }
}

fn sse_event(payload: &AccessEvent) -> Event {
    let name = payload.name();
    Event::default()
        .event(name)
        .json_data(payload)
        .unwrap_or_else(|err| {
            tracing::error!(error = %err, event = name, "failed to encode access event");
            Event::default().event(name)
        })
}

// Rebuilds the address the guest used, honouring a proxy's forwarded scheme.
fn request_address(
    headers: &HeaderMap,
    uri: &Uri,
) -> Result<Url, (StatusCode, Json<ErrorResponse>)> {
    let scheme = headers
        .get("x-forwarded-proto")
        .and_then(|value| value.to_str().ok())
        .unwrap_or("http");
    let host = headers
        .get(header::HOST)
        .and_then(|value| value.to_str().ok())
        .or_else(|| uri.authority().map(|authority| authority.as_str()))
        .unwrap_or("localhost");
    let path_and_query = uri
        .path_and_query()
        .map(|value| value.as_str())
        .unwrap_or("/");

    Url::parse(&format!("{scheme}://{host}{path_and_query}")).map_err(|err| {
        tracing::warn!(error = %err, "could not rebuild request address");
        error_response(StatusCode::BAD_REQUEST, "invalid request address")
    })
}

// Helper to build a JSON error response.
fn error_response(status: StatusCode, message: &str) -> (StatusCode, Json<ErrorResponse>) {
    (
        status,
        Json(ErrorResponse {
            message: message.to_string(),
        }),
    )
}
