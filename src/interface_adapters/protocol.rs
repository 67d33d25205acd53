use serde::{Deserialize, Serialize};

use crate::domain::reservation::ReservationRecord;

use crate::domain::access_code::{ACCESS_CODE_PARAM, AccessCode};
use crate::use_cases::access::AccessState;

// Body of `GET /` when the shell does not redirect.
#[derive(Debug, Serialize)]
#[serde(tag = "view", rename_all = "snake_case")]
pub enum ShellResponse {
    Landing {
        message: String,
    },
    Invitation {
        guest_id: String,
        // Stream of access states for this guest.
        events_url: String,
    },
}

impl ShellResponse {
    pub fn landing() -> Self {
        ShellResponse::Landing {
            message: "This wedding website is exclusively for invited guests. \
                      Please use your personal invitation link or enter your 5-letter Guest ID."
                .to_string(),
        }
    }

    pub fn invitation(code: &AccessCode) -> Self {
        ShellResponse::Invitation {
            guest_id: code.to_string(),
            events_url: format!("/invitation/events?{ACCESS_CODE_PARAM}={code}"),
        }
    }
}

// Payload of one server-sent access event.
#[derive(Debug, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum AccessEvent {
    Idle,
    ParsingCode,
    NoCode,
    InvalidFormat {
        guest_id: String,
        redirect_to: String,
    },
    LookingUp {
        guest_id: String,
    },
    Found {
        name: String,
        guest_id: String,
        adult_seats: u32,
        child_seats: u32,
    },
    NotFound {
        guest_id: String,
        message: String,
        banner: String,
        seconds_remaining: u32,
    },
    Error {
        reason: String,
        message: String,
        banner: String,
        seconds_remaining: u32,
    },
    Redirected {
        redirect_to: String,
    },
}

impl AccessEvent {
    /// SSE event name, matching the `state` tag.
    pub fn name(&self) -> &'static str {
        match self {
            AccessEvent::Idle => "idle",
            AccessEvent::ParsingCode => "parsing_code",
            AccessEvent::NoCode => "no_code",
            AccessEvent::InvalidFormat { .. } => "invalid_format",
            AccessEvent::LookingUp { .. } => "looking_up",
            AccessEvent::Found { .. } => "found",
            AccessEvent::NotFound { .. } => "not_found",
            AccessEvent::Error { .. } => "error",
            AccessEvent::Redirected { .. } => "redirected",
        }
    }
}

impl From<&AccessState> for AccessEvent {
    fn from(state: &AccessState) -> Self {
        let banner = state.banner().unwrap_or_default();
        match state {
            AccessState::Idle => AccessEvent::Idle,
            AccessState::ParsingCode => AccessEvent::ParsingCode,
            AccessState::NoCodeSupplied => AccessEvent::NoCode,
            AccessState::InvalidFormat { raw, target } => AccessEvent::InvalidFormat {
                guest_id: raw.clone(),
                redirect_to: target.to_string(),
            },
            AccessState::LookingUp { code } => AccessEvent::LookingUp {
                guest_id: code.to_string(),
            },
            AccessState::Found(record) => AccessEvent::Found {
                name: record.name.clone(),
                guest_id: record.guest_code.clone(),
                adult_seats: record.adult_seats,
                child_seats: record.child_seats,
            },
            AccessState::NotFoundRedirecting {
                code,
                message,
                seconds_remaining,
            } => AccessEvent::NotFound {
                guest_id: code.to_string(),
                message: message.clone(),
                banner,
                seconds_remaining: *seconds_remaining,
            },
            AccessState::ErrorRedirecting {
                kind,
                message,
                seconds_remaining,
            } => AccessEvent::Error {
                reason: kind.as_str().to_string(),
                message: message.clone(),
                banner,
                seconds_remaining: *seconds_remaining,
            },
            AccessState::Redirected { target } => AccessEvent::Redirected {
                redirect_to: target.to_string(),
            },
        }
    }
}

// Query for the free-text reservation search.
#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    #[serde(default)]
    pub name: String,
}

#[derive(Debug, Serialize)]
pub struct ReservationResponse {
    pub name: String,
    pub guest_id: String,
    pub adult_seats: u32,
    pub child_seats: u32,
}

impl From<ReservationRecord> for ReservationResponse {
    fn from(record: ReservationRecord) -> Self {
        Self {
            name: record.name,
            guest_id: record.guest_code,
            adult_seats: record.adult_seats,
            child_seats: record.child_seats,
        }
    }
}

// Simple error envelope for JSON responses.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub message: String,
}
