//! Actor Extractor
//!
//! The identity gateway in front of this service authenticates callers and
//! forwards the result as `x-actor-id` / `x-actor-role` headers. This
//! extractor only parses them; it performs no login.

use axum::{extract::FromRequestParts, http::request::Parts};
use shared::error::{AppError, ErrorCode};
use shared::order::{Actor, ActorRole};

use crate::core::ServerState;
use crate::security_log;

pub const ACTOR_ID_HEADER: &str = "x-actor-id";
pub const ACTOR_ROLE_HEADER: &str = "x-actor-role";

/// Authenticated caller of an HTTP request
#[derive(Debug, Clone)]
pub struct CurrentActor(pub Actor);

impl CurrentActor {
    pub fn into_inner(self) -> Actor {
        self.0
    }
}

fn header<'a>(parts: &'a Parts, name: &str) -> Option<&'a str> {
    parts
        .headers
        .get(name)
        .and_then(|h| h.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
}

impl FromRequestParts<ServerState> for CurrentActor {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        _state: &ServerState,
    ) -> Result<Self, Self::Rejection> {
        if let Some(actor) = parts.extensions.get::<CurrentActor>() {
            return Ok(actor.clone());
        }

        let (Some(id), Some(role)) = (
            header(parts, ACTOR_ID_HEADER),
            header(parts, ACTOR_ROLE_HEADER),
        ) else {
            security_log!("WARN", "actor_missing", uri = %parts.uri);
            return Err(AppError::not_authenticated());
        };

        let role: ActorRole = role.parse().map_err(|e: String| {
            security_log!(
                "WARN",
                "actor_role_invalid",
                error = e.as_str(),
                uri = %parts.uri
            );
            AppError::with_message(ErrorCode::InvalidActorRole, e)
        })?;

        let actor = CurrentActor(Actor::new(id, role));
        parts.extensions.insert(actor.clone());
        Ok(actor)
    }
}
