use std::net::{IpAddr, SocketAddr};

use axum::extract::{ConnectInfo, Request, State};
use axum::http::{header, Method};
use axum::middleware::Next;
use axum::response::Response;
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use tracing::{debug, warn};

use super::error::ApiError;
use super::state::AppState;

/// Basic auth over the whole authenticated surface. A missing configured
/// password disables the surface outright; there is no fallback password.
pub async fn require_basic_auth(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let Some(expected_pass) = state.auth_pass.as_deref() else {
        warn!("dashboard request rejected: no auth password configured");
        return Err(ApiError::Unavailable(
            "dashboard authentication is not configured".to_string(),
        ));
    };

    let provided = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Basic "))
        .and_then(|encoded| STANDARD.decode(encoded).ok())
        .and_then(|decoded| String::from_utf8(decoded).ok());

    match provided {
        Some(credentials)
            if credentials.split_once(':')
                == Some((state.auth_user.as_str(), expected_pass)) =>
        {
            Ok(next.run(request).await)
        }
        _ => {
            debug!("dashboard request rejected: bad credentials");
            Err(ApiError::Unauthorized)
        }
    }
}

/// Per-client-IP budget on write (POST) endpoints. Reads pass through
/// untouched.
pub async fn limit_write_rate(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    if request.method() == Method::POST {
        let ip = client_ip(&request);
        if state.write_limiter.check_key(&ip).is_err() {
            warn!(%ip, "write rate limit hit");
            return Err(ApiError::TooManyRequests);
        }
    }
    Ok(next.run(request).await)
}

fn client_ip(request: &Request) -> IpAddr {
    request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip())
        .unwrap_or_else(|| IpAddr::from([127, 0, 0, 1]))
}
