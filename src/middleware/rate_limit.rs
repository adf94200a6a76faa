//! Per-client rate limiting for the auth endpoints.

use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};
use std::thread::JoinHandle;
use std::time::Duration;

use axum::{body::Body, Router};
use http::{HeaderValue, StatusCode};
use tower_governor::governor::GovernorConfigBuilder;
use tower_governor::key_extractor::SmartIpKeyExtractor;
use tower_governor::{GovernorError, GovernorLayer};

use crate::config::RateLimitConfig;
use crate::response::ApiResponse;
use crate::AppState;

/// JSON envelope for rate limiter rejections, matching the rest of the API.
pub fn governor_error_response(error: GovernorError) -> http::Response<Body> {
    let (status, message, retry_after, extra_headers) = match error {
        GovernorError::TooManyRequests { wait_time, headers } => (
            StatusCode::TOO_MANY_REQUESTS,
            "Rate limit exceeded".to_string(),
            Some(wait_time),
            headers,
        ),
        GovernorError::UnableToExtractKey => (
            StatusCode::BAD_REQUEST,
            "Unable to determine client IP for rate limiting".to_string(),
            None,
            None,
        ),
        GovernorError::Other { code, msg, headers } => (
            StatusCode::from_u16(code.as_u16()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR),
            msg.unwrap_or_else(|| "Rate limiting error".to_string()),
            None,
            headers,
        ),
    };

    let body = serde_json::to_string(&ApiResponse::<()>::error(message))
        .unwrap_or_else(|_| r#"{"success":false}"#.to_string());
    let mut resp = http::Response::new(Body::from(body));
    *resp.status_mut() = status;
    resp.headers_mut().insert(
        http::header::CONTENT_TYPE,
        HeaderValue::from_static("application/json"),
    );

    if let Some(hmap) = extra_headers {
        for (name, value) in hmap.iter() {
            resp.headers_mut().append(name.clone(), value.clone());
        }
    }

    // `wait_time` is in seconds
    if let Some(retry_after) = retry_after {
        resp.headers_mut()
            .insert(http::header::RETRY_AFTER, HeaderValue::from(retry_after));
    }

    resp
}

/// Wrap `router` in a limiter keyed by client IP (forwarding headers first,
/// then the peer address). Also starts the thread that prunes idle keys; it
/// exits once `shutdown` is set.
pub fn rate_limit_by_ip(
    router: Router<Arc<AppState>>,
    config: &RateLimitConfig,
    shutdown: Arc<AtomicBool>,
) -> anyhow::Result<(Router<Arc<AppState>>, JoinHandle<()>)> {
    // `key_extractor` returns a new builder; the other settings go on that one.
    let mut builder = GovernorConfigBuilder::default().key_extractor(SmartIpKeyExtractor);
    builder.per_second(config.auth_per_second.into());
    builder.burst_size(config.auth_burst);
    builder.error_handler(governor_error_response);

    let governor_conf = Arc::new(
        builder
            .finish()
            .ok_or_else(|| anyhow::anyhow!("Failed to build auth governor config"))?,
    );

    let cleaner = {
        let limiter = governor_conf.limiter().clone();
        let interval = Duration::from_secs(60);
        std::thread::spawn(move || {
            // Short ticks so shutdown is noticed quickly.
            let tick = Duration::from_secs(1);
            loop {
                for _ in 0..interval.as_secs() {
                    if shutdown.load(Ordering::SeqCst) {
                        tracing::info!("Auth rate limiter cleanup thread exiting");
                        return;
                    }
                    std::thread::sleep(tick);
                }
                tracing::debug!("auth rate limiter size: {}", limiter.len());
                limiter.retain_recent();
            }
        })
    };

    let layer = GovernorLayer {
        config: governor_conf,
    };
    Ok((router.layer(layer), cleaner))
}
