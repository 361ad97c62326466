/// Rate limiting for authentication endpoints
///
/// Credential endpoints (register, login, refresh) are brute-force targets,
/// so they sit behind a token bucket keyed by client address. Exceeding the
/// limit yields 429 regardless of credential validity.
///
/// # Algorithm
///
/// Token bucket, evaluated atomically in Redis via a Lua script: tokens
/// refill at a constant rate, each attempt consumes one, and an empty
/// bucket rejects the request with a Retry-After hint. Redis keys are
/// `ratelimit:auth:{client}` with a short TTL for self-cleanup.
///
/// # Client identification
///
/// The first address in `X-Forwarded-For` when present (the usual case
/// behind a proxy), otherwise the socket peer address, otherwise a shared
/// fallback bucket.
///
/// # Failure policy
///
/// When no Redis URL is configured the limiter is inert. When Redis errors
/// at request time the limiter fails open and logs a warning, so an
/// unavailable limiter cannot take down login.

use crate::app::AppState;
use crate::error::ApiError;
use axum::{
    extract::{ConnectInfo, Request, State},
    http::HeaderValue,
    middleware::Next,
    response::Response,
};
use std::net::SocketAddr;
use std::time::{SystemTime, UNIX_EPOCH};

/// Attempts allowed per minute per client
const ATTEMPTS_PER_MINUTE: u32 = 10;

/// Burst capacity of the bucket
const BUCKET_CAPACITY: u32 = 10;

/// Redis key TTL in seconds
const KEY_TTL_SECONDS: u32 = 120;

/// Result of a rate-limit check
#[derive(Debug)]
pub struct RateLimitResult {
    /// Whether the attempt is allowed
    pub ok: bool,

    /// Tokens remaining after this attempt
    pub remaining: u32,

    /// Seconds until the next token is available (429 responses)
    pub retry_after: u64,
}

/// Extracts the first address from an X-Forwarded-For value
pub fn parse_forwarded_for(value: &str) -> Option<String> {
    value
        .split(',')
        .next()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

/// Derives the rate-limit key for a request
fn client_key(req: &Request) -> String {
    if let Some(forwarded) = req
        .headers()
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(parse_forwarded_for)
    {
        return forwarded;
    }

    if let Some(ConnectInfo(addr)) = req.extensions().get::<ConnectInfo<SocketAddr>>() {
        return addr.ip().to_string();
    }

    "unknown".to_string()
}

/// Rate-limiting middleware for the auth route group
///
/// # Errors
///
/// Returns 429 with a Retry-After header when the client's bucket is empty
pub async fn auth_rate_limit_layer(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let Some(client) = state.redis.clone() else {
        return Ok(next.run(request).await);
    };

    let key = format!("ratelimit:auth:{}", client_key(&request));

    match check_rate_limit(&client, &key).await {
        Ok(result) if !result.ok => {
            return Err(ApiError::RateLimitExceeded {
                retry_after: result.retry_after,
            });
        }
        Ok(result) => {
            let mut response = next.run(request).await;
            apply_headers(&mut response, &result);
            Ok(response)
        }
        Err(e) => {
            // Fail open: an unavailable limiter must not block logins
            tracing::warn!(error = %e, "rate limiter unavailable, failing open");
            Ok(next.run(request).await)
        }
    }
}

fn apply_headers(response: &mut Response, result: &RateLimitResult) {
    let headers = response.headers_mut();
    headers.insert(
        "X-RateLimit-Limit",
        HeaderValue::from_str(&ATTEMPTS_PER_MINUTE.to_string()).unwrap_or_else(|_| HeaderValue::from_static("0")),
    );
    headers.insert(
        "X-RateLimit-Remaining",
        HeaderValue::from_str(&result.remaining.to_string()).unwrap_or_else(|_| HeaderValue::from_static("0")),
    );
}

/// Checks the token bucket in Redis
///
/// The Lua script refills, consumes, and persists the bucket atomically so
/// concurrent attempts from one client cannot over-consume.
async fn check_rate_limit(
    client: &redis::Client,
    key: &str,
) -> Result<RateLimitResult, redis::RedisError> {
    let mut conn = client.get_multiplexed_async_connection().await?;

    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0);

    let refill_rate = f64::from(ATTEMPTS_PER_MINUTE) / 60.0;

    let script = redis::Script::new(
        r#"
        local key = KEYS[1]
        local capacity = tonumber(ARGV[1])
        local refill_rate = tonumber(ARGV[2])
        local now = tonumber(ARGV[3])
        local ttl = tonumber(ARGV[4])

        local bucket = redis.call('HMGET', key, 'tokens', 'last_refill')
        local tokens = tonumber(bucket[1])
        local last_refill = tonumber(bucket[2])

        if not tokens then
            tokens = capacity
            last_refill = now
        end

        local elapsed = now - last_refill
        tokens = math.min(capacity, tokens + (elapsed * refill_rate))

        if tokens >= 1 then
            tokens = tokens - 1
            redis.call('HMSET', key, 'tokens', tokens, 'last_refill', now)
            redis.call('EXPIRE', key, ttl)
            return {1, math.floor(tokens), 0}
        else
            return {0, 0, math.ceil((1 - tokens) / refill_rate)}
        end
        "#,
    );

    let result: Vec<i64> = script
        .key(key)
        .arg(BUCKET_CAPACITY)
        .arg(refill_rate)
        .arg(now)
        .arg(KEY_TTL_SECONDS)
        .invoke_async(&mut conn)
        .await?;

    Ok(RateLimitResult {
        ok: result.first().copied().unwrap_or(0) == 1,
        remaining: result.get(1).copied().unwrap_or(0) as u32,
        retry_after: result.get(2).copied().unwrap_or(0) as u64,
    })
}
