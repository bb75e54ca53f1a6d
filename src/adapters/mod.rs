// Adapters layer: concrete implementations of the domain ports for Square and Resend.

pub mod resend;
pub mod square;

use crate::utils::error::{BookingError, Result};

/// Reads a provider response as JSON; non-2xx becomes `UpstreamError` with the body untouched.
pub(crate) async fn upstream_json(
    service: &'static str,
    response: reqwest::Response,
) -> Result<serde_json::Value> {
    let status = response.status();
    let bytes = response.bytes().await?;

    // 上游偶爾回傳非 JSON (例如閘道錯誤頁)，包成字串避免遺失內容
    let body = serde_json::from_slice(&bytes).unwrap_or_else(|_| {
        serde_json::json!({ "error": String::from_utf8_lossy(&bytes).into_owned() })
    });

    tracing::debug!("{} responded with {}", service, status);

    if !status.is_success() {
        tracing::warn!("⚠️ {} returned {}: {}", service, status, body);
        return Err(BookingError::UpstreamError {
            service,
            status: status.as_u16(),
            body,
        });
    }

    Ok(body)
}
