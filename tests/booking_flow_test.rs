use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use glow_atelier::{server, AppConfig, AppState};
use http_body_util::BodyExt;
use httpmock::prelude::*;
use serde_json::{json, Value};
use tower::ServiceExt;

fn config_toml(square_url: &str, resend_url: &str, rate_limit_max: usize) -> String {
    format!(
        r#"
[site]
name = "Glow Atelier"
timezone = "America/Los_Angeles"

[payments]
base_url = "{square_url}"
access_token = "sq-token"
application_id = "sandbox-sq0idb-app"
location_id = "L123"
deposit_cents = 5000

[email]
base_url = "{resend_url}"
api_key = "re_test"
from = "Glow Atelier <bookings@glowatelier.com>"
rate_limit_max = {rate_limit_max}
rate_limit_window_seconds = 3600
"#
    )
}

fn app(toml: &str) -> anyhow::Result<axum::Router> {
    let config = AppConfig::from_toml_str(toml)?;
    Ok(server::router(AppState::from_config(config)?))
}

async fn post_json(app: axum::Router, uri: &str, body: String) -> anyhow::Result<(StatusCode, Option<String>, Value)> {
    let request = Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body))?;
    let response = app.oneshot(request).await?;

    let status = response.status();
    let retry_after = response
        .headers()
        .get(header::RETRY_AFTER)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    let bytes = response.into_body().collect().await?.to_bytes();
    Ok((status, retry_after, serde_json::from_slice(&bytes)?))
}

fn deposit_payload() -> Value {
    json!({
        "source_id": "cnon:card-nonce-ok",
        "service": "lip filler",
        "customer_name": "Dana Reyes",
        "email": "dana@example.com",
        "phone": "310-555-0199",
        "slot_start": "2026-10-20T17:30:00Z",
        "idempotency_key": "idem-42"
    })
}

#[tokio::test]
async fn test_deposit_charges_square_and_sends_confirmation() -> anyhow::Result<()> {
    let square = MockServer::start();
    let resend = MockServer::start();

    let payment_mock = square.mock(|when, then| {
        when.method(POST)
            .path("/v2/payments")
            .header("authorization", "Bearer sq-token")
            .json_body_partial(
                r#"{"source_id":"cnon:card-nonce-ok","idempotency_key":"idem-42","amount_money":{"amount":5000,"currency":"USD"},"location_id":"L123","buyer_email_address":"dana@example.com"}"#,
            );
        then.status(200).json_body(json!({
            "payment": {
                "id": "pay_789",
                "status": "COMPLETED",
                "receipt_url": "https://squareup.com/receipt/preview/pay_789",
                "amount_money": {"amount": 5000, "currency": "USD"}
            }
        }));
    });
    let email_mock = resend.mock(|when, then| {
        when.method(POST)
            .path("/emails")
            .header("authorization", "Bearer re_test")
            .body_contains("dana@example.com")
            .body_contains("Lip filler")
            .body_contains("Tue, Oct 20 at 10:30 AM PDT");
        then.status(200).json_body(json!({"id": "email_1"}));
    });

    let app = app(&config_toml(&square.base_url(), &resend.base_url(), 5))?;
    let (status, _, body) = post_json(app, "/api/payments", deposit_payload().to_string()).await?;

    assert_eq!(status, StatusCode::CREATED);
    payment_mock.assert();
    email_mock.assert();
    assert_eq!(body["payment"]["payment_id"], "pay_789");
    assert_eq!(body["service"], "Lip filler");
    assert_eq!(body["slot_label"], "Tue, Oct 20 at 10:30 AM PDT");
    assert_eq!(body["email_sent"], true);
    assert_eq!(body["email_id"], "email_1");
    Ok(())
}

#[tokio::test]
async fn test_square_error_is_forwarded_verbatim() -> anyhow::Result<()> {
    let square = MockServer::start();
    let resend = MockServer::start();
    let square_error = json!({
        "errors": [{
            "category": "PAYMENT_METHOD_ERROR",
            "code": "CARD_DECLINED",
            "detail": "Card declined."
        }]
    });

    square.mock(|when, then| {
        when.method(POST).path("/v2/payments");
        then.status(402).json_body(square_error.clone());
    });
    let email_mock = resend.mock(|when, then| {
        when.method(POST).path("/emails");
        then.status(200).json_body(json!({"id": "never"}));
    });

    let app = app(&config_toml(&square.base_url(), &resend.base_url(), 5))?;
    let (status, _, body) = post_json(app, "/api/payments", deposit_payload().to_string()).await?;

    assert_eq!(status, StatusCode::PAYMENT_REQUIRED);
    assert_eq!(body, square_error);
    email_mock.assert_hits(0);
    Ok(())
}

#[tokio::test]
async fn test_email_failure_does_not_fail_paid_deposit() -> anyhow::Result<()> {
    let square = MockServer::start();
    let resend = MockServer::start();

    square.mock(|when, then| {
        when.method(POST).path("/v2/payments");
        then.status(200)
            .json_body(json!({"payment": {"id": "pay_1", "status": "COMPLETED"}}));
    });
    resend.mock(|when, then| {
        when.method(POST).path("/emails");
        then.status(500).body("upstream exploded");
    });

    let app = app(&config_toml(&square.base_url(), &resend.base_url(), 5))?;
    let (status, _, body) = post_json(app, "/api/payments", deposit_payload().to_string()).await?;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["payment"]["payment_id"], "pay_1");
    assert_eq!(body["payment"]["amount"]["amount"], 5000);
    assert_eq!(body["email_sent"], false);
    assert!(body.get("email_id").is_none());
    Ok(())
}

#[tokio::test]
async fn test_invalid_payloads_are_rejected_before_square() -> anyhow::Result<()> {
    let square = MockServer::start();
    let resend = MockServer::start();
    let payment_mock = square.mock(|when, then| {
        when.method(POST).path("/v2/payments");
        then.status(200).json_body(json!({"payment": {"id": "pay_x", "status": "COMPLETED"}}));
    });
    let toml = config_toml(&square.base_url(), &resend.base_url(), 5);

    let (status, _, body) = post_json(app(&toml)?, "/api/payments", "{not json".to_string()).await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());

    let mut unknown = deposit_payload();
    unknown["service"] = json!("Hydrafacial");
    let (status, _, body) = post_json(app(&toml)?, "/api/payments", unknown.to_string()).await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("Unknown service"));

    let mut bad_email = deposit_payload();
    bad_email["email"] = json!("not-an-email");
    let (status, _, _) = post_json(app(&toml)?, "/api/payments", bad_email.to_string()).await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    payment_mock.assert_hits(0);
    Ok(())
}

#[tokio::test]
async fn test_payments_disabled_is_not_found() -> anyhow::Result<()> {
    let app = app("[site]\nname = \"Glow Atelier\"\n")?;
    let (status, _, body) = post_json(app, "/api/payments", deposit_payload().to_string()).await?;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body["error"].as_str().unwrap().contains("payments"));
    Ok(())
}

#[tokio::test]
async fn test_confirmation_is_rate_limited_per_recipient() -> anyhow::Result<()> {
    let square = MockServer::start();
    let resend = MockServer::start();
    let email_mock = resend.mock(|when, then| {
        when.method(POST).path("/emails");
        then.status(200).json_body(json!({"id": "email_ok"}));
    });

    let app = app(&config_toml(&square.base_url(), &resend.base_url(), 1))?;
    let payload = json!({
        "customer_name": "Dana Reyes",
        "email": "Dana@Example.com",
        "service": "Sculptra"
    });

    let (status, _, body) = post_json(app.clone(), "/api/confirmation", payload.to_string()).await?;
    assert_eq!(status, StatusCode::ACCEPTED);
    assert_eq!(body["id"], "email_ok");

    // 同一收件人 (大小寫不同) 共用額度
    let mut again = payload.clone();
    again["email"] = json!("dana@example.com");
    let (status, retry_after, body) = post_json(app.clone(), "/api/confirmation", again.to_string()).await?;
    assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
    assert!(retry_after.unwrap().parse::<u64>()? > 0);
    assert!(body["error"].as_str().unwrap().contains("retry"));

    let mut other = payload.clone();
    other["email"] = json!("sam@example.com");
    let (status, _, _) = post_json(app, "/api/confirmation", other.to_string()).await?;
    assert_eq!(status, StatusCode::ACCEPTED);

    email_mock.assert_hits(2);
    Ok(())
}

#[tokio::test]
async fn test_resend_error_is_forwarded_from_confirmation() -> anyhow::Result<()> {
    let square = MockServer::start();
    let resend = MockServer::start();
    let resend_error = json!({
        "statusCode": 422,
        "name": "validation_error",
        "message": "Invalid `from` field."
    });
    resend.mock(|when, then| {
        when.method(POST).path("/emails");
        then.status(422).json_body(resend_error.clone());
    });

    let app = app(&config_toml(&square.base_url(), &resend.base_url(), 5))?;
    let payload = json!({
        "customer_name": "Dana Reyes",
        "email": "dana@example.com",
        "service": "Sculptra",
        "payment_id": "pay_789"
    });
    let (status, _, body) = post_json(app, "/api/confirmation", payload.to_string()).await?;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body, resend_error);
    Ok(())
}
