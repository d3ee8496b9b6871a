//! Minimal Vault client: AppRole login, secret-id unwrapping and KV v2 reads.

pub mod kv;

use crate::APP_USER_AGENT;
use anyhow::{anyhow, Result};
use reqwest::Client;
use serde_json::{json, Value};
use tracing::{debug, instrument, Instrument};
use url::Url;

/// Build `<scheme>://<host>:<port><endpoint>` from the configured login URL.
///
/// # Errors
/// Returns an error if the URL has no host or an unsupported scheme.
pub fn endpoint_url(vault_url: &str, endpoint: &str) -> Result<String> {
    let url = Url::parse(vault_url)?;

    let scheme = url.scheme();

    let host = url
        .host()
        .ok_or_else(|| anyhow!("Error parsing URL: no host specified"))?
        .to_owned();

    let port = match url.port() {
        Some(p) => p,
        None => match scheme {
            "http" => 80,
            "https" => 443,
            _ => return Err(anyhow!("Error parsing URL: unsupported scheme {}", scheme)),
        },
    };

    let endpoint_url = format!("{scheme}://{host}:{port}{endpoint}");

    debug!("endpoint URL: {}", endpoint_url);

    Ok(endpoint_url)
}

fn first_error(body: &Value) -> &str {
    body["errors"][0].as_str().unwrap_or("")
}

/// Unwrap a response-wrapped secret id.
/// Create one with:
/// vault write -wrap-ttl=300s -f auth/approle/role/facegate/secret-id
///
/// # Errors
/// Returns an error if Vault rejects the token or the response has no `secret_id`.
#[instrument(skip(token))]
pub async fn unwrap(vault_url: &str, token: &str) -> Result<String> {
    let client = Client::builder().user_agent(APP_USER_AGENT).build()?;

    let unwrap_url = endpoint_url(vault_url, "/v1/sys/wrapping/unwrap")?;

    let response = client
        .post(&unwrap_url)
        .header("X-Vault-Token", token)
        .send()
        .await?;

    if !response.status().is_success() {
        let status = response.status();
        let body: Value = response.json().await.unwrap_or_default();

        return Err(anyhow!("{} - {}, {}", unwrap_url, status, first_error(&body)));
    }

    let body: Value = response.json().await?;
    let sid = body["data"]["secret_id"]
        .as_str()
        .ok_or_else(|| anyhow!("Error parsing JSON response: no secret_id found"))?;

    Ok(sid.to_string())
}

/// Log in with AppRole and return the client token.
/// Create a secret id with:
/// vault write -f auth/approle/role/facegate/secret-id
///
/// # Errors
/// Returns an error if the login is rejected or the response has no `client_token`.
#[instrument(skip(sid))]
pub async fn approle_login(vault_url: &str, sid: &str, rid: &str) -> Result<String> {
    let client = Client::builder().user_agent(APP_USER_AGENT).build()?;

    let login_payload = json!({
        "role_id": rid,
        "secret_id": sid
    });

    let span = tracing::info_span!("vault.approle.login", http.method = "POST");
    let response = client
        .post(vault_url)
        .json(&login_payload)
        .send()
        .instrument(span)
        .await?;

    if !response.status().is_success() {
        let status = response.status();
        let body: Value = response.json().await.unwrap_or_default();

        return Err(anyhow!("{} - {}, {}", vault_url, status, first_error(&body)));
    }

    let body: Value = response.json().await?;
    let token = body["auth"]["client_token"]
        .as_str()
        .ok_or_else(|| anyhow!("Error parsing JSON response: no client_token found"))?;

    Ok(token.to_string())
}
