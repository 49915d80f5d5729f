use std::{
    sync::Arc,
    time::{Duration, Instant},
};

use reqwest::Client;
use serde_json::Value;
use tokio::sync::Mutex;

use crate::{
    Res, config,
    management::{TokenManager, token_from_response},
    server::start_api_server,
    types::{PkceToken, Token},
    utils, warning,
};

/// How long the browser round trip may take.
const SIGN_IN_TIMEOUT: Duration = Duration::from_secs(120);

/// Builds the authorization URL the browser is sent to.
pub fn authorize_url(
    auth_url: &str,
    client_id: &str,
    redirect_uri: &str,
    scope: &str,
    code_challenge: &str,
) -> Result<reqwest::Url, String> {
    reqwest::Url::parse_with_params(
        auth_url,
        &[
            ("client_id", client_id),
            ("response_type", "code"),
            ("redirect_uri", redirect_uri),
            ("code_challenge", code_challenge),
            ("code_challenge_method", "S256"),
            ("scope", scope),
        ],
    )
    .map_err(|e| format!("invalid authorization URL `{}`: {}", auth_url, e))
}

/// Runs the PKCE sign-in and stores the resulting token.
pub async fn sign_in(shared_state: Arc<Mutex<Option<PkceToken>>>) -> Res<Token> {
    let code_verifier = utils::generate_code_verifier();
    let code_challenge = utils::generate_code_challenge(&code_verifier);

    let url = authorize_url(
        &config::auth_url()?,
        &config::client_id()?,
        &config::redirect_uri(),
        &config::scope(),
        &code_challenge,
    )?;

    // verifier must be in place before the callback can arrive
    {
        let mut lock = shared_state.lock().await;
        *lock = Some(PkceToken {
            code_verifier,
            token: None,
        });
    }

    let server_state = Arc::clone(&shared_state);
    let server = tokio::spawn(async move {
        if let Err(e) = start_api_server(server_state).await {
            warning!("Callback server stopped: {}", e);
        }
    });

    if webbrowser::open(url.as_str()).is_err() {
        warning!(
            "Failed to open browser. Please navigate to the following URL manually:\n{}",
            url
        )
    }

    let token = wait_for_token(shared_state).await;
    server.abort();

    let token = token.ok_or("Sign-in failed or timed out.")?;
    TokenManager::new(token.clone()).persist().await?;
    Ok(token)
}

async fn wait_for_token(shared_state: Arc<Mutex<Option<PkceToken>>>) -> Option<Token> {
    let start = Instant::now();

    while start.elapsed() < SIGN_IN_TIMEOUT {
        {
            let lock = shared_state.lock().await;
            if let Some(token) = lock.as_ref().and_then(|pkce| pkce.token.clone()) {
                return Some(token);
            }
        }
        tokio::time::sleep(Duration::from_secs(1)).await;
    }

    None
}

/// Exchanges an authorization code for a token.
pub async fn exchange_code(code: &str, verifier: &str) -> Res<Token> {
    let client_id = config::client_id()?;
    let redirect_uri = config::redirect_uri();

    let res = Client::new()
        .post(config::token_url()?)
        .form(&[
            ("grant_type", "authorization_code"),
            ("client_id", client_id.as_str()),
            ("code", code),
            ("code_verifier", verifier),
            ("redirect_uri", redirect_uri.as_str()),
        ])
        .send()
        .await?
        .error_for_status()?;

    let json: Value = res.json().await?;
    Ok(token_from_response(&json, None)?)
}
