use crate::error::SourceError;
use reqwest::Client;
use serde::Deserialize;
use tracing::info;

use super::{CLIENT_IDENTIFIER, PLEX_TV_BASE_URL};

/// Result of a username/password sign-in against plex.tv.
#[derive(Debug, Clone)]
pub struct SignIn {
    pub username: String,
    pub auth_token: String,
}

#[derive(Debug, Deserialize)]
struct SignInResponse {
    user: SignInUser,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SignInUser {
    #[serde(default)]
    username: Option<String>,
    auth_token: String,
}

/// Exchange account credentials for a user-level token.
pub async fn sign_in(username: &str, password: &str) -> Result<SignIn, SourceError> {
    let client = Client::new();
    let url = format!("{}/users/sign_in.json", PLEX_TV_BASE_URL);

    let response = client
        .post(&url)
        .basic_auth(username, Some(password))
        .header("X-Plex-Client-Identifier", CLIENT_IDENTIFIER)
        .header("X-Plex-Product", CLIENT_IDENTIFIER)
        .header("Accept", "application/json")
        .send()
        .await
        .map_err(SourceError::from_plex)?;

    let status = response.status();
    if !status.is_success() {
        return Err(SourceError::PlexApi(format!("Plex sign-in failed: {}", status)));
    }

    let body: SignInResponse = response.json().await.map_err(SourceError::from_plex)?;
    let sign_in = SignIn {
        username: body.user.username.unwrap_or_else(|| username.to_string()),
        auth_token: body.user.auth_token,
    };

    info!("Signed in to Plex as {}, user token obtained", sign_in.username);
    Ok(sign_in)
}
