use crate::output::{Output, OutputFormat};
use color_eyre::eyre::eyre;
use color_eyre::Result;
use dialoguer::{Input, Password};
use janitor_sources::sign_in;
use serde_json::json;

pub async fn run_plex_token(username: Option<String>, output: &Output) -> Result<()> {
    let username = match username {
        Some(username) => username,
        None => Input::<String>::new()
            .with_prompt("Plex username or email")
            .interact_text()
            .map_err(|e| eyre!("Failed to read input: {}", e))?,
    };
    let password = Password::new()
        .with_prompt("Plex password")
        .interact()
        .map_err(|e| eyre!("Failed to read password: {}", e))?;

    let signed_in = sign_in(&username, &password)
        .await
        .map_err(|e| eyre!("Plex sign-in failed: {}", e))?;

    match output.format() {
        OutputFormat::Human => {
            output.success(format!("Signed in as {}", signed_in.username));
            output.info("Set this as PLEX_USER_TOKEN (or plex.user_token in YAML):");
            // Printed even in quiet mode; it is the command's result
            println!("{}", signed_in.auth_token);
        }
        OutputFormat::Json | OutputFormat::JsonPretty => output.json(&json!({
            "username": signed_in.username,
            "user_token": signed_in.auth_token,
        })),
    }
    Ok(())
}
