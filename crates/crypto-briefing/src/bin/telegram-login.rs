//! Interactive Telegram sign-in.
//!
//! Writes the session file and prints the serialized session to put in
//! `TELEGRAM_SESSION_STRING`.

use std::io::{self, BufRead, Write};
use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use crypto_briefing::channel::telegram::{connect_client, encode_session};
use crypto_briefing::config::{SessionSource, TelegramConfig};
use grammers_client::SignInError;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

const DEFAULT_SESSION_FILE: &str = "telegram.session";

fn prompt(message: &str) -> Result<String> {
    print!("{}", message);
    io::stdout().flush()?;

    let mut line = String::new();
    io::stdin().lock().read_line(&mut line)?;
    Ok(line.trim().to_string())
}

fn required_var(key: &str) -> Result<String> {
    std::env::var(key)
        .ok()
        .filter(|v| !v.trim().is_empty())
        .with_context(|| format!("{} must be set", key))
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| "warn".into()))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let api_id = required_var("TELEGRAM_API_ID")?
        .parse::<i32>()
        .context("TELEGRAM_API_ID must be an integer")?;
    let api_hash = required_var("TELEGRAM_API_HASH")?;
    let session_file = std::env::var("TELEGRAM_SESSION_FILE")
        .map_or_else(|_| PathBuf::from(DEFAULT_SESSION_FILE), PathBuf::from);

    let config = TelegramConfig {
        api_id,
        api_hash,
        session: SessionSource::File(session_file.clone()),
    };
    let client = connect_client(&config).await?;

    if client.is_authorized().await? {
        println!("Session in {} is already signed in.", session_file.display());
    } else {
        let phone = prompt("Phone number (international format): ")?;
        let token = client.request_login_code(&phone).await?;
        let code = prompt("Login code: ")?;

        let user = match client.sign_in(&token, &code).await {
            Ok(user) => user,
            Err(SignInError::PasswordRequired(password_token)) => {
                let hint = password_token.hint().unwrap_or("none").to_string();
                let password = prompt(&format!("Two-step verification password (hint: {}): ", hint))?;
                client.check_password(password_token, password.as_bytes()).await?
            }
            Err(SignInError::SignUpRequired { .. }) => bail!("this phone number has no Telegram account"),
            Err(e) => return Err(e.into()),
        };
        println!("Signed in as {}", user.first_name());
    }

    client
        .session()
        .save_to_file(&session_file)
        .with_context(|| format!("cannot write {}", session_file.display()))?;
    println!("Session saved to {}", session_file.display());
    println!();
    println!("TELEGRAM_SESSION_STRING={}", encode_session(client.session()));
    Ok(())
}
