//! rtctoken CLI entry point

mod cli;

use crate::cli::{Cli, Commands};
use anyhow::{Context, Result};
use clap::Parser;
use rtctoken::{AccessToken, Account, IssuerConfig, Role};
use serde::Serialize;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Serialize)]
struct IssuedToken<'a> {
    token: &'a AccessToken,
    app_id: &'a str,
    kind: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<Role>,
    expire: u32,
}

fn main() -> Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    // Logs go to stderr so stdout carries only the token
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    // Command-line values win over the environment
    let (expire, privilege_expire) = match &cli.command {
        Commands::Channel {
            expire,
            privilege_expire,
            ..
        } => (*expire, *privilege_expire),
        Commands::Messaging { expire, .. } => (*expire, None),
    };
    let overrides = [
        ("RTC_APP_ID", cli.app_id.clone()),
        ("RTC_APP_CERTIFICATE", cli.app_certificate.clone()),
        ("RTC_TOKEN_EXPIRE", expire.map(|v| v.to_string())),
        ("RTC_PRIVILEGE_EXPIRE", privilege_expire.map(|v| v.to_string())),
    ];
    let config = IssuerConfig::from_lookup(|key| {
        overrides
            .iter()
            .find(|(name, _)| *name == key)
            .and_then(|(_, value)| value.clone())
            .or_else(|| std::env::var(key).ok())
    })
    .context("Invalid issuer configuration")?;

    let (token, kind, role) = match cli.command {
        Commands::Channel {
            channel,
            uid,
            account,
            role,
            ..
        } => {
            let account = match (uid, account) {
                (_, Some(name)) => Account::Name(name),
                (Some(uid), None) => Account::Uid(uid),
                (None, None) => Account::Uid(0),
            };
            info!(channel = %channel, role = %role, "Issuing channel join token");
            let token = config
                .channel_join_token(&channel, account, role)
                .with_context(|| format!("Failed to build token for channel {}", channel))?;
            (token, "channel_join", Some(role))
        }
        Commands::Messaging { user_id, .. } => {
            info!(user_id = %user_id, "Issuing messaging login token");
            let token = config
                .messaging_login_token(user_id.as_str())
                .with_context(|| format!("Failed to build token for user {}", user_id))?;
            (token, "messaging_login", None)
        }
    };

    if cli.json {
        let out = IssuedToken {
            token: &token,
            app_id: &config.app_id,
            kind,
            role,
            expire: config.token_expire,
        };
        println!("{}", serde_json::to_string_pretty(&out)?);
    } else {
        println!("{}", token);
    }

    Ok(())
}
