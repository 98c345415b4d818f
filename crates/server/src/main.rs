//! Process bootstrap for the Visa MCP server.
//!
//! Reads partner credentials from flags or the environment (a `.env` file
//! is honored), builds the gateway, and serves the tool catalog to an MCP
//! host over stdio. Logs go to stderr; stdout carries the protocol.

mod service;

use anyhow::Context as _;
use clap::Parser;
use rmcp::ServiceExt as _;
use rmcp::transport::stdio;
use service::VisaToolService;
use std::path::PathBuf;
use visa_mcp_gateway::{Credentials, Environment, Gateway, TransportFactory};

/// Expose Visa partner APIs as MCP tools over stdio.
#[derive(Debug, Parser)]
#[command(name = "visa-mcp-server", version, about)]
struct Cli {
    /// Partner basic-auth user id.
    #[arg(long, env = "VISA_USER_ID", default_value = "", hide_env_values = true)]
    user_id: String,

    /// Partner basic-auth password.
    #[arg(long, env = "VISA_PASSWORD", default_value = "", hide_env_values = true)]
    password: String,

    /// Path to the mTLS client certificate (PEM).
    #[arg(long, env = "VISA_CERT_PATH", default_value = "./certs/cert.pem")]
    cert_path: PathBuf,

    /// Path to the mTLS client private key (PEM).
    #[arg(long, env = "VISA_KEY_PATH", default_value = "./certs/key.pem")]
    key_path: PathBuf,

    /// Partner environment: "sandbox" selects the sandbox host, anything
    /// else selects production.
    #[arg(long, env = "VISA_ENV", default_value = "sandbox")]
    environment: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // `.env` first, so clap's env-var fallbacks can see it.
    let _ = dotenvy::dotenv();
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with_writer(std::io::stderr)
        .json()
        .init();

    let credentials = Credentials {
        user_id: cli.user_id,
        password: cli.password,
        cert_path: cli.cert_path,
        key_path: cli.key_path,
        environment: Environment::from_env_value(&cli.environment),
    };
    tracing::info!(credentials = ?credentials, "starting visa-mcp-server");

    let transport =
        TransportFactory::from_credentials(&credentials).context("build partner transport")?;
    let gateway = Gateway::new(transport).context("build tool gateway")?;

    let service = VisaToolService::new(gateway)
        .serve(stdio())
        .await
        .context("serve MCP over stdio")?;
    service.waiting().await.context("stdio service")?;
    Ok(())
}
