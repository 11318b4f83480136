use clap::{Parser, Subcommand};
use serde_json::json;

use skew_protection::config::schema::SECRET_ENVIRONMENT_VARIABLE;
use skew_protection::engine::now_ms;
use skew_protection::host::{Environment, ProcessEnvironment};
use skew_protection::token::{self, Payload};

#[derive(Parser)]
#[command(name = "skew-token")]
#[command(about = "Sign and inspect skew protection pin tokens", long_about = None)]
struct Cli {
    /// Environment variable holding the HMAC secret.
    #[arg(short, long, default_value = SECRET_ENVIRONMENT_VARIABLE)]
    secret_env: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Sign a pin for a deployment
    Sign {
        deployment_id: String,

        /// Issue time in epoch milliseconds (defaults to now)
        #[arg(long)]
        issued_at_ms: Option<u64>,
    },
    /// Verify a pin and print its payload
    Verify {
        token: String,

        /// Maximum age in milliseconds used to report expiry
        #[arg(long, default_value_t = 86_400_000)]
        max_age_ms: u64,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let secret = ProcessEnvironment
        .get(&cli.secret_env)
        .filter(|secret| !secret.is_empty())
        .ok_or_else(|| format!("environment variable {} is not set", cli.secret_env))?;

    match cli.command {
        Commands::Sign {
            deployment_id,
            issued_at_ms,
        } => {
            let payload = Payload::new(deployment_id, issued_at_ms.unwrap_or_else(now_ms));
            let token = token::sign(&payload, &secret)?;
            println!("{}", serde_json::to_string_pretty(&json!({ "token": token, "payload": payload }))?);
        }
        Commands::Verify { token, max_age_ms } => match token::verify(&token, &secret) {
            Ok(payload) => {
                let expired = payload.is_expired(now_ms(), max_age_ms);
                println!(
                    "{}",
                    serde_json::to_string_pretty(&json!({ "valid": true, "expired": expired, "payload": payload }))?
                );
            }
            Err(e) => {
                println!(
                    "{}",
                    serde_json::to_string_pretty(&json!({ "valid": false, "reason": e.to_string() }))?
                );
                std::process::exit(1);
            }
        },
    }

    Ok(())
}
