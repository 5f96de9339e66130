#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

use std::env;
use std::path::Path;

use kukaya_shell::{ApiClient, LifecycleState, Result, ShellConfig, ShellWorker};

/// A parsed command-line invocation.
#[derive(Debug, PartialEq, Eq)]
enum Command {
    /// Install and activate the offline cache.
    Warm,
    /// Request an OTP for a phone number.
    RequestOtp(String),
    /// Verify an OTP and log in.
    VerifyOtp(String, String),
    /// Fetch the profile for a saved session token.
    Profile(String),
}

fn parse_command(args: &[String]) -> Option<Command> {
    match args.first().map(String::as_str) {
        Some("warm") if args.len() == 1 => Some(Command::Warm),
        Some("request-otp") if args.len() == 2 => Some(Command::RequestOtp(args[1].clone())),
        Some("verify-otp") if args.len() == 3 => {
            Some(Command::VerifyOtp(args[1].clone(), args[2].clone()))
        }
        Some("profile") if args.len() == 2 => Some(Command::Profile(args[1].clone())),
        _ => None,
    }
}

fn usage() -> ! {
    eprintln!("Usage: kukaya <command>");
    eprintln!();
    eprintln!("Commands:");
    eprintln!("  warm                       install and activate the offline cache");
    eprintln!("  request-otp <phone>        request a login code");
    eprintln!("  verify-otp <phone> <otp>   verify the code and log in");
    eprintln!("  profile <token>            fetch the session's user profile");
    eprintln!();
    eprintln!("Set KUKAYA_CONFIG to point at a shell.toml to override defaults.");
    std::process::exit(1);
}

fn load_config() -> Result<ShellConfig> {
    match env::var("KUKAYA_CONFIG") {
        Ok(path) => ShellConfig::load(Path::new(&path)),
        Err(_) => ShellConfig::load_default(),
    }
}

async fn warm(config: ShellConfig) -> Result<()> {
    let worker = ShellWorker::new(config)?;
    worker.install().await?;
    if worker.state() != LifecycleState::Active {
        worker.activate().await?;
    }
    println!(
        "cache generation {} is {}",
        worker.config().generation(),
        worker.state()
    );
    Ok(())
}

async fn request_otp(config: &ShellConfig, phone: &str) -> Result<()> {
    let client = ApiClient::new(&config.api_base_url)?;
    let challenge = client.request_otp(phone).await?;
    println!("{}", challenge.message);
    if let Some(otp) = challenge.dev_otp {
        println!("dev-mode OTP: {otp}");
    }
    Ok(())
}

async fn verify_otp(config: &ShellConfig, phone: &str, otp: &str) -> Result<()> {
    let mut client = ApiClient::new(&config.api_base_url)?;
    let session = client.verify_otp(phone, otp).await?;
    if session.created {
        println!("new account created for {}", session.user.phone);
    }
    println!("logged in as {} ({})", session.user.phone, session.user.role);
    if let Some(token) = client.token() {
        println!("session token: {token}");
    }
    Ok(())
}

async fn profile(config: &ShellConfig, token: &str) -> Result<()> {
    let mut client = ApiClient::new(&config.api_base_url)?;
    client.set_token(token);
    let user = client.profile().await?;
    println!("{} ({}), id {}", user.phone, user.role, user.id);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();

    let args: Vec<String> = env::args().skip(1).collect();
    let Some(command) = parse_command(&args) else {
        usage();
    };

    let config = load_config()?;
    match command {
        Command::Warm => warm(config).await,
        Command::RequestOtp(phone) => request_otp(&config, &phone).await,
        Command::VerifyOtp(phone, otp) => verify_otp(&config, &phone, &otp).await,
        Command::Profile(token) => profile(&config, &token).await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(parts: &[&str]) -> Vec<String> {
        parts.iter().map(ToString::to_string).collect()
    }

    #[test]
    fn parse_warm() {
        assert_eq!(parse_command(&args(&["warm"])), Some(Command::Warm));
    }

    #[test]
    fn parse_request_otp() {
        assert_eq!(
            parse_command(&args(&["request-otp", "+255700000001"])),
            Some(Command::RequestOtp("+255700000001".to_string()))
        );
    }

    #[test]
    fn parse_verify_otp() {
        assert_eq!(
            parse_command(&args(&["verify-otp", "+255700000001", "4821"])),
            Some(Command::VerifyOtp(
                "+255700000001".to_string(),
                "4821".to_string()
            ))
        );
    }

    #[test]
    fn reject_unknown_or_malformed() {
        assert_eq!(parse_command(&args(&[])), None);
        assert_eq!(parse_command(&args(&["bogus"])), None);
        assert_eq!(parse_command(&args(&["request-otp"])), None);
        assert_eq!(parse_command(&args(&["warm", "extra"])), None);
        assert_eq!(parse_command(&args(&["verify-otp", "+255700000001"])), None);
    }
}
