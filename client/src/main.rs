//! Command-line entry point: runs one session operation against the hosted
//! platform and reports where the user would land.
#![cfg_attr(not(any(test, doctest)), deny(clippy::unwrap_used))]
#![cfg_attr(not(any(test, doctest)), deny(clippy::expect_used))]

use std::io::{self, Write};
use std::sync::Arc;

use clap::{Parser, Subcommand};
use color_eyre::eyre::{Context, Result, eyre};
use mockable::{DefaultClock, DefaultEnv};
use serde::Serialize;
use tokio::runtime::Builder;
use tracing::warn;
use tracing_subscriber::{EnvFilter, fmt};
use url::Url;

use marketplace_client::config::{BuildMode, backend_settings_from_env, session_file_from_env};
use marketplace_client::domain::{
    DomainError, Envelope, ProfileUpdate, RegistrationForm, Role, SessionBridge,
    SessionBridgePorts, User,
};
use marketplace_client::outbound::console::{LoggingNavigator, LoggingNotifier};
use marketplace_client::outbound::hosted::HostedAdapters;

/// `marketplace-session` command arguments.
#[derive(Debug, Parser)]
#[command(
    name = "marketplace-session",
    about = "Sign in to the marketplace and report the landing surface",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Sign in with email and password.
    Login {
        /// Account email.
        #[arg(long)]
        email: String,
        /// Account password.
        #[arg(long, env = "MARKETPLACE_PASSWORD", hide_env_values = true)]
        password: String,
    },
    /// Create an account.
    Register {
        /// Account email.
        #[arg(long)]
        email: String,
        /// Chosen password.
        #[arg(long, env = "MARKETPLACE_PASSWORD", hide_env_values = true)]
        password: String,
        /// Given name.
        #[arg(long)]
        first_name: String,
        /// Family name.
        #[arg(long)]
        last_name: String,
        /// ADMIN, MANAGER, VENDOR or CUSTOMER.
        #[arg(long, value_parser = parse_role)]
        role: Option<Role>,
        /// Contact phone.
        #[arg(long)]
        phone: Option<String>,
        /// Shop name; required for vendors.
        #[arg(long)]
        shop_name: Option<String>,
    },
    /// Send a password reset email.
    ResetPassword {
        /// Account email.
        #[arg(long)]
        email: String,
    },
    /// Print the Google consent URL to open in a browser.
    Google,
    /// Finish a Google sign-in or email link with the URL the browser was
    /// redirected to.
    Callback {
        /// Full redirect URL, including its `#access_token=...` fragment.
        #[arg(long)]
        url: Url,
    },
    /// Update the signed-in user's profile.
    UpdateProfile {
        /// New given name.
        #[arg(long)]
        first_name: Option<String>,
        /// New family name.
        #[arg(long)]
        last_name: Option<String>,
        /// New phone number.
        #[arg(long)]
        phone: Option<String>,
    },
    /// Show the restored session, if any.
    Status,
    /// Sign out.
    Logout,
}

fn parse_role(raw: &str) -> Result<Role, String> {
    Role::parse(raw).ok_or_else(|| format!("unknown role '{raw}'"))
}

fn main() -> Result<()> {
    color_eyre::install()?;
    if let Err(e) = fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .json()
        .try_init()
    {
        warn!(error = %e, "tracing init failed");
    }

    let cli = Cli::parse();
    let runtime = Builder::new_multi_thread()
        .enable_all()
        .build()
        .wrap_err("failed to build Tokio runtime")?;
    runtime.block_on(run(cli))
}

async fn run(cli: Cli) -> Result<()> {
    let envelope: Envelope<Summary> = session(cli.command).await.into();
    report(&envelope)?;
    match envelope {
        Envelope::Success(_) => Ok(()),
        Envelope::Failure { message } => Err(eyre!(message)),
    }
}

/// Final state printed after a command.
#[derive(Debug, Serialize)]
struct Summary {
    user: Option<User>,
    location: Option<String>,
}

/// Wire the hosted adapters, run `command` and summarise where it left the
/// user. Startup failures are reported like any other failed command.
async fn session(command: Command) -> Result<Summary, DomainError> {
    let env = DefaultEnv::new();
    let settings = backend_settings_from_env(&env, BuildMode::from_debug_assertions())?;
    let session_file = session_file_from_env(&env);
    let adapters =
        HostedAdapters::connect(&settings, Arc::new(DefaultClock), session_file.as_deref())
            .map_err(|err| DomainError::internal(err.to_string()))?;
    let navigator = Arc::new(LoggingNavigator::default());

    let bridge = SessionBridge::new(
        SessionBridgePorts {
            auth: Arc::new(adapters.auth),
            profiles: Arc::new(adapters.profiles),
            navigator: navigator.clone(),
            notifier: Arc::new(LoggingNotifier),
        },
        settings.oauth_redirect.clone(),
    );
    let mut handle = bridge.start();
    handle.ready().await;

    let outcome = execute(&bridge, command).await;
    handle.shutdown().await;

    outcome.map(|()| Summary {
        user: bridge.current_user(),
        location: navigator.last_location(),
    })
}

async fn execute(bridge: &SessionBridge, command: Command) -> Result<(), DomainError> {
    match command {
        Command::Login { email, password } => bridge.login(&email, &password).await,
        Command::Register {
            email,
            password,
            first_name,
            last_name,
            role,
            phone,
            shop_name,
        } => {
            bridge
                .register(RegistrationForm {
                    email,
                    password,
                    first_name,
                    last_name,
                    role,
                    phone,
                    shop_name,
                })
                .await
        }
        Command::ResetPassword { email } => bridge.reset_password(&email).await,
        Command::Google => bridge.login_with_google().await,
        Command::Callback { url } => bridge.complete_oauth_callback(&url).await,
        Command::UpdateProfile {
            first_name,
            last_name,
            phone,
        } => {
            bridge
                .update_profile(ProfileUpdate {
                    first_name,
                    last_name,
                    phone,
                    avatar: None,
                })
                .await
        }
        Command::Status => {
            bridge.redirect_to_dashboard();
            Ok(())
        }
        Command::Logout => bridge.logout().await,
    }
}

fn report(envelope: &Envelope<Summary>) -> Result<()> {
    let rendered = serde_json::to_string_pretty(envelope).wrap_err("failed to render summary")?;
    let mut stdout = io::stdout().lock();
    writeln!(stdout, "{rendered}").wrap_err("failed to write summary")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn command_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn password_can_come_from_the_environment() {
        let help = Cli::command()
            .find_subcommand_mut("login")
            .expect("login subcommand")
            .render_long_help()
            .to_string();
        assert!(help.contains("MARKETPLACE_PASSWORD"));
    }

    #[test]
    fn callback_takes_the_redirect_url() {
        let cli = Cli::try_parse_from([
            "marketplace-session",
            "callback",
            "--url",
            "http://localhost:3000/auth/callback#access_token=at&refresh_token=rt",
        ])
        .expect("callback parses");
        let Command::Callback { url } = cli.command else {
            panic!("expected callback command");
        };
        assert_eq!(url.fragment(), Some("access_token=at&refresh_token=rt"));
    }

    #[test]
    fn callback_without_url_is_rejected() {
        assert!(Cli::try_parse_from(["marketplace-session", "callback"]).is_err());
    }

    #[test]
    fn register_rejects_unknown_roles() {
        let result = Cli::try_parse_from([
            "marketplace-session",
            "register",
            "--email",
            "a@b.com",
            "--password",
            "secret1",
            "--first-name",
            "Ana",
            "--last-name",
            "Lee",
            "--role",
            "OWNER",
        ]);
        assert!(result.is_err());
    }
}
