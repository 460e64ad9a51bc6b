//! Command handler layer.
//!
//! This module owns CLI-oriented orchestration and output wiring. Every
//! command is a view: protected views go through the capability gate before
//! any backend call is made.
//!
//! ## Files
//! - `account.rs` — login/signup/logout/whoami/authorize/nav.
//! - `citizen.rs` — application submission and own status.
//! - `admin.rs` — live feed, actions, stats, threat analytics, users.
//!
//! ## Principles
//! - Parse/match CLI inputs here.
//! - Delegate business logic to `services/*`.
//! - Keep behavior and output schema stable.

pub mod account;
pub mod admin;
pub mod citizen;

use crate::cli::{Cli, Commands, FeedCommands};
use crate::services::api::{ApiClient, ApiError};
use crate::services::config::ConfigFile;
use crate::services::session::SessionStore;

pub struct AppContext {
    pub json: bool,
    pub config: ConfigFile,
    pub store: SessionStore,
}

impl AppContext {
    /// Client carrying the current session token.
    pub fn client(&self) -> anyhow::Result<ApiClient> {
        Ok(self.anonymous_client()?.with_session(&self.store.current()))
    }

    pub fn anonymous_client(&self) -> anyhow::Result<ApiClient> {
        Ok(ApiClient::new(
            &self.config.api.base_url,
            self.config.request_timeout(),
        )?)
    }
}

/// Turns transport failures into the message users expect to read.
pub fn describe(err: ApiError) -> anyhow::Error {
    match err {
        ApiError::Network(e) => {
            anyhow::Error::new(e).context("Network error. Unable to connect to server.")
        }
        other => other.into(),
    }
}

pub async fn run(cli: &Cli, ctx: &AppContext) -> anyhow::Result<()> {
    match &cli.command {
        Commands::Login { username, password } => account::login(ctx, username, password).await,
        Commands::Signup {
            username,
            password,
            role,
            login,
        } => account::signup(ctx, username, password, *role, *login).await,
        Commands::Logout => account::logout(ctx),
        Commands::Whoami => account::whoami(ctx),
        Commands::Authorize { view } => account::authorize(ctx, *view),
        Commands::Nav => account::nav(ctx),
        Commands::Apply {
            pan,
            bank_account,
            full_name,
            age,
            gender,
        } => {
            citizen::apply(
                ctx,
                citizen::SubmissionArgs {
                    pan: pan.clone(),
                    bank_account: bank_account.clone(),
                    full_name: full_name.clone(),
                    age: *age,
                    gender: gender.clone(),
                },
            )
            .await
        }
        Commands::Status => citizen::status(ctx).await,
        Commands::Feed { command } => match command {
            FeedCommands::Show { search, analytics } => {
                admin::show_feed(ctx, search, *analytics).await
            }
            FeedCommands::Watch {
                search,
                interval_secs,
                ticks,
                analytics,
            } => admin::watch_feed(ctx, search, *interval_secs, *ticks, *analytics).await,
        },
        Commands::Act { id, action } => admin::act(ctx, *id, *action).await,
        Commands::Stats => admin::stats(ctx).await,
        Commands::Threats => admin::threats(ctx).await,
        Commands::Users => admin::users(ctx).await,
    }
}
