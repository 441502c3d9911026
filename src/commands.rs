// Command layer: parses the command line and runs exactly one flow per
// invocation. Each flow opens a session, performs one remote call and
// returns the envelope to print. Errors never escape a flow.

use anyhow::{Context, Result};
use clap::error::ErrorKind;
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing::{debug, error, info};

use crate::api::ApiClient;
use crate::banner::ProfileBannerExt;
use crate::config::Config;
use crate::envelope::Envelope;
use crate::followers::summarize_followers;

/// Prints the target account's first followers as JSON, or updates the
/// logged-in account's profile image or banner.
#[derive(Parser, Debug)]
#[command(name = "banner-shim", version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug, PartialEq, Eq)]
pub enum Command {
    /// Upload a new profile image from a local file
    #[command(name = "update_image")]
    UpdateImage { path: Option<PathBuf> },
    /// Upload a new profile banner from a local file
    #[command(name = "update_banner")]
    UpdateBanner { path: Option<PathBuf> },
}

/// Map a command-line parse failure to the one-line envelope. `--help` and
/// `--version` become `{usage}`, everything else `{error}` with the first
/// line of clap's diagnostic. The full clap rendering belongs on stderr.
pub fn usage_envelope(err: &clap::Error) -> Envelope {
    let rendered = err.render().to_string();
    if matches!(err.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) {
        return Envelope::usage(rendered.trim());
    }
    let first = rendered
        .lines()
        .map(str::trim)
        .find(|line| !line.is_empty())
        .unwrap_or("invalid arguments");
    Envelope::error(first.trim_start_matches("error:").trim())
}

/// Dispatch `command`. `load_config` runs inside the flow so a missing
/// credential is reported like any other flow failure.
pub fn run<F>(command: Option<Command>, load_config: F) -> Envelope
where
    F: FnOnce() -> Result<Config>,
{
    match command {
        None => guarded(load_config, list_followers),
        Some(Command::UpdateImage { path: None }) => Envelope::error("Image path not provided"),
        Some(Command::UpdateImage { path: Some(path) }) => {
            guarded(load_config, |config| update_image(config, &path))
        }
        Some(Command::UpdateBanner { path: None }) => Envelope::error("Banner path not provided"),
        Some(Command::UpdateBanner { path: Some(path) }) => {
            guarded(load_config, |config| update_banner(config, &path))
        }
    }
}

fn guarded<L, F>(load_config: L, flow: F) -> Envelope
where
    L: FnOnce() -> Result<Config>,
    F: FnOnce(&Config) -> Result<Envelope>,
{
    match load_config().and_then(|config| flow(&config)) {
        Ok(envelope) => envelope,
        Err(e) => {
            error!("Command failed: {:#}", e);
            Envelope::failure(&e)
        }
    }
}

fn open_session(config: &Config) -> Result<ApiClient> {
    let mut api = ApiClient::from_config(config)?;
    api.login(&config.credentials)?;
    Ok(api)
}

/// Resolve the target handle, fetch its followers and summarize them.
pub fn list_followers(config: &Config) -> Result<Envelope> {
    let api = open_session(config)?;
    let target = config.target_username()?;

    let user = api
        .get_user_by_screen_name(target)
        .with_context(|| format!("Failed to look up user {}", target))?;
    let user_id = user
        .id_str
        .with_context(|| format!("User lookup for {} returned no id", target))?;

    let followers = api.get_user_followers(&user_id)?;
    debug!(first = ?followers.first(), "Fetched {} followers", followers.len());

    Ok(Envelope::Followers(summarize_followers(&followers)))
}

pub fn update_image(config: &Config, path: &Path) -> Result<Envelope> {
    let api = open_session(config)?;
    let image = read_file(path)?;
    api.update_profile_image(&image)?;
    info!("Profile image updated from {}", path.display());
    Ok(Envelope::success("Profile image updated successfully"))
}

pub fn update_banner(config: &Config, path: &Path) -> Result<Envelope> {
    let api = open_session(config)?;
    let banner = read_file(path)?;
    api.upload_profile_banner(banner)?;
    info!("Profile banner updated from {}", path.display());
    Ok(Envelope::success("Banner updated successfully"))
}

fn read_file(path: &Path) -> Result<Vec<u8>> {
    std::fs::read(path).with_context(|| format!("Failed to read {}", path.display()))
}
