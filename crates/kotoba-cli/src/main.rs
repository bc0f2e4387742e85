//! Kotoba CLI - Prompt template and version management
//!
//! Simple CLI for interacting with the Kotoba prompt service.

mod config;

use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use dialoguer::{Confirm, Password};
use serde_json::Value;
use uuid::Uuid;

use kotoba::{
    load_prompt, FormattedPrompt, MessageContent, PromptHandle, PromptProperties, PromptVersion,
    SupportedModalities, VersionFilter,
};
use kotoba_client::PromptServiceClient;

use config::Config;

#[derive(Parser)]
#[command(name = "kotoba")]
#[command(about = "Kotoba CLI - Prompt template and version management", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Login and store API key
    Login {
        /// API key (will prompt if not provided)
        #[arg(short, long)]
        key: Option<String>,
    },

    /// Manage profiles (prompt shortcuts)
    Profile {
        #[command(subcommand)]
        action: ProfileAction,
    },

    /// Version history operations
    Versions {
        #[command(subcommand)]
        action: VersionsAction,
    },

    /// Render a prompt with variables
    Format {
        /// Variables as key=value (value may be JSON)
        #[arg(short = 'v', long = "var")]
        vars: Vec<String>,
        /// Render a specific commit instead of the current version
        #[arg(short, long)]
        commit: Option<String>,
        /// Collapse image content to placeholders
        #[arg(long)]
        no_vision: bool,
        /// Collapse video content to placeholders
        #[arg(long)]
        no_video: bool,
        /// Profile to use
        #[arg(short, long)]
        profile: Option<String>,
    },

    /// Update prompt properties
    Update {
        /// New prompt name
        #[arg(long)]
        name: Option<String>,
        /// New description
        #[arg(long)]
        description: Option<String>,
        /// New tags (comma-separated)
        #[arg(long, value_delimiter = ',')]
        tags: Option<Vec<String>>,
        /// Profile to use
        #[arg(short, long)]
        profile: Option<String>,
    },

    /// Delete a prompt and all its versions
    Delete {
        /// Skip confirmation
        #[arg(short, long)]
        yes: bool,
        /// Profile to use
        #[arg(short, long)]
        profile: Option<String>,
    },

    /// Create a new version whose content equals a historical commit
    Restore {
        /// Commit to restore
        commit: String,
        /// Profile to use
        #[arg(short, long)]
        profile: Option<String>,
    },

    /// Show current configuration
    Config,
}

#[derive(Subcommand)]
enum ProfileAction {
    /// Add a new profile
    Add {
        /// Profile name (e.g. "greeting")
        name: String,
        /// Prompt ID
        #[arg(long)]
        prompt_id: String,
        /// Display name (optional)
        #[arg(long)]
        display_name: Option<String>,
    },
    /// List all profiles
    List,
    /// Set default profile
    Set {
        /// Profile name to set as default
        name: String,
    },
    /// Remove a profile
    Remove {
        /// Profile name to remove
        name: String,
    },
}

#[derive(Subcommand)]
enum VersionsAction {
    /// List the full version history
    List {
        /// Profile to use
        #[arg(short, long)]
        profile: Option<String>,
    },
    /// Show one version
    Show {
        /// Commit to show
        commit: String,
        /// Profile to use
        #[arg(short, long)]
        profile: Option<String>,
    },
    /// Diff a version against the current one (or --against)
    Diff {
        /// Commit to inspect
        commit: String,
        /// Compare against this commit instead of the current version
        #[arg(long)]
        against: Option<String>,
        /// Profile to use
        #[arg(short, long)]
        profile: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Login { key } => cmd_login(key).await,
        Commands::Profile { action } => cmd_profile(action).await,
        Commands::Versions { action } => cmd_versions(action).await,
        Commands::Format {
            vars,
            commit,
            no_vision,
            no_video,
            profile,
        } => cmd_format(vars, commit, no_vision, no_video, profile).await,
        Commands::Update {
            name,
            description,
            tags,
            profile,
        } => cmd_update(name, description, tags, profile).await,
        Commands::Delete { yes, profile } => cmd_delete(yes, profile).await,
        Commands::Restore { commit, profile } => cmd_restore(commit, profile).await,
        Commands::Config => cmd_config(),
    }
}

// ============================================
// Helpers
// ============================================

fn api_client(config: &Config) -> Result<PromptServiceClient> {
    let api_key = config
        .api_key
        .as_ref()
        .context("Not logged in. Run 'kotoba login' first.")?;
    Ok(PromptServiceClient::new(&config.base_url, api_key))
}

async fn load_handle(config: &Config, profile: Option<&str>) -> Result<PromptHandle> {
    let prompt_id = config.get_prompt_id(profile).context(
        "No profile specified and no default profile set. Use -p <profile> or set a default.",
    )?;
    let prompt_id: Uuid = prompt_id
        .parse()
        .context("Profile prompt id is not a valid UUID")?;

    let store = Arc::new(api_client(config)?);
    let handle = load_prompt(store, prompt_id).await?;
    Ok(handle)
}

/// Parse repeated `key=value` arguments; values parse as JSON where
/// possible and fall back to plain strings
fn parse_variables(vars: &[String]) -> Result<serde_json::Map<String, Value>> {
    let mut variables = serde_json::Map::new();
    for var in vars {
        let (key, value) = var
            .split_once('=')
            .with_context(|| format!("Invalid variable '{}', expected key=value", var))?;
        let value = serde_json::from_str(value).unwrap_or_else(|_| Value::String(value.to_string()));
        variables.insert(key.to_string(), value);
    }
    Ok(variables)
}

fn truncate_string(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let prefix: String = s.chars().take(max).collect();
        format!("{}...", prefix)
    }
}

// ============================================
// Command Implementations
// ============================================

async fn cmd_login(key: Option<String>) -> Result<()> {
    let mut config = Config::load()?;

    let api_key = match key {
        Some(k) => k,
        None => Password::new()
            .with_prompt("API Key")
            .interact()
            .context("Failed to read API key")?,
    };

    // Test connection
    let client = PromptServiceClient::new(&config.base_url, &api_key);
    print!("Testing connection... ");

    match client.health().await {
        Ok(true) => {
            println!("{}", "OK".green());
        }
        _ => {
            println!("{}", "Failed".red());
            bail!("Could not connect to the prompt service. Check the base URL and API key.");
        }
    }

    config.set_api_key(api_key);
    config.save()?;

    println!("{} API key saved to {:?}", "✓".green(), Config::config_path()?);

    if config.profiles.is_empty() {
        println!("\n{}", "Tip: Set up a profile to avoid typing prompt IDs:".yellow());
        println!("  kotoba profile add greeting --prompt-id <PROMPT_ID>");
        println!("  kotoba profile set greeting");
    }

    Ok(())
}

async fn cmd_profile(action: ProfileAction) -> Result<()> {
    let mut config = Config::load()?;

    match action {
        ProfileAction::Add {
            name,
            prompt_id,
            display_name,
        } => {
            // Verify the prompt exists if we have an API key
            if config.api_key.is_some() {
                let client = api_client(&config)?;
                let id: Uuid = prompt_id
                    .parse()
                    .context("Prompt id is not a valid UUID")?;
                match kotoba::PromptStore::get_prompt(&client, id).await {
                    Ok(record) => {
                        let display = display_name.clone().unwrap_or_else(|| record.name.clone());
                        config.add_profile(name.clone(), prompt_id, Some(display.clone()));
                        config.save()?;
                        println!("{} Profile '{}' added ({})", "✓".green(), name, display);
                    }
                    Err(e) => {
                        bail!("Could not verify prompt: {}", e);
                    }
                }
            } else {
                config.add_profile(name.clone(), prompt_id, display_name);
                config.save()?;
                println!(
                    "{} Profile '{}' added (unverified - no API key)",
                    "✓".yellow(),
                    name
                );
            }
        }

        ProfileAction::List => {
            if config.profiles.is_empty() {
                println!("No profiles configured.");
                println!("\n{}", "Add one with:".dimmed());
                println!("  kotoba profile add <name> --prompt-id <PROMPT_ID>");
                return Ok(());
            }

            println!("{}", "Profiles:".bold());
            for (name, profile) in &config.profiles {
                let is_default = config.default_profile.as_ref() == Some(name);
                let default_marker = if is_default {
                    " (default)".green().to_string()
                } else {
                    String::new()
                };
                let display_name = profile.name.as_deref().unwrap_or("-");

                println!(
                    "  {} {} ({}){}",
                    name.cyan(),
                    display_name.dimmed(),
                    truncate_string(&profile.prompt_id, 8),
                    default_marker
                );
            }
        }

        ProfileAction::Set { name } => {
            if config.set_default_profile(name.clone()) {
                config.save()?;
                println!("{} Default profile set to '{}'", "✓".green(), name);
            } else {
                bail!("Profile '{}' not found", name);
            }
        }

        ProfileAction::Remove { name } => {
            if config.remove_profile(&name) {
                if config.default_profile.as_ref() == Some(&name) {
                    config.default_profile = None;
                }
                config.save()?;
                println!("{} Profile '{}' removed", "✓".green(), name);
            } else {
                bail!("Profile '{}' not found", name);
            }
        }
    }

    Ok(())
}

async fn cmd_versions(action: VersionsAction) -> Result<()> {
    let config = Config::load()?;

    match action {
        VersionsAction::List { profile } => {
            let handle = load_handle(&config, profile.as_deref()).await?;
            let versions = handle.get_versions(VersionFilter::default()).await?;

            if versions.is_empty() {
                println!("No versions found.");
                return Ok(());
            }

            println!(
                "{} ({} versions):",
                handle.name().bold(),
                versions.len().to_string().green()
            );
            for version in &versions {
                let current_marker = if version.commit == handle.commit() {
                    " (current)".green().to_string()
                } else {
                    String::new()
                };
                let description = version
                    .change_description
                    .as_deref()
                    .map(|d| truncate_string(d, 60))
                    .unwrap_or_default();

                println!(
                    "  {} {} {}{}",
                    version.commit.cyan(),
                    version.version_age().dimmed(),
                    description,
                    current_marker
                );
            }
        }

        VersionsAction::Show { commit, profile } => {
            let handle = load_handle(&config, profile.as_deref()).await?;
            let version = fetch_version(&handle, &commit).await?;

            println!("{}", version.version_info().bold());
            println!("{}", format!("({})", version.version_age()).dimmed());
            println!();
            println!("{}", version.source());
        }

        VersionsAction::Diff {
            commit,
            against,
            profile,
        } => {
            let handle = load_handle(&config, profile.as_deref()).await?;
            let version = fetch_version(&handle, &commit).await?;
            let base = match against {
                Some(base_commit) => fetch_version(&handle, &base_commit).await?,
                None => handle.version().clone(),
            };

            print!("{}", version.compare_to(&base));
        }
    }

    Ok(())
}

async fn fetch_version(handle: &PromptHandle, commit: &str) -> Result<PromptVersion> {
    handle
        .get_version(commit)
        .await?
        .with_context(|| format!("Version '{}' not found", commit))
}

async fn cmd_format(
    vars: Vec<String>,
    commit: Option<String>,
    no_vision: bool,
    no_video: bool,
    profile: Option<String>,
) -> Result<()> {
    let config = Config::load()?;
    let handle = load_handle(&config, profile.as_deref()).await?;
    let variables = parse_variables(&vars)?;

    let version = match commit {
        Some(commit) => fetch_version(&handle, &commit).await?,
        None => handle.version().clone(),
    };
    let modalities = SupportedModalities {
        vision: no_vision.then_some(false),
        video: no_video.then_some(false),
    };

    match version.format_with_modalities(&variables, modalities)? {
        FormattedPrompt::Text(text) => println!("{}", text),
        FormattedPrompt::Chat(messages) => {
            for message in &messages {
                println!("{}", format!("[{}]", message.role).cyan().bold());
                match &message.content {
                    MessageContent::Text(text) => println!("{}", text),
                    MessageContent::Parts(parts) => {
                        println!("{}", serde_json::to_string_pretty(parts)?)
                    }
                }
                println!();
            }
        }
    }

    Ok(())
}

async fn cmd_update(
    name: Option<String>,
    description: Option<String>,
    tags: Option<Vec<String>>,
    profile: Option<String>,
) -> Result<()> {
    if name.is_none() && description.is_none() && tags.is_none() {
        bail!("Nothing to update. Pass --name, --description or --tags.");
    }

    let config = Config::load()?;
    let mut handle = load_handle(&config, profile.as_deref()).await?;

    handle
        .update_properties(PromptProperties {
            name,
            description,
            tags,
        })
        .await?;

    println!("{} Prompt '{}' updated", "✓".green(), handle.name());
    Ok(())
}

async fn cmd_delete(yes: bool, profile: Option<String>) -> Result<()> {
    let config = Config::load()?;
    let handle = load_handle(&config, profile.as_deref()).await?;

    if !yes {
        let confirmed = Confirm::new()
            .with_prompt(format!(
                "Delete prompt '{}' and all of its versions?",
                handle.name()
            ))
            .default(false)
            .interact()
            .context("Failed to read confirmation")?;
        if !confirmed {
            println!("Aborted.");
            return Ok(());
        }
    }

    handle.delete().await?;
    println!("{} Prompt '{}' deleted", "✓".green(), handle.name());
    Ok(())
}

async fn cmd_restore(commit: String, profile: Option<String>) -> Result<()> {
    let config = Config::load()?;
    let handle = load_handle(&config, profile.as_deref()).await?;
    let version = fetch_version(&handle, &commit).await?;

    let new_commit = match &handle {
        PromptHandle::Text(prompt) => prompt.use_version(&version).await?.commit().to_string(),
        PromptHandle::Chat(prompt) => prompt.use_version(&version).await?.commit().to_string(),
    };

    println!(
        "{} Restored content of {} as new version {}",
        "✓".green(),
        commit.cyan(),
        new_commit.cyan().bold()
    );
    Ok(())
}

fn cmd_config() -> Result<()> {
    let config = Config::load()?;

    println!("{}", "Configuration:".bold());
    println!("  config file: {:?}", Config::config_path()?);
    println!("  base_url: {}", config.base_url);
    println!(
        "  api_key: {}",
        if config.api_key.is_some() {
            "set".green().to_string()
        } else {
            "not set".red().to_string()
        }
    );
    println!(
        "  default_profile: {}",
        config.default_profile.as_deref().unwrap_or("-")
    );
    println!("  profiles: {}", config.profiles.len());

    Ok(())
}
