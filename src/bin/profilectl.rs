//! profilectl
//!
//! Administrative command line over a profilestore data directory.
//!
//! ```text
//! profilectl --data-dir ./data create username=alice education_level=Undergraduate
//! profilectl recs add alice topic="Linear Algebra" 'resources=["Videos"]'
//! profilectl search education_level=Undergraduate
//! ```
//!
//! Field arguments are `key=value`. A value that parses as JSON is stored as
//! that JSON value, anything else as a string. Results are printed to stdout
//! as pretty JSON; logs go to stderr.

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;
use serde_json::Value;
use tracing_subscriber::{fmt, EnvFilter};

use profilestore::storage::files::ENV_DATA_DIR;
use profilestore::{Attributes, ProfileStore, StoreConfig};

/// Inspect and edit profiles, preferences and recommendations
#[derive(Parser)]
#[command(name = "profilectl")]
#[command(version)]
#[command(about = "Inspect and edit a profilestore data directory")]
#[command(propagate_version = true)]
struct Cli {
    /// Data directory
    #[arg(short, long, env = ENV_DATA_DIR, default_value = "./data")]
    data_dir: PathBuf,

    /// Verbosity level (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List stored usernames
    List,
    /// Show one profile
    Show { username: String },
    /// Create a profile; fields must include username=<name>
    Create {
        #[arg(required = true)]
        fields: Vec<String>,
    },
    /// Merge fields into an existing profile
    Update {
        username: String,
        #[arg(required = true)]
        fields: Vec<String>,
    },
    /// Delete a profile with its preferences, recommendations and feedback
    Delete { username: String },
    /// Profiles whose fields equal every given key=value
    Search { criteria: Vec<String> },
    /// Learning preferences
    Prefs {
        #[command(subcommand)]
        action: PrefsCommands,
    },
    /// Recommendation history
    Recs {
        #[command(subcommand)]
        action: RecsCommands,
    },
    /// System-wide counters
    Stats,
    /// Subject popularity
    Topics,
    /// Heuristic recommendation impact
    Impact,
}

#[derive(Subcommand)]
enum PrefsCommands {
    /// Show a user's preferences
    Show { username: String },
    /// Replace a user's preferences
    Set { username: String, fields: Vec<String> },
    /// Merge fields into a user's preferences
    Update {
        username: String,
        #[arg(required = true)]
        fields: Vec<String>,
    },
}

#[derive(Subcommand)]
enum RecsCommands {
    /// List a user's recommendations, newest first
    List { username: String },
    /// Show one recommendation
    Show { username: String, id: String },
    /// Save a recommendation and print its id
    Add { username: String, fields: Vec<String> },
    /// Delete one recommendation
    Delete { username: String, id: String },
}

/// Splits `key=value`, reading the value as JSON when it parses.
fn parse_assignment(arg: &str) -> Result<(String, Value)> {
    let Some((key, raw)) = arg.split_once('=') else {
        bail!("expected key=value, got '{arg}'");
    };
    if key.is_empty() {
        bail!("empty key in '{arg}'");
    }
    let value = serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()));
    Ok((key.to_string(), value))
}

fn parse_fields(args: &[String]) -> Result<Attributes> {
    args.iter()
        .map(|arg| parse_assignment(arg))
        .collect::<Result<Attributes>>()
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    let text = serde_json::to_string_pretty(value).context("failed to encode output")?;
    println!("{text}");
    Ok(())
}

fn run(store: &ProfileStore, command: Commands) -> Result<()> {
    match command {
        Commands::List => print_json(&store.try_list_all_profiles()?),
        Commands::Show { username } => match store.try_get_profile(&username)? {
            Some(profile) => print_json(&profile),
            None => bail!("no profile for '{username}'"),
        },
        Commands::Create { fields } => {
            let profile = store.try_create_profile(parse_fields(&fields)?)?;
            print_json(&profile)
        }
        Commands::Update { username, fields } => {
            let profile = store.try_update_profile(&username, parse_fields(&fields)?)?;
            print_json(&profile)
        }
        Commands::Delete { username } => {
            let report = store.try_delete_profile(&username)?;
            print_json(&report)?;
            if !report.is_complete() {
                bail!("profile removed but cascade incomplete");
            }
            Ok(())
        }
        Commands::Search { criteria } => {
            print_json(&store.try_search_profiles(&parse_fields(&criteria)?)?)
        }
        Commands::Prefs { action } => match action {
            PrefsCommands::Show { username } => match store.try_get_preferences(&username)? {
                Some(prefs) => print_json(&prefs),
                None => bail!("no preferences for '{username}'"),
            },
            PrefsCommands::Set { username, fields } => {
                print_json(&store.try_save_preferences(&username, parse_fields(&fields)?)?)
            }
            PrefsCommands::Update { username, fields } => {
                print_json(&store.try_update_preferences(&username, parse_fields(&fields)?)?)
            }
        },
        Commands::Recs { action } => match action {
            RecsCommands::List { username } => {
                print_json(&store.try_get_all_recommendations(&username)?)
            }
            RecsCommands::Show { username, id } => {
                match store.try_get_recommendation(&username, &id)? {
                    Some(rec) => print_json(&rec),
                    None => bail!("no recommendation '{id}' for '{username}'"),
                }
            }
            RecsCommands::Add { username, fields } => {
                let id = store.try_save_recommendation(&username, parse_fields(&fields)?)?;
                print_json(&id)
            }
            RecsCommands::Delete { username, id } => {
                store.try_delete_recommendation(&username, &id)?;
                print_json(&id)
            }
        },
        Commands::Stats => print_json(&store.try_get_statistics()?),
        Commands::Topics => print_json(&store.try_get_topic_analytics()?),
        Commands::Impact => print_json(&store.try_get_recommendation_impact()?),
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = match cli.verbose {
        0 => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        1 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };
    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let config = StoreConfig::from_env().with_base_dir(cli.data_dir);
    let store = ProfileStore::open(config).context("failed to open data directory")?;
    run(&store, cli.command)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn assignment_values_parse_as_json_or_string() {
        assert_eq!(parse_assignment("age=21").unwrap(), ("age".into(), json!(21)));
        assert_eq!(
            parse_assignment("subjects=[\"Math\",\"Art\"]").unwrap().1,
            json!(["Math", "Art"])
        );
        assert_eq!(parse_assignment("major=CS").unwrap().1, json!("CS"));
        assert_eq!(parse_assignment("note=a=b").unwrap().1, json!("a=b"));
        assert_eq!(parse_assignment("empty=").unwrap().1, json!(""));
    }

    #[test]
    fn assignment_requires_key_and_separator() {
        assert!(parse_assignment("novalue").is_err());
        assert!(parse_assignment("=x").is_err());
    }

    #[test]
    fn later_fields_override_earlier() {
        let fields = parse_fields(&["a=1".to_string(), "a=2".to_string()]).unwrap();
        assert_eq!(fields.get("a"), Some(&json!(2)));
    }

    #[test]
    fn cli_parses_nested_subcommands() {
        let cli = Cli::try_parse_from([
            "profilectl", "--data-dir", "/tmp/x", "recs", "show", "alice", "20240301-120000",
        ])
        .unwrap();
        assert_eq!(cli.data_dir, PathBuf::from("/tmp/x"));
        assert!(matches!(
            cli.command,
            Commands::Recs { action: RecsCommands::Show { .. } }
        ));
    }
}
