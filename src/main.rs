//! hmdfleet - Fleet management for networked VR headsets
//!
//! This is the binary entry point. All coordination logic lives in the
//! library crates; the CLI manages the persisted surfaces (saved
//! connections and settings). Live-device operations go through a
//! `DeviceConnector` supplied by the embedding application.

use clap::{Parser, Subcommand};
use color_eyre::eyre::Result;
use tracing::debug;

use hmdfleet_app::{config_dir, load_settings, save_settings, ConnectionStore};
use hmdfleet_core::types::ConnectionRecord;

/// Fleet management for networked VR headsets
#[derive(Parser, Debug)]
#[command(name = "hmdfleet")]
#[command(about = "Manage a fleet of networked VR headsets", long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Manage saved device connections
    #[command(subcommand)]
    Connections(ConnectionsCommand),

    /// Show or change settings
    #[command(subcommand)]
    Config(ConfigCommand),
}

#[derive(Subcommand, Debug)]
enum ConnectionsCommand {
    /// List saved connections
    List,

    /// Save a device for reconnection at startup
    Add {
        /// Device address, e.g. 10.0.0.7:5555
        address: String,

        /// Username; defaults apply when omitted
        #[arg(long, default_value = "")]
        username: String,

        /// Password; an empty value means "use the default credentials"
        #[arg(long, default_value = "")]
        password: String,
    },

    /// Remove one saved connection
    Remove {
        /// Device address to remove
        address: String,
    },

    /// Delete every saved connection
    Forget,
}

#[derive(Subcommand, Debug)]
enum ConfigCommand {
    /// Print the current settings
    Show,

    /// Change one or more settings
    Set {
        /// Username substituted when a connect request carries none
        #[arg(long)]
        default_username: Option<String>,

        /// Password substituted when a connect request carries none
        #[arg(long)]
        default_password: Option<String>,

        /// Per-device connect timeout in seconds
        #[arg(long)]
        connect_timeout: Option<u64>,

        /// Reconnect to saved devices automatically at startup
        #[arg(long)]
        auto_reconnect: Option<bool>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    hmdfleet_core::logging::init()?;

    let args = Args::parse();
    debug!("Running {:?}", args.command);

    match args.command {
        Command::Connections(command) => run_connections(command),
        Command::Config(command) => run_config(command),
    }
}

fn run_connections(command: ConnectionsCommand) -> Result<()> {
    let store = ConnectionStore::default_location();

    match command {
        ConnectionsCommand::List => {
            let records = store.load_all();
            if records.is_empty() {
                println!("No saved connections.");
                return Ok(());
            }
            for record in &records {
                let credentials = if record.uses_default_credentials() {
                    "default credentials".to_string()
                } else {
                    format!("user {}", record.username)
                };
                println!("{}  ({})", record.address, credentials);
            }
        }
        ConnectionsCommand::Add {
            address,
            username,
            password,
        } => {
            store.upsert(ConnectionRecord::new(&address, username, password))?;
            println!("Saved {}", address);
        }
        ConnectionsCommand::Remove { address } => {
            let mut records = store.load_all();
            let before = records.len();
            records.retain(|r| r.address != address);
            if records.len() == before {
                println!("No saved connection for {}", address);
            } else {
                store.save_all(&records)?;
                println!("Removed {}", address);
            }
        }
        ConnectionsCommand::Forget => {
            store.delete_all()?;
            println!("All saved connections deleted.");
        }
    }
    Ok(())
}

fn run_config(command: ConfigCommand) -> Result<()> {
    let dir = config_dir();

    match command {
        ConfigCommand::Show => {
            let settings = load_settings(&dir);
            println!("default_username     = {}", settings.default_username);
            println!(
                "default_password     = {}",
                if settings.default_password.is_empty() {
                    "(not set)"
                } else {
                    "(set)"
                }
            );
            println!("connect_timeout_secs = {}", settings.connect_timeout_secs);
            println!("auto_reconnect       = {}", settings.auto_reconnect);
        }
        ConfigCommand::Set {
            default_username,
            default_password,
            connect_timeout,
            auto_reconnect,
        } => {
            let mut settings = load_settings(&dir);
            if let Some(username) = default_username {
                settings.default_username = username;
            }
            if let Some(password) = default_password {
                settings.default_password = password;
            }
            if let Some(timeout) = connect_timeout {
                settings.connect_timeout_secs = timeout;
            }
            if let Some(auto) = auto_reconnect {
                settings.auto_reconnect = auto;
            }
            save_settings(&dir, &settings)?;
            println!("Settings saved.");
        }
    }
    Ok(())
}
