use std::fmt::Debug;
use std::fs::File;
use std::io::BufReader;
use std::path::PathBuf;

use clap::{Parser, Subcommand};
use clap_serde_derive::ClapSerde;
use serde::Serialize;
use tracing::{debug, info};
use tracing_subscriber::{fmt, EnvFilter};
use wtledger::delegate::{
    BlockNumberStore, ChannelActionSet, DelegateManager, DelegateStore, MonitorStore,
};
use wtledger::store::{db_migrate::DbMigrate, Store};
use wtledger::types::{Address, Hash256};
use wtledger::{get_default_config_file, Config, LedgerConfig};

pub struct ExitMessage(String);

impl Debug for ExitMessage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl<E: std::fmt::Display> From<E> for ExitMessage {
    fn from(err: E) -> Self {
        ExitMessage(err.to_string())
    }
}

#[derive(Parser)]
#[command(author, version, about = "Inspect and maintain a watchtower delegation ledger")]
struct Args {
    /// config file
    #[arg(short, long = "config", help = format!("config file [default: {:?} or $BASE_DIR/config.yml]", get_default_config_file()))]
    config_path: Option<PathBuf>,

    /// base directory
    #[arg(short = 'd', long = "dir", help = format!("base directory for all [default: {:?}]", wtledger::get_base_dir()))]
    base_dir: Option<PathBuf>,

    #[command(flatten)]
    ledger: <LedgerConfig as ClapSerde>::Opt,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Decode every record and report the corrupted ones
    Check,
    /// Run pending schema migrations
    Migrate,
    /// Show the credit an address must keep reserved
    Account {
        #[arg(long)]
        address: Address,
    },
    /// Show the delegation of an address on a channel
    Delegation {
        #[arg(long)]
        channel_id: Hash256,
        #[arg(long)]
        address: Address,
    },
    /// List the active delegations on a channel
    Channel {
        #[arg(long)]
        channel_id: Hash256,
    },
    /// List the archived delegations of a channel
    Archived {
        #[arg(long)]
        channel_id: Hash256,
    },
    /// Show the monitor triggers in `(after, up_to]`
    Triggers {
        #[arg(long, default_value_t = 0)]
        after: u64,
        #[arg(long, default_value_t = u64::MAX)]
        up_to: u64,
    },
    /// Show or raise the latest processed block number
    Height {
        #[arg(long)]
        set: Option<u64>,
    },
    /// Submit a delegation read from a JSON file
    Submit {
        #[arg(long)]
        address: Address,
        #[arg(long)]
        file: PathBuf,
    },
}

fn print_json<T: Serialize>(value: &T) -> Result<(), ExitMessage> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn open_store(config: &LedgerConfig) -> Result<Store, ExitMessage> {
    let path = config.create_store_dir()?;
    debug!("Opening store at {}", path.display());
    Ok(Store::new(path)?)
}

pub fn main() -> Result<(), ExitMessage> {
    fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|err| ExitMessage(format!("failed to initialize logger: {}", err)))?;

    let mut args = Args::parse();
    let config = Config::load(
        args.config_path.as_deref(),
        args.base_dir.as_deref(),
        &mut args.ledger,
    )?
    .ledger;
    info!(
        "wtledger {} using store {}",
        wtledger::get_git_version(),
        config.store_path().display()
    );

    match args.command {
        Command::Check => {
            Store::check_validate(config.store_path())?;
            println!("store is valid");
        }
        Command::Migrate => {
            let store = Store::open_db(&config.create_store_dir()?)?;
            let migrate = DbMigrate::new(&store);
            if migrate.need_init()? {
                migrate.init_db_version()?;
            } else {
                migrate.migrate()?;
            }
            println!("store is up to date");
        }
        Command::Account { address } => {
            let store = open_store(&config)?;
            let manager = DelegateManager::new(store, config.to_delegate_config());
            print_json(&manager.get_account(&address)?)?;
        }
        Command::Delegation {
            channel_id,
            address,
        } => {
            let store = open_store(&config)?;
            let manager = DelegateManager::new(store, config.to_delegate_config());
            let delegation = manager
                .get_delegation(channel_id, address)?
                .ok_or_else(|| {
                    ExitMessage(format!(
                        "no delegation of {} on channel {}",
                        address, channel_id
                    ))
                })?;
            print_json(&delegation)?;
        }
        Command::Channel { channel_id } => {
            let store = open_store(&config)?;
            let manager = DelegateManager::new(store, config.to_delegate_config());
            print_json(&manager.list_by_channel(&channel_id)?)?;
        }
        Command::Archived { channel_id } => {
            let store = open_store(&config)?;
            print_json(&store.get_archived_delegations(&channel_id)?)?;
        }
        Command::Triggers { after, up_to } => {
            let store = open_store(&config)?;
            print_json(&store.get_monitor_triggers_in_range(after, up_to)?)?;
        }
        Command::Height { set } => {
            let store = open_store(&config)?;
            if let Some(block_number) = set {
                let manager = DelegateManager::new(store.clone(), config.to_delegate_config());
                manager.scheduler().advance_chain_height(block_number)?;
            }
            println!("{}", store.get_latest_block_number()?);
        }
        Command::Submit { address, file } => {
            let actions: ChannelActionSet =
                serde_json::from_reader(BufReader::new(File::open(&file)?))?;
            let store = open_store(&config)?;
            let manager = DelegateManager::new(store, config.to_delegate_config());
            let delegation = manager.submit(actions, address)?;
            print_json(&delegation)?;
            print_json(&manager.get_account(&address)?)?;
        }
    }
    Ok(())
}
