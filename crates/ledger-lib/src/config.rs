//! Layered configuration: YAML file, then command line and environment.

use std::{
    fs::{self, File},
    io::BufReader,
    path::{Path, PathBuf},
};

use clap_serde_derive::{
    clap::{self},
    ClapSerde,
};
use home::home_dir;
use num_bigint::BigUint;
use serde::Deserialize;
use tracing::debug;

use crate::{
    delegate::{CostModel, DelegateConfig, DEFAULT_REVEAL_TIMEOUT},
    Error, Result,
};

pub const DEFAULT_CONFIG_FILE_NAME: &str = "config.yml";
const DEFAULT_BASE_DIR_NAME: &str = ".wtledger";
const DEFAULT_STORE_DIR_NAME: &str = "store";

/// Default credit charged per delegated action.
pub const DEFAULT_UNIT_COST: u128 = 1;

pub fn get_base_dir() -> PathBuf {
    let mut path = home_dir().unwrap_or_default();
    path.push(DEFAULT_BASE_DIR_NAME);
    path
}

pub fn get_default_config_file() -> PathBuf {
    get_base_dir().join(DEFAULT_CONFIG_FILE_NAME)
}

// Use prefix `ledger-`/`LEDGER_`
#[derive(ClapSerde, Debug, Clone)]
pub struct LedgerConfig {
    /// ledger base directory
    #[arg(
        name = "LEDGER_BASE_DIR",
        long = "ledger-base-dir",
        env,
        help = "base directory for the ledger [default: $BASE_DIR]"
    )]
    pub base_dir: Option<PathBuf>,

    #[arg(
        name = "LEDGER_STORE_PATH",
        long = "ledger-store-path",
        env,
        help = "path of the RocksDB store [default: $BASE_DIR/store]"
    )]
    pub store_path: Option<PathBuf>,

    /// Blocks before the settle block number in which fraud evidence can still
    /// be submitted on chain.
    #[default(DEFAULT_REVEAL_TIMEOUT)]
    #[arg(
        name = "LEDGER_REVEAL_TIMEOUT",
        long = "ledger-reveal-timeout",
        env,
        help = format!("reveal timeout in blocks [default: {}]", DEFAULT_REVEAL_TIMEOUT)
    )]
    pub reveal_timeout: u64,

    #[default(DEFAULT_UNIT_COST)]
    #[arg(
        name = "LEDGER_UNIT_COST_UPDATE_TRANSFER",
        long = "ledger-unit-cost-update-transfer",
        env,
        help = format!("credit charged for a balance proof update [default: {}]", DEFAULT_UNIT_COST)
    )]
    pub unit_cost_update_transfer: u128,

    #[default(DEFAULT_UNIT_COST)]
    #[arg(
        name = "LEDGER_UNIT_COST_UNLOCK",
        long = "ledger-unit-cost-unlock",
        env,
        help = format!("credit charged per unlock [default: {}]", DEFAULT_UNIT_COST)
    )]
    pub unit_cost_unlock: u128,

    #[default(DEFAULT_UNIT_COST)]
    #[arg(
        name = "LEDGER_UNIT_COST_PUNISH",
        long = "ledger-unit-cost-punish",
        env,
        help = format!("credit charged once for any number of punishes [default: {}]", DEFAULT_UNIT_COST)
    )]
    pub unit_cost_punish: u128,

    /// Test networks only, participants there may lose their local state.
    #[default(false)]
    #[arg(
        name = "LEDGER_ALLOW_NONCE_REGRESSION",
        long = "ledger-allow-nonce-regression",
        env,
        help = "accept balance proofs with a lower nonce than the stored one [default: false]"
    )]
    pub allow_nonce_regression: bool,
}

impl LedgerConfig {
    pub fn base_dir(&self) -> PathBuf {
        self.base_dir.clone().unwrap_or_else(get_base_dir)
    }

    pub fn store_path(&self) -> PathBuf {
        self.store_path
            .clone()
            .unwrap_or_else(|| self.base_dir().join(DEFAULT_STORE_DIR_NAME))
    }

    pub fn create_store_dir(&self) -> Result<PathBuf> {
        let path = self.store_path();
        if !path.exists() {
            fs::create_dir_all(&path)?;
        }
        Ok(path)
    }

    pub fn to_delegate_config(&self) -> DelegateConfig {
        DelegateConfig {
            cost_model: CostModel::new(
                BigUint::from(self.unit_cost_update_transfer),
                BigUint::from(self.unit_cost_unlock),
                BigUint::from(self.unit_cost_punish),
            ),
            reveal_timeout: self.reveal_timeout,
            allow_nonce_regression: self.allow_nonce_regression,
        }
    }
}

#[derive(Deserialize)]
struct SerializedConfig {
    ledger: Option<<LedgerConfig as ClapSerde>::Opt>,
}

#[derive(Debug)]
pub struct Config {
    pub ledger: LedgerConfig,
}

impl Config {
    /// Builds the config from the YAML file at `config_path` (or `config.yml`
    /// under `base_dir`), with values given on the command line or through the
    /// environment in `args` taking precedence.
    ///
    /// A missing config file is fine, a malformed one is an error.
    pub fn load(
        config_path: Option<&Path>,
        base_dir: Option<&Path>,
        args: &mut <LedgerConfig as ClapSerde>::Opt,
    ) -> Result<Self> {
        let base_dir = base_dir.map(Path::to_path_buf).unwrap_or_else(get_base_dir);
        let config_file = config_path
            .map(Path::to_path_buf)
            .unwrap_or_else(|| base_dir.join(DEFAULT_CONFIG_FILE_NAME));

        if args.base_dir.is_none() {
            args.base_dir = Some(Some(base_dir));
        }

        let from_file = match File::open(&config_file) {
            Ok(f) => {
                debug!("Loading config file {}", config_file.display());
                serde_yaml::from_reader::<_, SerializedConfig>(BufReader::new(f))
                    .map_err(|e| {
                        Error::ConfigError(format!(
                            "invalid config file {}: {}",
                            config_file.display(),
                            e
                        ))
                    })?
                    .ledger
            }
            Err(_) => None,
        };

        let ledger = match from_file {
            Some(opt) => LedgerConfig::from(opt).merge(args),
            None => LedgerConfig::from(args),
        };
        Ok(Self { ledger })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap_serde_derive::clap::Parser;
    use std::io::Write;

    #[derive(Parser)]
    struct TestArgs {
        #[command(flatten)]
        ledger: <LedgerConfig as ClapSerde>::Opt,
    }

    fn parse_args(args: &[&str]) -> <LedgerConfig as ClapSerde>::Opt {
        TestArgs::parse_from(std::iter::once("wtledger").chain(args.iter().copied())).ledger
    }

    #[test]
    fn test_defaults_without_config_file() {
        let dir = tempfile::tempdir().unwrap();
        let mut args = parse_args(&[]);
        let config = Config::load(None, Some(dir.path()), &mut args).unwrap().ledger;

        assert_eq!(config.base_dir(), dir.path());
        assert_eq!(config.store_path(), dir.path().join("store"));
        assert_eq!(config.reveal_timeout, DEFAULT_REVEAL_TIMEOUT);
        assert!(!config.allow_nonce_regression);
        assert_eq!(config.to_delegate_config().cost_model, CostModel::default());
    }

    #[test]
    fn test_command_line_overrides_config_file() {
        let dir = tempfile::tempdir().unwrap();
        let mut file = File::create(dir.path().join(DEFAULT_CONFIG_FILE_NAME)).unwrap();
        writeln!(
            file,
            "ledger:\n  reveal_timeout: 12\n  unit_cost_unlock: 5\n  allow_nonce_regression: true"
        )
        .unwrap();

        let mut args = parse_args(&["--ledger-reveal-timeout", "40"]);
        let config = Config::load(None, Some(dir.path()), &mut args).unwrap().ledger;

        assert_eq!(config.reveal_timeout, 40);
        assert_eq!(config.unit_cost_unlock, 5);
        assert_eq!(config.unit_cost_punish, DEFAULT_UNIT_COST);
        assert!(config.allow_nonce_regression);

        let delegate_config = config.to_delegate_config();
        assert_eq!(delegate_config.reveal_timeout, 40);
        assert_eq!(delegate_config.cost_model.unlock, BigUint::from(5u8));
    }

    #[test]
    fn test_explicit_store_path() {
        let dir = tempfile::tempdir().unwrap();
        let store = dir.path().join("elsewhere");
        let mut args = parse_args(&["--ledger-store-path", store.to_str().unwrap()]);
        let config = Config::load(None, Some(dir.path()), &mut args).unwrap().ledger;

        assert_eq!(config.store_path(), store);
        assert_eq!(config.create_store_dir().unwrap(), store);
        assert!(store.is_dir());
    }

    #[test]
    fn test_malformed_config_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.yml");
        fs::write(&path, "ledger:\n  reveal_timeout: soon\n").unwrap();

        let mut args = parse_args(&[]);
        let err = Config::load(Some(&path), Some(dir.path()), &mut args).unwrap_err();
        assert!(matches!(err, Error::ConfigError(_)));
    }
}
