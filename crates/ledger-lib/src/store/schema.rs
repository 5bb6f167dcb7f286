//!
//! +--------------+-----------------------------------------+---------------------+
//! | KeyPrefix::  | Key::                                   | Value::             |
//! +--------------+-----------------------------------------+---------------------+
//! | 0            | ChannelId | Address                     | Delegation          |
//! | 16           | ChannelId | Address | OpenBlockNumber   | ArchivedDelegation  |
//! | 32           | Address                                 | Account             |
//! | 64           | BlockNumber | ChannelId | Address       | MonitorTrigger      |
//! | 96           |                                         | LatestBlockNumber   |
//! +--------------+-----------------------------------------+---------------------+
//!
//! Block numbers inside keys are big-endian so that prefix scans visit them in
//! ascending order.

pub const DELEGATION_PREFIX: u8 = 0;
pub const ARCHIVED_DELEGATION_PREFIX: u8 = 16;
pub const ACCOUNT_PREFIX: u8 = 32;
pub const MONITOR_TRIGGER_PREFIX: u8 = 64;
pub const LATEST_BLOCK_NUMBER_PREFIX: u8 = 96;
