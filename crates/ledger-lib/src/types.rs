//! Fixed size identifiers: `Hash256` for channel ids and hash commitments,
//! `Address` for delegators, partners and tokens.

use serde::{Deserialize, Serialize};
use serde_with::serde_as;

use crate::serde_utils::SliceHex;

macro_rules! fixed_bytes {
    ($name:ident, $len:expr) => {
        impl $name {
            pub const LEN: usize = $len;

            pub fn as_bytes(&self) -> &[u8; $len] {
                &self.0
            }
        }

        impl From<[u8; $len]> for $name {
            fn from(value: [u8; $len]) -> Self {
                Self(value)
            }
        }

        impl From<$name> for [u8; $len] {
            fn from(val: $name) -> Self {
                val.0
            }
        }

        impl From<$name> for Vec<u8> {
            fn from(val: $name) -> Self {
                val.0.to_vec()
            }
        }

        impl AsRef<[u8]> for $name {
            fn as_ref(&self) -> &[u8] {
                &self.0
            }
        }

        impl TryFrom<&[u8]> for $name {
            type Error = anyhow::Error;

            fn try_from(value: &[u8]) -> Result<Self, Self::Error> {
                let data: [u8; $len] = value.try_into().map_err(|_| {
                    anyhow::anyhow!(
                        "Invalid {} length: expected {}, got {}",
                        stringify!($name),
                        $len,
                        value.len()
                    )
                })?;
                Ok(Self(data))
            }
        }

        impl ::core::fmt::LowerHex for $name {
            fn fmt(&self, f: &mut ::core::fmt::Formatter) -> ::core::fmt::Result {
                if f.alternate() {
                    write!(f, "0x")?;
                }
                write!(f, "{}", hex::encode(self.0))
            }
        }

        impl ::core::fmt::Debug for $name {
            fn fmt(&self, f: &mut ::core::fmt::Formatter) -> ::core::fmt::Result {
                write!(f, "{}({:#x})", stringify!($name), self)
            }
        }

        impl ::core::fmt::Display for $name {
            fn fmt(&self, f: &mut ::core::fmt::Formatter) -> ::core::fmt::Result {
                write!(f, "{:#x}", self)
            }
        }

        impl std::str::FromStr for $name {
            type Err = anyhow::Error;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let s = s.trim_start_matches("0x");
                let bytes = hex::decode(s)?;
                Self::try_from(bytes.as_slice())
            }
        }
    };
}

/// A 256-bit hash digest, used as channel identifier, lock hash, locksroot etc.
#[serde_as]
#[derive(Copy, Clone, Serialize, Deserialize, Hash, Eq, PartialEq, Ord, PartialOrd, Default)]
pub struct Hash256(#[serde_as(as = "SliceHex")] [u8; 32]);

fixed_bytes!(Hash256, 32);

/// A 20-byte account address on the settlement chain.
#[serde_as]
#[derive(Copy, Clone, Serialize, Deserialize, Hash, Eq, PartialEq, Ord, PartialOrd, Default)]
pub struct Address(#[serde_as(as = "SliceHex")] [u8; 20]);

fixed_bytes!(Address, 20);
