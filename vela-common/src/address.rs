use core::fmt;
use core::str::FromStr;

use bech32::{self, FromBase32, ToBase32, Variant};
use bincode::{Decode, Encode};
use serde::{de, Deserialize, Deserializer, Serialize, Serializer};

use crate::constants::*;
use crate::crypto::blake2b_256_hash;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AddressBech32DecodeError {
    Bech32DecodingError(bech32::Error),
    InvalidVariant(bech32::Variant),
    InvalidHrp,
    InvalidLength(usize),
}

#[cfg(feature = "std")]
impl std::error::Error for AddressBech32DecodeError {}

impl fmt::Display for AddressBech32DecodeError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

fn decode_bech32<const N: usize>(
    expected_hrp: &str,
    text: &str,
) -> Result<[u8; N], AddressBech32DecodeError> {
    let (actual_hrp, data, variant) =
        bech32::decode(text).map_err(AddressBech32DecodeError::Bech32DecodingError)?;

    match variant {
        Variant::Bech32 => {}
        _ => return Err(AddressBech32DecodeError::InvalidVariant(variant)),
    };

    if actual_hrp != expected_hrp {
        return Err(AddressBech32DecodeError::InvalidHrp);
    }

    let data = Vec::<u8>::from_base32(&data)
        .map_err(AddressBech32DecodeError::Bech32DecodingError)?;
    let length = data.len();
    data.try_into()
        .map_err(|_| AddressBech32DecodeError::InvalidLength(length))
}

fn encode_bech32(hrp: &str, data: &[u8], f: &mut fmt::Formatter) -> fmt::Result {
    let text = bech32::encode(hrp, data.to_base32(), Variant::Bech32).map_err(|_| fmt::Error)?;
    f.write_str(&text)
}

macro_rules! bech32_byte_type {
    ($t:ident, $length:expr, $hrp:expr) => {
        impl $t {
            pub const LENGTH: usize = $length;

            pub fn as_bytes(&self) -> &[u8] {
                &self.0
            }

            pub fn try_from_slice(slice: &[u8]) -> Option<Self> {
                slice.try_into().ok().map(Self)
            }

            pub fn to_hex(&self) -> String {
                hex::encode(self.0)
            }
        }

        impl AsRef<[u8]> for $t {
            fn as_ref(&self) -> &[u8] {
                &self.0
            }
        }

        impl fmt::Display for $t {
            fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
                encode_bech32($hrp, &self.0, f)
            }
        }

        impl fmt::Debug for $t {
            fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
                write!(f, "{}({})", stringify!($t), self)
            }
        }

        impl FromStr for $t {
            type Err = AddressBech32DecodeError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                decode_bech32::<$length>($hrp, s).map(Self)
            }
        }

        impl Serialize for $t {
            fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.collect_str(self)
            }
        }

        impl<'de> Deserialize<'de> for $t {
            fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                let s = String::deserialize(deserializer)?;
                Self::from_str(&s).map_err(de::Error::custom)
            }
        }
    };
}

/// The user-facing address of an account, including module-owned accounts.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Encode, Decode)]
pub struct AccountAddress(pub [u8; 20]);

bech32_byte_type!(AccountAddress, 20, ACCOUNT_ADDRESS_HRP);

impl AccountAddress {
    /// The account owned by the module called `name`. Module accounts have no private key.
    pub fn module(name: &str) -> Self {
        let hash = blake2b_256_hash(name.as_bytes());
        let mut bytes = [0u8; 20];
        bytes.copy_from_slice(&hash[..20]);
        Self(bytes)
    }
}

/// The consensus-layer identity of a validator, derived from its public key.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Encode, Decode)]
pub struct ConsensusAddress(pub [u8; 20]);

bech32_byte_type!(ConsensusAddress, 20, CONSENSUS_ADDRESS_HRP);

/// An ed25519 consensus public key of a validator node.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Encode, Decode)]
pub struct ConsensusPublicKey(pub [u8; 32]);

bech32_byte_type!(ConsensusPublicKey, 32, CONSENSUS_PUBLIC_KEY_HRP);

impl ConsensusPublicKey {
    pub fn to_consensus_address(&self) -> ConsensusAddress {
        let hash = blake2b_256_hash(self.0);
        let mut bytes = [0u8; 20];
        bytes.copy_from_slice(&hash[..20]);
        ConsensusAddress(bytes)
    }
}
