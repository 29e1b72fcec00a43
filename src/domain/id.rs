//! Content identifiers in CB58 text form.
//!
//! CB58 is base58 over the payload followed by the last four bytes of the
//! payload's SHA-256 digest. Every ledger object this crate touches (VMs,
//! subnets, blockchains, transactions, nodes) is named this way.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use sha2::{Digest, Sha256};
use thiserror::Error;

const CHECKSUM_LEN: usize = 4;
const NODE_ID_PREFIX: &str = "NodeID-";

/// Reasons a CB58 string fails to decode into an identifier.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum IdError {
    #[error("not valid base58: {0}")]
    Base58(String),

    #[error("too short to carry a checksum")]
    TooShort,

    #[error("checksum mismatch")]
    Checksum,

    #[error("expected {expected} bytes, got {actual}")]
    Length { expected: usize, actual: usize },

    #[error("missing '{0}' prefix")]
    MissingPrefix(&'static str),
}

/// Encode bytes as CB58.
#[must_use]
pub fn encode_cb58(payload: &[u8]) -> String {
    let digest = Sha256::digest(payload);
    let mut buf = Vec::with_capacity(payload.len() + CHECKSUM_LEN);
    buf.extend_from_slice(payload);
    buf.extend_from_slice(&digest[digest.len() - CHECKSUM_LEN..]);
    bs58::encode(buf).into_string()
}

/// Decode a CB58 string, verifying its checksum.
pub fn decode_cb58(text: &str) -> Result<Vec<u8>, IdError> {
    let mut raw = bs58::decode(text)
        .into_vec()
        .map_err(|e| IdError::Base58(e.to_string()))?;
    if raw.len() < CHECKSUM_LEN {
        return Err(IdError::TooShort);
    }
    let checksum = raw.split_off(raw.len() - CHECKSUM_LEN);
    let digest = Sha256::digest(&raw);
    if digest[digest.len() - CHECKSUM_LEN..] != checksum[..] {
        return Err(IdError::Checksum);
    }
    Ok(raw)
}

fn decode_fixed<const N: usize>(text: &str) -> Result<[u8; N], IdError> {
    let raw = decode_cb58(text)?;
    <[u8; N]>::try_from(raw.as_slice()).map_err(|_| IdError::Length {
        expected: N,
        actual: raw.len(),
    })
}

macro_rules! content_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub struct $name([u8; 32]);

        impl $name {
            /// Wrap raw identifier bytes.
            #[must_use]
            pub const fn from_bytes(bytes: [u8; 32]) -> Self {
                Self(bytes)
            }

            /// Raw identifier bytes.
            #[must_use]
            pub const fn as_bytes(&self) -> &[u8; 32] {
                &self.0
            }
        }

        impl FromStr for $name {
            type Err = IdError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                decode_fixed::<32>(s).map(Self)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&encode_cb58(&self.0))
            }
        }

        impl Serialize for $name {
            fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.collect_str(self)
            }
        }

        impl<'de> Deserialize<'de> for $name {
            fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                let text = String::deserialize(deserializer)?;
                text.parse().map_err(serde::de::Error::custom)
            }
        }
    };
}

content_id! {
    /// Identifier of a pluggable VM module.
    VmId
}

content_id! {
    /// Identifier of a subnet. Equal to the id of the transaction that created it.
    SubnetId
}

content_id! {
    /// Identifier of a blockchain running on a subnet.
    BlockchainId
}

content_id! {
    /// Identifier of an issued transaction.
    TxId
}

impl From<TxId> for SubnetId {
    fn from(tx: TxId) -> Self {
        Self(tx.0)
    }
}

impl From<TxId> for BlockchainId {
    fn from(tx: TxId) -> Self {
        Self(tx.0)
    }
}

/// 20-byte node identifier, written `NodeID-<cb58>`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId([u8; 20]);

impl NodeId {
    #[must_use]
    pub const fn from_bytes(bytes: [u8; 20]) -> Self {
        Self(bytes)
    }
}

impl FromStr for NodeId {
    type Err = IdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let body = s
            .strip_prefix(NODE_ID_PREFIX)
            .ok_or(IdError::MissingPrefix(NODE_ID_PREFIX))?;
        decode_fixed::<20>(body).map(Self)
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{NODE_ID_PREFIX}{}", encode_cb58(&self.0))
    }
}

impl Serialize for NodeId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for NodeId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        text.parse().map_err(serde::de::Error::custom)
    }
}
