//! Namespaced block identifiers.
//!
//! Ore profiles name the block they predict with a stable `namespace:path`
//! key (e.g. `minecraft:diamond_ore`). Keys are validated once when the
//! registry is built and ordered so reports iterate deterministically.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Default namespace used when a key omits an explicit namespace.
pub const DEFAULT_NAMESPACE: &str = "minecraft";

/// Error returned when parsing an invalid [`BlockKey`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BlockKeyError {
    /// Input was empty or whitespace.
    #[error("block key cannot be empty")]
    Empty,
    /// Namespace part was empty, too long or used invalid characters.
    #[error("invalid block key namespace {0:?} (allowed: a-z0-9_.-, max 64)")]
    Namespace(String),
    /// Path part was empty, too long or used invalid characters.
    #[error("invalid block key path {0:?} (allowed: a-z0-9_./-, max 128)")]
    Path(String),
}

/// A namespaced block key of the form `namespace:path`.
///
/// Ordering is lexical by `(namespace, path)` and is stable across runs.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct BlockKey {
    namespace: String,
    path: String,
}

impl BlockKey {
    /// Parse a block key.
    ///
    /// Accepts either:
    /// - `namespace:path`
    /// - `path` (uses [`DEFAULT_NAMESPACE`])
    pub fn parse(input: &str) -> Result<Self, BlockKeyError> {
        let input = input.trim();
        if input.is_empty() {
            return Err(BlockKeyError::Empty);
        }

        let (namespace, path) = match input.split_once(':') {
            Some((ns, p)) => (ns.trim(), p.trim()),
            None => (DEFAULT_NAMESPACE, input),
        };

        validate_namespace(namespace)?;
        validate_path(path)?;

        Ok(Self {
            namespace: namespace.to_string(),
            path: path.to_string(),
        })
    }

    /// Block key namespace.
    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// Block key path.
    pub fn path(&self) -> &str {
        &self.path
    }
}

impl fmt::Display for BlockKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.namespace, self.path)
    }
}

impl FromStr for BlockKey {
    type Err = BlockKeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for BlockKey {
    type Error = BlockKeyError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<BlockKey> for String {
    fn from(key: BlockKey) -> Self {
        key.to_string()
    }
}

fn validate_namespace(ns: &str) -> Result<(), BlockKeyError> {
    let valid = !ns.is_empty()
        && ns.len() <= 64
        && ns
            .chars()
            .all(|c| matches!(c, 'a'..='z' | '0'..='9' | '_' | '-' | '.'));
    if valid {
        Ok(())
    } else {
        Err(BlockKeyError::Namespace(ns.to_string()))
    }
}

fn validate_path(path: &str) -> Result<(), BlockKeyError> {
    let valid = !path.is_empty()
        && path.len() <= 128
        && path
            .chars()
            .all(|c| matches!(c, 'a'..='z' | '0'..='9' | '_' | '-' | '.' | '/'));
    if valid {
        Ok(())
    } else {
        Err(BlockKeyError::Path(path.to_string()))
    }
}
