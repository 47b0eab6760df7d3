//! Local signers.

use alloy_signer_local::PrivateKeySigner;
use eyre::{Result, WrapErr};

/// Parses a hex encoded private key, with or without `0x` prefix.
pub fn signer_from_private_key(key: &str) -> Result<PrivateKeySigner> {
    let key = key.trim();
    key.parse::<PrivateKeySigner>().wrap_err("failed to parse private key")
}
