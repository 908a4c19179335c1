use std::path::Path;

use base64::{prelude::BASE64_STANDARD, Engine};
use miette::{IntoDiagnostic, WrapErr};

/// Reads a base64 encoded protobuf asset, such as a recorded block.
pub fn read_block<B: prost::Message + Default>(path: &Path) -> miette::Result<B> {
    let encoded = std::fs::read_to_string(path)
        .into_diagnostic()
        .wrap_err_with(|| format!("Failed to read {}", path.display()))?;
    let raw_bytes = BASE64_STANDARD
        .decode(encoded.trim())
        .into_diagnostic()
        .wrap_err("Failed to decode base64")?;

    B::decode(&*raw_bytes)
        .into_diagnostic()
        .wrap_err_with(|| format!("Not able to decode block from {}", path.display()))
}

/// Writes `message` in the format read by [`read_block`].
#[cfg(test)]
pub fn write_block<B: prost::Message>(path: &Path, message: &B) -> miette::Result<()> {
    std::fs::write(path, BASE64_STANDARD.encode(message.encode_to_vec()))
        .into_diagnostic()
        .wrap_err_with(|| format!("Failed to write {}", path.display()))
}
