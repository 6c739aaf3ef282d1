//! Local voter identity.
//!
//! The server trusts whatever voter id a client presents, so this id only
//! keeps one honest client from voting twice. Anyone can mint a new one.

use rand::Rng;
use std::path::{Path, PathBuf};

use crate::ClientError;

const ID_PREFIX: &str = "user_";
const ID_SUFFIX_LEN: usize = 9;
const ID_CHARSET: &[u8] = b"abcdefghijklmnopqrstuvwxyz0123456789";
const IDENTITY_FILE: &str = ".pollcast_user";

pub fn generate() -> String {
    let mut rng = rand::thread_rng();
    let suffix: String = (0..ID_SUFFIX_LEN)
        .map(|_| ID_CHARSET[rng.gen_range(0..ID_CHARSET.len())] as char)
        .collect();
    format!("{ID_PREFIX}{suffix}")
}

/// `$HOME/.pollcast_user`, or the working directory when there is no home.
pub fn default_path() -> PathBuf {
    std::env::var_os("HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("."))
        .join(IDENTITY_FILE)
}

/// Read the stored voter id, issuing and persisting a fresh one if the file
/// is missing or blank.
pub fn load_or_create(path: &Path) -> Result<String, ClientError> {
    match std::fs::read_to_string(path) {
        Ok(contents) if !contents.trim().is_empty() => return Ok(contents.trim().to_string()),
        Ok(_) => {}
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => return Err(e.into()),
    }

    let id = generate();
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, format!("{id}\n"))?;
    tracing::debug!(path = %path.display(), "issued new voter id");
    Ok(id)
}
