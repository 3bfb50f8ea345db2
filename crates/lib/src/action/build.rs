//! Install metadata: the record an installed component leaves in the root.

use std::fs;
use std::io;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::warn;

use super::ActionError;

/// Contents of `<orchestra_root>/share/orchestra/<component>.json`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstallMetadata {
  pub component_name: String,
  pub build_name: String,
  /// How the component was installed. Always `"build"`: binary archives are
  /// not supported.
  pub source: String,
  pub recursive_hash: String,
  /// The user asked for this component, as opposed to it being installed as
  /// a dependency.
  pub manually_installed: bool,
}

/// Read install metadata, treating a missing or unreadable file as "not installed".
pub fn read_install_metadata(path: &Path) -> Option<InstallMetadata> {
  let text = match fs::read_to_string(path) {
    Ok(text) => text,
    Err(err) if err.kind() == io::ErrorKind::NotFound => return None,
    Err(err) => {
      warn!(path = %path.display(), error = %err, "could not read install metadata");
      return None;
    }
  };

  match serde_json::from_str(&text) {
    Ok(metadata) => Some(metadata),
    Err(err) => {
      warn!(path = %path.display(), error = %err, "could not parse install metadata");
      None
    }
  }
}

pub fn write_install_metadata(path: &Path, metadata: &InstallMetadata) -> Result<(), ActionError> {
  let json = serde_json::to_string_pretty(metadata)?;

  if let Some(parent) = path.parent() {
    fs::create_dir_all(parent).map_err(|source| ActionError::Io {
      path: parent.to_path_buf(),
      source,
    })?;
  }

  fs::write(path, json).map_err(|source| ActionError::Io {
    path: path.to_path_buf(),
    source,
  })
}
