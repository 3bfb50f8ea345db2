pub const APP_NAME: &str = "orchestra";

/// Shell used for every script; the strict prelude relies on `pipefail`.
pub const SHELL: &str = "/bin/bash";

pub const DEFAULT_CONFIG_FILENAME: &str = "orchestra.json";
pub const CONFIG_ENV_VAR: &str = "ORCHESTRA_CONFIG";
pub const REMOTE_HEADS_CACHE_FILENAME: &str = "remote_refs_cache.json";

pub const SOURCE_DIR_VAR: &str = "SOURCE_DIR";
pub const BUILD_DIR_VAR: &str = "BUILD_DIR";
pub const TMP_ROOT_VAR: &str = "TMP_ROOT";
pub const TMP_ROOTS_VAR: &str = "TMP_ROOTS";

/// Branches a clone tries to check out, in priority order.
pub const PREFERRED_BRANCHES: &[&str] = &["develop", "master"];

/// Name given to the branch created by `git clone` so that checkouts of real
/// branch names never collide with it.
pub const TEMPORARY_BRANCH: &str = "orchestra-temporary";

/// Number of slashes prepended to `$ORCHESTRA_ROOT` in `RPATH_PLACEHOLDER`.
pub const RPATH_PLACEHOLDER_PADDING: usize = 48;
