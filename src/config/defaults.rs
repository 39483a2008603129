//! Default configuration values

use crate::cbor::DEFAULT_MAX_DEPTH;

/// Directory name under the XDG config home
pub const CONFIG_DIR_NAME: &str = "firehose-cbor";

/// Config file name
pub const CONFIG_FILE_NAME: &str = "config.toml";

/// Default maximum nesting depth
pub const fn default_max_depth() -> usize {
    DEFAULT_MAX_DEPTH
}

/// Default message size limit (4 MiB)
pub const fn default_max_message_bytes() -> usize {
    4 * 1024 * 1024
}

/// Default parallelism (number of CPU cores)
pub fn default_parallelism() -> usize {
    num_cpus::get()
}
