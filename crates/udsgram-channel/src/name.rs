//! Channel name validation and path resolution.
//!
//! A channel is addressed by a short logical name. The filesystem path it
//! binds to is `<PATH_PREFIX><name>`, unless the caller opts out of the
//! prefix and supplies an already-qualified path. Validation is purely
//! syntactic and never touches the filesystem.

use crate::error::{ChannelError, Result};
use crate::platform::SUN_PATH_CAPACITY;

/// Filesystem prefix prepended to logical channel names.
pub const PATH_PREFIX: &str = "/tmp/";

/// Minimum length of a valid channel name.
pub const SHORTEST_VALID_NAME: usize = 1;

/// Maximum length of a valid channel name.
pub const LONGEST_VALID_NAME: usize = 100;

/// Returns true iff `name` has a valid length.
///
/// Empty names are invalid by the lower bound.
pub fn is_valid(name: &str) -> bool {
    (SHORTEST_VALID_NAME..=LONGEST_VALID_NAME).contains(&name.len())
}

/// Validate `name` and resolve it to the path the channel binds to.
///
/// With `prefixed`, validation runs on the logical name and the result is
/// `<PATH_PREFIX><name>`; otherwise the supplied string is validated and
/// used verbatim. Either way the result must fit the address structure's
/// path field.
pub(crate) fn resolve(name: &str, prefixed: bool) -> Result<String> {
    if !is_valid(name) {
        return Err(ChannelError::InvalidChannelName);
    }

    let path = if prefixed {
        format!("{PATH_PREFIX}{name}")
    } else {
        name.to_string()
    };

    if path.len() > SUN_PATH_CAPACITY - 1 {
        return Err(ChannelError::InvalidChannelName);
    }

    Ok(path)
}
