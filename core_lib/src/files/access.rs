//! Access rules for file records.

use uuid::Uuid;

use super::models::File;

/// A file is readable by its owner and, when public, by anyone.
/// `caller` is `None` for anonymous requests.
pub fn can_read(file: &File, caller: Option<Uuid>) -> bool {
    file.is_public || caller == Some(file.owner_id)
}

/// Only the owner may mutate; there is no public-write path.
pub fn can_mutate(file: &File, caller: Uuid) -> bool {
    file.owner_id == caller
}
