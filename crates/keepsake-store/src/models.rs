//! Domain model structs for the album.
//!
//! Every struct derives `Serialize` and `Deserialize` so it can be handed
//! directly to the gallery client as JSON.  Wire field names are camelCase
//! because that is what the client consumes.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Metadata key always present on a record: the name the file had on the
/// client before upload.
pub const META_ORIGINAL_NAME: &str = "originalName";

/// Metadata key set only when the optional mirror upload succeeded.
pub const META_MIRROR_URL: &str = "mirrorUrl";

// ---------------------------------------------------------------------------
// Media
// ---------------------------------------------------------------------------

/// Metadata entry describing one uploaded photo or video.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct MediaRecord {
    /// Registry-assigned id.  Monotonically increasing, never reused.
    pub id: u64,
    /// Client-supplied file name, used for display and for downloads.
    pub file_name: String,
    /// MIME type, echoed verbatim as the response Content-Type.
    pub file_type: String,
    /// Size in bytes of the uploaded payload.
    pub file_size: u64,
    /// When the record was created.  Immutable.
    pub upload_date: DateTime<Utc>,
    /// Open key/value bag (`originalName`, optionally `mirrorUrl`).
    pub metadata: HashMap<String, String>,
}

// ---------------------------------------------------------------------------
// User
// ---------------------------------------------------------------------------

/// A registered user.  No media flow reads this; it exists so a future
/// authenticated gallery has somewhere to hang accounts.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct UserRecord {
    /// Registry-assigned id.
    pub id: u64,
    /// Unique login name.
    pub username: String,
    /// Stored as given.
    pub password: String,
}
