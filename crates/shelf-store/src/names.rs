//! Artifact naming.
//!
//! Valid blob names:
//! - Must be non-empty
//! - Must not contain `/`, `\` or NUL
//! - Must not start with `.` (this also rules out `.` and `..`)

use std::fmt;

use serde::{Deserialize, Serialize};
use shelf_types::CoverId;

use crate::error::{StoreError, StoreResult};

/// Extensions accepted for cover uploads, lowercase.
pub const ALLOWED_COVER_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "gif"];

/// A validated artifact name inside a store root.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct BlobName(String);

impl BlobName {
    pub fn new(name: impl Into<String>) -> StoreResult<Self> {
        let name = name.into();
        let reason = if name.is_empty() {
            Some("must not be empty")
        } else if name.contains(['/', '\\', '\0']) {
            Some("must not contain path separators")
        } else if name.starts_with('.') {
            Some("must not start with '.'")
        } else {
            None
        };
        match reason {
            Some(reason) => Err(StoreError::InvalidName {
                name,
                reason: reason.into(),
            }),
            None => Ok(Self(name)),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for BlobName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "BlobName({})", self.0)
    }
}

impl fmt::Display for BlobName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for BlobName {
    type Error = StoreError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<BlobName> for String {
    fn from(name: BlobName) -> Self {
        name.0
    }
}

/// Lowercased extension of a declared upload filename, if it is allowed.
///
/// Only the part after the last `.` counts; a name without a dot has no
/// extension.
pub fn cover_extension(filename: &str) -> Option<String> {
    let (_, ext) = filename.rsplit_once('.')?;
    let ext = ext.to_ascii_lowercase();
    ALLOWED_COVER_EXTENSIONS
        .contains(&ext.as_str())
        .then_some(ext)
}

/// Deterministic artifact name for a cover: `<cover_id>.<extension>`.
pub fn cover_blob_name(cover_id: CoverId, extension: &str) -> StoreResult<BlobName> {
    BlobName::new(format!("{}.{}", cover_id.get(), extension))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_plain_names() {
        assert!(BlobName::new("12.png").is_ok());
        assert!(BlobName::new("cover").is_ok());
    }

    #[test]
    fn rejects_traversal_and_separators() {
        for bad in ["", "..", ".", ".hidden", "a/b.png", "..\\x.png", "a\0b"] {
            assert!(BlobName::new(bad).is_err(), "{bad:?} should be rejected");
        }
    }

    #[test]
    fn extension_is_lowercased() {
        assert_eq!(cover_extension("Scan.JPG").as_deref(), Some("jpg"));
        assert_eq!(cover_extension("a.b.Gif").as_deref(), Some("gif"));
    }

    #[test]
    fn extension_must_be_allowed() {
        assert_eq!(cover_extension("cover.bmp"), None);
        assert_eq!(cover_extension("cover"), None);
        assert_eq!(cover_extension("cover."), None);
        assert_eq!(cover_extension("png"), None);
    }

    #[test]
    fn cover_name_uses_id_and_extension() {
        let name = cover_blob_name(CoverId::new(42), "jpeg").unwrap();
        assert_eq!(name.as_str(), "42.jpeg");
    }
}
