//! File requirement validator.
//!
//! A prescription submission must reference at least one uploaded evidence
//! file. The references come from the external upload collaborator; content,
//! type, and size checks are its concern, not ours.

use crate::error::{EngineError, EngineResult};
use crate::models::FileReference;

/// Reject submissions with no evidence file.
///
/// # Errors
///
/// [`EngineError::Validation`] when the list is empty.
pub fn require_evidence(files: &[FileReference]) -> EngineResult<()> {
    if files.is_empty() {
        return Err(EngineError::validation("prescription evidence required"));
    }
    Ok(())
}

/// The primary filename shown to staff, taken from the first reference's URL.
pub fn primary_filename(files: &[FileReference]) -> Option<String> {
    files.first().map(|file| {
        file.url
            .rsplit('/')
            .next()
            .unwrap_or(file.url.as_str())
            .to_string()
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_file_list_rejected() {
        let err = require_evidence(&[]).unwrap_err();
        assert!(matches!(err, EngineError::Validation(_)));
    }

    #[test]
    fn test_single_reference_accepted() {
        let files = vec![FileReference {
            url: "https://uploads.example.com/rx/scan-001.jpg".to_string(),
            declared_mime_type: "image/jpeg".to_string(),
        }];
        assert!(require_evidence(&files).is_ok());
    }

    #[test]
    fn test_primary_filename_from_first_url() {
        let files = vec![
            FileReference {
                url: "https://uploads.example.com/rx/scan-001.jpg".to_string(),
                declared_mime_type: "image/jpeg".to_string(),
            },
            FileReference {
                url: "https://uploads.example.com/rx/scan-002.jpg".to_string(),
                declared_mime_type: "image/jpeg".to_string(),
            },
        ];
        assert_eq!(primary_filename(&files).as_deref(), Some("scan-001.jpg"));
        assert_eq!(primary_filename(&[]), None);
    }
}
