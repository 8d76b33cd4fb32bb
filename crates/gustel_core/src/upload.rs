//! Upload validation.

use crate::error::UploadError;

/// Largest accepted attachment, in bytes.
pub const MAX_UPLOAD_BYTES: u64 = 50_000_000;

/// Longest accepted attachment filename, in characters.
pub const MAX_FILENAME_LEN: usize = 100;

/// What the chat platform tells us about an attachment before we download it.
#[derive(Debug, Clone)]
pub struct AttachmentInfo<'a> {
    pub filename: &'a str,
    pub content_type: Option<&'a str>,
    pub size: u64,
}

/// Reject attachments that cannot be sounds before downloading them.
pub fn validate_attachment(attachment: &AttachmentInfo<'_>) -> Result<(), UploadError> {
    let is_audio = attachment
        .content_type
        .is_some_and(|ct| ct.starts_with("audio/"));
    if !is_audio {
        return Err(UploadError::NotAudio {
            content_type: attachment.content_type.map(str::to_string),
        });
    }

    if attachment.size > MAX_UPLOAD_BYTES {
        return Err(UploadError::TooLarge {
            size: attachment.size,
            max: MAX_UPLOAD_BYTES,
        });
    }

    let len = attachment.filename.chars().count();
    if len > MAX_FILENAME_LEN {
        return Err(UploadError::FilenameTooLong {
            len,
            max: MAX_FILENAME_LEN,
        });
    }

    Ok(())
}

/// Trim a requested display name, refusing empty ones.
pub fn normalize_display_name(name: &str) -> Result<String, UploadError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(UploadError::EmptyName);
    }
    Ok(name.to_string())
}

/// Split a comma-separated tag list into trimmed, lowercase, unique tags.
pub fn parse_tags(raw: &str) -> Vec<String> {
    let mut tags: Vec<String> = Vec::new();
    for tag in raw.split(',').map(|t| t.trim().to_lowercase()) {
        if !tag.is_empty() && !tags.contains(&tag) {
            tags.push(tag);
        }
    }
    tags
}

/// Name a stored upload so identical filenames from different uploads never collide.
pub fn stored_file_name(content_hash: &str, original: &str) -> String {
    let prefix: String = content_hash.chars().take(12).collect();
    let clean: String = original
        .chars()
        .map(|c| {
            if c.is_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .collect();
    format!("{prefix}_{clean}")
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn info<'a>(filename: &'a str, content_type: Option<&'a str>, size: u64) -> AttachmentInfo<'a> {
        AttachmentInfo {
            filename,
            content_type,
            size,
        }
    }

    #[test]
    fn accepts_reasonable_audio() {
        assert_eq!(
            validate_attachment(&info("horn.mp3", Some("audio/mpeg"), 40_000)),
            Ok(())
        );
    }

    #[test]
    fn rejects_non_audio() {
        assert!(matches!(
            validate_attachment(&info("cat.png", Some("image/png"), 10)),
            Err(UploadError::NotAudio { .. })
        ));
        assert!(matches!(
            validate_attachment(&info("mystery", None, 10)),
            Err(UploadError::NotAudio { content_type: None })
        ));
    }

    #[test]
    fn rejects_oversized_and_long_names() {
        assert!(matches!(
            validate_attachment(&info("big.mp3", Some("audio/mpeg"), MAX_UPLOAD_BYTES + 1)),
            Err(UploadError::TooLarge { .. })
        ));

        let long = format!("{}.mp3", "a".repeat(MAX_FILENAME_LEN));
        assert!(matches!(
            validate_attachment(&info(&long, Some("audio/mpeg"), 10)),
            Err(UploadError::FilenameTooLong { .. })
        ));
    }

    #[test]
    fn tags_are_cleaned() {
        assert_eq!(parse_tags(" Meme, short,,meme , "), vec!["meme", "short"]);
        assert!(parse_tags("").is_empty());
    }

    #[test]
    fn stored_names_are_safe() {
        assert_eq!(
            stored_file_name("0123456789abcdef", "my horn (1).mp3"),
            "0123456789ab_my_horn__1_.mp3"
        );
    }

    #[test]
    fn blank_display_name_is_refused() {
        assert_eq!(normalize_display_name("  "), Err(UploadError::EmptyName));
        assert_eq!(normalize_display_name(" Horn "), Ok("Horn".to_string()));
    }
}
