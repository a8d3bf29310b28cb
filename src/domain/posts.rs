//! Post validation and derived fields.

use crate::domain::error::DomainError;

pub const TITLE_MAX_CHARS: usize = 100;
pub const TAG_MAX_CHARS: usize = 30;
pub const EXCERPT_MAX_CHARS: usize = 150;
const EXCERPT_OMISSION: &str = "...";

/// Audio narration formats accepted for attachment.
pub const AUDIO_CONTENT_TYPES: &[&str] =
    &["audio/mpeg", "audio/mp3", "audio/wav", "audio/x-wav"];

/// Derive the stored excerpt from post content: the content itself when it
/// fits, otherwise a truncation capped at 150 characters including the
/// trailing omission marker.
pub fn derive_excerpt(content: &str) -> String {
    let total = content.chars().count();
    if total <= EXCERPT_MAX_CHARS {
        return content.to_string();
    }

    let keep = EXCERPT_MAX_CHARS - EXCERPT_OMISSION.chars().count();
    let mut excerpt: String = content.chars().take(keep).collect();
    excerpt.push_str(EXCERPT_OMISSION);
    excerpt
}

pub fn validate_title(title: &str) -> Result<(), DomainError> {
    let trimmed = title.trim();
    if trimmed.is_empty() {
        return Err(DomainError::validation("title can't be blank"));
    }
    if trimmed.chars().count() > TITLE_MAX_CHARS {
        return Err(DomainError::validation(format!(
            "title is too long (maximum is {TITLE_MAX_CHARS} characters)"
        )));
    }
    Ok(())
}

pub fn validate_content(content: &str) -> Result<(), DomainError> {
    if content.trim().is_empty() {
        return Err(DomainError::validation("content can't be blank"));
    }
    Ok(())
}

/// Split a comma-separated tag list into normalized names: trimmed,
/// lowercased, de-duplicated, blanks dropped.
pub fn normalize_tags(raw: &str) -> Result<Vec<String>, DomainError> {
    let mut names = Vec::new();
    for piece in raw.split(',') {
        let name = piece.trim().to_lowercase();
        if name.is_empty() {
            continue;
        }
        if name.chars().count() > TAG_MAX_CHARS {
            return Err(DomainError::validation(format!(
                "tag `{name}` is too long (maximum is {TAG_MAX_CHARS} characters)"
            )));
        }
        if !names.contains(&name) {
            names.push(name);
        }
    }
    Ok(names)
}

pub fn validate_audio_content_type(content_type: &str) -> Result<(), DomainError> {
    if AUDIO_CONTENT_TYPES.contains(&content_type) {
        Ok(())
    } else {
        Err(DomainError::validation("audio must be an MP3 or WAV file"))
    }
}

pub const COMMENT_MAX_CHARS: usize = 1000;

pub fn validate_comment_content(content: &str) -> Result<(), DomainError> {
    if content.trim().is_empty() {
        return Err(DomainError::validation("content can't be blank"));
    }
    if content.chars().count() > COMMENT_MAX_CHARS {
        return Err(DomainError::validation(format!(
            "content is too long (maximum is {COMMENT_MAX_CHARS} characters)"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_content_is_its_own_excerpt() {
        assert_eq!(derive_excerpt("morning verse"), "morning verse");
    }

    #[test]
    fn long_content_is_truncated_with_omission() {
        let content = "a".repeat(400);
        let excerpt = derive_excerpt(&content);
        assert_eq!(excerpt.chars().count(), EXCERPT_MAX_CHARS);
        assert!(excerpt.ends_with("..."));
    }

    #[test]
    fn excerpt_truncation_respects_char_boundaries() {
        let content = "é".repeat(200);
        let excerpt = derive_excerpt(&content);
        assert_eq!(excerpt.chars().count(), EXCERPT_MAX_CHARS);
    }

    #[test]
    fn tags_are_normalized_and_deduplicated() {
        let tags = normalize_tags(" Poetry, HAIKU ,poetry,, nature ").unwrap();
        assert_eq!(tags, vec!["poetry", "haiku", "nature"]);
    }

    #[test]
    fn overlong_tag_is_rejected() {
        let raw = "x".repeat(TAG_MAX_CHARS + 1);
        assert!(normalize_tags(&raw).is_err());
    }

    #[test]
    fn title_bounds_are_enforced() {
        assert!(validate_title("A Quiet Stanza").is_ok());
        assert!(validate_title("  ").is_err());
        assert!(validate_title(&"t".repeat(TITLE_MAX_CHARS + 1)).is_err());
    }

    #[test]
    fn audio_formats_are_limited_to_mp3_and_wav() {
        assert!(validate_audio_content_type("audio/mpeg").is_ok());
        assert!(validate_audio_content_type("audio/wav").is_ok());
        assert!(validate_audio_content_type("audio/ogg").is_err());
    }
}
