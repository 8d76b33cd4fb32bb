//! The sound file record shared by the resolver, the database and the bot.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

/// One playable audio asset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SoundFile {
    /// Row id in the catalog
    pub id: i64,

    /// User-facing name, searched by the resolver
    pub display_name: String,

    /// Name of the stored file inside the sound folder
    pub file_name: String,

    /// Hex content digest, used to find duplicate uploads
    pub content_hash: String,

    /// Length in whole seconds, 0 when unknown
    pub duration_seconds: u64,

    /// Size of the stored file in bytes
    pub size_bytes: u64,

    /// Guild the sound was uploaded from, `None` for library imports
    pub owner_guild_id: Option<u64>,

    /// User who uploaded the sound
    pub uploader_id: Option<u64>,

    /// Public sounds are visible everywhere, private ones only in the owner guild
    pub public: bool,

    /// Free-form tags, compared exactly
    pub tags: BTreeSet<String>,

    /// Soft-delete flag, set while the backing file is missing
    pub deleted: bool,
}

impl SoundFile {
    /// Whether this file may be seen from `guild_id`.
    pub fn is_visible_to(&self, guild_id: u64) -> bool {
        self.public || self.owner_guild_id == Some(guild_id)
    }

    /// Whether the file carries every tag in `required`.
    pub fn has_tags<S: AsRef<str>>(&self, required: &[S]) -> bool {
        required.iter().all(|tag| self.tags.contains(tag.as_ref()))
    }

    /// Whether the length passes a max-duration bound.
    ///
    /// `None` and `Some(0)` are unlimited and admit everything, unknown
    /// lengths included. A positive bound only admits known lengths within it.
    pub fn fits_duration(&self, max_duration: Option<u64>) -> bool {
        match max_duration {
            None | Some(0) => true,
            Some(bound) => self.duration_seconds > 0 && self.duration_seconds <= bound,
        }
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;

    /// Build a public, non-deleted sound with the given name and length.
    pub fn sound(id: i64, name: &str, duration_seconds: u64) -> SoundFile {
        SoundFile {
            id,
            display_name: name.to_string(),
            file_name: format!("{name}.mp3"),
            content_hash: format!("hash-{id}"),
            duration_seconds,
            size_bytes: 1024,
            owner_guild_id: Some(1),
            uploader_id: Some(10),
            public: true,
            tags: BTreeSet::new(),
            deleted: false,
        }
    }

    pub fn tagged(mut file: SoundFile, tags: &[&str]) -> SoundFile {
        file.tags = tags.iter().map(|t| t.to_string()).collect();
        file
    }
}

#[cfg(test)]
mod tests {
    use super::test_support::*;

    #[test]
    fn private_sound_only_visible_to_owner() {
        let mut file = sound(1, "horn", 3);
        file.public = false;
        file.owner_guild_id = Some(42);

        assert!(file.is_visible_to(42));
        assert!(!file.is_visible_to(7));

        file.public = true;
        assert!(file.is_visible_to(7));
    }

    #[test]
    fn unknown_duration_only_fits_without_bound() {
        let file = sound(1, "mystery", 0);
        assert!(file.fits_duration(None));
        assert!(file.fits_duration(Some(0)));
        assert!(!file.fits_duration(Some(60)));
    }

    #[test]
    fn tag_check_is_conjunctive() {
        let file = tagged(sound(1, "airhorn", 2), &["meme", "short"]);
        assert!(file.has_tags(&["meme"]));
        assert!(file.has_tags::<&str>(&[]));
        assert!(!file.has_tags(&["meme", "long"]));
    }
}
