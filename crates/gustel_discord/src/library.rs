//! Sound storage on disk and its catalog records.
//!
//! Uploaded sounds live in `sounds/custom`, named by [`stored_file_name`].
//! The catalog in the database mirrors that folder; [`SoundLibrary::sync`]
//! reconciles the two when files are added or removed by hand.

use std::collections::HashSet;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use gustel_core::hash::{content_hash, hash_file};
use gustel_core::upload::{normalize_display_name, stored_file_name};
use gustel_core::{DurationProbe, SoundFile, StorageConfig};
use gustel_db::queries::{self, FileQuery, NewSoundFile};
use gustel_db::{DbError, SqlitePool};
use tracing::{debug, info, warn};

use crate::error::{DiscordError, Result};

/// A downloaded attachment on its way into the catalog.
#[derive(Debug, Clone)]
pub struct SoundUpload<'a> {
    pub bytes: &'a [u8],
    /// Attachment filename as sent by the user
    pub filename: &'a str,
    pub display_name: &'a str,
    pub tags: Vec<String>,
    pub public: bool,
    pub guild_id: u64,
    pub uploader_id: u64,
}

/// What happened to an upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UploadOutcome {
    /// New sound stored and catalogued
    Stored(SoundFile),
    /// Same bytes were catalogued before but the file had gone missing
    Restored(SoundFile),
    /// Same bytes already exist; the name is only given when this guild may see it
    Duplicate { visible_name: Option<String> },
    /// Another sound visible here already uses the name
    NameTaken(String),
}

impl UploadOutcome {
    /// Reply for the uploader, `requested` being the name they asked for.
    pub fn message(&self, requested: &str) -> String {
        match self {
            Self::Stored(file) | Self::Restored(file) => {
                format!("Sound `{}` successfully uploaded to GustelBot", file.display_name)
            }
            Self::Duplicate {
                visible_name: Some(existing),
            } => format!("File `{requested}` already exists as `{existing}`"),
            Self::Duplicate { visible_name: None } => format!("File `{requested}` already exists"),
            Self::NameTaken(name) => format!("**Error**: The Filename `{name}` is already in use!"),
        }
    }
}

/// Counts from a [`SoundLibrary::sync`] run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncReport {
    pub marked_deleted: usize,
    pub restored: usize,
    pub imported: usize,
    pub skipped: usize,
}

#[derive(Clone)]
pub struct SoundLibrary {
    custom_dir: PathBuf,
    default_dir: PathBuf,
    probe: Arc<dyn DurationProbe>,
}

impl std::fmt::Debug for SoundLibrary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SoundLibrary")
            .field("custom_dir", &self.custom_dir)
            .field("default_dir", &self.default_dir)
            .finish_non_exhaustive()
    }
}

impl SoundLibrary {
    pub fn new(storage: &StorageConfig, probe: Arc<dyn DurationProbe>) -> Self {
        Self::with_dirs(storage.custom_sounds_dir(), storage.default_sounds_dir(), probe)
    }

    pub fn with_dirs(
        custom_dir: impl Into<PathBuf>,
        default_dir: impl Into<PathBuf>,
        probe: Arc<dyn DurationProbe>,
    ) -> Self {
        Self {
            custom_dir: custom_dir.into(),
            default_dir: default_dir.into(),
            probe,
        }
    }

    pub fn custom_dir(&self) -> &Path {
        &self.custom_dir
    }

    /// Folder with the bundled sounds (conch clips and the like).
    pub fn default_dir(&self) -> &Path {
        &self.default_dir
    }

    /// Location of a catalogued sound on disk.
    pub fn path_of(&self, file: &SoundFile) -> PathBuf {
        self.custom_dir.join(&file.file_name)
    }

    /// Write upload bytes under `file_name` in the custom folder.
    pub async fn store_upload(&self, bytes: &[u8], file_name: &str) -> io::Result<PathBuf> {
        tokio::fs::create_dir_all(&self.custom_dir).await?;
        let path = self.custom_dir.join(file_name);
        tokio::fs::write(&path, bytes).await?;
        debug!("Stored {} bytes at {}", bytes.len(), path.display());
        Ok(path)
    }

    /// Run an already validated attachment through the upload pipeline:
    /// name check, content dedup, duration probe, storage, catalog insert.
    pub async fn import(&self, pool: &SqlitePool, upload: SoundUpload<'_>) -> Result<UploadOutcome> {
        let name = normalize_display_name(upload.display_name)?;

        let same_name = FileQuery {
            display_name: Some(name.clone()),
            deleted: Some(false),
            visible_to: Some(upload.guild_id),
            ..FileQuery::default()
        };
        if !queries::find_files(pool, &same_name).await?.is_empty() {
            return Ok(UploadOutcome::NameTaken(name));
        }

        let hash = content_hash(upload.bytes);
        let same_bytes = FileQuery {
            content_hash: Some(hash.clone()),
            ..FileQuery::default()
        };
        if let Some(existing) = queries::find_files(pool, &same_bytes).await?.into_iter().next() {
            if existing.deleted && existing.is_visible_to(upload.guild_id) {
                if self.name_in_use(pool, &existing).await? {
                    return Ok(UploadOutcome::NameTaken(existing.display_name));
                }
                self.store_upload(upload.bytes, &existing.file_name).await?;
                queries::set_file_deleted(pool, existing.id, false).await?;
                info!("Restored sound {} from a re-upload", existing.display_name);
                return Ok(UploadOutcome::Restored(SoundFile {
                    deleted: false,
                    ..existing
                }));
            }
            let visible_name = existing
                .is_visible_to(upload.guild_id)
                .then_some(existing.display_name);
            return Ok(UploadOutcome::Duplicate { visible_name });
        }

        let extension = Path::new(upload.filename)
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_string);
        let probe = Arc::clone(&self.probe);
        let bytes = upload.bytes.to_vec();
        let duration = tokio::task::spawn_blocking(move || {
            probe.probe_bytes(&bytes, extension.as_deref())
        })
        .await
        .map_err(io::Error::other)?
        .map_err(DiscordError::NotAudio)?;

        let file_name = stored_file_name(&hash, upload.filename);
        let stored_at = self.store_upload(upload.bytes, &file_name).await?;

        let record = NewSoundFile {
            display_name: name,
            file_name,
            content_hash: hash,
            duration_seconds: duration.unwrap_or(0),
            size_bytes: upload.bytes.len() as u64,
            owner_guild_id: Some(upload.guild_id),
            uploader_id: Some(upload.uploader_id),
            public: upload.public,
            tags: upload.tags,
        };

        let id = match queries::create_file(pool, &record).await {
            Ok(id) => id,
            Err(e) => {
                if let Err(remove_err) = tokio::fs::remove_file(&stored_at).await {
                    warn!(
                        "Failed to remove {} after a failed insert: {}",
                        stored_at.display(),
                        remove_err
                    );
                }
                return Err(e.into());
            }
        };

        let file = queries::get_file(pool, id)
            .await?
            .ok_or_else(|| DbError::not_found("file", id))?;
        info!(id, name = %file.display_name, "Uploaded new sound");
        Ok(UploadOutcome::Stored(file))
    }

    /// Whether a live sound that `file` would be visible next to already
    /// uses its display name. Public files clash with any live sound of that
    /// name, private ones only with sounds their owner guild can see.
    async fn name_in_use(&self, pool: &SqlitePool, file: &SoundFile) -> Result<bool> {
        let query = FileQuery {
            display_name: Some(file.display_name.clone()),
            deleted: Some(false),
            visible_to: if file.public { None } else { file.owner_guild_id },
            ..FileQuery::default()
        };
        let clashes = queries::find_files(pool, &query).await?;
        Ok(clashes.iter().any(|other| other.id != file.id))
    }

    /// Reconcile the catalog with the custom sound folder.
    ///
    /// Records whose file vanished are marked deleted, records whose file is
    /// back are restored unless their name was taken meanwhile, and untracked
    /// audio files are imported as public sounds named after their file stem
    /// unless that name or their content is already catalogued.
    pub async fn sync(&self, pool: &SqlitePool) -> Result<SyncReport> {
        tokio::fs::create_dir_all(&self.custom_dir).await?;

        let mut report = SyncReport::default();
        let records = queries::list_files(pool).await?;

        let mut tracked: HashSet<String> = HashSet::new();
        let mut hashes: HashSet<String> = HashSet::new();
        let mut names: HashSet<String> = HashSet::new();

        for record in &records {
            tracked.insert(record.file_name.clone());
            hashes.insert(record.content_hash.clone());

            let present = match tokio::fs::try_exists(self.path_of(record)).await {
                Ok(present) => present,
                Err(e) => {
                    warn!("Cannot check file of {}, leaving it as is: {}", record.display_name, e);
                    report.skipped += 1;
                    continue;
                }
            };

            if present && record.deleted {
                if self.name_in_use(pool, record).await? {
                    warn!(
                        "Sound {} is back on disk but its name is taken, keeping it deleted",
                        record.display_name
                    );
                    report.skipped += 1;
                    continue;
                }
                queries::set_file_deleted(pool, record.id, false).await?;
                info!("Sound {} is back on disk", record.display_name);
                report.restored += 1;
            } else if !present && !record.deleted {
                queries::set_file_deleted(pool, record.id, true).await?;
                warn!("Sound file missing for {}, marking deleted", record.display_name);
                report.marked_deleted += 1;
            }

            if present {
                names.insert(record.display_name.to_lowercase());
            }
        }

        let mut untracked = Vec::new();
        let mut entries = tokio::fs::read_dir(&self.custom_dir).await?;
        while let Some(entry) = entries.next_entry().await? {
            if !entry.file_type().await?.is_file() {
                continue;
            }
            match entry.file_name().into_string() {
                Ok(file_name) if !tracked.contains(&file_name) => untracked.push(file_name),
                Ok(_) => {}
                Err(raw) => warn!("Skipping non UTF-8 file name {:?}", raw),
            }
        }
        untracked.sort();

        for file_name in untracked {
            let path = self.custom_dir.join(&file_name);
            let stem = Path::new(&file_name)
                .file_stem()
                .and_then(|s| s.to_str())
                .unwrap_or(&file_name)
                .trim()
                .to_string();

            let probe = Arc::clone(&self.probe);
            let probe_path = path.clone();
            let (hash, duration) = tokio::task::spawn_blocking(move || {
                let hash = hash_file(&probe_path)?;
                io::Result::Ok((hash, probe.probe_file(&probe_path)))
            })
            .await
            .map_err(io::Error::other)??;

            let duration = match duration {
                Ok(duration) => duration,
                Err(e) => {
                    warn!("Skipping {}: {}", file_name, e);
                    report.skipped += 1;
                    continue;
                }
            };

            if stem.is_empty() || hashes.contains(&hash) || names.contains(&stem.to_lowercase()) {
                debug!("Skipping {}: name or content already catalogued", file_name);
                report.skipped += 1;
                continue;
            }

            let size = tokio::fs::metadata(&path).await?.len();
            let record = NewSoundFile {
                display_name: stem.clone(),
                file_name,
                content_hash: hash.clone(),
                duration_seconds: duration.unwrap_or(0),
                size_bytes: size,
                owner_guild_id: None,
                uploader_id: None,
                public: true,
                tags: Vec::new(),
            };
            queries::create_file(pool, &record).await?;
            info!("Imported untracked sound {}", stem);

            hashes.insert(hash);
            names.insert(stem.to_lowercase());
            report.imported += 1;
        }

        Ok(report)
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    /// 8-bit mono PCM WAV of `seconds` at 8 kHz, `fill` as every sample.
    pub fn wav(seconds: u32, fill: u8) -> Vec<u8> {
        let rate = 8000u32;
        let data_len = seconds * rate;
        let mut out = Vec::with_capacity(44 + data_len as usize);
        out.extend_from_slice(b"RIFF");
        out.extend_from_slice(&(36 + data_len).to_le_bytes());
        out.extend_from_slice(b"WAVEfmt ");
        out.extend_from_slice(&16u32.to_le_bytes());
        out.extend_from_slice(&1u16.to_le_bytes());
        out.extend_from_slice(&1u16.to_le_bytes());
        out.extend_from_slice(&rate.to_le_bytes());
        out.extend_from_slice(&rate.to_le_bytes());
        out.extend_from_slice(&1u16.to_le_bytes());
        out.extend_from_slice(&8u16.to_le_bytes());
        out.extend_from_slice(b"data");
        out.extend_from_slice(&data_len.to_le_bytes());
        out.resize(44 + data_len as usize, fill);
        out
    }
}
