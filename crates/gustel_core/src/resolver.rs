//! Sound selection.
//!
//! Given a snapshot of catalog records and an optional search string, pick a
//! single sound to play. Matching is fuzzy: names are compared with a
//! normalized longest-common-subsequence ratio, weak matches are dropped, a
//! clear winner is returned as-is and near-ties are broken randomly so that
//! repeating an ambiguous query does not always play the same file.
//!
//! Everything here is pure. The caller supplies the candidates per call.

use rand::Rng;

use crate::error::ResolveError;
use crate::sound::SoundFile;

/// Minimum similarity for a candidate to count as a match (inclusive).
pub const ACCEPT_THRESHOLD: f64 = 0.65;

/// Lead the best match needs over the runner-up to win outright.
pub const DECISIVE_GAP: f64 = 0.10;

/// Number of top matches a near-tie is drawn from.
pub const NEAR_TIE_WINDOW: usize = 3;

/// Parameters of a single resolution.
#[derive(Debug, Clone, Copy, Default)]
pub struct ResolveRequest<'a> {
    /// Guild asking; when set, files not visible to it are skipped
    pub guild_id: Option<u64>,
    /// Upper bound in seconds; `None` or `Some(0)` is unlimited
    pub max_duration: Option<i64>,
    /// Free-text query; absent or blank means random selection
    pub search: Option<&'a str>,
    /// Tags a candidate must all carry
    pub required_tags: &'a [String],
}

impl<'a> ResolveRequest<'a> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn guild(mut self, guild_id: u64) -> Self {
        self.guild_id = Some(guild_id);
        self
    }

    pub fn max_duration(mut self, seconds: i64) -> Self {
        self.max_duration = Some(seconds);
        self
    }

    pub fn search(mut self, text: &'a str) -> Self {
        self.search = Some(text);
        self
    }

    pub fn tags(mut self, tags: &'a [String]) -> Self {
        self.required_tags = tags;
        self
    }

    fn bound(&self) -> Result<Option<u64>, ResolveError> {
        match self.max_duration {
            Some(secs) if secs < 0 => Err(ResolveError::InvalidInput {
                field: "max_duration",
                reason: format!("must be zero (unlimited) or positive, got {secs}"),
            }),
            Some(secs) => Ok(Some(secs as u64)),
            None => Ok(None),
        }
    }

    fn query(&self) -> Option<&'a str> {
        self.search.map(str::trim).filter(|q| !q.is_empty())
    }
}

/// Resolve a sound using the thread-local RNG.
pub fn resolve<'c>(
    candidates: &'c [SoundFile],
    request: &ResolveRequest<'_>,
) -> Result<Option<&'c SoundFile>, ResolveError> {
    resolve_with_rng(candidates, request, &mut rand::rng())
}

/// Resolve a sound, drawing random choices from `rng`.
pub fn resolve_with_rng<'c, R: Rng + ?Sized>(
    candidates: &'c [SoundFile],
    request: &ResolveRequest<'_>,
    rng: &mut R,
) -> Result<Option<&'c SoundFile>, ResolveError> {
    let pool = eligible(candidates, request)?;

    let Some(query) = request.query() else {
        return Ok(pick(&pool, rng));
    };

    let mut matches: Vec<(&SoundFile, f64)> = pool
        .into_iter()
        .map(|file| (file, similarity(query, &file.display_name)))
        .filter(|(_, ratio)| *ratio >= ACCEPT_THRESHOLD)
        .collect();

    if matches.len() <= 1 {
        return Ok(matches.pop().map(|(file, _)| file));
    }

    matches.sort_by(|a, b| b.1.total_cmp(&a.1));
    if matches[0].1 - matches[1].1 >= DECISIVE_GAP {
        return Ok(Some(matches[0].0));
    }

    matches.truncate(NEAR_TIE_WINDOW);
    let ties: Vec<&SoundFile> = matches.into_iter().map(|(file, _)| file).collect();
    Ok(pick(&ties, rng))
}

/// Candidates that survive the visibility, tag and duration filters.
///
/// The filters are independent predicates, so their order does not matter.
pub fn eligible<'c>(
    candidates: &'c [SoundFile],
    request: &ResolveRequest<'_>,
) -> Result<Vec<&'c SoundFile>, ResolveError> {
    let bound = request.bound()?;
    Ok(candidates
        .iter()
        .filter(|file| !file.deleted)
        .filter(|file| {
            request
                .guild_id
                .map_or(true, |guild| file.is_visible_to(guild))
        })
        .filter(|file| file.has_tags(request.required_tags))
        .filter(|file| file.fits_duration(bound))
        .collect())
}

/// Case-insensitive similarity of two strings in `[0, 1]`.
///
/// Computed as `2 * lcs / (len_a + len_b)` over characters, so it is
/// symmetric and reaches 1.0 only when both strings fold to the same text.
pub fn similarity(a: &str, b: &str) -> f64 {
    let a: Vec<char> = a.to_lowercase().chars().collect();
    let b: Vec<char> = b.to_lowercase().chars().collect();

    let total = a.len() + b.len();
    if total == 0 {
        return 1.0;
    }
    (2 * lcs_len(&a, &b)) as f64 / total as f64
}

fn lcs_len(a: &[char], b: &[char]) -> usize {
    let mut prev = vec![0usize; b.len() + 1];
    let mut curr = vec![0usize; b.len() + 1];

    for &ca in a {
        for (j, &cb) in b.iter().enumerate() {
            curr[j + 1] = if ca == cb {
                prev[j] + 1
            } else {
                prev[j + 1].max(curr[j])
            };
        }
        std::mem::swap(&mut prev, &mut curr);
    }
    prev[b.len()]
}

fn pick<'c, R: Rng + ?Sized>(pool: &[&'c SoundFile], rng: &mut R) -> Option<&'c SoundFile> {
    if pool.is_empty() {
        return None;
    }
    Some(pool[rng.random_range(0..pool.len())])
}
