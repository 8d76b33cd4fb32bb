//! End-to-end checks of sound selection through the public API, using a
//! library shaped like a real server's.

use std::collections::{BTreeSet, HashMap};

use gustel_core::resolver::eligible;
use gustel_core::{ResolveRequest, SoundFile, resolve, resolve_with_rng};
use rand::SeedableRng;
use rand::rngs::StdRng;

const HOME: u64 = 100;
const OTHER: u64 = 200;

fn file(id: i64, name: &str, seconds: u64, owner: u64, public: bool, tags: &[&str]) -> SoundFile {
    SoundFile {
        id,
        display_name: name.to_string(),
        file_name: format!("{id}_{name}.mp3"),
        content_hash: format!("{id:064x}"),
        duration_seconds: seconds,
        size_bytes: 10_000,
        owner_guild_id: Some(owner),
        uploader_id: Some(1),
        public,
        tags: tags.iter().map(|t| t.to_string()).collect::<BTreeSet<_>>(),
        deleted: false,
    }
}

fn library() -> Vec<SoundFile> {
    vec![
        file(1, "Airhorn", 2, HOME, true, &["meme", "short"]),
        file(2, "Sad Trombone", 4, HOME, true, &["meme"]),
        file(3, "Ententanz", 95, HOME, true, &["music"]),
        file(4, "Insider Joke", 6, OTHER, false, &["meme"]),
        file(5, "Untimed Clip", 0, HOME, true, &[]),
    ]
}

#[test]
fn typo_still_finds_sound() {
    let files = library();
    let found = resolve(&files, &ResolveRequest::new().guild(HOME).search("airhron"))
        .unwrap()
        .map(|f| f.id);
    assert_eq!(found, Some(1));
}

#[test]
fn private_sound_of_other_guild_is_hidden() {
    let files = library();
    let from_home = resolve(&files, &ResolveRequest::new().guild(HOME).search("insider joke")).unwrap();
    assert!(from_home.is_none());

    let from_owner = resolve(&files, &ResolveRequest::new().guild(OTHER).search("insider joke"))
        .unwrap()
        .map(|f| f.id);
    assert_eq!(from_owner, Some(4));
}

#[test]
fn random_play_respects_server_limit() {
    let files = library();
    let mut rng = StdRng::seed_from_u64(11);
    let mut counts: HashMap<i64, usize> = HashMap::new();

    for _ in 0..400 {
        let request = ResolveRequest::new().guild(HOME).max_duration(30);
        let found = resolve_with_rng(&files, &request, &mut rng)
            .unwrap()
            .expect("short public sounds exist");
        *counts.entry(found.id).or_default() += 1;
    }

    let mut picked: Vec<i64> = counts.keys().copied().collect();
    picked.sort_unstable();
    assert_eq!(picked, vec![1, 2]);
}

#[test]
fn tag_fallback_pool() {
    let files = library();
    let tags = vec!["meme".to_string()];
    let pool: Vec<i64> = eligible(&files, &ResolveRequest::new().guild(HOME).tags(&tags))
        .unwrap()
        .into_iter()
        .map(|f| f.id)
        .collect();
    assert_eq!(pool, vec![1, 2]);
}
