//! The magic conch shell: a yes/no oracle with a voice clip per answer.

use std::path::{Path, PathBuf};

use rand::Rng;

/// Folder below the default sound directory holding the conch clips.
pub const CONCH_FOLDER: &str = "magic_conch_shell";

/// One possible answer and the clip that speaks it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConchAnswer {
    pub text: &'static str,
    pub clip: &'static str,
}

pub const ANSWERS: [ConchAnswer; 6] = [
    ConchAnswer {
        text: "Eines Tages vielleicht.",
        clip: "einesTagesVielleicht.mp3",
    },
    ConchAnswer {
        text: "Nein.",
        clip: "nein.mp3",
    },
    ConchAnswer {
        text: "Nein!",
        clip: "nein!.mp3",
    },
    ConchAnswer {
        text: "Ich glaub' eher nicht.",
        clip: "ichGlaubEherNicht.mp3",
    },
    ConchAnswer {
        text: "Ja.",
        clip: "ja.mp3",
    },
    ConchAnswer {
        text: "Frag doch einfach nochmal.",
        clip: "fragDochEinfachNochmal.mp3",
    },
];

impl ConchAnswer {
    /// Ask the shell.
    pub fn draw<R: Rng + ?Sized>(rng: &mut R) -> Self {
        ANSWERS[rng.random_range(0..ANSWERS.len())]
    }

    pub fn clip_path(&self, default_sounds_dir: &Path) -> PathBuf {
        default_sounds_dir.join(CONCH_FOLDER).join(self.clip)
    }

    /// Reply text, quoting the question when one was asked.
    pub fn reply(&self, question: Option<&str>) -> String {
        match question.map(str::trim).filter(|q| !q.is_empty()) {
            Some(question) => format!("> {question}\n{}", self.text),
            None => self.text.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    use super::*;

    #[test]
    fn reply_quotes_question() {
        let answer = ANSWERS[4];
        assert_eq!(answer.reply(Some("Soll ich?")), "> Soll ich?\nJa.");
        assert_eq!(answer.reply(Some("  ")), "Ja.");
        assert_eq!(answer.reply(None), "Ja.");
    }

    #[test]
    fn every_answer_can_be_drawn() {
        let mut rng = StdRng::seed_from_u64(3);
        let mut seen = std::collections::HashSet::new();
        for _ in 0..500 {
            seen.insert(ConchAnswer::draw(&mut rng).clip);
        }
        assert_eq!(seen.len(), ANSWERS.len());
    }

    #[test]
    fn clips_live_in_conch_folder() {
        let path = ANSWERS[1].clip_path(Path::new("/data/sounds/default"));
        assert_eq!(
            path,
            PathBuf::from("/data/sounds/default/magic_conch_shell/nein.mp3")
        );
    }
}
