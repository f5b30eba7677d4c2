//! The local archive: insights served when the remote oracle is silent.
//!
//! Every entry keeps the same contract the generative call is held to -
//! a phrase of at most three words and an absolute reference URL - so the
//! rest of the application cannot tell a fallback from a live response.

use unseen_types::{Insight, Theme};

struct FallbackFact {
    phrase: &'static str,
    explanation: &'static str,
    theme: Theme,
    source_url: &'static str,
}

impl FallbackFact {
    fn to_insight(&self) -> Insight {
        Insight {
            phrase: self.phrase.to_string(),
            explanation: self.explanation.to_string(),
            theme: self.theme,
            source_url: self.source_url.to_string(),
        }
    }
}

const FALLBACK_FACTS: &[FallbackFact] = &[
    FallbackFact {
        phrase: "PROJECT BLUE BEAM",
        explanation: "A rumored plan to stage a holographic alien invasion and usher in a single world government.",
        theme: Theme::Conspiracy,
        source_url: "https://en.wikipedia.org/wiki/Serge_Monast",
    },
    FallbackFact {
        phrase: "AKASHIC RECORDS",
        explanation: "Every event, thought, and intent ever to occur, said to be encoded on a non-physical plane.",
        theme: Theme::Mysticism,
        source_url: "https://en.wikipedia.org/wiki/Akashic_records",
    },
    FallbackFact {
        phrase: "THE HUM",
        explanation: "A low-frequency drone heard worldwide with no traceable source. Some say it rises from the hollow earth.",
        theme: Theme::Paranormal,
        source_url: "https://en.wikipedia.org/wiki/The_Hum",
    },
    FallbackFact {
        phrase: "SHADOW PEOPLE",
        explanation: "Dark silhouettes glimpsed at the edge of vision, most often during sleep paralysis. Some believe they feed on fear.",
        theme: Theme::Paranormal,
        source_url: "https://en.wikipedia.org/wiki/Shadow_person",
    },
    FallbackFact {
        phrase: "EGREGORE",
        explanation: "An autonomous psychic entity born from a collective group mind. Enough shared thought takes on a life of its own.",
        theme: Theme::Occult,
        source_url: "https://en.wikipedia.org/wiki/Egregore",
    },
    FallbackFact {
        phrase: "NUMBERS STATIONS",
        explanation: "Shortwave broadcasts of synthesized voices reading endless digits. Spies? Ghosts? Something else entirely?",
        theme: Theme::Conspiracy,
        source_url: "https://en.wikipedia.org/wiki/Numbers_station",
    },
    FallbackFact {
        phrase: "ARS GOETIA",
        explanation: "A seventeenth-century catalogue of seventy-two demons, each with a seal, a rank, and a price for summoning.",
        theme: Theme::Occult,
        source_url: "https://en.wikipedia.org/wiki/Lesser_Key_of_Solomon",
    },
    FallbackFact {
        phrase: "EMERALD TABLET",
        explanation: "A cryptic alchemical text promising the secret of all transmutation: as above, so below.",
        theme: Theme::Mysticism,
        source_url: "https://en.wikipedia.org/wiki/Emerald_Tablet",
    },
];

/// One fallback insight, chosen uniformly at random.
#[must_use]
pub fn random_fallback() -> Insight {
    use rand::Rng;
    let index = rand::rng().random_range(0..FALLBACK_FACTS.len());
    FALLBACK_FACTS[index].to_insight()
}

/// Every fallback insight, in table order. Exposed so consumers can assert
/// that a degraded response came from the archive.
#[must_use]
pub fn entries() -> Vec<Insight> {
    FALLBACK_FACTS.iter().map(FallbackFact::to_insight).collect()
}

#[cfg(test)]
mod tests {
    use super::{FALLBACK_FACTS, entries, random_fallback};
    use unseen_types::Theme;

    #[test]
    fn archive_is_large_enough() {
        assert!(FALLBACK_FACTS.len() >= 6);
    }

    #[test]
    fn archive_spans_every_theme() {
        for theme in Theme::all() {
            assert!(
                FALLBACK_FACTS.iter().any(|fact| fact.theme == *theme),
                "no fallback entry for theme {theme}"
            );
        }
    }

    #[test]
    fn phrases_stay_short() {
        for fact in FALLBACK_FACTS {
            assert!(
                fact.phrase.split_whitespace().count() <= 3,
                "phrase too long: {:?}",
                fact.phrase
            );
            assert!(!fact.phrase.trim().is_empty());
        }
    }

    #[test]
    fn source_urls_are_absolute() {
        for fact in FALLBACK_FACTS {
            let url = url::Url::parse(fact.source_url).expect("fallback URL must parse");
            assert!(
                matches!(url.scheme(), "http" | "https"),
                "unexpected scheme in {:?}",
                fact.source_url
            );
        }
    }

    #[test]
    fn random_fallback_draws_from_archive() {
        let archive = entries();
        for _ in 0..32 {
            assert!(archive.contains(&random_fallback()));
        }
    }
}
