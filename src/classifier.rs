//! Keyword-based content classification.
//!
//! Two keyword sets drive the digest's editorial line:
//!
//! | Set | Effect | Topics |
//! |-----|--------|--------|
//! | blocklist | item is dropped | violence, death, crime, politics, disasters, scandal |
//! | prefer | item ranks higher | events, health, traffic, culture, education, services |
//!
//! Matching is case-insensitive substring containment over the title and
//! summary joined by a space. Keywords are word fragments on purpose
//! (`"homic"` catches both "homicídio" and "homicida").

/// Fragments whose presence excludes an item.
pub const DEFAULT_BLOCKLIST: &[&str] = &[
    "morte", "morto", "assassin", "homic", "crime", "violên", "tirote", "trág", "trag",
    "estupro", "roubo", "furto", "sequestro", "corpo", "política", "eleição", "partido",
    "corrup", "escând", "acidente grave", "desastre", "catástro", "explos",
];

/// Public-utility fragments that raise an item's rank.
pub const DEFAULT_PREFER: &[&str] = &[
    "evento", "aviso", "mutirão", "vacinação", "saúde", "trânsito", "obra", "feira",
    "cultura", "educação", "serviço", "atendimento",
];

/// Immutable keyword sets, case-folded once at construction.
#[derive(Debug, Clone)]
pub struct Classifier {
    blocklist: Vec<String>,
    prefer: Vec<String>,
}

impl Default for Classifier {
    fn default() -> Self {
        Self::new(DEFAULT_BLOCKLIST, DEFAULT_PREFER)
    }
}

impl Classifier {
    pub fn new<B, P>(blocklist: &[B], prefer: &[P]) -> Self
    where
        B: AsRef<str>,
        P: AsRef<str>,
    {
        Self {
            blocklist: fold_keywords(blocklist),
            prefer: fold_keywords(prefer),
        }
    }

    /// Build from optional overrides, falling back to the built-in lists.
    pub fn from_overrides(blocklist: Option<&[String]>, prefer: Option<&[String]>) -> Self {
        let blocklist = blocklist
            .map(fold_keywords)
            .unwrap_or_else(|| fold_keywords(DEFAULT_BLOCKLIST));
        let prefer = prefer
            .map(fold_keywords)
            .unwrap_or_else(|| fold_keywords(DEFAULT_PREFER));
        Self { blocklist, prefer }
    }

    /// True if any blocklist keyword occurs in the title or summary.
    pub fn is_blocked(&self, title: &str, summary: &str) -> bool {
        let hay = haystack(title, summary);
        self.blocklist.iter().any(|w| hay.contains(w.as_str()))
    }

    /// Number of preference keywords occurring in the title or summary.
    pub fn preference_score(&self, title: &str, summary: &str) -> usize {
        let hay = haystack(title, summary);
        self.prefer.iter().filter(|w| hay.contains(w.as_str())).count()
    }
}

fn haystack(title: &str, summary: &str) -> String {
    format!("{title} {summary}").to_lowercase()
}

// Empty keywords would match everything.
fn fold_keywords<S: AsRef<str>>(words: &[S]) -> Vec<String> {
    words
        .iter()
        .map(|w| w.as_ref().trim().to_lowercase())
        .filter(|w| !w.is_empty())
        .collect()
}
