//! Keyword extraction used as the categorization key.
//!
//! Documents are tokenized into lowercase alphanumeric runs, stop-words are
//! dropped (plus language boilerplate for scripts), and the survivors are
//! ranked by term frequency. Ties keep the order of first occurrence so results are
//! reproducible.

use std::collections::{HashMap, HashSet};

/// Default number of keywords returned per document.
pub const DEFAULT_MAX_KEYWORDS: usize = 5;

/// Tokens shorter than this never become keywords.
const MIN_TOKEN_LEN: usize = 2;

const ENGLISH_STOP_WORDS: &[&str] = &[
    "a", "about", "above", "after", "again", "against", "all", "am", "an", "and", "any", "are",
    "as", "at", "be", "because", "been", "before", "being", "below", "between", "both", "but",
    "by", "can", "could", "did", "do", "does", "doing", "down", "during", "each", "few", "for",
    "from", "further", "had", "has", "have", "having", "he", "her", "here", "hers", "herself",
    "him", "himself", "his", "how", "i", "if", "in", "into", "is", "it", "its", "itself", "just",
    "me", "might", "more", "most", "must", "my", "myself", "no", "nor", "not", "now", "of", "off",
    "on", "once", "only", "or", "other", "our", "ours", "ourselves", "out", "over", "own", "same",
    "shall", "she", "should", "so", "some", "such", "than", "that", "the", "their", "theirs",
    "them", "themselves", "then", "there", "these", "they", "this", "those", "through", "to",
    "too", "under", "until", "up", "very", "was", "we", "were", "what", "when", "where", "which",
    "while", "who", "whom", "why", "will", "with", "would", "you", "your", "yours", "yourself",
    "yourselves",
];

// Keywords of the languages the sniffer recognises; they say nothing about a file's topic.
const SCRIPT_STOP_WORDS: &[&str] = &[
    "def", "pass", "import", "return", "class", "self", "none", "true", "false", "elif", "else",
    "function", "var", "let", "const", "echo", "fi", "esac", "done", "exit", "call", "cmd", "exe",
    "html", "head", "body", "div", "script",
];

/// Ranks the terms of a document and returns the top-N.
///
/// # Examples
///
/// ```
/// use topicsort::keywords::KeywordExtractor;
///
/// let extractor = KeywordExtractor::default();
/// assert_eq!(extractor.extract_script("def foo(): pass"), vec!["foo".to_string()]);
/// assert_eq!(extractor.extract("head and body"), vec!["head".to_string(), "body".to_string()]);
/// assert!(extractor.extract("the and of").is_empty());
/// ```
#[derive(Debug, Clone)]
pub struct KeywordExtractor {
    max_keywords: usize,
    stop_words: HashSet<&'static str>,
    script_stop_words: HashSet<&'static str>,
}

impl KeywordExtractor {
    /// Creates an extractor returning at most `max_keywords` terms.
    pub fn new(max_keywords: usize) -> Self {
        Self {
            max_keywords,
            stop_words: ENGLISH_STOP_WORDS.iter().copied().collect(),
            script_stop_words: SCRIPT_STOP_WORDS.iter().copied().collect(),
        }
    }

    /// Extracts up to `max_keywords` keywords from prose, most frequent first.
    ///
    /// Equal frequencies are ordered by first occurrence in `text`. An empty
    /// result means no token survived filtering.
    pub fn extract(&self, text: &str) -> Vec<String> {
        self.rank(text, false)
    }

    /// Like [`KeywordExtractor::extract`], also dropping the keywords of the
    /// script languages the sniffer recognises.
    pub fn extract_script(&self, text: &str) -> Vec<String> {
        self.rank(text, true)
    }

    fn rank(&self, text: &str, script: bool) -> Vec<String> {
        // term -> (frequency, index of first occurrence)
        let mut terms: HashMap<String, (usize, usize)> = HashMap::new();

        for (position, token) in self.tokenize(text, script).enumerate() {
            terms.entry(token).or_insert((0, position)).0 += 1;
        }

        let mut ranked: Vec<(String, usize, usize)> = terms
            .into_iter()
            .map(|(term, (count, first))| (term, count, first))
            .collect();
        ranked.sort_by(|a, b| b.1.cmp(&a.1).then(a.2.cmp(&b.2)));

        ranked
            .into_iter()
            .take(self.max_keywords)
            .map(|(term, _, _)| term)
            .collect()
    }

    fn tokenize<'a>(&'a self, text: &'a str, script: bool) -> impl Iterator<Item = String> + 'a {
        text.split(|c: char| !c.is_alphanumeric())
            .filter(|raw| raw.chars().count() >= MIN_TOKEN_LEN)
            .map(str::to_lowercase)
            .filter(move |token| {
                !self.stop_words.contains(token.as_str())
                    && !(script && self.script_stop_words.contains(token.as_str()))
            })
    }
}

impl Default for KeywordExtractor {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_KEYWORDS)
    }
}
