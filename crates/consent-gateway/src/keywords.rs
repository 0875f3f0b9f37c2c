//! Keyword vocabularies and message classification.

use crate::config::KeywordConfig;
use std::collections::HashSet;

/// How a message body classified against the keyword vocabularies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeywordMatch {
    OptOut,
    Help,
    OptIn,
}

/// The three fixed vocabularies, matched case-insensitively against the
/// token set of an inbound message.
#[derive(Debug, Clone)]
pub struct KeywordSets {
    opt_in: HashSet<String>,
    opt_out: HashSet<String>,
    help: HashSet<String>,
}

impl KeywordSets {
    pub fn new<I, S>(opt_in: I, opt_out: I, help: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let upper = |words: I| -> HashSet<String> {
            words
                .into_iter()
                .map(|w| w.as_ref().trim().to_uppercase())
                .filter(|w| !w.is_empty())
                .collect()
        };
        Self {
            opt_in: upper(opt_in),
            opt_out: upper(opt_out),
            help: upper(help),
        }
    }

    pub fn from_config(config: &KeywordConfig) -> Self {
        Self::new(&config.opt_in, &config.opt_out, &config.help)
    }

    /// Classify a message body. Tokens are whitespace-split and
    /// uppercased; order and duplicates are irrelevant. Opt-out is checked
    /// first so STOP always wins, then help, then opt-in.
    pub fn classify(&self, body: &str) -> Option<KeywordMatch> {
        let tokens: HashSet<String> = body
            .split_whitespace()
            .map(|t| t.to_uppercase())
            .collect();

        if tokens.iter().any(|t| self.opt_out.contains(t)) {
            Some(KeywordMatch::OptOut)
        } else if tokens.iter().any(|t| self.help.contains(t)) {
            Some(KeywordMatch::Help)
        } else if tokens.iter().any(|t| self.opt_in.contains(t)) {
            Some(KeywordMatch::OptIn)
        } else {
            None
        }
    }
}

impl Default for KeywordSets {
    fn default() -> Self {
        Self::from_config(&KeywordConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keywords_match_any_token_not_the_whole_body() {
        let sets = KeywordSets::default();
        assert_eq!(sets.classify("please STOP now"), Some(KeywordMatch::OptOut));
        assert_eq!(sets.classify("StopAll please"), Some(KeywordMatch::OptOut));
    }

    #[test]
    fn matching_is_case_insensitive() {
        let sets = KeywordSets::default();
        assert_eq!(sets.classify("join"), Some(KeywordMatch::OptIn));
        assert_eq!(sets.classify("Help"), Some(KeywordMatch::Help));
        assert_eq!(sets.classify("sToP"), Some(KeywordMatch::OptOut));
    }

    #[test]
    fn opt_out_wins_when_a_message_carries_both() {
        let sets = KeywordSets::default();
        assert_eq!(sets.classify("STOP START"), Some(KeywordMatch::OptOut));
        assert_eq!(sets.classify("START STOP"), Some(KeywordMatch::OptOut));
    }

    #[test]
    fn help_wins_over_opt_in() {
        let sets = KeywordSets::default();
        assert_eq!(sets.classify("HELP JOIN"), Some(KeywordMatch::Help));
    }

    #[test]
    fn substrings_do_not_match() {
        let sets = KeywordSets::default();
        // "STOPPED" is not the token "STOP".
        assert_eq!(sets.classify("STOPPED"), None);
        assert_eq!(sets.classify("Joey"), None);
    }

    #[test]
    fn empty_body_matches_nothing() {
        let sets = KeywordSets::default();
        assert_eq!(sets.classify(""), None);
        assert_eq!(sets.classify("   "), None);
    }
}
