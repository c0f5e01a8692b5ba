//! Headline sentiment scoring using VADER
//!
//! VADER's general-purpose lexicon misses most earnings and analyst jargon,
//! so its compound score is nudged by a small equity-news keyword table.
//!
//! # Example
//! ```rust
//! use marketpulse::infrastructure::news::SentimentAnalyzer;
//!
//! let analyzer = SentimentAnalyzer::new();
//! let score = analyzer.analyze("Apple beats estimates and raises guidance");
//! assert!(score > 0.0);
//! ```

use vader_sentiment::SentimentIntensityAnalyzer;

/// Equity news terms and their boost, matched on whole words.
const BULLISH_KEYWORDS: &[(&str, f64)] = &[
    ("beat", 0.4),
    ("beats", 0.4),
    ("tops", 0.3),
    ("surge", 0.4),
    ("surges", 0.4),
    ("rally", 0.4),
    ("rallies", 0.4),
    ("soars", 0.5),
    ("upgrade", 0.4),
    ("upgraded", 0.4),
    ("outperform", 0.3),
    ("raises", 0.2),
    ("buyback", 0.3),
    ("record", 0.2),
    ("bullish", 0.5),
    ("breakthrough", 0.4),
    ("partnership", 0.2),
];

const BEARISH_KEYWORDS: &[(&str, f64)] = &[
    ("miss", -0.4),
    ("misses", -0.4),
    ("plunge", -0.5),
    ("plunges", -0.5),
    ("slump", -0.4),
    ("slumps", -0.4),
    ("downgrade", -0.4),
    ("downgraded", -0.4),
    ("underperform", -0.3),
    ("cuts", -0.3),
    ("layoffs", -0.4),
    ("recall", -0.4),
    ("probe", -0.4),
    ("lawsuit", -0.4),
    ("antitrust", -0.3),
    ("bearish", -0.5),
    ("selloff", -0.4),
    ("sell-off", -0.4),
];

/// Multi-word phrases, matched as substrings.
const PHRASES: &[(&str, f64)] = &[
    ("raises guidance", 0.4),
    ("all-time high", 0.4),
    ("cuts guidance", -0.5),
    ("lowers guidance", -0.5),
    ("profit warning", -0.5),
];

/// VADER analyzer with equity keyword boosting.
pub struct SentimentAnalyzer {
    analyzer: SentimentIntensityAnalyzer<'static>,
}

impl SentimentAnalyzer {
    pub fn new() -> Self {
        Self {
            analyzer: SentimentIntensityAnalyzer::new(),
        }
    }

    fn keyword_boost(text: &str) -> f64 {
        let lower = text.to_lowercase();
        let words: Vec<&str> = lower
            .split(|c: char| !(c.is_alphanumeric() || c == '-'))
            .filter(|w| !w.is_empty())
            .collect();

        let word_boost: f64 = BULLISH_KEYWORDS
            .iter()
            .chain(BEARISH_KEYWORDS.iter())
            .filter(|(keyword, _)| words.contains(keyword))
            .map(|(_, score)| score)
            .sum();
        let phrase_boost: f64 = PHRASES
            .iter()
            .filter(|(phrase, _)| lower.contains(phrase))
            .map(|(_, score)| score)
            .sum();

        word_boost + phrase_boost
    }

    /// Sentiment in [-1.0, 1.0]; 0.0 for blank text.
    pub fn analyze(&self, text: &str) -> f64 {
        if text.trim().is_empty() {
            return 0.0;
        }

        let scores = self.analyzer.polarity_scores(text);
        let compound = scores["compound"];
        (compound + Self::keyword_boost(text) * 0.5).clamp(-1.0, 1.0)
    }
}

impl Default for SentimentAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bullish_headlines() {
        let analyzer = SentimentAnalyzer::new();

        for headline in [
            "Microsoft beats estimates as cloud revenue surges",
            "Amazon shares rally after analyst upgrade",
            "Alphabet raises guidance and announces record buyback",
        ] {
            let score = analyzer.analyze(headline);
            assert!(score > 0.0, "Expected positive score for '{}', got {}", headline, score);
        }
    }

    #[test]
    fn test_bearish_headlines() {
        let analyzer = SentimentAnalyzer::new();

        for headline in [
            "Apple misses revenue estimates, shares plunge",
            "Regulators open antitrust probe into Google",
            "Retailer cuts guidance and announces layoffs",
        ] {
            let score = analyzer.analyze(headline);
            assert!(score < 0.0, "Expected negative score for '{}', got {}", headline, score);
        }
    }

    #[test]
    fn test_keywords_match_whole_words() {
        // "missile" and "recalls" must not trigger "miss" / "recall"
        assert_eq!(SentimentAnalyzer::keyword_boost("missile recalls"), 0.0);
        assert!(SentimentAnalyzer::keyword_boost("Q3 miss") < 0.0);
    }

    #[test]
    fn test_score_is_bounded() {
        let analyzer = SentimentAnalyzer::new();
        assert_eq!(analyzer.analyze("   "), 0.0);
        let score = analyzer.analyze(
            "great amazing beats surges soars upgrade record bullish breakthrough rally",
        );
        assert!(score <= 1.0);
    }
}
