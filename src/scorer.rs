use tracing::debug;

use crate::models::{DocumentScoreCard, MaturityLabel, Sentiment, SentimentLabel};

pub const SUMMARY_TOPIC_KEYWORDS: [&str; 7] = [
    "ai",
    "risk",
    "automation",
    "kpi",
    "revenue",
    "control",
    "compliance",
];
pub const SUMMARY_MAX_SENTENCES: usize = 5;
pub const SUMMARY_SEPARATOR: &str = ". ";

pub const POSITIVE_KEYWORDS: [&str; 5] = ["improve", "optimize", "enhance", "increase", "efficient"];
pub const NEGATIVE_KEYWORDS: [&str; 5] = ["risk", "delay", "issue", "failure", "weak"];

pub const RISK_KEYWORDS: [&str; 5] = ["risk", "fraud", "control", "audit", "compliance"];
pub const RISK_POINTS_PER_HIT: usize = 5;
pub const RISK_COVERAGE_CAP: u32 = 100;

pub const AI_KEYWORDS: [&str; 5] = [
    "predictive",
    "automation",
    "machine learning",
    "anomaly",
    "ai model",
];
pub const AI_ADVANCED_ABOVE: usize = 10;
pub const AI_INTERMEDIATE_ABOVE: usize = 4;

/// Case-folded document text. All scoring goes through this type so keyword
/// tables, which are lowercase, always see lowercase input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentText(String);

impl DocumentText {
    pub fn new(raw: &str) -> Self {
        Self(raw.to_lowercase())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_blank(&self) -> bool {
        self.0.trim().is_empty()
    }

    /// Non-overlapping substring occurrences, so "risks" counts as "risk".
    pub fn count(&self, keyword: &str) -> usize {
        self.0.matches(keyword).count()
    }

    /// Sum of per-keyword counts; keywords are counted independently.
    pub fn count_all(&self, keywords: &[&str]) -> usize {
        keywords.iter().map(|keyword| self.count(keyword)).sum()
    }
}

/// First sentences that mention a topic keyword, joined with ". ".
/// An empty string means the document had no matching insight.
pub fn executive_summary(text: &DocumentText) -> String {
    text.as_str()
        .split(['.', '\n'])
        .filter(|sentence| {
            SUMMARY_TOPIC_KEYWORDS
                .iter()
                .any(|keyword| sentence.contains(keyword))
        })
        // Splitting on '.' leaves the inter-sentence spaces attached.
        .map(str::trim)
        .take(SUMMARY_MAX_SENTENCES)
        .collect::<Vec<_>>()
        .join(SUMMARY_SEPARATOR)
}

pub fn sentiment(text: &DocumentText) -> Sentiment {
    let positive_hits = text.count_all(&POSITIVE_KEYWORDS);
    let negative_hits = text.count_all(&NEGATIVE_KEYWORDS);

    let label = match positive_hits.cmp(&negative_hits) {
        std::cmp::Ordering::Greater => SentimentLabel::Positive,
        std::cmp::Ordering::Less => SentimentLabel::RiskFocused,
        std::cmp::Ordering::Equal => SentimentLabel::Neutral,
    };

    Sentiment {
        label,
        positive_hits,
        negative_hits,
    }
}

pub fn mentions_kpi(text: &DocumentText) -> bool {
    text.as_str().contains("kpi")
}

pub fn mentions_percentage(text: &DocumentText) -> bool {
    text.as_str().contains('%')
}

/// Linear score of risk keyword hits, capped at 100.
pub fn risk_coverage(hits: usize) -> u32 {
    let score = hits.saturating_mul(RISK_POINTS_PER_HIT);
    u32::try_from(score)
        .unwrap_or(RISK_COVERAGE_CAP)
        .min(RISK_COVERAGE_CAP)
}

pub fn maturity(hits: usize) -> MaturityLabel {
    if hits > AI_ADVANCED_ABOVE {
        MaturityLabel::Advanced
    } else if hits > AI_INTERMEDIATE_ABOVE {
        MaturityLabel::Intermediate
    } else {
        MaturityLabel::Basic
    }
}

pub fn score_document(raw: &str) -> DocumentScoreCard {
    let text = DocumentText::new(raw);
    if text.is_blank() {
        debug!("scoring an empty document");
    }

    let risk_hits = text.count_all(&RISK_KEYWORDS);
    let ai_hits = text.count_all(&AI_KEYWORDS);

    DocumentScoreCard {
        executive_summary: executive_summary(&text),
        sentiment: sentiment(&text),
        mentions_kpi: mentions_kpi(&text),
        mentions_percentage: mentions_percentage(&text),
        risk_hits,
        risk_coverage: risk_coverage(risk_hits),
        ai_hits,
        maturity: maturity(ai_hits),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text(raw: &str) -> DocumentText {
        DocumentText::new(raw)
    }

    #[test]
    fn matching_is_case_folded_substring() {
        let doc = text("RISKS and Risk-based controls");
        assert_eq!(doc.count("risk"), 2);
        assert_eq!(doc.count("control"), 1);
    }

    #[test]
    fn summary_keeps_first_five_topic_sentences() {
        let doc = text(
            "Intro line. Revenue grew. Nothing here\nAI pilots launched. \
             Compliance reviewed. KPI board set. Control gaps closed. Automation later.",
        );
        assert_eq!(
            executive_summary(&doc),
            "revenue grew. ai pilots launched. compliance reviewed. kpi board set. control gaps closed"
        );
    }

    #[test]
    fn summary_sentences_lose_surrounding_whitespace() {
        let doc = text("  Revenue grew 5%.   \n\t Risk register updated   ");
        assert_eq!(executive_summary(&doc), "revenue grew 5%. risk register updated");
    }

    #[test]
    fn summary_without_topics_is_empty() {
        assert_eq!(executive_summary(&text("Hello world. Nothing to see")), "");
        assert_eq!(executive_summary(&text("")), "");
    }

    #[test]
    fn sentiment_ties_are_neutral() {
        let result = sentiment(&text("We improve things but one risk remains"));
        assert_eq!(result.label, SentimentLabel::Neutral);
        assert_eq!((result.positive_hits, result.negative_hits), (1, 1));
        assert_eq!(sentiment(&text("")).label, SentimentLabel::Neutral);
    }

    #[test]
    fn sentiment_leans_on_majority() {
        assert_eq!(
            sentiment(&text("Optimize and enhance to increase output")).label,
            SentimentLabel::Positive
        );
        assert_eq!(
            sentiment(&text("Delay, failure and a weak issue")).label,
            SentimentLabel::RiskFocused
        );
    }

    #[test]
    fn kpi_and_percentage_flags_are_independent() {
        let doc = text("KPIs tracked monthly");
        assert!(mentions_kpi(&doc));
        assert!(!mentions_percentage(&doc));

        let doc = text("Grew 12%");
        assert!(!mentions_kpi(&doc));
        assert!(mentions_percentage(&doc));
    }

    #[test]
    fn risk_coverage_is_linear_then_capped() {
        assert_eq!(risk_coverage(0), 0);
        assert_eq!(risk_coverage(7), 35);
        assert_eq!(risk_coverage(19), 95);
        assert_eq!(risk_coverage(20), 100);
        assert_eq!(risk_coverage(500), 100);
        assert_eq!(risk_coverage(usize::MAX), 100);
    }

    #[test]
    fn maturity_thresholds_are_strict() {
        assert_eq!(maturity(4), MaturityLabel::Basic);
        assert_eq!(maturity(5), MaturityLabel::Intermediate);
        assert_eq!(maturity(10), MaturityLabel::Intermediate);
        assert_eq!(maturity(11), MaturityLabel::Advanced);
    }

    #[test]
    fn score_card_from_blob() {
        let blob = "Predictive maintenance and automation reduce risk. \
                    Our AI model flags each anomaly. Machine Learning improves audit KPI by 20%.";
        let card = score_document(blob);

        assert_eq!(card.ai_hits, 5);
        assert_eq!(card.maturity, MaturityLabel::Intermediate);
        assert_eq!(card.risk_hits, 2);
        assert_eq!(card.risk_coverage, 10);
        assert!(card.mentions_kpi);
        assert!(card.mentions_percentage);
        assert_eq!(card.sentiment.label, SentimentLabel::Neutral);
        assert!(card.executive_summary.starts_with("predictive maintenance"));
    }

    #[test]
    fn twenty_risk_mentions_saturate_coverage() {
        let card = score_document(&"Top risk. ".repeat(20));
        assert_eq!(card.risk_hits, 20);
        assert_eq!(card.risk_coverage, 100);

        let card = score_document(&"Top risk. ".repeat(19));
        assert_eq!(card.risk_hits, 19);
        assert_eq!(card.risk_coverage, 95);

        let card = score_document(&"Fraud audit. ".repeat(30));
        assert_eq!(card.risk_hits, 60);
        assert_eq!(card.risk_coverage, 100);
    }

    #[test]
    fn four_ai_terms_stay_basic() {
        let blob = "Predictive pricing. Automation of invoicing. \
                    Machine learning pilots. One anomaly found.";
        let card = score_document(blob);
        assert_eq!(card.ai_hits, 4);
        assert_eq!(card.maturity, MaturityLabel::Basic);

        let card = score_document(&format!("{blob} An AI model went live."));
        assert_eq!(card.ai_hits, 5);
        assert_eq!(card.maturity, MaturityLabel::Intermediate);
    }

    #[test]
    fn scoring_is_deterministic() {
        let blob = "Audit controls improve compliance.";
        assert_eq!(score_document(blob), score_document(blob));
    }
}
