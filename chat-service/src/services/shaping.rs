//! Optional post-processing of model replies.

use chrono::{DateTime, Utc};
use serde::Serialize;

const TECHNICAL_TRIGGERS: [&str; 4] = ["how to", "error", "problem", "doesn't work"];
const TECHNICAL_TERMS: [&str; 9] = [
    "error",
    "bug",
    "code",
    "system",
    "update",
    "installation",
    "software",
    "hardware",
    "configuration",
];
const FEEDBACK_TRIGGERS: [&str; 6] = ["thank", "thanks", "good", "bad", "review", "rate"];
const POSITIVE_WORDS: [&str; 6] = ["good", "great", "excellent", "awesome", "thanks", "helpful"];
const NEGATIVE_WORDS: [&str; 5] = ["bad", "poor", "terrible", "unhelpful", "disappointed"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Sentiment {
    Positive,
    Negative,
    Neutral,
}

/// What kind of exchange a reply belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ReplyKind {
    Standard,
    Technical { keywords: Vec<&'static str> },
    Feedback { sentiment: Sentiment },
}

impl ReplyKind {
    pub fn label(&self) -> &'static str {
        match self {
            ReplyKind::Standard => "standard",
            ReplyKind::Technical { .. } => "technical",
            ReplyKind::Feedback { .. } => "feedback",
        }
    }
}

/// Substring heuristics over the lowercased query; technical wins over
/// feedback.
pub fn classify(query: &str, reply: &str) -> ReplyKind {
    let query = query.to_lowercase();

    if TECHNICAL_TRIGGERS.iter().any(|t| query.contains(t)) {
        let reply = reply.to_lowercase();
        let keywords = TECHNICAL_TERMS
            .iter()
            .copied()
            .filter(|term| reply.contains(term))
            .collect();
        return ReplyKind::Technical { keywords };
    }

    if FEEDBACK_TRIGGERS.iter().any(|t| query.contains(t)) {
        return ReplyKind::Feedback {
            sentiment: sentiment(&query),
        };
    }

    ReplyKind::Standard
}

fn sentiment(lowercase_query: &str) -> Sentiment {
    let count = |words: &[&str]| {
        words
            .iter()
            .filter(|word| lowercase_query.contains(*word))
            .count()
    };
    let positive = count(&POSITIVE_WORDS);
    let negative = count(&NEGATIVE_WORDS);

    match positive.cmp(&negative) {
        std::cmp::Ordering::Greater => Sentiment::Positive,
        std::cmp::Ordering::Less => Sentiment::Negative,
        std::cmp::Ordering::Equal => Sentiment::Neutral,
    }
}

/// A reply moving through the pipeline. Transforms return a new value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    pub text: String,
    pub generated_at: DateTime<Utc>,
}

impl Reply {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            generated_at: Utc::now(),
        }
    }

    fn with_text(self, text: String) -> Self {
        Self { text, ..self }
    }
}

pub type Transform = fn(Reply) -> Reply;

/// Drop markdown bold markers and surrounding whitespace.
pub fn strip_emphasis(reply: Reply) -> Reply {
    let text = reply.text.replace("**", "").trim().to_string();
    reply.with_text(text)
}

pub fn append_timestamp(reply: Reply) -> Reply {
    let text = format!(
        "{}\n[Response generated at: {}]",
        reply.text,
        reply.generated_at.format("%Y-%m-%d %H:%M:%S")
    );
    reply.with_text(text)
}

/// Ordered chain of transforms. An empty pipeline returns the reply as is.
#[derive(Debug, Clone, Default)]
pub struct ShapingPipeline {
    transforms: Vec<Transform>,
}

impl ShapingPipeline {
    pub fn new() -> Self {
        Self::default()
    }

    /// The chain used on live replies when shaping is switched on.
    pub fn live() -> Self {
        Self::new().then(strip_emphasis)
    }

    pub fn then(mut self, transform: Transform) -> Self {
        self.transforms.push(transform);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.transforms.is_empty()
    }

    pub fn apply(&self, reply: Reply) -> Reply {
        self.transforms
            .iter()
            .fold(reply, |reply, transform| transform(reply))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn fixed(text: &str) -> Reply {
        Reply {
            text: text.to_string(),
            generated_at: Utc.with_ymd_and_hms(2024, 9, 1, 10, 30, 0).unwrap(),
        }
    }

    #[test]
    fn plain_questions_are_standard() {
        assert_eq!(
            classify("What programs are offered at CIC?", "Business, Engineering..."),
            ReplyKind::Standard
        );
    }

    #[test]
    fn technical_keywords_come_from_the_reply() {
        let kind = classify(
            "The portal doesn't work for me",
            "Please clear the cache; this is a known System Update issue.",
        );
        assert_eq!(
            kind,
            ReplyKind::Technical {
                keywords: vec!["system", "update"]
            }
        );
    }

    #[test]
    fn technical_takes_precedence_over_feedback() {
        let kind = classify("Thanks, but how to reset my password?", "Use the portal.");
        assert_eq!(kind.label(), "technical");
    }

    #[test]
    fn feedback_sentiment_counts_words() {
        // "great" alone is not a feedback trigger.
        assert_eq!(
            classify("Great answer, very helpful", "Glad to help"),
            ReplyKind::Standard
        );
        assert_eq!(
            classify("Thanks, that was helpful", ""),
            ReplyKind::Feedback {
                sentiment: Sentiment::Positive
            }
        );
        assert_eq!(
            classify("That was a bad and unhelpful reply", ""),
            ReplyKind::Feedback {
                sentiment: Sentiment::Negative
            }
        );
        assert_eq!(
            classify("Please rate this", ""),
            ReplyKind::Feedback {
                sentiment: Sentiment::Neutral
            }
        );
    }

    #[test]
    fn strip_emphasis_removes_bold_and_trims() {
        let shaped = strip_emphasis(fixed("  **Fees** are listed online.\n"));
        assert_eq!(shaped.text, "Fees are listed online.");
    }

    #[test]
    fn pipeline_applies_transforms_in_order() {
        let pipeline = ShapingPipeline::new()
            .then(strip_emphasis)
            .then(append_timestamp);

        let shaped = pipeline.apply(fixed("**Hi** "));
        assert_eq!(
            shaped.text,
            "Hi\n[Response generated at: 2024-09-01 10:30:00]"
        );
    }

    #[test]
    fn empty_pipeline_is_identity() {
        let reply = fixed("**unchanged**");
        assert_eq!(ShapingPipeline::new().apply(reply.clone()), reply);
    }
}
