use std::collections::HashMap;

use vader_sentiment::SentimentIntensityAnalyzer;

use crate::types::ChatEvent;

/// Lexical polarity model producing a compound score in `[-1, 1]`.
pub trait PolarityModel {
    fn compound(&self, text: &str) -> f64;
}

/// VADER lexicon and rule set, tuned for social media text.
pub struct VaderModel {
    analyzer: SentimentIntensityAnalyzer<'static>,
}

impl VaderModel {
    pub fn new() -> Self {
        Self {
            analyzer: SentimentIntensityAnalyzer::new(),
        }
    }
}

impl Default for VaderModel {
    fn default() -> Self {
        Self::new()
    }
}

impl PolarityModel for VaderModel {
    fn compound(&self, text: &str) -> f64 {
        self.analyzer
            .polarity_scores(text)
            .get("compound")
            .copied()
            .unwrap_or(0.0)
    }
}

/// Scores chat messages, evaluating the model once per distinct text.
pub struct SentimentScorer<M> {
    model: M,
}

impl<M: PolarityModel> SentimentScorer<M> {
    pub fn new(model: M) -> Self {
        Self { model }
    }

    /// One score per event, in input order. Texts are matched exactly.
    pub fn score_events(&self, events: &[ChatEvent]) -> Vec<f64> {
        let mut memo: HashMap<&str, f64> = HashMap::new();
        events
            .iter()
            .map(|event| {
                *memo
                    .entry(event.message.as_str())
                    .or_insert_with(|| self.score_text(&event.message))
            })
            .collect()
    }

    pub fn score_text(&self, text: &str) -> f64 {
        let score = self.model.compound(text);
        if score.is_finite() {
            score.clamp(-1.0, 1.0)
        } else {
            0.0
        }
    }
}

impl Default for SentimentScorer<VaderModel> {
    fn default() -> Self {
        Self::new(VaderModel::new())
    }
}
