use tracing::{debug, info};

use crate::{
    bucket::Bucketizer,
    config::AnalysisConfig,
    detect::{SignalDetector, build_detector},
    error::{ChatclipError, Result},
    expand::BoundaryExpander,
    merge::merge_ranges,
    sentiment::{PolarityModel, SentimentScorer, VaderModel},
    types::{ChatEvent, Highlights},
};

/// Chat events in, merged highlight windows out.
///
/// Holds only read-only state, so one pipeline can serve any number of
/// independent `process` calls.
pub struct HighlightPipeline<M = VaderModel> {
    config: AnalysisConfig,
    scorer: SentimentScorer<M>,
}

impl HighlightPipeline<VaderModel> {
    pub fn new(config: AnalysisConfig) -> Result<Self> {
        Self::with_model(config, VaderModel::new())
    }
}

impl<M: PolarityModel> HighlightPipeline<M> {
    pub fn with_model(config: AnalysisConfig, model: M) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            scorer: SentimentScorer::new(model),
        })
    }

    pub fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    pub fn process(&self, events: &[ChatEvent]) -> Result<Highlights> {
        check_events(events)?;
        if events.is_empty() {
            debug!("no chat events, nothing to detect");
            return Ok(Highlights::default());
        }

        let detector = build_detector(&self.config);
        let bucketizer = Bucketizer::new(detector.bucket_width_seconds());
        let series = if detector.needs_sentiment() {
            let scores = self.scorer.score_events(events);
            bucketizer.bucketize_scored(events, &scores)
        } else {
            bucketizer.bucketize(events)
        };
        debug!(
            detector = detector.name(),
            buckets = series.len(),
            width = series.width_seconds,
            "bucketized chat"
        );

        let peaks = detector.detect(&series);
        if peaks.is_empty() {
            info!(detector = detector.name(), "no peaks detected");
            return Ok(Highlights::default());
        }

        let expander = BoundaryExpander::from_config(&self.config);
        let peak_seconds: Vec<f64> = peaks.iter().map(|p| p.offset_seconds).collect();
        let provisional = expander.expand_all(&peak_seconds, events);
        let ranges = merge_ranges(&provisional, self.config.merge_gap());

        info!(
            detector = detector.name(),
            boundary = expander.mode().name(),
            peaks = peaks.len(),
            ranges = ranges.len(),
            "highlights detected"
        );
        Ok(Highlights { ranges, peaks })
    }
}

/// Runs one pipeline over `events` with the default sentiment model.
pub fn process(events: &[ChatEvent], config: &AnalysisConfig) -> Result<Highlights> {
    HighlightPipeline::new(config.clone())?.process(events)
}

fn check_events(events: &[ChatEvent]) -> Result<()> {
    match events
        .iter()
        .position(|e| !(e.offset_seconds.is_finite() && e.offset_seconds >= 0.0))
    {
        Some(i) => Err(ChatclipError::PreconditionViolated {
            reason: format!(
                "chat event {i} has offset {} (must be finite and >= 0)",
                events[i].offset_seconds
            ),
        }),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{BoundaryMode, DetectorKind};

    struct Neutral;

    impl PolarityModel for Neutral {
        fn compound(&self, _text: &str) -> f64 {
            0.0
        }
    }

    fn all_configs() -> Vec<AnalysisConfig> {
        let mut configs = Vec::new();
        for detector in [DetectorKind::ZScore, DetectorKind::Mad] {
            for boundary in [BoundaryMode::Fixed, BoundaryMode::Dynamic] {
                configs.push(AnalysisConfig {
                    detector,
                    boundary: Some(boundary),
                    ..Default::default()
                });
            }
        }
        configs
    }

    #[test]
    fn empty_events_give_empty_highlights_for_every_strategy() {
        for config in all_configs() {
            let pipeline = HighlightPipeline::with_model(config, Neutral).unwrap();
            assert_eq!(pipeline.process(&[]).unwrap(), Highlights::default());
        }
    }

    #[test]
    fn quiet_constant_chat_has_no_highlights() {
        let events: Vec<ChatEvent> = (0..3600)
            .step_by(6)
            .map(|t| ChatEvent::new(t as f64, "viewer", "hello"))
            .collect();
        for config in all_configs() {
            let pipeline = HighlightPipeline::with_model(config, Neutral).unwrap();
            assert!(pipeline.process(&events).unwrap().is_empty());
        }
    }

    #[test]
    fn negative_offset_is_rejected() {
        let events = vec![
            ChatEvent::new(10.0, "a", "hi"),
            ChatEvent::new(-1.0, "b", "early"),
        ];
        let pipeline = HighlightPipeline::with_model(AnalysisConfig::default(), Neutral).unwrap();
        assert!(matches!(
            pipeline.process(&events),
            Err(ChatclipError::PreconditionViolated { .. })
        ));
    }

    #[test]
    fn invalid_config_is_rejected_up_front() {
        let config = AnalysisConfig {
            drop_off_confirm_minutes: 0,
            ..Default::default()
        };
        assert!(HighlightPipeline::with_model(config, Neutral).is_err());
    }
}
