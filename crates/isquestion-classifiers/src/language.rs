//! Language identification for the guard

use whatlang::{Lang, Script};

/// ISO 639-3 code for English
pub const ENGLISH: &str = "eng";

/// Dominant language of a piece of text
#[derive(Debug, Clone, PartialEq)]
pub struct Detection {
    /// ISO 639-3 code, e.g. `"eng"`
    pub code: String,
    /// Detector confidence in `[0, 1]`
    pub confidence: f64,
    /// Whether the detector stands behind this answer; short texts often
    /// get a low-confidence guess
    pub reliable: bool,
}

impl Detection {
    pub fn is_english(&self) -> bool {
        self.code == ENGLISH
    }
}

/// Language detector used by the guard.
///
/// Implementations must be deterministic: the same text always yields the
/// same answer.
pub trait LanguageDetector: Send + Sync {
    /// Dominant language of `text`, if one can be determined
    fn detect(&self, text: &str) -> Option<Detection>;

    /// True when the dominant script of `text` is Latin
    fn is_latin_script(&self, text: &str) -> bool;

    /// Get the detector name
    fn name(&self) -> &str;
}

/// Trigram detector backed by `whatlang`
#[derive(Debug, Clone, Default)]
pub struct WhatlangDetector;

impl WhatlangDetector {
    pub fn new() -> Self {
        Self
    }
}

impl LanguageDetector for WhatlangDetector {
    fn detect(&self, text: &str) -> Option<Detection> {
        let info = whatlang::detect(text)?;
        Some(Detection {
            code: info.lang().code().to_string(),
            confidence: info.confidence(),
            reliable: info.is_reliable(),
        })
    }

    fn is_latin_script(&self, text: &str) -> bool {
        whatlang::detect_script(text) == Some(Script::Latin)
    }

    fn name(&self) -> &str {
        "whatlang"
    }
}

/// Detector that always gives the same answer.
///
/// Useful in tests and in deployments that already know their traffic is
/// English.
#[derive(Debug, Clone)]
pub struct StaticDetector {
    detection: Option<Detection>,
    latin: bool,
}

impl StaticDetector {
    /// Reports every input as `code` with full confidence, in Latin script
    pub fn new(code: impl Into<String>) -> Self {
        Self {
            detection: Some(Detection {
                code: code.into(),
                confidence: 1.0,
                reliable: true,
            }),
            latin: true,
        }
    }

    pub fn english() -> Self {
        Self::new(Lang::Eng.code())
    }

    /// Reports no detection and a non-Latin script for every input
    pub fn undetermined() -> Self {
        Self {
            detection: None,
            latin: false,
        }
    }

    pub fn with_latin_script(mut self, latin: bool) -> Self {
        self.latin = latin;
        self
    }

    /// Mark the detection as a low-confidence guess
    pub fn unreliable(mut self) -> Self {
        if let Some(detection) = &mut self.detection {
            detection.confidence = 0.1;
            detection.reliable = false;
        }
        self
    }
}

impl LanguageDetector for StaticDetector {
    fn detect(&self, _text: &str) -> Option<Detection> {
        self.detection.clone()
    }

    fn is_latin_script(&self, _text: &str) -> bool {
        self.latin
    }

    fn name(&self) -> &str {
        "static"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_whatlang_detects_english() {
        let detector = WhatlangDetector::new();
        let detection = detector
            .detect("Where can I find a good place to eat around here tonight with my friends?")
            .unwrap();
        assert!(detection.is_english());
        assert!(detection.confidence > 0.0);
    }

    #[test]
    fn test_short_questions_are_never_reliably_foreign() {
        let detector = WhatlangDetector::new();
        for question in [
            "Can you help me?",
            "How old are you?",
            "How do I kill the dragon?",
            "Is he at home?",
        ] {
            match detector.detect(question) {
                Some(d) if !d.is_english() => assert!(!d.reliable, "{question:?} -> {}", d.code),
                _ => {}
            }
        }
    }

    #[test]
    fn test_whatlang_detects_other_languages() {
        let detector = WhatlangDetector::new();
        let detection = detector
            .detect("Ich habe heute keine Zeit, weil ich den ganzen Tag arbeiten muss.")
            .unwrap();
        assert!(!detection.is_english());
        assert_eq!(detection.code, "deu");
    }

    #[test]
    fn test_script_detection() {
        let detector = WhatlangDetector::new();
        assert!(detector.is_latin_script("hello there"));
        assert!(!detector.is_latin_script("привет как дела"));
        assert!(!detector.is_latin_script("12345 !!"));
    }

    #[test]
    fn test_static_detector() {
        let detector = StaticDetector::english();
        assert!(detector.detect("anything").unwrap().is_english());
        assert!(detector.detect("anything").unwrap().reliable);
        assert!(detector.is_latin_script("日本語"));

        let detector = StaticDetector::new("afr").unreliable();
        assert!(!detector.detect("anything").unwrap().reliable);

        let detector = StaticDetector::undetermined();
        assert!(detector.detect("anything").is_none());
        assert!(!detector.is_latin_script("hello"));
    }
}
