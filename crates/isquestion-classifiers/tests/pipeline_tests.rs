//! End-to-end behavior of the question pipeline
//!
//! Uses fixed-score classifiers and a fixed language detector so only the
//! guard and the override rule decide the outcome.

mod mock_classifiers;

use std::sync::Arc;

use isquestion_classifiers::{Classifier, StaticDetector, WhatlangDetector};
use isquestion_core::{Label, OverrideRule, RejectReason, Verdict};
use mock_classifiers::{
    fitted_features, negative_pipeline, pipeline_with, FailingClassifier, MockClassifier,
    COMPONENTS,
};

fn answer(verdict: &Verdict) -> bool {
    verdict.is_question().unwrap()
}

#[test]
fn test_how_are_you_is_question() {
    let verdict = negative_pipeline().evaluate("How are you?");
    assert!(answer(&verdict));

    match verdict {
        Verdict::Classified(c) => {
            assert_eq!(c.model_label, Label::NotQuestion);
            assert_eq!(c.overridden_by, Some(OverrideRule::QuestionWord("how".to_string())));
        }
        other => panic!("expected classification, got {:?}", other),
    }
}

#[test]
fn test_degenerate_inputs_are_false() {
    let pipeline = negative_pipeline();
    for sentence in ["aaaaaaaa", "Th", "", "?????"] {
        let verdict = pipeline.evaluate(sentence);
        assert!(matches!(verdict, Verdict::Rejected(_)), "{sentence:?}");
        assert!(!answer(&verdict));
    }
}

#[test]
fn test_profanity_is_false_even_for_questions() {
    let pipeline = pipeline_with(
        Arc::new(MockClassifier::new("positive").with_score(2.0)),
        Arc::new(StaticDetector::english()),
    );
    let verdict = pipeline.evaluate("fuck");
    assert!(!answer(&verdict));

    let verdict = pipeline.evaluate("why is this crap");
    assert_eq!(
        verdict,
        Verdict::Rejected(RejectReason::Profanity {
            token: "crap".to_string()
        })
    );
}

#[test]
fn test_whitelisted_terms_reach_the_model() {
    let verdict = negative_pipeline().evaluate("Is this a weapon attack?");
    assert!(matches!(verdict, Verdict::Classified(_)));
    assert!(answer(&verdict));
}

#[test]
fn test_override_by_question_starter() {
    let verdict = negative_pipeline().evaluate("does this work");
    match verdict {
        Verdict::Classified(c) => {
            assert!(c.is_question);
            assert_eq!(
                c.overridden_by,
                Some(OverrideRule::QuestionStarter("does".to_string()))
            );
        }
        other => panic!("expected classification, got {:?}", other),
    }
}

#[test]
fn test_override_by_question_mark() {
    let verdict = negative_pipeline().evaluate("you did that?");
    match verdict {
        Verdict::Classified(c) => {
            assert!(c.is_question);
            assert_eq!(c.overridden_by, Some(OverrideRule::QuestionWord("?".to_string())));
        }
        other => panic!("expected classification, got {:?}", other),
    }
}

#[test]
fn test_plain_statement_stays_negative() {
    let verdict = negative_pipeline().evaluate("The weather is nice today");
    assert_eq!(verdict.outcome(), "not_question");
}

#[test]
fn test_positive_prediction_is_never_overridden() {
    let pipeline = pipeline_with(
        Arc::new(MockClassifier::new("positive").with_score(0.7)),
        Arc::new(StaticDetector::english()),
    );
    match pipeline.evaluate("what time is it") {
        Verdict::Classified(c) => {
            assert!(c.is_question);
            assert_eq!(c.model_label, Label::Question);
            assert_eq!(c.overridden_by, None);
            assert_eq!(c.score, 0.7);
        }
        other => panic!("expected classification, got {:?}", other),
    }
}

#[test]
fn test_non_english_is_false() {
    let pipeline = pipeline_with(
        Arc::new(MockClassifier::new("positive").with_score(1.0)),
        Arc::new(StaticDetector::new("fra")),
    );
    let verdict = pipeline.evaluate("Comment allez vous ce matin?");
    assert_eq!(
        verdict,
        Verdict::Rejected(RejectReason::NotEnglish {
            detected: Some("fra".to_string())
        })
    );
}

#[test]
fn test_model_failure_is_distinct_from_false() {
    let pipeline = pipeline_with(
        Arc::new(FailingClassifier::new()),
        Arc::new(StaticDetector::english()),
    );
    let verdict = pipeline.evaluate("Where is the station?");
    assert!(verdict.is_failed());
    assert_eq!(verdict.is_question(), None);

    // Guard rejections never reach the failing model
    assert!(!pipeline.evaluate("Th").is_failed());
}

#[test]
fn test_evaluation_is_idempotent() {
    let pipeline = negative_pipeline();
    for sentence in ["How are you?", "The train was late", "aaaaaa", "does it rain"] {
        assert_eq!(pipeline.evaluate(sentence), pipeline.evaluate(sentence));
    }
}

#[test]
fn test_with_whatlang_detector() {
    let pipeline = pipeline_with(
        Arc::new(MockClassifier::new("negative")),
        Arc::new(WhatlangDetector::new()),
    );
    let verdict = pipeline.evaluate("Where can I find a good place to eat around here tonight?");
    assert!(answer(&verdict));

    let verdict = pipeline.evaluate(
        "Ich habe heute leider keine Zeit, weil ich den ganzen Tag im Büro arbeiten muss und abends noch einkaufen gehe.",
    );
    assert_eq!(verdict.outcome(), "rejected");
}

#[test]
fn test_short_english_questions_pass_whatlang() {
    let pipeline = pipeline_with(
        Arc::new(MockClassifier::new("negative")),
        Arc::new(WhatlangDetector::new()),
    );
    for question in ["Can you help me?", "How old are you?", "How do I kill the dragon?"] {
        let verdict = pipeline.evaluate(question);
        assert!(matches!(verdict, Verdict::Classified(_)), "{question:?}: {verdict:?}");
        assert!(answer(&verdict));
    }
}

#[test]
fn test_profanity_with_question_mark_is_false() {
    let verdict = negative_pipeline().evaluate("who the fuck?");
    assert_eq!(verdict.outcome(), "rejected");
    assert!(!answer(&verdict));
}

#[test]
fn test_mock_classifier_basic() {
    let classifier = MockClassifier::new("test").with_score(0.8);
    let score = classifier.decision_function(&[0.0; COMPONENTS]).unwrap();
    assert_eq!(score, 0.8);
    assert_eq!(classifier.call_count(), 1);
    assert!(classifier.predict(&[0.0; COMPONENTS]).unwrap().is_question());
}

#[test]
fn test_failing_classifier() {
    let classifier = FailingClassifier::new().with_error("nope");
    let err = classifier.decision_function(&[]).unwrap_err();
    assert!(err.to_string().contains("nope"));
}

#[test]
fn test_fixture_features_are_consistent() {
    let (vectorizer, reducer) = fitted_features();
    assert_eq!(reducer.n_features(), vectorizer.vocabulary_size());
    assert_eq!(reducer.n_components(), COMPONENTS);
}
