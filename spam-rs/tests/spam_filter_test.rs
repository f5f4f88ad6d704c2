//! Integration tests for algorithm dispatch

use spam_rs::classifiers::{Algorithm, Label, TrainingOptions};
use spam_rs::config::{ConfigLayer, ConfigResolver, ConfigWatcher};
use spam_rs::corpus::TrainingSet;
use spam_rs::filter::VerdictReason;
use spam_rs::{FilterConfig, SpamError, SpamFilter};
use std::fs;
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use tokio_util::sync::CancellationToken;

const SPAM_TEXT: &str = "Congratulations, you won a free lottery prize! Click here to claim now";
const HAM_TEXT: &str = "Reminder: please review the project notes before Friday's meeting";

fn trained_filter(config: FilterConfig) -> SpamFilter {
    let mut filter = SpamFilter::new(config);
    filter
        .train(
            &TrainingSet::sample(),
            &[Algorithm::NaiveBayes, Algorithm::Svm],
            &TrainingOptions::default(),
        )
        .unwrap();
    filter
}

#[test]
fn test_each_algorithm_name_selects_its_model() {
    for (name, expected) in [
        ("naive_bayes", Algorithm::NaiveBayes),
        ("NaiveBayes", Algorithm::NaiveBayes),
        ("svm", Algorithm::Svm),
        ("SVM", Algorithm::Svm),
    ] {
        let filter = trained_filter(FilterConfig {
            algorithm: name.to_string(),
            ..FilterConfig::default()
        });

        let verdict = filter.run(SPAM_TEXT).unwrap();
        assert_eq!(verdict.algorithm, expected, "algorithm name {}", name);
        assert!((0.0..=1.0).contains(&verdict.spam_probability));
    }
}

#[test]
fn test_naive_bayes_separates_sample_messages() {
    let filter = trained_filter(FilterConfig::default());
    assert_eq!(filter.run(SPAM_TEXT).unwrap().label, Label::Spam);
    assert_eq!(filter.run(HAM_TEXT).unwrap().label, Label::Ham);
}

#[test]
fn test_invalid_algorithm_is_an_error() {
    let filter = trained_filter(FilterConfig {
        algorithm: "InvalidAlgorithm".to_string(),
        ..FilterConfig::default()
    });

    let err = filter.run(SPAM_TEXT).unwrap_err();
    assert!(matches!(err, SpamError::UnsupportedAlgorithm(_)));
    assert_eq!(err.to_string(), "Algorithm 'InvalidAlgorithm' is not supported");
}

#[test]
fn test_sender_lists_override_model() {
    let mut config = FilterConfig::default();
    config.whitelist.insert("friend@example.com".to_string());
    config.blacklist.insert("lottery.example".to_string());
    let filter = trained_filter(config);

    let spammy_from_friend = format!("From: friend@example.com\nSubject: hi\n\n{}", SPAM_TEXT);
    let verdict = filter.run(&spammy_from_friend).unwrap();
    assert_eq!(verdict.label, Label::Ham);
    assert_eq!(verdict.reason, VerdictReason::Whitelisted("friend@example.com".to_string()));

    let clean_from_blacklisted = format!("From: News <news@mail.lottery.example>\n\n{}", HAM_TEXT);
    let verdict = filter.run(&clean_from_blacklisted).unwrap();
    assert_eq!(verdict.label, Label::Spam);
    assert_eq!(verdict.reason, VerdictReason::Blacklisted("lottery.example".to_string()));
}

#[tokio::test]
async fn test_batch_classification_keeps_order() {
    let filter = Arc::new(trained_filter(FilterConfig::default()));
    let contents = vec![
        SPAM_TEXT.to_string(),
        HAM_TEXT.to_string(),
        HAM_TEXT.to_string(),
        SPAM_TEXT.to_string(),
    ];

    let labels: Vec<Label> = filter
        .classify_batch(contents, 2)
        .await
        .into_iter()
        .map(|r| r.unwrap().label)
        .collect();

    assert_eq!(labels, vec![Label::Spam, Label::Ham, Label::Ham, Label::Spam]);
}

#[tokio::test]
async fn test_filter_follows_reloaded_config() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("config.json");
    fs::write(&path, r#"{"algorithm": "naive_bayes"}"#).unwrap();

    let cancel = CancellationToken::new();
    let resolver = ConfigResolver::new(Some(path.clone())).with_env(ConfigLayer::default());
    let watcher = ConfigWatcher::spawn(resolver, cancel.clone()).unwrap();

    let mut filter = SpamFilter::with_config_updates(watcher.subscribe());
    filter
        .train(&TrainingSet::sample(), &[Algorithm::NaiveBayes], &TrainingOptions::default())
        .unwrap();
    assert!(filter.run(SPAM_TEXT).is_ok());

    let mut updates = watcher.subscribe();
    fs::write(&path, r#"{"algorithm": "rnn"}"#).unwrap();
    tokio::time::timeout(Duration::from_secs(10), updates.changed())
        .await
        .expect("config reload")
        .unwrap();

    // rnn was never trained
    assert!(matches!(
        filter.run(SPAM_TEXT),
        Err(SpamError::UnsupportedAlgorithm(ref name)) if name == "rnn"
    ));

    cancel.cancel();
    watcher.join().await.unwrap();
}
