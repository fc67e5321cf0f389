//! End-to-end runs with the real FastEmbed models

mod common;

use common::{Fixture, FORUM, GA1_COURSE};
use virtual_ta::qa::QaEngine;

#[tokio::test]
#[ignore] // Requires model download
async fn test_default_models_answer_ga1_deadline() {
    let mut fixture = Fixture::new(Some(GA1_COURSE), Some(FORUM));
    fixture.config.extractor.kind = "cross-encoder".to_string();
    fixture.config.extractor.min_confidence = 0.1;

    let engine = QaEngine::from_config(&fixture.config).expect("Failed to load models");

    let results = engine.search("GA1 deadline", 5).await.unwrap();
    assert_eq!(results[0].document.content, "The deadline for GA1 is Jan 15.");

    let response = engine.answer("When is the GA1 deadline?").await.unwrap();
    println!("Answer: {}", response.answer);
    assert!(response.answer.contains("Jan 15"));
    assert!(response.links.len() <= 2);
}

#[tokio::test]
#[ignore] // Requires model download
async fn test_forum_question_cites_forum() {
    let fixture = Fixture::new(Some(GA1_COURSE), Some(FORUM));
    let engine = QaEngine::from_config(&fixture.config).expect("Failed to load models");

    let response = engine
        .answer("Is Docker acceptable instead of Podman for the project?")
        .await
        .unwrap();
    assert!(response
        .links
        .iter()
        .any(|l| l.url.contains("docker-or-podman")));
}
