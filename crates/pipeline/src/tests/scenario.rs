//! Multi-cycle scenarios against an in-memory sheet.

use super::support::{provider_error, Harness, ScriptedGenerator};
use crate::processor::{CycleOutcome, CycleReport};
use postgen_core::ProviderErrorKind;
use postgen_sheets::{parse_rows, TopicSource, TopicStatus};

#[tokio::test]
async fn test_end_to_end_single_pending_row() {
    let harness = Harness::new(
        vec![
            vec!["AI ethics", "", ""],
            vec!["Cloud cost", "Generated", "existing post"],
        ],
        ScriptedGenerator::new(|_, _| Ok("Ethics matter.".to_string())),
    );

    let pending = harness.source.fetch_pending().await.unwrap();
    assert_eq!(pending.len(), 1);
    assert_eq!(pending[0].text, "AI ethics");

    let outcome = harness.processor.run_cycle().await;
    assert_eq!(
        outcome,
        CycleOutcome::Processed(CycleReport {
            committed: 1,
            generation_failed: 0,
            commit_failed: 0,
        })
    );
    assert_eq!(harness.source.sheet.commit_count(), 1);
    assert!(harness.source.fetch_pending().await.unwrap().is_empty());

    let grid = harness.grid().await;
    assert_eq!(grid[0], vec!["AI ethics", "Generated", "Ethics matter."]);
    assert_eq!(grid[1], vec!["Cloud cost", "Generated", "existing post"]);

    assert_eq!(harness.processor.run_cycle().await, CycleOutcome::Idle);
    assert_eq!(harness.generator.requests().len(), 1);
}

#[tokio::test]
async fn test_failed_topic_is_retried_next_cycle() {
    let harness = Harness::new(
        vec![vec!["AI ethics"], vec!["Cloud cost"]],
        ScriptedGenerator::new(|request, call| {
            if call == 0 && request.prompt.contains("AI ethics") {
                Err(provider_error(ProviderErrorKind::Transport))
            } else {
                Ok(format!("Post for {}", request.prompt))
            }
        }),
    );

    let first = harness.processor.step().await;
    assert!(matches!(
        first,
        CycleOutcome::Processed(r) if r.committed == 1 && r.generation_failed == 1
    ));

    let second = harness.processor.step().await;
    assert!(matches!(
        second,
        CycleOutcome::Processed(r) if r.committed == 1 && r.attempted() == 1
    ));

    let third = harness.processor.step().await;
    assert_eq!(third, CycleOutcome::Idle);

    assert_eq!(
        harness.generator.prompts(),
        vec!["Topic: AI ethics", "Topic: Cloud cost", "Topic: AI ethics"]
    );
}

#[tokio::test]
async fn test_generated_rows_always_have_content() {
    let harness = Harness::new(
        vec![
            vec!["one"],
            vec!["two"],
            vec!["three"],
            vec!["four"],
            vec!["five"],
        ],
        ScriptedGenerator::new(|_, call| match call % 3 {
            0 => Ok("a post".to_string()),
            1 => Ok("   ".to_string()),
            _ => Err(provider_error(ProviderErrorKind::Api)),
        }),
    );
    harness.source.fail_commit(5);

    for _ in 0..4 {
        harness.processor.step().await;
    }

    let grid = harness.grid().await;
    let topics = parse_rows(&grid, 2);
    assert!(topics.iter().any(|t| t.status == TopicStatus::Generated));
    for topic in topics {
        if topic.status == TopicStatus::Generated {
            let content = topic.generated_content.unwrap_or_default();
            assert!(!content.trim().is_empty(), "row {} has no content", topic.row);
        }
    }
}

#[tokio::test]
async fn test_source_recovers_after_fetch_failure() {
    let harness = Harness::new(vec![vec!["Rust"]], ScriptedGenerator::echo());

    harness.source.fail_fetch(true);
    assert!(matches!(harness.processor.step().await, CycleOutcome::Failed(_)));

    harness.source.fail_fetch(false);
    assert!(matches!(
        harness.processor.step().await,
        CycleOutcome::Processed(r) if r.committed == 1
    ));
    assert_eq!(
        harness.grid().await[0],
        vec!["Rust", "Generated", "Post: Topic: Rust"]
    );
}
