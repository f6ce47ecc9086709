//! Inactivity-reminder behavior at the flow level, driven by a paused
//! clock.

mod common;

use std::time::Duration;

use common::{drain_tasks, harness, Harness};
use serde_json::Map;
use uuid::Uuid;

use intervue_core::{EngineConfig, InterviewFlow};
use intervue_store::{InterviewPatch, InterviewStatus, RecordStore};

const RESPONDENT: i64 = 200;
const RESEARCHER: i64 = 100;

async fn published_interview(h: &Harness) -> Uuid {
    let interview = h.store.create_interview(Map::new()).await.unwrap();
    let patch = InterviewPatch {
        status: Some(InterviewStatus::InProgress),
        instruction: Some("Hi! Quick questions about your shop.".to_string()),
        researcher_id: Some(RESEARCHER),
        ..Default::default()
    };
    h.store.update_interview(interview.id, patch).await.unwrap();
    interview.id
}

fn reminder_count(h: &Harness) -> usize {
    h.transport
        .sent_to(RESPONDENT)
        .iter()
        .filter(|m| m.contains("Still there?"))
        .count()
}

fn escalation_count(h: &Harness) -> usize {
    h.transport
        .sent_to(RESPONDENT)
        .iter()
        .filter(|m| m.contains("leave the conversation open"))
        .count()
}

#[tokio::test(start_paused = true)]
async fn first_reminder_fires_after_the_primary_delay() {
    let h = harness();
    let flow = InterviewFlow::new(h.collaborators.clone(), EngineConfig::default());
    let id = published_interview(&h).await;

    flow.start(RESPONDENT, id).await.unwrap();

    tokio::time::advance(Duration::from_secs(119)).await;
    drain_tasks().await;
    assert_eq!(reminder_count(&h), 0);

    tokio::time::advance(Duration::from_secs(1)).await;
    drain_tasks().await;
    assert_eq!(reminder_count(&h), 1);
    assert_eq!(escalation_count(&h), 0);
}

#[tokio::test(start_paused = true)]
async fn escalation_follows_an_ignored_first_reminder() {
    let h = harness();
    let flow = InterviewFlow::new(h.collaborators.clone(), EngineConfig::default());
    let id = published_interview(&h).await;

    flow.start(RESPONDENT, id).await.unwrap();

    tokio::time::advance(Duration::from_secs(120)).await;
    drain_tasks().await;
    assert_eq!(reminder_count(&h), 1);

    tokio::time::advance(Duration::from_secs(3599)).await;
    drain_tasks().await;
    assert_eq!(escalation_count(&h), 0);

    tokio::time::advance(Duration::from_secs(1)).await;
    drain_tasks().await;
    assert_eq!(escalation_count(&h), 1);
}

#[tokio::test(start_paused = true)]
async fn answering_rearms_the_primary_timer() {
    let h = harness();
    let flow = InterviewFlow::new(h.collaborators.clone(), EngineConfig::default());
    let id = published_interview(&h).await;

    flow.start(RESPONDENT, id).await.unwrap();

    tokio::time::advance(Duration::from_secs(100)).await;
    drain_tasks().await;
    flow.submit_answer(RESPONDENT, "we sell houseplants")
        .await
        .unwrap();

    // The original deadline passes quietly.
    tokio::time::advance(Duration::from_secs(100)).await;
    drain_tasks().await;
    assert_eq!(reminder_count(&h), 0);

    tokio::time::advance(Duration::from_secs(20)).await;
    drain_tasks().await;
    assert_eq!(reminder_count(&h), 1);
}

#[tokio::test(start_paused = true)]
async fn answering_after_a_reminder_resets_the_whole_ladder() {
    let h = harness();
    let flow = InterviewFlow::new(h.collaborators.clone(), EngineConfig::default());
    let id = published_interview(&h).await;

    flow.start(RESPONDENT, id).await.unwrap();

    tokio::time::advance(Duration::from_secs(120)).await;
    drain_tasks().await;
    assert_eq!(reminder_count(&h), 1);

    flow.submit_answer(RESPONDENT, "sorry, got distracted; we sell houseplants")
        .await
        .unwrap();

    // The pending escalation was cancelled and the primary stage can
    // deliver again after another quiet stretch.
    tokio::time::advance(Duration::from_secs(3600)).await;
    drain_tasks().await;
    assert_eq!(escalation_count(&h), 0);
    assert_eq!(reminder_count(&h), 2);
}

#[tokio::test(start_paused = true)]
async fn each_stage_fires_at_most_once_per_quiet_stretch() {
    let h = harness();
    let flow = InterviewFlow::new(h.collaborators.clone(), EngineConfig::default());
    let id = published_interview(&h).await;

    flow.start(RESPONDENT, id).await.unwrap();

    tokio::time::advance(Duration::from_secs(120)).await;
    drain_tasks().await;
    tokio::time::advance(Duration::from_secs(3600)).await;
    drain_tasks().await;

    // A long further silence produces nothing new.
    tokio::time::advance(Duration::from_secs(7200)).await;
    drain_tasks().await;
    assert_eq!(reminder_count(&h), 1);
    assert_eq!(escalation_count(&h), 1);
}

#[tokio::test(start_paused = true)]
async fn finishing_the_interview_silences_pending_reminders() {
    let h = harness();
    let flow = InterviewFlow::new(
        h.collaborators.clone(),
        EngineConfig::default().with_min_answers(1),
    );
    let id = published_interview(&h).await;

    flow.start(RESPONDENT, id).await.unwrap();
    h.judge.push_question(intervue_judge::NextQuestion::Finish);
    flow.submit_answer(RESPONDENT, "we sell houseplants")
        .await
        .unwrap();
    assert!(!flow.has_session(RESPONDENT));

    tokio::time::advance(Duration::from_secs(7200)).await;
    drain_tasks().await;
    assert_eq!(reminder_count(&h), 0);
    assert_eq!(escalation_count(&h), 0);
}

#[tokio::test(start_paused = true)]
async fn cancelling_silences_pending_reminders() {
    let h = harness();
    let flow = InterviewFlow::new(h.collaborators.clone(), EngineConfig::default());
    let id = published_interview(&h).await;

    flow.start(RESPONDENT, id).await.unwrap();
    flow.cancel(RESPONDENT).await.unwrap();

    tokio::time::advance(Duration::from_secs(7200)).await;
    drain_tasks().await;
    assert_eq!(reminder_count(&h), 0);
}
