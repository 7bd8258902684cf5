use async_trait::async_trait;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tokio::sync::Notify;

use rise_core::controller::{ControllerSettings, ProgressController, TurnOutcome};
use rise_core::generation::{GenerationClient, GenerationContext, ScriptedGenerationClient};
use rise_core::learner::Profession;
use rise_core::message::ConversationMessage;
use rise_core::response::{ReplySignal, RiseStep};
use rise_core::roster::LearnerRepository;
use rise_core::session::{Phase, Tab};
use rise_core::store::MemoryStore;

struct Harness {
    controller: ProgressController,
    roster: LearnerRepository,
    script: Arc<ScriptedGenerationClient>,
}

async fn harness(delay_ms: u64, profession: Profession) -> Harness {
    let roster = LearnerRepository::new(Arc::new(MemoryStore::new()));
    let script = Arc::new(ScriptedGenerationClient::default());
    let controller = ProgressController::new(
        roster.clone(),
        script.clone(),
        ControllerSettings {
            mastery_delay: Duration::from_millis(delay_ms),
            ..Default::default()
        },
    );
    controller
        .begin_sign_in("Kofi Mensah", "kofi@gcb.com.gh", Some(profession))
        .await
        .unwrap();
    controller.verify("1234").await.unwrap();
    Harness {
        controller,
        roster,
        script,
    }
}

#[tokio::test]
async fn test_banker_masters_first_module() {
    let h = harness(20, Profession::Banker).await;
    h.script
        .push_reply("Welcome to Role Anchoring.\nOPTION 1: Credit Risk Officer\nOPTION 2: Branch Teller")
        .await;
    h.script
        .push_reply("Good choice. Now what INPUT will you provide?\nOPTION 1: Loan file\nOPTION 2: Nothing")
        .await;
    h.script
        .push_reply("Which STEPS should the model follow?\nOPTION 1: Ratio analysis first")
        .await;
    h.script
        .push_reply("Finally, the EXPECTATION for the output format?\nOPTION 1: One-page memo")
        .await;
    h.script
        .push_reply("MASTERY CONFIRMED. Your code is PASS-BANKER-T1-M1.")
        .await;

    assert_eq!(h.controller.launch(1).await.unwrap(), TurnOutcome::Replied(None));
    let snap = h.controller.snapshot().await;
    assert_eq!(snap.phase, Phase::AwaitingRoleChoice);
    assert!(snap.messages[0].is_module_intro);
    assert_eq!(snap.messages[0].choices.as_ref().unwrap().len(), 2);

    let steps = [
        ("Credit Risk Officer", RiseStep::Input),
        ("Loan file", RiseStep::Steps),
        ("Ratio analysis first", RiseStep::Expectation),
    ];
    for (choice, expected) in steps {
        let outcome = h.controller.send_message(choice).await.unwrap();
        assert_eq!(outcome, TurnOutcome::Replied(Some(ReplySignal::AdvanceTo(expected))));
        assert_eq!(h.controller.snapshot().await.state.step, expected.index());
    }

    let outcome = h.controller.send_message("One-page memo").await.unwrap();
    assert_eq!(outcome, TurnOutcome::Replied(Some(ReplySignal::MasteryConfirmed)));
    assert_eq!(h.controller.snapshot().await.phase, Phase::MasteryPending);
    assert_eq!(
        h.controller.send_message("anything else?").await.unwrap(),
        TurnOutcome::Ignored
    );

    h.controller.wait_for_mastery().await;

    let snap = h.controller.snapshot().await;
    assert_eq!(snap.phase, Phase::Idle);
    assert!(snap.state.active_module.is_none());
    assert_eq!(snap.state.step, 0);
    assert!(snap.messages.is_empty());
    assert_eq!(snap.badge_count, 1);

    let learner = snap.learner.unwrap();
    assert_eq!(learner.completed_modules(), &[1]);
    let result = learner.result_for(1).unwrap();
    assert_eq!(result.score, 100);
    assert_eq!(result.feedback, "MASTERY CONFIRMED");
    assert_eq!(result.transcript.len(), 9);
    assert_eq!(result.mastery_code.as_deref(), Some("PASS-BANKER-T1-M1"));

    let stored = h.roster.active_learner().await.unwrap().unwrap();
    assert_eq!(stored.badge_count(), 1);
    assert_eq!(h.roster.list_learners().await.unwrap()[0].badge_count(), 1);

    let requests = h.script.requests().await;
    assert_eq!(requests.len(), 5);
    assert!(requests[0].is_launch);
    assert_eq!(requests[4].history_len, 7);
}

#[tokio::test]
async fn test_navigating_during_delay_records_badge_once() {
    let h = harness(60_000, Profession::Lawyer).await;
    h.script.push_reply("Intro\nOPTION 1: Senior Partner").await;
    h.script.push_reply("Well done. MASTERY CONFIRMED").await;

    h.controller.launch(1).await.unwrap();
    h.controller.send_message("Senior Partner").await.unwrap();
    assert_eq!(h.controller.snapshot().await.phase, Phase::MasteryPending);

    h.controller.navigate(Tab::Treasury).await.unwrap();
    h.controller.navigate(Tab::Dashboard).await.unwrap();
    h.controller.wait_for_mastery().await;

    let snap = h.controller.snapshot().await;
    assert_eq!(snap.phase, Phase::Idle);
    assert_eq!(snap.state.active_tab, Tab::Dashboard);
    assert_eq!(snap.badge_count, 1);
    assert_eq!(h.roster.list_learners().await.unwrap()[0].completed_modules(), &[1]);
}

/// Answers the launch at once, then holds every later reply until released.
#[derive(Default)]
struct GatedClient {
    calls: AtomicUsize,
    entered: Notify,
    release: Notify,
}

#[async_trait]
impl GenerationClient for GatedClient {
    async fn generate(
        &self,
        _history: &[ConversationMessage],
        _latest_input: &str,
        _context: &GenerationContext,
    ) -> anyhow::Result<String> {
        if self.calls.fetch_add(1, Ordering::SeqCst) == 0 {
            return Ok("Intro\nOPTION 1: Editor".to_string());
        }
        self.entered.notify_one();
        self.release.notified().await;
        Ok("Now the INPUT.".to_string())
    }
}

#[tokio::test]
async fn test_reply_after_abandoning_module_is_discarded() {
    let client = Arc::new(GatedClient::default());
    let controller = ProgressController::new(
        LearnerRepository::new(Arc::new(MemoryStore::new())),
        client.clone(),
        ControllerSettings::default(),
    );
    controller
        .begin_sign_in("Esi", "esi@gja.org.gh", Some(Profession::Journalist))
        .await
        .unwrap();
    controller.verify("1234").await.unwrap();
    controller.launch(1).await.unwrap();

    let sender = controller.clone();
    let send = tokio::spawn(async move { sender.send_message("Editor").await });
    client.entered.notified().await;
    assert!(controller.snapshot().await.state.loading);

    controller.navigate(Tab::Dashboard).await.unwrap();
    client.release.notify_one();
    assert_eq!(send.await.unwrap().unwrap(), TurnOutcome::Stale);

    let snap = controller.snapshot().await;
    assert_eq!(snap.phase, Phase::Idle);
    assert!(snap.messages.is_empty());
    assert!(!snap.state.loading);
}

#[tokio::test]
async fn test_review_shows_archived_transcript() {
    let h = harness(10, Profession::Accountant).await;
    h.script.push_reply("Intro\nOPTION 1: Auditor").await;
    h.script.push_reply("PASS-ACCOUNTANT-T1-M1").await;
    h.controller.launch(1).await.unwrap();
    assert_eq!(
        h.controller.send_message("Auditor").await.unwrap(),
        TurnOutcome::Replied(Some(ReplySignal::MasteryConfirmed))
    );
    h.controller.wait_for_mastery().await;

    assert!(!h.controller.review(2).await.unwrap());
    assert!(h.controller.review(1).await.unwrap());
    let snap = h.controller.snapshot().await;
    assert_eq!(snap.phase, Phase::Review);
    assert_eq!(snap.messages.len(), 3);
    assert_eq!(
        h.controller.send_message("again").await.unwrap(),
        TurnOutcome::Ignored
    );

    h.controller.navigate(Tab::MasteryArchive).await.unwrap();
    let snap = h.controller.snapshot().await;
    assert_eq!(snap.phase, Phase::Idle);
    assert!(snap.messages.is_empty());
}

#[tokio::test]
async fn test_mastery_code_for_another_module_does_not_complete() {
    let h = harness(10, Profession::Executive).await;
    h.script.push_reply("Intro").await;
    h.script.push_reply("Later you will earn PASS-EXECUTIVE-T4-M4.").await;
    h.controller.launch(1).await.unwrap();

    let outcome = h.controller.send_message("ok").await.unwrap();
    assert_eq!(outcome, TurnOutcome::Replied(None));
    assert_eq!(h.controller.snapshot().await.phase, Phase::AwaitingRoleChoice);
}

#[tokio::test]
async fn test_sign_in_again_restores_progress() {
    let h = harness(10, Profession::Banker).await;
    h.script.push_reply("Intro").await;
    h.script.push_reply("MASTERY CONFIRMED").await;
    h.controller.launch(1).await.unwrap();
    h.controller.send_message("go").await.unwrap();
    h.controller.sign_out().await.unwrap();

    let snap = h.controller.snapshot().await;
    assert!(snap.learner.is_none());
    assert!(h.roster.active_learner().await.unwrap().is_none());

    h.controller
        .begin_sign_in("Kofi A. Mensah", "KOFI@gcb.com.gh", Some(Profession::Executive))
        .await
        .unwrap();
    let learner = h.controller.verify(" 1234 ").await.unwrap();
    assert_eq!(learner.name, "Kofi A. Mensah");
    assert_eq!(learner.profession, Profession::Executive);
    assert_eq!(learner.completed_modules(), &[1]);
    assert_eq!(h.roster.list_learners().await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_admin_sign_up_and_roster_management() {
    let roster = LearnerRepository::new(Arc::new(MemoryStore::new()));
    let controller = ProgressController::new(
        roster,
        Arc::new(ScriptedGenerationClient::default()),
        ControllerSettings::default(),
    );
    controller
        .begin_sign_in("Registrar", "admin@rise.gh", Some(Profession::Other))
        .await
        .unwrap();
    let admin = controller.verify("1234").await.unwrap();
    assert!(admin.is_admin());

    let enrolled = controller
        .enroll_learner("Esi", "esi@gja.org.gh", Profession::Journalist)
        .await
        .unwrap();
    assert!(!enrolled.is_admin());
    assert_eq!(controller.list_learners().await.unwrap().len(), 2);
    assert!(controller.enroll_learner("Esi", "esi", Profession::Journalist).await.is_err());

    assert!(controller.delete_learner(enrolled.id).await.unwrap());
    assert!(!controller.delete_learner(enrolled.id).await.unwrap());
}
