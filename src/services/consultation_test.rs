use super::*;
use crate::llm::types::Role;
use crate::state::test_helpers::MockLlm;

fn detailed_form(age: &str) -> IntakeForm {
    IntakeForm {
        age: age.into(),
        gender: "Male".into(),
        medical_history: "migraine".into(),
        medications: String::new(),
        allergies: "peanuts".into(),
        symptoms: "throbbing headache behind the eyes".into(),
        ..IntakeForm::default()
    }
}

fn concerns_form(concerns: &str) -> IntakeForm {
    IntakeForm { age: "61".into(), gender: "Female".into(), concerns: concerns.into(), ..IntakeForm::default() }
}

fn controller(mock: &Arc<MockLlm>, variant: IntakeVariant) -> Consultation {
    Consultation::new(mock.clone(), variant)
}

async fn started(mock: &Arc<MockLlm>) -> (Consultation, SessionState) {
    let consultation = controller(mock, IntakeVariant::Detailed);
    let mut session = SessionState::new();
    consultation
        .submit(&mut session, &detailed_form("40"))
        .await
        .unwrap();
    (consultation, session)
}

// =============================================================================
// submit
// =============================================================================

#[tokio::test]
async fn submit_out_of_range_age_makes_no_call() {
    for age in ["0", "121"] {
        let mock = Arc::new(MockLlm::new(&[]));
        let consultation = controller(&mock, IntakeVariant::Detailed);
        let mut session = SessionState::new();

        let err = consultation
            .submit(&mut session, &detailed_form(age))
            .await
            .unwrap_err();

        assert!(matches!(err, ConsultationError::Validation(ValidationError::Age)));
        assert!(!session.is_started());
        assert!(session.snapshot().intake.is_none());
        assert!(session.transcript().is_empty());
        assert_eq!(mock.call_count(), 0);
    }
}

#[tokio::test]
async fn submit_seeds_summary_and_first_reply() {
    let mock = Arc::new(MockLlm::new(&["How long have you had the headache?"]));
    let (_, session) = started(&mock).await;

    assert!(session.is_started());
    assert_eq!(session.snapshot().intake.map(|i| i.age), Some(40));
    let transcript = session.transcript();
    assert_eq!(transcript.len(), 2);
    assert_eq!(transcript[0].role, Role::User);
    assert!(transcript[0].content.starts_with("Patient Summary:"));
    assert!(transcript[0].content.contains("- Current medications: None"));
    assert_eq!(transcript[1], Message::assistant("How long have you had the headache?"));
}

#[tokio::test]
async fn submit_sends_only_the_instruction_prompt() {
    let mock = Arc::new(MockLlm::new(&[]));
    let (_, session) = started(&mock).await;

    let calls = mock.calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].len(), 1);
    let instruction = &calls[0][0];
    assert_eq!(instruction.role, Role::User);
    assert!(instruction.content.starts_with("You are a highly experienced medical doctor."));
    assert_ne!(instruction.content, session.transcript()[0].content);
    assert!(
        session
            .transcript()
            .iter()
            .all(|m| !m.content.contains(&instruction.content))
    );
}

#[tokio::test]
async fn submit_keeps_padded_fields_verbatim() {
    let mock = Arc::new(MockLlm::new(&[]));
    let consultation = controller(&mock, IntakeVariant::Detailed);
    let mut session = SessionState::new();
    let form = IntakeForm {
        medical_history: "  type 2 diabetes\n".into(),
        symptoms: "\tfever, cough ".into(),
        ..detailed_form("52")
    };
    consultation.submit(&mut session, &form).await.unwrap();

    let summary = &session.transcript()[0].content;
    assert!(summary.contains("- Medical history:   type 2 diabetes\n"));
    assert!(summary.contains("- Symptoms: \tfever, cough "));
    let instruction = &mock.calls()[0][0].content;
    assert!(instruction.contains("  type 2 diabetes\n"));
    assert!(instruction.contains("\tfever, cough "));
}

#[tokio::test]
async fn submit_while_active_is_rejected() {
    let mock = Arc::new(MockLlm::new(&[]));
    let (consultation, mut session) = started(&mock).await;

    let err = consultation
        .submit(&mut session, &detailed_form("30"))
        .await
        .unwrap_err();
    assert!(matches!(err, ConsultationError::AlreadyStarted));
    assert_eq!(session.snapshot().intake.map(|i| i.age), Some(40));
    assert_eq!(mock.call_count(), 1);
}

#[tokio::test]
async fn submit_service_failure_commits_nothing() {
    let mock = Arc::new(MockLlm::failing(500));
    let consultation = controller(&mock, IntakeVariant::Detailed);
    let mut session = SessionState::new();

    let err = consultation
        .submit(&mut session, &detailed_form("40"))
        .await
        .unwrap_err();
    assert!(matches!(err, ConsultationError::Service(LlmError::ApiResponse { status: 500, .. })));
    assert!(!session.is_started());
    assert!(session.transcript().is_empty());
    assert_eq!(mock.call_count(), 1);
}

#[tokio::test]
async fn concerns_variant_requires_ten_words() {
    let mock = Arc::new(MockLlm::new(&[]));
    let consultation = controller(&mock, IntakeVariant::Concerns);
    let mut session = SessionState::new();

    let short = consultation
        .submit(&mut session, &concerns_form("my back hurts when I bend over to lift"))
        .await
        .unwrap_err();
    assert!(matches!(short, ConsultationError::Validation(ValidationError::Concerns { words: 9 })));
    assert_eq!(mock.call_count(), 0);

    consultation
        .submit(&mut session, &concerns_form("my lower back hurts when I bend over to lift"))
        .await
        .unwrap();
    assert_eq!(mock.call_count(), 1);
    assert_eq!(session.transcript().len(), 2);
    assert!(session.transcript()[0].content.contains("- Concerns: my lower back hurts"));
}

// =============================================================================
// send_message
// =============================================================================

#[tokio::test]
async fn message_appends_user_and_reply() {
    let mock = Arc::new(MockLlm::new(&["first", "Is it worse in the morning?"]));
    let (consultation, mut session) = started(&mock).await;

    consultation
        .send_message(&mut session, "  It started two days ago.  ")
        .await
        .unwrap();

    let transcript = session.transcript();
    assert_eq!(transcript.len(), 4);
    assert_eq!(transcript[2], Message::user("  It started two days ago.  "));
    assert_eq!(transcript[3], Message::assistant("Is it worse in the morning?"));
}

#[tokio::test]
async fn message_replays_full_transcript_in_order() {
    let mock = Arc::new(MockLlm::new(&[]));
    let (consultation, mut session) = started(&mock).await;
    consultation
        .send_message(&mut session, "one")
        .await
        .unwrap();
    let before: Vec<Message> = session.transcript().to_vec();

    consultation
        .send_message(&mut session, "two")
        .await
        .unwrap();

    let calls = mock.calls();
    assert_eq!(calls.len(), 3);
    let mut expected = before;
    expected.push(Message::user("two"));
    assert_eq!(calls[2], expected);
    assert_eq!(calls[2][0], session.transcript()[0]);
    assert_eq!(session.transcript().len(), 6);
}

#[tokio::test]
async fn message_before_start_is_rejected() {
    let mock = Arc::new(MockLlm::new(&[]));
    let consultation = controller(&mock, IntakeVariant::Detailed);
    let mut session = SessionState::new();

    let err = consultation
        .send_message(&mut session, "hello")
        .await
        .unwrap_err();
    assert!(matches!(err, ConsultationError::NotStarted));
    assert!(session.transcript().is_empty());
    assert_eq!(mock.call_count(), 0);
}

#[tokio::test]
async fn empty_message_is_rejected() {
    let mock = Arc::new(MockLlm::new(&[]));
    let (consultation, mut session) = started(&mock).await;

    let err = consultation
        .send_message(&mut session, " \n ")
        .await
        .unwrap_err();
    assert!(matches!(err, ConsultationError::EmptyMessage));
    assert_eq!(session.transcript().len(), 2);
    assert_eq!(mock.call_count(), 1);
}

#[tokio::test]
async fn message_service_failure_leaves_user_message_unanswered() {
    let mock = Arc::new(MockLlm::scripted(vec![Ok("hello".into()), Err(502)]));
    let (consultation, mut session) = started(&mock).await;

    let err = consultation
        .send_message(&mut session, "Are you there?")
        .await
        .unwrap_err();
    assert!(matches!(err, ConsultationError::Service(_)));
    assert_eq!(session.transcript().len(), 3);
    assert_eq!(session.transcript()[2], Message::user("Are you there?"));

    // The next message carries the unanswered one along with it.
    consultation
        .send_message(&mut session, "Hello?")
        .await
        .unwrap();
    let last_call = mock.calls().pop().unwrap();
    assert_eq!(last_call.len(), 4);
    assert_eq!(last_call[2], Message::user("Are you there?"));
    assert_eq!(session.transcript().len(), 5);
}

// =============================================================================
// reset
// =============================================================================

#[tokio::test]
async fn reset_clears_and_next_submission_starts_fresh() {
    let mock = Arc::new(MockLlm::new(&[]));
    let (consultation, mut session) = started(&mock).await;
    consultation
        .send_message(&mut session, "still hurts")
        .await
        .unwrap();

    consultation.reset(&mut session);
    assert!(!session.is_started());
    assert!(session.snapshot().intake.is_none());
    assert!(session.transcript().is_empty());

    consultation
        .submit(&mut session, &detailed_form("41"))
        .await
        .unwrap();
    assert_eq!(session.transcript().len(), 2);
    assert!(session.transcript()[0].content.contains("- Age: 41 years"));
    assert!(
        session
            .transcript()
            .iter()
            .all(|m| m.content != "still hurts")
    );
}

#[tokio::test]
async fn reset_in_intake_is_harmless() {
    let mock = Arc::new(MockLlm::new(&[]));
    let consultation = controller(&mock, IntakeVariant::Detailed);
    let mut session = SessionState::new();
    consultation.reset(&mut session);
    assert!(!session.is_started());
    assert_eq!(mock.call_count(), 0);
}
