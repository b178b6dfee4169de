//! Races between callbacks, cancellations and parallel sessions.

use paraph_core::{CreateSessionRequest, DocumentRef, SessionStatus};
use paraph_orchestrator::{CallbackOutcome, OrchestratorError};
use paraph_pipeline::BusinessDocument;
use paraph_simulation::{SimulationHarness, encoded_signature};
use paraph_store::SessionStore;

fn start() -> SimulationHarness {
    SimulationHarness::start().expect("harness should start")
}

#[tokio::test]
async fn concurrent_callbacks_complete_exactly_once() {
    let sim = start();
    let created = sim
        .orchestrator
        .create_session(sim.default_request())
        .await
        .expect("dispatch should succeed");

    let payload = encoded_signature();
    let (first, second) = tokio::join!(
        sim.orchestrator
            .process_signature_callback(&created.session_id, &payload),
        sim.orchestrator
            .process_signature_callback(&created.session_id, &payload),
    );

    let outcomes = [first.unwrap(), second.unwrap()];
    let completed = outcomes
        .iter()
        .filter(|o| matches!(o, CallbackOutcome::Completed))
        .count();
    let ignored = outcomes
        .iter()
        .filter(|o| matches!(o, CallbackOutcome::AlreadyFinished { .. }))
        .count();
    assert_eq!(completed, 1, "exactly one callback may win");
    assert_eq!(ignored, 1);

    let snapshot = sim.orchestrator.metrics().snapshot();
    assert_eq!(snapshot.callbacks_completed, 1);
    assert_eq!(snapshot.callbacks_ignored, 1);

    let stored = sim
        .store
        .find_by_session_id(&created.session_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored.status, SessionStatus::Completed);
}

#[tokio::test]
async fn cancel_racing_a_callback_never_resurrects_the_session() {
    let sim = start();
    let created = sim
        .orchestrator
        .create_session(sim.default_request())
        .await
        .expect("dispatch should succeed");

    let (cancelled, callback) = tokio::join!(
        sim.orchestrator.cancel_session(
            &created.session_id,
            &sim.company(),
            &sim.invoice(),
            "clerk-7",
            "changed their mind",
        ),
        sim.orchestrator
            .process_signature_callback(&created.session_id, &encoded_signature()),
    );

    let stored = sim
        .store
        .find_by_session_id(&created.session_id)
        .await
        .unwrap()
        .unwrap();
    match stored.status {
        SessionStatus::Completed => {
            // The callback won. The cancel must have been turned away.
            assert!(matches!(
                cancelled,
                Err(OrchestratorError::InvalidState(SessionStatus::Completed))
            ));
            assert!(matches!(callback, Ok(CallbackOutcome::Completed)));
        }
        SessionStatus::Cancelled => {
            // The cancel won. Whatever the callback saw, it did not
            // complete the session.
            assert!(cancelled.is_ok());
            assert!(!matches!(callback, Ok(CallbackOutcome::Completed)));
        }
        other => panic!("session ended in unexpected state {other}"),
    }
}

#[tokio::test]
async fn parallel_sessions_on_distinct_documents_stay_isolated() {
    let sim = SimulationHarness::builder()
        .document(BusinessDocument::new(
            DocumentRef::invoice("inv-2002"),
            "2024-02002",
            99.0,
            "EUR",
        ))
        .build()
        .expect("harness should start");

    let first = sim
        .orchestrator
        .create_session(sim.default_request())
        .await
        .expect("dispatch should succeed");
    let second = sim
        .orchestrator
        .create_session(CreateSessionRequest::new(
            DocumentRef::invoice("inv-2002"),
            SimulationHarness::TABLET,
            SimulationHarness::COMPANY,
            "Sam Prokurist",
        ))
        .await
        .expect("dispatch should succeed");

    assert!(sim.submit_signature(&first.session_id).await);
    sim.orchestrator
        .cancel_session(
            &second.session_id,
            &sim.company(),
            &DocumentRef::invoice("inv-2002"),
            "clerk-7",
            "wrong signer",
        )
        .await
        .unwrap();

    let first_stored = sim
        .store
        .find_by_session_id(&first.session_id)
        .await
        .unwrap()
        .unwrap();
    let second_stored = sim
        .store
        .find_by_session_id(&second.session_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(first_stored.status, SessionStatus::Completed);
    assert_eq!(second_stored.status, SessionStatus::Cancelled);

    let snapshot = sim.orchestrator.metrics().snapshot();
    assert_eq!(snapshot.sessions_created, 2);
    assert_eq!(snapshot.callbacks_completed, 1);
    assert_eq!(snapshot.sessions_cancelled, 1);
}
