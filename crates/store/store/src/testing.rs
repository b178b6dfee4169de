use chrono::{Duration, Utc};

use paraph_core::{
    CompanyId, CreateSessionRequest, DocumentRef, SessionId, SessionStatus, SignatureSession,
};

use crate::error::SessionStoreError;
use crate::store::SessionStore;

fn test_session(id: &str) -> SignatureSession {
    let mut session = SignatureSession::new(&CreateSessionRequest::new(
        DocumentRef::invoice(format!("inv-{id}")),
        "test-tablet",
        "test-company",
        "Test Signer",
    ));
    session.session_id = SessionId::new(id);
    session
}

/// Run the full session store conformance test suite.
///
/// Call this from your backend's test module with a fresh store instance.
///
/// # Errors
///
/// Returns an error if any conformance test fails.
pub async fn run_store_conformance_tests(
    store: &dyn SessionStore,
) -> Result<(), SessionStoreError> {
    test_find_missing(store).await?;
    test_save_and_find(store).await?;
    test_save_overwrites(store).await?;
    test_company_scoping(store).await?;
    test_save_if_status_match(store).await?;
    test_save_if_status_mismatch(store).await?;
    test_save_if_status_missing(store).await?;
    test_scan_open(store).await?;
    Ok(())
}

async fn test_find_missing(store: &dyn SessionStore) -> Result<(), SessionStoreError> {
    let found = store
        .find_by_session_id(&SessionId::new("missing"))
        .await?;
    assert!(found.is_none(), "find on missing session should return None");
    Ok(())
}

async fn test_save_and_find(store: &dyn SessionStore) -> Result<(), SessionStoreError> {
    let session = test_session("save-find");
    store.save(&session).await?;

    let found = store.find_by_session_id(&session.session_id).await?;
    let found = found.expect("saved session should be found");
    assert_eq!(found.session_id, session.session_id);
    assert_eq!(found.status, SessionStatus::Pending);
    assert_eq!(found.document, session.document);
    Ok(())
}

async fn test_save_overwrites(store: &dyn SessionStore) -> Result<(), SessionStoreError> {
    let mut session = test_session("overwrite");
    store.save(&session).await?;

    session.status = SessionStatus::SentToTablet;
    store.save(&session).await?;

    let found = store.find_by_session_id(&session.session_id).await?;
    assert_eq!(
        found.map(|s| s.status),
        Some(SessionStatus::SentToTablet),
        "second save should overwrite the record"
    );
    Ok(())
}

async fn test_company_scoping(store: &dyn SessionStore) -> Result<(), SessionStoreError> {
    let session = test_session("scoped");
    store.save(&session).await?;

    let found = store
        .find_for_company(&session.session_id, &session.company_id)
        .await?;
    assert!(found.is_some(), "owning company should see the session");

    let found = store
        .find_for_company(&session.session_id, &CompanyId::new("other-company"))
        .await?;
    assert!(
        found.is_none(),
        "a foreign company must see the session as missing"
    );
    Ok(())
}

async fn test_save_if_status_match(store: &dyn SessionStore) -> Result<(), SessionStoreError> {
    let mut session = test_session("cas-match");
    store.save(&session).await?;

    session.status = SessionStatus::SentToTablet;
    let swapped = store
        .save_if_status(&session, SessionStatus::Pending)
        .await?;
    assert!(swapped, "swap with matching status should succeed");

    let found = store.find_by_session_id(&session.session_id).await?;
    assert_eq!(found.map(|s| s.status), Some(SessionStatus::SentToTablet));
    Ok(())
}

async fn test_save_if_status_mismatch(store: &dyn SessionStore) -> Result<(), SessionStoreError> {
    let mut session = test_session("cas-mismatch");
    session.status = SessionStatus::Cancelled;
    store.save(&session).await?;

    session.status = SessionStatus::Completed;
    let swapped = store
        .save_if_status(&session, SessionStatus::SentToTablet)
        .await?;
    assert!(!swapped, "swap with stale status should fail");

    let found = store.find_by_session_id(&session.session_id).await?;
    assert_eq!(
        found.map(|s| s.status),
        Some(SessionStatus::Cancelled),
        "record should keep its stored status"
    );
    Ok(())
}

async fn test_save_if_status_missing(store: &dyn SessionStore) -> Result<(), SessionStoreError> {
    let session = test_session("cas-missing");
    let swapped = store
        .save_if_status(&session, SessionStatus::Pending)
        .await?;
    assert!(!swapped, "swap on a missing session should fail");

    let found = store.find_by_session_id(&session.session_id).await?;
    assert!(found.is_none(), "failed swap must not create a record");
    Ok(())
}

async fn test_scan_open(store: &dyn SessionStore) -> Result<(), SessionStoreError> {
    let mut open = test_session("scan-open");
    open.expires_at = Utc::now() + Duration::minutes(5);
    store.save(&open).await?;

    let mut done = test_session("scan-done");
    done.status = SessionStatus::Completed;
    store.save(&done).await?;

    let sessions = store.scan_open().await?;
    assert!(
        sessions.iter().any(|s| s.session_id == open.session_id),
        "scan should include open sessions"
    );
    assert!(
        sessions.iter().all(|s| s.session_id != done.session_id),
        "scan should exclude terminal sessions"
    );
    assert!(
        sessions.iter().all(|s| !s.status.is_terminal()),
        "scan must only return non-terminal sessions"
    );
    Ok(())
}
