use std::sync::Arc;
use std::time::Duration;

use chainscore_core::{synthesize_at, Address, AuthorizationArtifact, AuthorizationKind, ErrorKind};
use chainscore_engine::{
    EngineConfig, Provenance, QueryError, QuerySession, QueryStatus, ScoreAcquisitionEngine,
};
use chainscore_rpc::ledger::mock_client::MockLedgerClient;
use chainscore_rpc::{decode, LedgerError, ReceiptStatus, RequestHandle, RpcError};
use chainscore_wallet::mock::MockWallet;
use chainscore_wallet::{ProviderAuthorizer, WalletError};
use serde_json::json;

type Engine = ScoreAcquisitionEngine<Arc<MockLedgerClient>, ProviderAuthorizer<Arc<MockWallet>>>;

const TARGET: &str = "0x5aAeb6053F3E94C9b9A09f33669435E7Ef1BeAed";

fn contract() -> Address {
    Address::from_bytes([0xc0; 20])
}

fn signer() -> String {
    Address::from_bytes([0x51; 20]).to_canonical()
}

fn target() -> Address {
    Address::parse(TARGET).unwrap()
}

fn build(ledger: MockLedgerClient, wallet: MockWallet, config: EngineConfig) -> (
    Engine,
    Arc<MockLedgerClient>,
    Arc<MockWallet>,
) {
    let ledger = Arc::new(ledger);
    let wallet = Arc::new(wallet);
    let engine = ScoreAcquisitionEngine::new(
        Arc::clone(&ledger),
        ProviderAuthorizer::new(Arc::clone(&wallet)),
        config,
    );
    (engine, ledger, wallet)
}

fn setup(ledger: MockLedgerClient) -> (Engine, Arc<MockLedgerClient>, Arc<MockWallet>) {
    build(ledger, MockWallet::new(), EngineConfig::new(contract()))
}

#[tokio::test]
async fn invalid_address_fails_before_any_prompt() {
    let (engine, ledger, wallet) = setup(MockLedgerClient::new());

    let err = engine
        .query_score("not-an-address", Some(&signer()))
        .await
        .unwrap_err();

    assert_eq!(err.kind(), Some(ErrorKind::InvalidAddress));
    assert_eq!(wallet.prompts(), 0);
    assert_eq!(ledger.submit_calls(), 0);
    assert_eq!(engine.status(), QueryStatus::Failed(ErrorKind::InvalidAddress));
}

#[tokio::test]
async fn missing_target_or_signer_is_invalid_input() {
    let (engine, _ledger, wallet) = setup(MockLedgerClient::new());

    let err = engine.query_score("  ", Some(&signer())).await.unwrap_err();
    assert_eq!(err.kind(), Some(ErrorKind::InvalidInput));

    let err = engine.query_score(TARGET, None).await.unwrap_err();
    assert_eq!(err.kind(), Some(ErrorKind::InvalidInput));

    let err = engine.query_score(TARGET, Some("0x1234")).await.unwrap_err();
    assert_eq!(err.kind(), Some(ErrorKind::InvalidInput));

    assert_eq!(wallet.prompts(), 0);
}

#[tokio::test]
async fn unconfigured_contract_is_a_configuration_error() {
    let (engine, _ledger, wallet) =
        build(MockLedgerClient::new(), MockWallet::new(), EngineConfig::default());

    let err = engine.query_score(TARGET, Some(&signer())).await.unwrap_err();
    assert_eq!(err, QueryError::NotConfigured);
    assert_eq!(err.kind(), Some(ErrorKind::ConfigurationError));
    assert_eq!(wallet.prompts(), 0);
}

#[tokio::test]
async fn user_rejection_is_terminal_without_fallback() {
    let (engine, ledger, wallet) = build(
        MockLedgerClient::new(),
        MockWallet::new().with_tx_outcome(Err(WalletError::UserRejected)),
        EngineConfig::new(contract()),
    );

    let err = engine.query_score(TARGET, Some(&signer())).await.unwrap_err();

    assert_eq!(err.kind(), Some(ErrorKind::UserRejected));
    assert_eq!(wallet.prompts(), 1);
    assert_eq!(ledger.submit_calls(), 0);
    let session = engine.session();
    assert_eq!(session.status, QueryStatus::Failed(ErrorKind::UserRejected));
    assert!(session.result.is_none());
}

#[tokio::test]
async fn other_wallet_failures_are_authorization_errors() {
    let (engine, ledger, _wallet) = build(
        MockLedgerClient::new(),
        MockWallet::new().with_tx_outcome(Err(WalletError::Unavailable("offline".into()))),
        EngineConfig::new(contract()),
    );

    let err = engine.query_score(TARGET, Some(&signer())).await.unwrap_err();
    assert_eq!(err.kind(), Some(ErrorKind::AuthorizationError));
    assert_eq!(ledger.submit_calls(), 0);
}

#[tokio::test]
async fn insufficient_balance_stops_before_prompt() {
    let config = EngineConfig {
        fee: 10_000,
        check_balance: true,
        ..EngineConfig::new(contract())
    };
    let (engine, _ledger, wallet) =
        build(MockLedgerClient::new(), MockWallet::new().with_balance(9_999), config);

    let err = engine.query_score(TARGET, Some(&signer())).await.unwrap_err();
    assert_eq!(
        err,
        QueryError::InsufficientBalance {
            balance: 9_999,
            fee: 10_000
        }
    );
    assert_eq!(wallet.prompts(), 0);
}

#[tokio::test(start_paused = true)]
async fn sufficient_balance_proceeds_and_pays_the_fee() {
    let config = EngineConfig {
        fee: 10_000,
        check_balance: true,
        ..EngineConfig::new(contract())
    };
    let (engine, _ledger, wallet) =
        build(MockLedgerClient::new(), MockWallet::new().with_balance(10_000), config);

    engine.query_score(TARGET, Some(&signer())).await.unwrap();
    let sent = wallet.sent_transactions();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].to, contract());
    assert_eq!(sent[0].value, 10_000);
}

#[tokio::test(start_paused = true)]
async fn submit_transport_error_falls_back_to_synthesized_score() {
    let (engine, ledger, wallet) = setup(
        MockLedgerClient::new()
            .with_submit(Err(LedgerError::RpcUnavailable("connection refused".into()))),
    );

    let resolved = engine.query_score(TARGET, Some(&signer())).await.unwrap();

    assert_eq!(resolved.provenance, Provenance::Fallback);
    assert_eq!(
        resolved.record,
        synthesize_at(&target(), resolved.record.timestamp)
    );
    assert_eq!(wallet.prompts(), 1);
    assert_eq!(ledger.poll_calls(), 0);

    let session = engine.session();
    assert_eq!(session.status, QueryStatus::Resolved(Provenance::Fallback));
    assert_eq!(session.remote_issue, Some(ErrorKind::RpcUnavailable));
    assert_eq!(session.result, Some(resolved.record));
}

#[tokio::test]
async fn contract_upstream_failure_at_submit_falls_back() {
    let submitted = decode::request_handle(&json!({
        "error": "fetch_failed",
        "message": "etherscan down"
    }));
    let (engine, ledger, _wallet) = setup(MockLedgerClient::new().with_submit(submitted));

    let resolved = engine.query_score(TARGET, Some(&signer())).await.unwrap();

    assert_eq!(resolved.provenance, Provenance::Fallback);
    assert_eq!(resolved.record.address, target());
    assert_eq!(ledger.poll_calls(), 0);
    assert_eq!(engine.session().remote_issue, Some(ErrorKind::RpcUnavailable));
}

#[tokio::test]
async fn busy_server_at_submit_falls_back() {
    let busy = LedgerError::from(RpcError::Remote {
        code: -32000,
        message: "server busy".into(),
        data: None,
    });
    let (engine, _ledger, _wallet) = setup(MockLedgerClient::new().with_submit(Err(busy)));

    let resolved = engine.query_score(TARGET, Some(&signer())).await.unwrap();
    assert_eq!(resolved.provenance, Provenance::Fallback);
    assert_eq!(engine.status(), QueryStatus::Resolved(Provenance::Fallback));
}

#[tokio::test]
async fn remote_rejection_at_submit_is_terminal() {
    let submitted = decode::request_handle(&json!({
        "error": "insufficient_payment",
        "message": "Payment failed"
    }));
    let (engine, _ledger, _wallet) = setup(MockLedgerClient::new().with_submit(submitted));

    let err = engine.query_score(TARGET, Some(&signer())).await.unwrap_err();
    assert_eq!(err.kind(), Some(ErrorKind::RemoteRejected));
    assert!(engine.session().result.is_none());
}

#[tokio::test(start_paused = true)]
async fn finalized_receipt_resolves_remote_record() {
    let mut remote = synthesize_at(&target(), 1_700_000_000);
    remote.fee_paid = 10_000;
    remote.summary = "computed by validators".to_string();
    let (engine, ledger, _wallet) = setup(
        MockLedgerClient::new()
            .with_receipts(vec![Ok(ReceiptStatus::Pending), Ok(ReceiptStatus::Finalized)])
            .with_last_score(Ok(Some(remote.clone()))),
    );

    let started = tokio::time::Instant::now();
    let resolved = engine.query_score(TARGET, Some(&signer())).await.unwrap();

    assert_eq!(resolved.provenance, Provenance::Remote);
    assert_eq!(resolved.record, remote);
    assert_eq!(ledger.poll_calls(), 2);
    assert_eq!(ledger.last_score_reads(), 1);
    assert!(started.elapsed() >= Duration::from_secs(4));

    let session = engine.session();
    assert_eq!(session.poll_attempts, 2);
    assert_eq!(
        session.request_handle,
        Some(RequestHandle(format!("mock:{}", target())))
    );
    assert!(session.remote_issue.is_none());
}

#[tokio::test(start_paused = true)]
async fn rejected_receipt_fails_with_remote_rejected() {
    let (engine, _ledger, _wallet) =
        setup(MockLedgerClient::new().with_receipt_default(Ok(ReceiptStatus::Rejected)));

    let err = engine.query_score(TARGET, Some(&signer())).await.unwrap_err();
    assert_eq!(err.kind(), Some(ErrorKind::RemoteRejected));
    assert_eq!(
        engine.status(),
        QueryStatus::Failed(ErrorKind::RemoteRejected)
    );
}

#[tokio::test(start_paused = true)]
async fn exhausted_polling_falls_back() {
    let config = EngineConfig {
        max_poll_attempts: 5,
        ..EngineConfig::new(contract())
    };
    let (engine, ledger, _wallet) = build(
        MockLedgerClient::new().with_receipt_default(Ok(ReceiptStatus::Pending)),
        MockWallet::new(),
        config,
    );

    let resolved = engine.query_score(TARGET, Some(&signer())).await.unwrap();

    assert_eq!(resolved.provenance, Provenance::Fallback);
    assert_eq!(ledger.poll_calls(), 5);
    assert_eq!(ledger.last_score_reads(), 0);
    assert_eq!(engine.session().remote_issue, Some(ErrorKind::Timeout));
}

#[tokio::test(start_paused = true)]
async fn poll_error_falls_back_immediately() {
    let (engine, ledger, _wallet) = setup(
        MockLedgerClient::new().with_receipts(vec![Err(LedgerError::Decode("bad json".into()))]),
    );

    let resolved = engine.query_score(TARGET, Some(&signer())).await.unwrap();
    assert_eq!(resolved.provenance, Provenance::Fallback);
    assert_eq!(ledger.poll_calls(), 1);
    assert_eq!(engine.session().remote_issue, Some(ErrorKind::DecodeFailure));
}

#[tokio::test(start_paused = true)]
async fn missing_or_foreign_last_score_falls_back() {
    let (engine, _ledger, _wallet) = setup(MockLedgerClient::new().with_last_score(Ok(None)));
    let resolved = engine.query_score(TARGET, Some(&signer())).await.unwrap();
    assert_eq!(resolved.provenance, Provenance::Fallback);
    assert_eq!(engine.session().remote_issue, Some(ErrorKind::NotFound));

    let other = synthesize_at(&Address::from_bytes([0x77; 20]), 1);
    let (engine, _ledger, _wallet) =
        setup(MockLedgerClient::new().with_last_score(Ok(Some(other))));
    let resolved = engine.query_score(TARGET, Some(&signer())).await.unwrap();
    assert_eq!(resolved.provenance, Provenance::Fallback);
    assert_eq!(resolved.record.address, target());
    assert_eq!(engine.session().remote_issue, Some(ErrorKind::DecodeFailure));
}

#[tokio::test(start_paused = true)]
async fn signature_mode_submits_signature_artifact() {
    let config = EngineConfig {
        authorization: AuthorizationKind::Signature,
        ..EngineConfig::new(contract())
    };
    let (engine, ledger, wallet) = build(
        MockLedgerClient::new(),
        MockWallet::new().with_sign_outcome(Ok("0xsigned".to_string())),
        config,
    );

    engine.query_score(TARGET, Some(&signer())).await.unwrap();
    assert_eq!(
        ledger.last_authorization(),
        Some(AuthorizationArtifact::Signature("0xsigned".to_string()))
    );
    assert_eq!(wallet.prompts(), 1);
    assert!(wallet.sent_transactions().is_empty());
}

#[tokio::test(start_paused = true)]
async fn reset_mid_poll_abandons_the_query() {
    let ledger = MockLedgerClient::new()
        .with_receipt_default(Ok(ReceiptStatus::Finalized))
        .with_poll_delay(Duration::from_secs(1));
    let (engine, ledger, _wallet) = setup(ledger);
    let engine = Arc::new(engine);

    let running = {
        let engine = Arc::clone(&engine);
        let signer = signer();
        tokio::spawn(async move { engine.query_score(TARGET, Some(&signer)).await })
    };

    // First poll starts at 2s and would answer at 3s.
    tokio::time::sleep(Duration::from_millis(2_500)).await;
    assert_eq!(engine.status(), QueryStatus::Polling);

    engine.reset();
    let outcome = running.await.unwrap();
    assert_eq!(outcome, Err(QueryError::Cancelled));

    tokio::time::sleep(Duration::from_secs(10)).await;
    assert_eq!(ledger.poll_calls(), 0);
    assert_eq!(ledger.last_score_reads(), 0);
    assert_eq!(engine.status(), QueryStatus::Idle);
    assert_eq!(engine.session(), QuerySession::default());
}

#[tokio::test(start_paused = true)]
async fn new_query_supersedes_the_previous_one() {
    let (engine, _ledger, wallet) = setup(MockLedgerClient::new().with_last_score(Ok(None)));
    let engine = Arc::new(engine);

    let first = {
        let engine = Arc::clone(&engine);
        let signer = signer();
        tokio::spawn(async move { engine.query_score(TARGET, Some(&signer)).await })
    };
    tokio::time::sleep(Duration::from_secs(1)).await;

    let second_target = Address::from_bytes([0x42; 20]).to_canonical();
    let second = engine
        .query_score(&second_target, Some(&signer()))
        .await
        .unwrap();

    assert_eq!(first.await.unwrap(), Err(QueryError::Cancelled));
    assert_eq!(second.record.address.to_canonical(), second_target);
    assert_eq!(engine.session().target, Some(second.record.address));
    assert_eq!(wallet.prompts(), 2);
}

#[tokio::test]
async fn reset_is_safe_when_idle_and_after_resolution() {
    let (engine, _ledger, _wallet) =
        setup(MockLedgerClient::new().with_submit(Err(LedgerError::RpcUnavailable("down".into()))));
    engine.reset();
    assert_eq!(engine.status(), QueryStatus::Idle);

    engine.query_score(TARGET, Some(&signer())).await.unwrap();
    assert!(engine.status().is_terminal());
    engine.reset();
    assert_eq!(engine.session(), QuerySession::default());
}

#[tokio::test]
async fn cached_score_is_free_and_leaves_session_alone() {
    let cached = synthesize_at(&target(), 1_700_000_000);
    let (engine, ledger, wallet) = setup(MockLedgerClient::new().with_cached(cached.clone()));

    let record = engine.get_cached_score(TARGET).await.unwrap();
    assert_eq!(record, cached);
    assert_eq!(ledger.cached_reads(), 1);
    assert_eq!(wallet.prompts(), 0);
    assert_eq!(engine.status(), QueryStatus::Idle);

    let miss = Address::from_bytes([9; 20]).to_canonical();
    assert_eq!(
        engine.get_cached_score(&miss).await,
        Err(QueryError::NotFound)
    );
    assert_eq!(
        engine.get_cached_score("0xnope").await.unwrap_err().kind(),
        Some(ErrorKind::InvalidAddress)
    );
    assert_eq!(engine.status(), QueryStatus::Idle);
}
