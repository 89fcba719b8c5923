use crate::fixtures::*;
use secp256k1::SecretKey;
use std::sync::Arc;
use std::time::Duration;
use swap_core::application::{EndpointSigner, InitiateOutcome, SignerWorker};
use swap_core::domain::ledger::sighash::sighash_all_message;
use swap_core::domain::ledger::signature::verify_pubkey_hash;
use swap_core::domain::ledger::{Transaction, WitnessArgs};
use swap_core::domain::multisig::multisig_script;
use swap_core::foundation::SIGNATURE_SIZE;
use swap_core::SwapError;

async fn initiated(setup: &MultisigSetup) -> InitiateOutcome {
    let harness = &setup.harness;
    let caller = harness.add_caller_cell(1, 100 * CKB);
    harness.add_fund_cell(10, 1_000 * CKB, 0);
    harness.refresh().await;
    let tx = TradeBuilder::new(250 * CKB, 1_000 * UNIT).input(&caller).build();
    harness.service().initiate(tx, &[0]).await.expect("initiate")
}

/// Signatures carried by the multisig witness lock, each checked against the configured keys.
fn signer_indices(setup: &MultisigSetup, tx: &Transaction) -> Vec<usize> {
    let lock = tx.witness_args(1).expect("witness").and_then(|args| args.lock).expect("lock");
    let script = multisig_script(&setup.config);
    assert_eq!(&lock[..script.len()], script.as_slice());
    let message = sighash_all_message(tx, &[1]).expect("message");
    lock[script.len()..]
        .chunks(SIGNATURE_SIZE)
        .map(|signature| {
            setup
                .config
                .pubkey_hashes()
                .iter()
                .position(|hash| verify_pubkey_hash(signature, &message, hash))
                .expect("signature from a configured signer")
        })
        .collect()
}

#[tokio::test]
async fn test_multisig_swap_when_threshold_met_then_confirmed() {
    let setup = MultisigSetup::new();
    let outcome = initiated(&setup).await;
    assert_eq!(outcome.tx.witness_args(1).expect("witness").and_then(|args| args.lock), Some(setup.harness.ctx.fund_pool.witness_placeholder.clone()));

    let coordinator = setup.coordinator(setup.endpoints());
    let worker = SignerWorker::new(setup.harness.ctx.clone(), Arc::new(coordinator));
    let handle = tokio::spawn(async move {
        let _ = worker.run().await;
    });
    let confirmed = setup.harness.service().confirm(outcome.tx.clone()).await.expect("confirm");
    handle.abort();

    let indices = signer_indices(&setup, &confirmed.tx);
    assert_eq!(indices.len(), 2);
    assert_eq!(indices[0], 0);
    assert_eq!(setup.harness.chain.submitted().len(), 1);
}

#[tokio::test]
async fn test_multisig_when_optional_signer_fails_then_other_optional_fills_in() {
    let setup = MultisigSetup::new();
    let outcome = initiated(&setup).await;
    let coordinator = setup.coordinator(setup.endpoints().failing("signer-1"));

    let signed = coordinator.sign_multisig_tx(outcome.tx).await.expect("signed");

    assert_eq!(signer_indices(&setup, &signed), vec![0, 2]);
}

#[tokio::test]
async fn test_multisig_when_required_signer_is_slow_then_optional_signers_are_asked_meanwhile() {
    let setup = MultisigSetup::new();
    let outcome = initiated(&setup).await;
    let coordinator = setup.coordinator(setup.endpoints().answering_after("signer-0", "signer-1"));

    let signed = tokio::time::timeout(Duration::from_secs(5), coordinator.sign_multisig_tx(outcome.tx))
        .await
        .expect("optional signers asked while the required one is pending")
        .expect("signed");

    let indices = signer_indices(&setup, &signed);
    assert_eq!(indices.len(), 2);
    assert_eq!(indices[0], 0);
}

#[tokio::test]
async fn test_multisig_when_optional_signers_fail_then_threshold_not_met() {
    let setup = MultisigSetup::new();
    let outcome = initiated(&setup).await;
    let coordinator = setup.coordinator(setup.endpoints().failing("signer-1").failing("signer-2"));

    let err = coordinator.sign_multisig_tx(outcome.tx).await.expect_err("threshold");

    assert!(matches!(err, SwapError::ThresholdNotMet { required: 2, received: 1 }), "{err}");
}

#[tokio::test]
async fn test_multisig_when_required_signer_fails_then_error() {
    let setup = MultisigSetup::new();
    let outcome = initiated(&setup).await;
    let coordinator = setup.coordinator(setup.endpoints().failing("signer-0"));

    let err = coordinator.sign_multisig_tx(outcome.tx).await.expect_err("required");

    assert!(matches!(err, SwapError::SignerEndpointFailed { ref endpoint, .. } if endpoint == "signer-0"), "{err}");
}

#[tokio::test]
async fn test_multisig_when_required_signer_uses_wrong_key_then_invalid_signature() {
    let setup = MultisigSetup::new();
    let outcome = initiated(&setup).await;
    let impostor = SecretKey::from_slice(&FUND_SECRET).expect("secret");
    let coordinator = setup.coordinator(setup.endpoints().impostor("signer-0", impostor));

    let err = coordinator.sign_multisig_tx(outcome.tx).await.expect_err("impostor");

    assert!(matches!(err, SwapError::InvalidSignature { signer_index: 0 }), "{err}");
}

#[tokio::test]
async fn test_multisig_when_placeholder_missing_then_rejected() {
    let setup = MultisigSetup::new();
    let outcome = initiated(&setup).await;
    let mut tx = outcome.tx;
    tx.set_witness_args(1, &WitnessArgs::with_lock(vec![0u8; SIGNATURE_SIZE]));
    let coordinator = setup.coordinator(setup.endpoints());

    let err = coordinator.sign_multisig_tx(tx).await.expect_err("placeholder");

    assert!(matches!(err, SwapError::MissingPlaceholder { index: 1 }), "{err}");
}

#[tokio::test]
async fn test_endpoint_signer_signs_fund_pool_group() {
    let setup = MultisigSetup::new();
    let outcome = initiated(&setup).await;
    let secret = setup.keys["signer-2"];
    let signer = EndpointSigner::new(secret, &setup.harness.ctx.fund_pool, setup.harness.chain.clone()).expect("member");

    let signature = signer.sign(&outcome.tx).await.expect("signature");

    let message = sighash_all_message(&outcome.tx, &[1]).expect("message");
    assert!(verify_pubkey_hash(&signature, &message, &signer.pubkey_hash()));
}

#[tokio::test]
async fn test_endpoint_signer_when_key_not_member_then_config_error() {
    let setup = MultisigSetup::new();
    let outsider = SecretKey::from_slice(&FUND_SECRET).expect("secret");

    let result = EndpointSigner::new(outsider, &setup.harness.ctx.fund_pool, setup.harness.chain.clone());

    assert!(matches!(result, Err(SwapError::ConfigError(_))));
}
