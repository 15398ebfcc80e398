//! End-to-end handshake: generate an identity on one origin, issue a token,
//! verify it on another.

use std::collections::HashSet;
use std::time::Duration;

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use uauth_core::{Clock, EpochMillis, ManualClock, SystemClock};
use uauth_crypto::{generate_key_pair, CryptoProvider, Ed25519Provider, KeyPair};
use uauth_sso::{
    InvalidReason, SsoPayload, SsoToken, SsoTokenIssuer, SsoTokenVerifier, TokenVerification,
    TOKEN_TTL,
};

fn identity() -> KeyPair {
    generate_key_pair(&Ed25519Provider).expect("key generation")
}

fn sign_payload(pair: &KeyPair, payload: SsoPayload) -> String {
    let input = payload.signing_input().unwrap();
    let signature = Ed25519Provider.sign(&pair.private_key, input.as_bytes()).unwrap();
    SsoToken { payload, signature }.encode().unwrap()
}

#[test]
fn issue_then_verify_on_another_origin() {
    let pair = identity();
    let token = SsoTokenIssuer::new(&Ed25519Provider, &SystemClock)
        .with_identity(&pair)
        .issue("example.com")
        .unwrap();

    match SsoTokenVerifier::new(&SystemClock).verify(&token) {
        TokenVerification::Valid { user_id, public_key } => {
            assert_eq!(user_id, pair.user_id.as_str());
            assert_eq!(public_key, pair.public_key);
        }
        other => panic!("expected valid token, got {other:?}"),
    }
}

#[test]
fn expired_with_valid_signature_reports_expired() {
    let now = SystemClock.now();
    let pair = identity();
    let payload = SsoPayload {
        user_id: pair.user_id.to_string(),
        public_key: pair.public_key.clone(),
        target_domain: "example.com".to_string(),
        timestamp: EpochMillis::new(now.as_millis() - TOKEN_TTL.as_millis() as i64 - 1),
        expires_at: EpochMillis::new(now.as_millis() - 1),
    };
    let token = sign_payload(&pair, payload);

    let clock = ManualClock::new(now);
    let result = SsoTokenVerifier::new(&clock).verify(&token);
    assert_eq!(result, TokenVerification::Invalid { reason: InvalidReason::Expired });
}

#[test]
fn tampered_target_domain_reports_invalid_signature() {
    let pair = identity();
    let clock = ManualClock::new(EpochMillis::new(1_767_225_600_000));
    let mut token = SsoTokenIssuer::new(&Ed25519Provider, &clock)
        .with_identity(&pair)
        .issue_token("example.com")
        .unwrap();
    token.payload.target_domain = "evil.example".to_string();

    let result = SsoTokenVerifier::new(&clock).verify(&token.encode().unwrap());
    assert_eq!(result.reason(), Some(InvalidReason::InvalidSignature));
}

#[test]
fn token_signed_by_other_identity_is_rejected() {
    let alice = identity();
    let mallory = identity();
    let clock = ManualClock::new(EpochMillis::new(1_767_225_600_000));
    let mut token = SsoTokenIssuer::new(&Ed25519Provider, &clock)
        .with_identity(&mallory)
        .issue_token("example.com")
        .unwrap();
    token.payload.user_id = alice.user_id.to_string();
    token.payload.public_key = alice.public_key.clone();

    let result = SsoTokenVerifier::new(&clock).verify(&token.encode().unwrap());
    assert_eq!(result.reason(), Some(InvalidReason::InvalidSignature));
}

#[test]
fn reordered_envelope_still_verifies() {
    let pair = identity();
    let clock = ManualClock::new(EpochMillis::new(1_767_225_600_000));
    let token = SsoTokenIssuer::new(&Ed25519Provider, &clock)
        .with_identity(&pair)
        .issue_token("example.com")
        .unwrap();
    let p = &token.payload;
    let reordered = format!(
        concat!(
            r#"{{"signature":"{}","payload":{{"targetDomain":"{}","expiresAt":{},"#,
            r#""userId":"{}","timestamp":{},"publicKey":"{}"}}}}"#
        ),
        token.signature,
        p.target_domain,
        p.expires_at.as_millis(),
        p.user_id,
        p.timestamp.as_millis(),
        p.public_key
    );
    let result = SsoTokenVerifier::new(&clock).verify(&STANDARD.encode(reordered));
    assert!(result.is_valid(), "{result:?}");
}

#[test]
fn token_expires_after_fifteen_minutes() {
    let pair = identity();
    let clock = ManualClock::new(EpochMillis::new(1_767_225_600_000));
    let token = SsoTokenIssuer::new(&Ed25519Provider, &clock)
        .with_identity(&pair)
        .issue("example.com")
        .unwrap();
    clock.advance(Duration::from_secs(14 * 60));
    assert!(SsoTokenVerifier::new(&clock).verify(&token).is_valid());
    clock.advance(Duration::from_secs(2 * 60));
    assert_eq!(SsoTokenVerifier::new(&clock).verify(&token).reason(), Some(InvalidReason::Expired));
}

#[test]
fn ten_thousand_identities_have_distinct_user_ids() {
    let mut seen = HashSet::with_capacity(10_000);
    for _ in 0..10_000 {
        let pair = identity();
        assert!(seen.insert(pair.user_id.clone()), "collision on {}", pair.user_id);
    }
}
