//! Google ID token verification against a mock JWKS endpoint

use dhanrakshak_backend::identity::{GoogleVerifier, IdentityError, IdentityVerifier};

use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use serde_json::{json, Value};
use wiremock::{
    matchers::{method, path},
    Mock, MockServer, ResponseTemplate,
};

const CLIENT_ID: &str = "test-client.apps.googleusercontent.com";
const KEY_ID: &str = "test-kid";

const TEST_KEY_PEM: &[u8] = include_bytes!("fixtures/google_test_key.pem");

const TEST_KEY_MODULUS: &str = "rYCDhOtWFKkb3RmOp4niHhf6Zbsx4Xp8u9Yn07I3XU7PeC_21XgxcDoCUfw3WiAQTuaZ4e5sn_ZAYXUWpp2akcAnabPHN5VlxXsZFktJN7BZe_6uxvMARlXudPmHxyNjy4AXfEeD_X5PaNFNvMOjNfvyqmBGrc2OjvbbM9QrHz-wbvnSUyvE3SyiIkF_x_vWWghUMc1n5d7Laj5HvfmzOaSPkSQsRjblBWWOweSLmI4fI0cI6PlX2H7u69x-BhJEA_Q7ic5LPuk1vyuweiShejsxx5bQvgB7y-ptyDVdixDfIn3uwmd0qJuxikWfaf8iXfGNPVm3lchmxggZyFn_aQ";

fn jwks() -> Value {
    json!({
        "keys": [{
            "kty": "RSA",
            "kid": KEY_ID,
            "alg": "RS256",
            "use": "sig",
            "n": TEST_KEY_MODULUS,
            "e": "AQAB"
        }]
    })
}

async fn mount_jwks(server: &MockServer, expected_fetches: u64) {
    Mock::given(method("GET"))
        .and(path("/oauth2/v3/certs"))
        .respond_with(ResponseTemplate::new(200).set_body_json(jwks()))
        .expect(expected_fetches)
        .mount(server)
        .await;
}

fn verifier_for(server: &MockServer) -> GoogleVerifier {
    GoogleVerifier::with_certs_url(CLIENT_ID, format!("{}/oauth2/v3/certs", server.uri()))
}

fn claims() -> Value {
    let now = chrono::Utc::now().timestamp();
    json!({
        "iss": "https://accounts.google.com",
        "aud": CLIENT_ID,
        "sub": "110169484474386276334",
        "email": "asha@example.com",
        "email_verified": true,
        "name": "Asha Rao",
        "picture": "https://example.com/asha.png",
        "iat": now,
        "exp": now + 3600
    })
}

fn sign(claims: &Value, kid: Option<&str>) -> String {
    let mut header = Header::new(Algorithm::RS256);
    header.kid = kid.map(str::to_string);
    encode(&header, claims, &EncodingKey::from_rsa_pem(TEST_KEY_PEM).unwrap()).unwrap()
}

#[tokio::test]
async fn test_valid_token() {
    let mock_server = MockServer::start().await;
    mount_jwks(&mock_server, 1).await;

    let identity = verifier_for(&mock_server)
        .verify(&sign(&claims(), Some(KEY_ID)))
        .await
        .unwrap();

    assert_eq!(identity.sub, "110169484474386276334");
    assert_eq!(identity.email, "asha@example.com");
    assert!(identity.email_verified);
    assert_eq!(identity.name.as_deref(), Some("Asha Rao"));
}

#[tokio::test]
async fn test_keys_are_cached() {
    let mock_server = MockServer::start().await;
    mount_jwks(&mock_server, 1).await;

    let verifier = verifier_for(&mock_server);
    let token = sign(&claims(), Some(KEY_ID));

    assert!(verifier.verify(&token).await.is_ok());
    assert!(verifier.verify(&token).await.is_ok());
}

#[tokio::test]
async fn test_wrong_audience_rejected() {
    let mock_server = MockServer::start().await;
    mount_jwks(&mock_server, 1).await;

    let mut payload = claims();
    payload["aud"] = json!("someone-else.apps.googleusercontent.com");

    let result = verifier_for(&mock_server)
        .verify(&sign(&payload, Some(KEY_ID)))
        .await;
    assert!(matches!(result, Err(IdentityError::Rejected(_))));
}

#[tokio::test]
async fn test_wrong_issuer_rejected() {
    let mock_server = MockServer::start().await;
    mount_jwks(&mock_server, 1).await;

    let mut payload = claims();
    payload["iss"] = json!("https://evil.example.com");

    let result = verifier_for(&mock_server)
        .verify(&sign(&payload, Some(KEY_ID)))
        .await;
    assert!(matches!(result, Err(IdentityError::Rejected(_))));
}

#[tokio::test]
async fn test_expired_token_rejected() {
    let mock_server = MockServer::start().await;
    mount_jwks(&mock_server, 1).await;

    let mut payload = claims();
    let now = chrono::Utc::now().timestamp();
    payload["iat"] = json!(now - 7200);
    payload["exp"] = json!(now - 3600);

    let result = verifier_for(&mock_server)
        .verify(&sign(&payload, Some(KEY_ID)))
        .await;
    assert!(matches!(result, Err(IdentityError::Rejected(_))));
}

#[tokio::test]
async fn test_unknown_key_id() {
    let mock_server = MockServer::start().await;
    mount_jwks(&mock_server, 1).await;

    let result = verifier_for(&mock_server)
        .verify(&sign(&claims(), Some("rotated-away")))
        .await;
    assert!(matches!(result, Err(IdentityError::UnknownKey(kid)) if kid == "rotated-away"));
}

#[tokio::test]
async fn test_unknown_key_id_does_not_refetch_recent_keys() {
    let mock_server = MockServer::start().await;
    mount_jwks(&mock_server, 1).await;

    let verifier = verifier_for(&mock_server);
    let unknown = sign(&claims(), Some("rotated-away"));

    for _ in 0..5 {
        assert!(matches!(
            verifier.verify(&unknown).await,
            Err(IdentityError::UnknownKey(_))
        ));
    }
    assert!(verifier.verify(&sign(&claims(), Some(KEY_ID))).await.is_ok());
}

#[tokio::test]
async fn test_missing_key_id() {
    let mock_server = MockServer::start().await;
    mount_jwks(&mock_server, 0).await;

    let result = verifier_for(&mock_server)
        .verify(&sign(&claims(), None))
        .await;
    assert!(matches!(result, Err(IdentityError::MissingKeyId)));
}

#[tokio::test]
async fn test_key_endpoint_failure() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/oauth2/v3/certs"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&mock_server)
        .await;

    let result = verifier_for(&mock_server)
        .verify(&sign(&claims(), Some(KEY_ID)))
        .await;
    assert!(matches!(result, Err(IdentityError::KeyFetch(_))));
}
