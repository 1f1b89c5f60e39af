use std::path::Path;
use std::time::Duration;

use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde_json::{json, Value};
use tower::ServiceExt;

use trustval_engine::{ConfigError, EngineError, TrustValidator, ValidatorConfig};
use trustval_nullables::TestCert;
use trustval_types::ServiceType;

fn b64(cert: &TestCert) -> String {
    STANDARD.encode(cert.certificate().der())
}

fn write_pem(path: &Path, certs: &[&TestCert]) {
    let pem: String = certs.iter().map(|c| c.pem()).collect();
    std::fs::write(path, pem).unwrap();
}

fn config(dir: &Path, extra: &str) -> ValidatorConfig {
    let toml = format!(
        "[server]\nbind_address = \"127.0.0.1\"\nport = 0\n\n[cache]\nlocation = {:?}\n\n{extra}",
        dir.join("cache")
    );
    ValidatorConfig::from_toml_str(&toml).unwrap()
}

fn app(validator: &TrustValidator) -> axum::Router {
    trustval_rpc::router(validator.engine(), validator.config().cors.layer())
}

async fn post(app: axum::Router, path: &str, body: Value) -> (StatusCode, Value) {
    let response = app
        .oneshot(
            Request::post(path)
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
        .unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
}

#[tokio::test]
async fn pid_keystore_scenario() {
    let tmp = tempfile::tempdir().unwrap();
    let root = TestCert::root("PID Root");
    write_pem(&tmp.path().join("roots.pem"), &[&root]);
    let config = config(
        tmp.path(),
        &format!(
            "[trust_sources.key_store]\nlocation = {:?}\n",
            tmp.path().join("roots.pem")
        ),
    );
    let validator = TrustValidator::new(config).unwrap();

    let leaf = root.leaf("issuer.example");
    let (status, body) = post(
        app(&validator),
        "/trust",
        json!({ "chain": [b64(&leaf)], "verificationContext": "PID" }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "trusted": true, "trustAnchor": b64(&root) }));

    let stranger = TestCert::root("Unrelated").leaf("issuer.example");
    let (status, body) = post(
        app(&validator),
        "/trust",
        json!({ "chain": [b64(&stranger)], "verificationContext": "PID" }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "trusted": false }));

    let (status, body) = post(
        app(&validator),
        "/trust",
        json!({ "chain": [b64(&leaf)], "verificationContext": "Custom" }),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, json!({ "description": "Missing useCase" }));
}

#[tokio::test]
async fn alias_pattern_limits_keystore_anchors() {
    let tmp = tempfile::tempdir().unwrap();
    let keystore = tmp.path().join("keystore");
    std::fs::create_dir(&keystore).unwrap();
    let pid_root = TestCert::root("PID Root");
    let eaa_root = TestCert::root("EAA Root");
    write_pem(&keystore.join("pid-root.pem"), &[&pid_root]);
    write_pem(&keystore.join("eaa-root.pem"), &[&eaa_root]);

    let config = config(
        tmp.path(),
        &format!(
            "[trust_sources.key_store]\nlocation = {:?}\nkeystore_type = \"dir\"\nalias_pattern = \"^pid-.*$\"\n",
            keystore
        ),
    );
    let validator = TrustValidator::new(config).unwrap();
    let engine = validator.engine();

    let chain = |root: &TestCert| trustval_nullables::pki::chain(&[&root.leaf("x.example")]);
    let pid = trustval_types::VerificationContext::Pid;
    assert!(engine.is_chain_trusted(&chain(&pid_root), &pid).await.unwrap().is_trusted());
    assert!(!engine.is_chain_trusted(&chain(&eaa_root), &pid).await.unwrap().is_trusted());
}

#[tokio::test]
async fn keystore_rescues_unreachable_trusted_list() {
    let tmp = tempfile::tempdir().unwrap();
    let list_root = TestCert::root("List Root");
    let keystore_root = TestCert::root("Keystore Root");
    write_pem(&tmp.path().join("pid-list.pem"), &[&list_root]);
    write_pem(&tmp.path().join("roots.pem"), &[&keystore_root]);

    let extra = format!(
        r#"
[trust_sources.pid_providers]
location = {list:?}
issuance_service = "http://uri.etsi.org/Svc/Svctype/Provider/PID"
revocation_service = "http://uri.etsi.org/Svc/Svctype/Provider/PID/Status"

[[trust_sources.eaa_providers]]
use_case = "mdl"
lotl = {{ location = {missing:?}, issuance_service = "i", revocation_service = "r" }}

[trust_sources.key_store]
location = {keystore:?}
"#,
        list = format!("file://{}", tmp.path().join("pid-list.pem").display()),
        missing = tmp.path().join("missing.pem"),
        keystore = tmp.path().join("roots.pem"),
    );
    let validator = TrustValidator::new(config(tmp.path(), &extra)).unwrap();
    let engine = validator.engine();
    let chain = |root: &TestCert| trustval_nullables::pki::chain(&[&root.leaf("x.example")]);

    // The list answers for PID; the keystore backs it up.
    let pid = trustval_types::VerificationContext::Pid;
    let decision = engine.is_chain_trusted(&chain(&list_root), &pid).await.unwrap();
    assert_eq!(decision.anchor().unwrap(), &list_root.anchor());
    let decision = engine.is_chain_trusted(&chain(&keystore_root), &pid).await.unwrap();
    assert_eq!(decision.anchor().unwrap(), &keystore_root.anchor());

    // The mdl list does not exist: the failure is not fatal and the
    // keystore still vouches.
    let mdl = trustval_types::VerificationContext::Eaa("mdl".into());
    let decision = engine.is_chain_trusted(&chain(&keystore_root), &mdl).await.unwrap();
    assert!(decision.is_trusted());
    let decision = engine.is_chain_trusted(&chain(&list_root), &mdl).await.unwrap();
    assert!(!decision.is_trusted());
    assert!(engine.metrics().source_failures.get() >= 1);

    let metrics = engine.render_metrics();
    assert!(metrics.contains("trustval_queries_total 4"), "{metrics}");
    assert!(metrics.contains(r#"cache="trusted_lists""#), "{metrics}");
}

#[tokio::test]
async fn unconfigured_contexts_are_errors() {
    let tmp = tempfile::tempdir().unwrap();
    let root = TestCert::root("PID Root");
    let leaf = b64(&root.leaf("issuer.example"));

    // Nothing configured at all: server error.
    let empty = TrustValidator::new(config(tmp.path(), "")).unwrap();
    let (status, _) = post(
        app(&empty),
        "/trust",
        json!({ "chain": [leaf], "verificationContext": "PID" }),
    )
    .await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);

    // A list for PID only: other contexts are bad requests.
    write_pem(&tmp.path().join("pid.pem"), &[&root]);
    let extra = format!(
        "[trust_sources.pid_providers]\nlocation = {:?}\nissuance_service = \"i\"\nrevocation_service = \"r\"\n",
        tmp.path().join("pid.pem")
    );
    let validator = TrustValidator::new(config(tmp.path(), &extra)).unwrap();
    for body in [
        json!({ "chain": [leaf], "verificationContext": "QEAA" }),
        json!({ "chain": [leaf], "verificationContext": "Custom", "useCase": "unknown" }),
        json!({ "chain": [leaf], "verificationContext": "EAA", "useCase": "unknown" }),
    ] {
        let (status, body) = post(app(&validator), "/trust", body).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        let description = body["description"].as_str().unwrap();
        assert!(description.starts_with("No configuration found for VerificationContext"));
    }
}

#[tokio::test]
async fn signed_pem_bundle_lists_are_rejected_at_startup() {
    let tmp = tempfile::tempdir().unwrap();
    let root = TestCert::root("Signer");
    write_pem(&tmp.path().join("signers.pem"), &[&root]);
    let extra = format!(
        r#"
[trust_sources.pid_providers]
location = "https://tl.example/pid.pem"
issuance_service = "i"
revocation_service = "r"
signature_verification = {{ location = {:?} }}
"#,
        tmp.path().join("signers.pem")
    );
    match TrustValidator::new(config(tmp.path(), &extra)) {
        Err(EngineError::Config(ConfigError::Source { .. })) => {}
        Err(other) => panic!("unexpected error {other}"),
        Ok(_) => panic!("signed pem-bundle list accepted"),
    }
}

#[tokio::test]
async fn service_type_profile_serves_refreshed_roots() {
    let tmp = tempfile::tempdir().unwrap();
    let root = TestCert::root("PID Provider Root");
    write_pem(&tmp.path().join("pid.pem"), &[&root]);
    let extra = format!(
        "[[service_type_sources]]\nprovider_type = \"PIDProvider\"\nkeystore = {{ location = {:?} }}\n",
        tmp.path().join("pid.pem")
    );
    let mut validator = TrustValidator::new(config(tmp.path(), &extra)).unwrap();
    validator.start().await.unwrap();

    for _ in 0..200 {
        if validator.trust_store().get(ServiceType::PidProvider).await.is_some() {
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }

    let leaf = b64(&root.leaf("issuer.example"));
    let (status, body) = post(
        app(&validator),
        "/trust/service-type",
        json!({ "x5c": [leaf], "serviceType": ServiceType::PidProvider.uri() }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "trusted": true }));

    let (status, body) = post(
        app(&validator),
        "/trust/service-type",
        json!({ "x5c": [leaf], "serviceType": "QEAAProvider" }),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Unknown service type");

    validator.stop().await;
}
