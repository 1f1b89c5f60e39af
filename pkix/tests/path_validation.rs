//! Path validation against generated hierarchies.

use rcgen::{BasicConstraints, DistinguishedName, DnType, KeyPair, KeyUsagePurpose};
use trustval_nullables::pki::{self, anchors, ca_params, chain, leaf_params, TestCert};
use trustval_pkix::{ChainValidator, PathValidationError};
use trustval_types::{GeneralSubtree, NameConstraints, Timestamp, TrustAnchor, TrustAnchorSet};

/// 2025-06-15, inside the default rcgen validity window.
fn now() -> Timestamp {
    Timestamp::new(1_750_000_000)
}

fn validate(
    chain: &trustval_types::CertificateChain,
    anchors: &TrustAnchorSet,
) -> Result<TrustAnchor, PathValidationError> {
    ChainValidator::default().validate(chain, anchors, now())
}

#[test]
fn leaf_signed_by_anchor_is_trusted() {
    let root = TestCert::root("Root R");
    let leaf = root.leaf("pid.example.com");

    let anchor = validate(&chain(&[&leaf]), &anchors(&[&root])).unwrap();
    assert_eq!(anchor.certificate(), &root.certificate());

    // The same chain with the anchor appended terminates at the same anchor.
    let anchor = validate(&chain(&[&leaf, &root]), &anchors(&[&root])).unwrap();
    assert_eq!(anchor.certificate(), &root.certificate());
}

#[test]
fn chain_without_its_anchor_is_rejected() {
    let root = TestCert::root("Root R");
    let other = TestCert::root("Root S");
    let leaf = root.leaf("pid.example.com");

    let err = validate(&chain(&[&leaf, &root]), &anchors(&[&other])).unwrap_err();
    assert!(matches!(err, PathValidationError::NoMatchingAnchor { .. }));
}

#[test]
fn anchor_with_same_name_but_different_key_is_rejected() {
    let root = TestCert::root("Root R");
    let impostor = TestCert::root("Root R");
    let leaf = root.leaf("pid.example.com");

    let err = validate(&chain(&[&leaf]), &anchors(&[&impostor])).unwrap_err();
    assert!(matches!(err, PathValidationError::NoMatchingAnchor { depth: 0, .. }));
}

#[test]
fn expired_leaf_is_rejected_regardless_of_anchors() {
    let root = TestCert::root("Root R");
    let mut params = leaf_params("old.example.com");
    params.not_before = rcgen::date_time_ymd(2000, 1, 1);
    params.not_after = rcgen::date_time_ymd(2001, 1, 1);
    let leaf = root.issue(params);

    let err = validate(&chain(&[&leaf]), &anchors(&[&root])).unwrap_err();
    assert!(matches!(err, PathValidationError::Expired { depth: 0, .. }));

    let err = validate(&chain(&[&leaf, &root]), &anchors(&[&root])).unwrap_err();
    assert!(matches!(err, PathValidationError::Expired { depth: 0, .. }));
}

fn self_signed(params: rcgen::CertificateParams) -> TestCert {
    let key = KeyPair::generate().unwrap();
    let cert = params.self_signed(&key).unwrap();
    TestCert { cert, key }
}

#[test]
fn expired_leaf_that_is_itself_an_anchor_is_rejected() {
    let mut params = leaf_params("old.example.com");
    params.not_before = rcgen::date_time_ymd(2000, 1, 1);
    params.not_after = rcgen::date_time_ymd(2001, 1, 1);
    let leaf = self_signed(params);

    let err = validate(&chain(&[&leaf]), &anchors(&[&leaf])).unwrap_err();
    assert!(matches!(err, PathValidationError::Expired { depth: 0, .. }));
}

#[test]
fn presented_anchor_must_be_within_its_validity_period() {
    let mut params = ca_params("Old Root", BasicConstraints::Unconstrained);
    params.not_before = rcgen::date_time_ymd(2000, 1, 1);
    params.not_after = rcgen::date_time_ymd(2001, 1, 1);
    let root = self_signed(params);
    let leaf = root.leaf("pid.example.com");

    let err = validate(&chain(&[&leaf, &root]), &anchors(&[&root])).unwrap_err();
    assert!(matches!(err, PathValidationError::Expired { depth: 1, .. }));

    // An anchor that is only configured, not presented, is not date-checked.
    assert!(validate(&chain(&[&leaf]), &anchors(&[&root])).is_ok());
}

#[test]
fn not_yet_valid_leaf_is_rejected() {
    let root = TestCert::root("Root R");
    let mut params = leaf_params("future.example.com");
    params.not_before = rcgen::date_time_ymd(2040, 1, 1);
    params.not_after = rcgen::date_time_ymd(2041, 1, 1);
    let leaf = root.issue(params);

    let err = validate(&chain(&[&leaf]), &anchors(&[&root])).unwrap_err();
    assert!(matches!(err, PathValidationError::NotYetValid { depth: 0, .. }));
}

#[test]
fn three_level_chain_validates() {
    let root = TestCert::root("Root R");
    let int = root.intermediate("Issuing CA");
    let leaf = int.leaf("qeaa.example.com");

    let anchor = validate(&chain(&[&leaf, &int]), &anchors(&[&root])).unwrap();
    assert_eq!(anchor.certificate(), &root.certificate());
}

#[test]
fn intermediate_anchor_truncates_the_path() {
    let root = TestCert::root("Root R");
    let int = root.intermediate("Issuing CA");
    let leaf = int.leaf("qeaa.example.com");

    let anchor = validate(&chain(&[&leaf, &int, &root]), &anchors(&[&int])).unwrap();
    assert_eq!(anchor.certificate(), &int.certificate());
}

#[test]
fn swapped_intermediate_breaks_the_signature() {
    let root = TestCert::root("Root R");
    let int = root.intermediate("Issuing CA");
    let twin = root.intermediate("Issuing CA");
    let leaf = int.leaf("qeaa.example.com");

    let err = validate(&chain(&[&leaf, &twin]), &anchors(&[&root])).unwrap_err();
    assert!(matches!(err, PathValidationError::SignatureInvalid { depth: 0, .. }));
}

#[test]
fn non_ca_issuer_is_rejected() {
    let root = TestCert::root("Root R");
    let not_ca = root.issue(leaf_params("server.example.com"));
    let leaf = not_ca.leaf("client.example.com");

    let err = validate(&chain(&[&leaf, &not_ca]), &anchors(&[&root])).unwrap_err();
    assert!(matches!(err, PathValidationError::NotCa { depth: 1, .. }));
}

#[test]
fn ca_without_key_cert_sign_is_rejected() {
    let root = TestCert::root("Root R");
    let mut params = ca_params("Issuing CA", BasicConstraints::Unconstrained);
    params.key_usages = vec![KeyUsagePurpose::DigitalSignature];
    let int = root.issue(params);
    let leaf = int.leaf("a.example.com");

    let err = validate(&chain(&[&leaf, &int]), &anchors(&[&root])).unwrap_err();
    assert!(matches!(err, PathValidationError::KeyCertSignMissing { depth: 1, .. }));
}

#[test]
fn path_length_constraint_is_enforced() {
    let root = TestCert::root("Root R");
    let policy_ca = root.issue(ca_params("Policy CA", BasicConstraints::Constrained(0)));
    let issuing_ca = policy_ca.intermediate("Issuing CA");
    let leaf = issuing_ca.leaf("a.example.com");

    let err = validate(&chain(&[&leaf, &issuing_ca, &policy_ca]), &anchors(&[&root])).unwrap_err();
    assert!(matches!(err, PathValidationError::PathLenExceeded { depth: 2, .. }));

    // pathLen 0 still allows issuing end-entity certificates directly.
    let direct = policy_ca.leaf("b.example.com");
    assert!(validate(&chain(&[&direct, &policy_ca]), &anchors(&[&root])).is_ok());
}

#[test]
fn anchor_name_constraints_are_enforced() {
    let root = TestCert::root("Root R");
    let constraints = NameConstraints {
        permitted: vec![GeneralSubtree::Dns("example.com".into())],
        excluded: Vec::new(),
    };
    let anchors = TrustAnchorSet::new(vec![root.anchor().with_name_constraints(constraints)]);

    let inside = root.leaf("wallet.example.com");
    assert!(validate(&chain(&[&inside]), &anchors).is_ok());

    let outside = root.leaf("wallet.example.org");
    let err = validate(&chain(&[&outside]), &anchors).unwrap_err();
    assert_eq!(
        err,
        PathValidationError::NameConstraintViolation {
            depth: 0,
            name: "wallet.example.org".into()
        }
    );
}

#[test]
fn intermediate_name_constraints_are_enforced() {
    let root = TestCert::root("Root R");
    let mut params = ca_params("Constrained CA", BasicConstraints::Unconstrained);
    params.name_constraints = Some(rcgen::NameConstraints {
        permitted_subtrees: Vec::new(),
        excluded_subtrees: vec![rcgen::GeneralSubtree::DnsName("blocked.example".into())],
    });
    let int = root.issue(params);

    let allowed = int.leaf("ok.example");
    assert!(validate(&chain(&[&allowed, &int]), &anchors(&[&root])).is_ok());

    let blocked = int.leaf("a.blocked.example");
    let err = validate(&chain(&[&blocked, &int]), &anchors(&[&root])).unwrap_err();
    assert!(matches!(
        err,
        PathValidationError::NameConstraintViolation { depth: 0, .. }
    ));
}

#[test]
fn intermediate_directory_name_constraints_are_enforced() {
    let mut org = DistinguishedName::new();
    org.push(DnType::OrganizationName, "Example Org");

    let root = TestCert::root("Root R");
    let mut params = ca_params("Constrained CA", BasicConstraints::Unconstrained);
    params.name_constraints = Some(rcgen::NameConstraints {
        permitted_subtrees: vec![rcgen::GeneralSubtree::DirectoryName(org)],
        excluded_subtrees: Vec::new(),
    });
    let int = root.issue(params);

    let mut inside = leaf_params("ok.example");
    inside.distinguished_name = DistinguishedName::new();
    inside.distinguished_name.push(DnType::OrganizationName, "Example Org");
    inside.distinguished_name.push(DnType::CommonName, "ok.example");
    let allowed = int.issue(inside);
    assert!(validate(&chain(&[&allowed, &int]), &anchors(&[&root])).is_ok());

    // Subject is only CN=other.example, outside O=Example Org.
    let outside = int.leaf("other.example");
    let err = validate(&chain(&[&outside, &int]), &anchors(&[&root])).unwrap_err();
    assert!(matches!(
        err,
        PathValidationError::NameConstraintViolation { depth: 0, .. }
    ));
}

#[test]
fn rejection_under_one_anchor_falls_through_to_the_next() {
    let root = TestCert::root("Root R");
    let leaf = root.leaf("pid.example.com");
    let constrained = root.anchor().with_name_constraints(NameConstraints {
        permitted: Vec::new(),
        excluded: vec![GeneralSubtree::Dns("pid.example.com".into())],
    });

    let only_constrained = TrustAnchorSet::new(vec![constrained.clone()]);
    let err = validate(&chain(&[&leaf]), &only_constrained).unwrap_err();
    assert!(matches!(err, PathValidationError::NameConstraintViolation { .. }));

    let both = TrustAnchorSet::new(vec![constrained, root.anchor()]);
    let anchor = validate(&chain(&[&leaf]), &both).unwrap();
    assert!(anchor.name_constraints().is_none());
}

#[test]
fn overly_long_chain_is_rejected() {
    let root = TestCert::root("Root R");
    let leaf = root.leaf("a.example.com");
    let certs: Vec<&TestCert> = std::iter::repeat(&leaf).take(17).collect();

    let err = validate(&pki::chain(&certs), &anchors(&[&root])).unwrap_err();
    assert!(matches!(err, PathValidationError::ChainTooLong { max: 16 }));
}
