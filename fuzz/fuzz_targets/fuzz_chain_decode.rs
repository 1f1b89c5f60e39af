#![no_main]

use libfuzzer_sys::fuzz_target;
use trustval_types::{Certificate, CertificateChain};

// Arbitrary DER must be rejected, never panic.
fuzz_target!(|data: &[u8]| {
    if let Ok(cert) = Certificate::from_der(data) {
        assert_eq!(cert.der(), data);
        let _ = cert.subject();
    }

    // Treat NUL bytes as separators between chain members.
    let _ = CertificateChain::from_der_list(data.split(|b| *b == 0));

    // Same input through the base64 path of the HTTP layer.
    if let Ok(text) = std::str::from_utf8(data) {
        let encoded: Vec<String> = text.split(',').map(str::to_owned).collect();
        let _ = trustval_rpc::encoding::decode_chain(&encoded);
    }
});
