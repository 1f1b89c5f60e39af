#![no_main]

use libfuzzer_sys::fuzz_target;

// Downloaded trusted lists and keystore files are untrusted input.
fuzz_target!(|data: &[u8]| {
    if let Ok(certs) = trustval_sources::pem::parse_pem_bundle(data) {
        assert!(!certs.is_empty());
    }
    let _ = trustval_sources::pem::parse_certificate_file(data);
});
