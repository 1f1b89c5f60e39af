//! Certificate file decoding (PEM bundles and bare DER).

use x509_parser::pem::Pem;

use trustval_types::{Certificate, FetchError};

/// Decode every `CERTIFICATE` block of a PEM document.
///
/// Non-certificate blocks are skipped. Trailing garbage after at least one
/// certificate is ignored; a document with no certificates is an error.
pub fn parse_pem_bundle(input: &[u8]) -> Result<Vec<Certificate>, FetchError> {
    let mut certs = Vec::new();
    for block in Pem::iter_from_buffer(input) {
        match block {
            Ok(pem) if pem.label == "CERTIFICATE" || pem.label == "TRUSTED CERTIFICATE" => {
                let cert = Certificate::from_der(pem.contents)
                    .map_err(|e| FetchError::Parse(e.to_string()))?;
                certs.push(cert);
            }
            Ok(_) => {}
            Err(_) if !certs.is_empty() => break,
            Err(e) => return Err(FetchError::Parse(format!("failed to parse PEM: {e}"))),
        }
    }
    if certs.is_empty() {
        return Err(FetchError::Parse("no certificates found in PEM input".into()));
    }
    Ok(certs)
}

/// Decode a certificate file that is either PEM (one or more blocks) or a
/// single DER certificate.
pub fn parse_certificate_file(input: &[u8]) -> Result<Vec<Certificate>, FetchError> {
    if looks_like_pem(input) {
        parse_pem_bundle(input)
    } else {
        Certificate::from_der(input.to_vec())
            .map(|c| vec![c])
            .map_err(|e| FetchError::Parse(e.to_string()))
    }
}

fn looks_like_pem(input: &[u8]) -> bool {
    input
        .windows(b"-----BEGIN".len())
        .any(|w| w == b"-----BEGIN")
}
