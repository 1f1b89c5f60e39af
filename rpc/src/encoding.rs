//! Base64 certificate encoding.
//!
//! Decoding accepts standard-alphabet input with or without padding and
//! ignores embedded whitespace. Encoding always produces padded standard
//! base64.

use base64::alphabet;
use base64::engine::general_purpose::{GeneralPurpose, GeneralPurposeConfig, STANDARD};
use base64::engine::DecodePaddingMode;
use base64::Engine;

use trustval_types::{Certificate, CertificateChain};

use crate::error::RpcError;

const LENIENT: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new().with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

pub fn decode_base64(input: &str) -> Result<Vec<u8>, base64::DecodeError> {
    let compact: String = input.chars().filter(|c| !c.is_ascii_whitespace()).collect();
    LENIENT.decode(compact)
}

pub fn encode_certificate(cert: &Certificate) -> String {
    STANDARD.encode(cert.der())
}

/// Decode a leaf-first list of base64 DER certificates.
pub fn decode_chain(encoded: &[String]) -> Result<CertificateChain, RpcError> {
    let mut certs = Vec::with_capacity(encoded.len());
    for (index, item) in encoded.iter().enumerate() {
        let der = decode_base64(item)
            .map_err(|e| RpcError::InvalidChain(format!("certificate {index}: {e}")))?;
        let cert = Certificate::from_der(der)
            .map_err(|e| RpcError::InvalidChain(format!("certificate {index}: {e}")))?;
        certs.push(cert);
    }
    CertificateChain::new(certs).map_err(|e| RpcError::InvalidChain(e.to_string()))
}
