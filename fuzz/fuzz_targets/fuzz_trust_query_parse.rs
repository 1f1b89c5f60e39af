#![no_main]

use libfuzzer_sys::fuzz_target;
use trustval_rpc::handlers::{ServiceTypeQueryRequest, TrustQueryRequest};
use trustval_types::ServiceType;

fuzz_target!(|data: &[u8]| {
    if let Ok(request) = serde_json::from_slice::<TrustQueryRequest>(data) {
        let _ = request.verification_context.with_use_case(request.use_case);
        let _ = trustval_rpc::encoding::decode_chain(&request.chain);
    }
    if let Ok(request) = serde_json::from_slice::<ServiceTypeQueryRequest>(data) {
        let _ = request.service_type.parse::<ServiceType>();
    }
});
