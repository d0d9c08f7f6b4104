#![no_main]

use jwt_mock::server::extract;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let _ = extract::token_request(data);
});
