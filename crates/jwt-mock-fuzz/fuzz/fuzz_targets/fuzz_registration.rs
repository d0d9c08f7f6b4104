#![no_main]

use jwt_mock::server::extract;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(registration) = extract::registration(data) {
        // Anything accepted must have come from a JSON object.
        let value: serde_json::Value = serde_json::from_slice(data).expect("decoded once already");
        assert_eq!(value["client_id"].as_str(), Some(registration.id.as_str()));
    }
});
