#![no_main]

use chrono::Utc;
use jwt_mock::keys::SigningKey;
use jwt_mock::server::extract;
use jwt_mock::token;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(claims) = extract::claims(data) {
        // One instant for both checks, so an `exp` of "now" cannot lapse in between.
        let now = Utc::now();
        if claims.validate_at(now).is_ok() {
            let key = SigningKey::secret("fuzz", b"fuzz-secret");
            let token = token::sign_at(&claims, &key, now).expect("validated claims sign");
            assert_eq!(token.split('.').count(), 3);
        }
    }
});
