//! Fuzzing library for jwt-mock.
//!
//! Targets exercise the request body decoders and claim validation with
//! arbitrary bytes; none of them may panic.
//!
//! # Usage
//!
//! ```bash
//! cd crates/jwt-mock-fuzz
//! cargo +nightly fuzz run fuzz_token_form -- -max_total_time=60
//! ```

pub use jwt_mock::server::extract;
pub use jwt_mock::token::Claims;
