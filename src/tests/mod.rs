//! Test modules for GameSaleBot
//!
//! Tests that need HTTP mocks or temp files live here; small pure-function
//! tests stay next to the code they cover.

#[cfg(test)]
pub mod seen_store_tests;
