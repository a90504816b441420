//! Test harness for CLI integration tests.
//!
//! Provides isolated test environments holding a copy of the fixture world,
//! and CLI assertion helpers using `assert_cmd`.

mod command;
mod env;

// Re-export main types for external use
#[allow(unused_imports)]
pub use command::LorekeepCommand;
#[allow(unused_imports)]
pub use env::TestEnv;
