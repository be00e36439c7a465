//! Library wrapper around the `contrail` CLI.
//!
//! Compiling the binary root as a module lets `cargo test -p contrail-cli --lib`
//! typecheck the CLI without building the integration tests.

#[allow(dead_code)]
#[path = "main.rs"]
mod main_bin;
