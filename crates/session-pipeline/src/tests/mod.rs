//! Integration tests for the session pipeline.
//!
//! - `harness.rs`   - Session wired to a scripted transport and memory store
//! - `retry.rs`     - Single retry after refresh (P1, Scenario D)
//! - `refresh.rs`   - Single-flight refresh under concurrency (P2)
//! - `logout.rs`    - Logout always clears (P3)
//! - `guard.rs`     - Guard loading, redirect, and reactivity (P4)
//! - `identity.rs`  - Startup check and cached identity fallback (P5, Scenarios A-B)
//! - `login.rs`     - Login outcomes (Scenario C)

mod identity;
mod logout;
mod refresh;
