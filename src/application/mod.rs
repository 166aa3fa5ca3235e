//! Application layer containing the core business logic orchestration.
//!
//! This module defines the `TransferEngine`, the only writer of balances and
//! of the transaction log, together with the per-account lock table it uses
//! to keep concurrent transfers isolated.

pub mod engine;
pub mod locks;
