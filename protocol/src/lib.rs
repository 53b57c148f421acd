// Copyright (c) 2026 ALAS Technology. MIT License.
// See LICENSE for details.

//! # Lockbox Protocol: shared primitives
//!
//! The small set of types every other Lockbox crate agrees on. Nothing in
//! here knows what a deposit or a receipt is; that lives in
//! `lockbox-contracts`. This crate only answers three questions:
//!
//! - **Who?**: [`identity::Address`], the opaque account key.
//! - **When?**: [`time::Clock`], an injectable source of "now".
//! - **How much?**: [`units`], fixed-point amounts in smallest units.
//!
//! Plus [`config`], where the protocol constants live.
//!
//! ## Design Philosophy
//!
//! 1. Time is an input, never a side effect. The ledger asks a clock; it
//!    never reads the wall clock behind your back.
//! 2. Amounts are integers. The decimal point exists only at the edges
//!    (parsing user input, printing output).
//! 3. Identities are cheap `Copy` values so they can be passed around freely.

pub mod config;
pub mod identity;
pub mod time;
pub mod units;

pub use identity::Address;
pub use time::{Clock, ManualClock, SystemClock};
pub use units::Amount;
