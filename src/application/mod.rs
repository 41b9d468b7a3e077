//! Application layer containing the checkout lifecycle orchestration.
//!
//! This module defines the `PaymentSession` which owns a single payment
//! attempt from phone submission through gateway polling to a terminal
//! outcome. It is a cooperative state machine driven by caller events.

pub mod session;
