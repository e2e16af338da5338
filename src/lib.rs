// src/lib.rs

//! slotwatch library: watches a driving-school booking page and reports new
//! lesson slots over Messenger.

pub mod error;
#[cfg(feature = "lambda")]
pub mod lambda;
pub mod models;
pub mod pipeline;
pub mod services;
pub mod storage;
pub mod utils;
