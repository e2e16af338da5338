//! Service layer for the slot watcher.
//!
//! This module contains the business logic for:
//! - Page fetching (`Fetcher`)
//! - Listing parsing (`SlotParser`)
//! - Notification delivery (`MessengerNotifier`)
//! - Webhook subscription checks (`webhook::verify`)

mod fetcher;
mod notifier;
mod parser;
pub mod webhook;

pub use fetcher::{Fetcher, PageSource};
pub use notifier::{
    DeliveryReceipt, LogNotifier, MessageComposer, MessengerNotifier, Notify, classify_response,
};
pub use parser::SlotParser;
