//! Forwarding tables.
//!
//! The [`name_tree::NameTree`] is the shared index: FIB entries, Measurements
//! entries and PIT attachments all live on its nodes, so a single walk of a
//! name's prefixes reaches every table at once.

pub mod cs;
pub mod cs_policy;
pub mod dead_nonce_list;
pub mod fib;
pub mod measurements;
pub mod name_tree;
pub mod pit;
pub mod strategy_choice;
