//! Forwarding pipelines and strategies.

pub mod adaptive;
pub mod algorithm;
pub mod forwarder;
pub mod multicast;
pub mod strategy;
pub mod unsolicited;

#[cfg(test)]
mod tests;
