//! # testlink-listener: back-channel receiver
//!
//! Accepts client sessions on a loopback port, decodes their frames and
//! checks each session against the expected order: one start
//! notification, any number of test/result/console events, one end
//! notification, then close.

pub mod server;
