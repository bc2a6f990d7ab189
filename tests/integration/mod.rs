//! Integration tests
//!
//! Queue behaviour end to end: lifecycle over real storage, in-flight
//! concurrency, and HTTP replay.

mod http_test;
mod lifecycle_test;
