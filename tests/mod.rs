//! Test suite for offline-queue
//!
//! This module organizes all tests

pub mod common;
pub mod integration;
