//! Core catalog rebuild logic.
//!
//! This crate ties together dataset discovery, path classification, entry
//! construction and catalog assembly into the end-to-end `rebuild` workflow.

pub mod assembler;
pub mod classify;
pub mod entry;
pub mod pipeline;
pub mod scan;
