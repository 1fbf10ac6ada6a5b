//! Step definitions for daily automation behaviour tests.

pub mod when;
