//! Cucumber step definitions for interface tests.

pub mod promise;
