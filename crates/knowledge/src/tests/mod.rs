//! Cross-module tests for the knowledge crate.

pub(crate) mod support;
