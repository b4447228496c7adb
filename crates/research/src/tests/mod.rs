//! Scenario tests for the report cycle.

pub(crate) mod fakes;
