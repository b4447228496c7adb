//! Property and scenario tests spanning several modules.

mod fakes;
mod pipeline;
