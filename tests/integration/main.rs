//! Integration tests for the lesson catalog

mod cascade;
mod cli_contracts;
mod import_idempotence;
mod lesson_scenario;
mod sled_persistence;
mod support;
