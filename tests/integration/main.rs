//! Integration test suite entry point.

mod archive_tests;
mod registry_tests;
mod resource_tests;
mod usage_tests;
