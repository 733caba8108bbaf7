//! E2E test suite entry point.

mod mcp_workflow;
