//! Property test suite entry point.

mod manifest_props;
mod slug_props;
mod uri_props;
