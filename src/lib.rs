//! Host package for workspace-level integration tests; see `tests/`.
//! The published crates live in the workspace members.
