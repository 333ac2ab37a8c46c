//! Render pipeline tests, run against the library from the binary crate.
