/// Command-line surface tests.
mod cli;
/// Helpers.
mod common;
