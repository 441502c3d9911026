// Library root
// -----------
// This crate exposes a small library surface for the CLI. The binary
// (`main.rs`) parses arguments, runs one command and prints its envelope.
//
// Module responsibilities:
// - `api`: the authenticated HTTP session (login, user lookup, followers,
//   profile image).
// - `banner`: the authenticated-POST capability and the banner extension
//   built on it.
// - `followers`: follower record projection.
// - `envelope`: the one-line JSON result printed per run.
// - `config`: credentials and target handle from the environment.
// - `commands`: argument definitions and the three flows.
pub mod api;
pub mod banner;
pub mod commands;
pub mod config;
pub mod envelope;
pub mod followers;
