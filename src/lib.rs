// Library root
// -----------
// This crate exposes a small library surface for the CLI. The binary
// (`main.rs`) uses these modules to implement the interactive CLI.
//
// Module responsibilities:
// - `api`: Endpoint descriptors for the course-recommender API and the
//   blocking dispatcher that classifies each response into an `Outcome`.
// - `interpret`: Per-endpoint result-shape rules turning an `Outcome`
//   into a display instruction (the one piece of real domain logic).
// - `ui`: Implements the terminal menu flows, parameter prompts and
//   table rendering, and delegates requests to `api`.
//
// Keeping this separation makes it easier to test the dispatch and
// interpretation logic or replace the UI in the future (for example,
// adding a TUI or GUI).
pub mod api;
pub mod interpret;
pub mod ui;
