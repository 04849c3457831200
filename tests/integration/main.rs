//! Integration test driver for the `tests/integration/` submodules.
//!
//! Each `mod` below maps to a file that drives whole control cycles
//! through the engine against the mock rig.  All tests run on the host
//! with no real hardware required.

mod engine_tests;
mod mock_hw;
mod session_tests;
