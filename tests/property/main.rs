//! Property tests, gathered into one test binary.

mod depth;
mod edit_distance;
mod idempotence;
