//! Per-product facades over the shared client core.
//!
//! Each facade validates what it can locally, builds the wire body, sends it
//! through `ClientCore`, and returns a typed result.

mod akuma;
mod enzan;
mod sozo;

pub use akuma::AkumaClient;
pub use enzan::EnzanClient;
pub use sozo::SozoClient;
