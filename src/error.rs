//! The crate's only error type.
//!
//! Almost every failure mode in this crate is either a contract violation
//! (diagnosed with `debug_assert!`, never recovered) or a silent numeric
//! no-op. The one real, recoverable failure is a malformed path: a
//! non-`Move` command appended before the first `Move`.
//!
//! Everything else (misaligned pixel buffer, rasterize-before-initialise,
//! stride not a multiple of 4) stays an assertion, and gradient stop/length
//! values are clamped rather than rejected; there is nothing left to make
//! fallible.
#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathError {
    #[error("path command appended before the first moveTo")]
    InvalidState,
}
