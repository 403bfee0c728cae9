//! Error types for satnet core.

use thiserror::Error;

/// Errors raised while building topology or routing components.
///
/// Path-walk failures and unreachable destinations are not errors; they
/// are ordinary outcomes recorded in statistics.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CoreError {
    /// Grid dimensions are unusable
    #[error("Invalid grid {p}x{q}: {reason}")]
    InvalidGrid { p: usize, q: usize, reason: String },
    
    /// Domain partition does not tile the grid
    #[error("Domain {kp}x{kn} does not divide grid {p}x{q}")]
    IndivisibleDomain { kp: usize, kn: usize, p: usize, q: usize },
    
    /// No algorithm registered under this id
    #[error("Unknown algorithm id {id} (known: {known})")]
    UnknownAlgorithm { id: u32, known: String },
}
