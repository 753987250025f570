//! Capture buffer size negotiation.
//!
//! The platform's minimum buffer size is probed at the requested sample
//! rate first, then across a fixed list of standard rates, accepting the
//! first rate the platform reports a valid minimum for. Capture still
//! runs at the caller's configured rate; only the working buffer size
//! comes from the accepted probe.

use crate::RecordError;

/// Standard rates probed, in descending preference order, when the
/// requested rate is rejected.
pub const CANDIDATE_RATES: [u32; 5] = [44_100, 22_050, 16_000, 11_025, 8_000];

/// The working capture buffer is the platform minimum times this factor.
const OVERSAMPLE_FACTOR: usize = 1;

/// Outcome of a successful negotiation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NegotiatedBuffer {
    /// The probe rate the platform accepted.
    pub rate: u32,
    /// Working capture buffer size in bytes. Always positive.
    pub size: usize,
}

/// Selects a capture buffer size compatible with `requested` Hz.
///
/// `probe` reports the platform's minimum buffer size in bytes for a
/// given rate, or `None` if the rate is unsupported. A reported minimum
/// of zero counts as a rejection; a zero or negative size is never
/// passed downstream.
///
/// # Errors
///
/// Returns [`RecordError::NoSupportedRate`] when the requested rate and
/// every candidate are rejected. This is fatal to session setup; there
/// is no silent fallback to the requested rate.
///
/// # Example
///
/// ```
/// use record_audio::source::negotiate;
///
/// let negotiated = negotiate(16000, |rate| (rate == 16000).then_some(1280)).unwrap();
/// assert_eq!(negotiated.rate, 16000);
/// assert_eq!(negotiated.size, 1280);
/// ```
pub fn negotiate(
    requested: u32,
    mut probe: impl FnMut(u32) -> Option<usize>,
) -> Result<NegotiatedBuffer, RecordError> {
    let mut probed = Vec::with_capacity(1 + CANDIDATE_RATES.len());

    let candidates = std::iter::once(requested)
        .chain(CANDIDATE_RATES.iter().copied().filter(|&r| r != requested));

    for rate in candidates {
        probed.push(rate);
        match probe(rate) {
            Some(min) if min > 0 => {
                let size = min * OVERSAMPLE_FACTOR;
                tracing::debug!(rate, size, "capture buffer negotiated");
                return Ok(NegotiatedBuffer { rate, size });
            }
            _ => {}
        }
    }

    Err(RecordError::NoSupportedRate { probed })
}
