//! Outbound payload fragmentation for MTU-limited notification transport
//!
//! A GATT notification carries at most the negotiated link MTU minus a fixed
//! per-notification overhead. Payloads larger than that are split into an
//! ordered sequence of fragments, each emitted as one characteristic update.
//! Fragments carry no header of their own; the receiving side sees a plain
//! byte stream and reassembles by concatenation.
//!
//! Fragmentation covers every payload byte exactly once: every fragment
//! except possibly the last has the effective fragment size, and a payload
//! whose length is an exact multiple of that size ends with a full-size
//! fragment rather than an empty remainder.

use async_trait::async_trait;
use tracing::debug;

use crate::errors::{BridgeError, Result};

// ----------------------------------------------------------------------------
// Constants
// ----------------------------------------------------------------------------

/// Bytes reserved per notification for protocol overhead
pub const NOTIFY_OVERHEAD: usize = 5;

/// Fragment size used when no MTU negotiation data is available
pub const DEFAULT_FRAGMENT_SIZE: usize = 20;

// ----------------------------------------------------------------------------
// Fragment Sizing
// ----------------------------------------------------------------------------

/// Effective fragment size for a negotiated link MTU
///
/// `None` means the link never reported an MTU; the conservative default
/// applies. The result is clamped so a pathological MTU report can never
/// produce a zero-size fragment.
pub fn effective_fragment_size(negotiated_mtu: Option<usize>) -> usize {
    match negotiated_mtu {
        Some(mtu) => mtu.saturating_sub(NOTIFY_OVERHEAD).max(1),
        None => DEFAULT_FRAGMENT_SIZE,
    }
}

/// Number of fragments a payload of `payload_len` bytes will produce
pub fn fragment_count(payload_len: usize, fragment_size: usize) -> usize {
    payload_len.div_ceil(fragment_size)
}

// ----------------------------------------------------------------------------
// Fragment Stream
// ----------------------------------------------------------------------------

/// Iterator over the ordered MTU-bounded fragments of one payload
///
/// Yields borrowed slices; an empty payload yields no fragments.
pub struct FragmentStream<'a> {
    payload: &'a [u8],
    fragment_size: usize,
    offset: usize,
}

impl<'a> FragmentStream<'a> {
    /// Fragment `payload` into slices of at most `fragment_size` bytes
    pub fn new(payload: &'a [u8], fragment_size: usize) -> Result<Self> {
        if fragment_size == 0 {
            return Err(BridgeError::InvalidConfiguration {
                reason: "fragment size must be at least 1 byte".into(),
            });
        }
        Ok(Self {
            payload,
            fragment_size,
            offset: 0,
        })
    }

    /// Fragments remaining to be yielded
    pub fn remaining(&self) -> usize {
        fragment_count(self.payload.len() - self.offset, self.fragment_size)
    }
}

impl<'a> Iterator for FragmentStream<'a> {
    type Item = &'a [u8];

    fn next(&mut self) -> Option<&'a [u8]> {
        if self.offset >= self.payload.len() {
            return None;
        }
        let end = usize::min(self.offset + self.fragment_size, self.payload.len());
        let fragment = &self.payload[self.offset..end];
        self.offset = end;
        Some(fragment)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.remaining();
        (remaining, Some(remaining))
    }
}

// ----------------------------------------------------------------------------
// Notify Sink
// ----------------------------------------------------------------------------

/// Destination for outbound fragments
///
/// Implemented by the GATT notification path. `send_fragment` returns
/// whether the subscriber is still notifying; once it reports `false` the
/// writer stops emitting. Truncated transfers are the consumer's problem
/// to detect.
#[async_trait]
pub trait NotifySink: Send {
    async fn send_fragment(&mut self, fragment: &[u8]) -> Result<bool>;
}

// ----------------------------------------------------------------------------
// Fragment Writer
// ----------------------------------------------------------------------------

/// Drives one payload through a [`NotifySink`] as ordered fragments
pub struct FragmentWriter {
    fragment_size: usize,
}

impl FragmentWriter {
    /// Create a writer emitting fragments of at most `fragment_size` bytes
    pub fn new(fragment_size: usize) -> Result<Self> {
        if fragment_size == 0 {
            return Err(BridgeError::InvalidConfiguration {
                reason: "fragment size must be at least 1 byte".into(),
            });
        }
        Ok(Self { fragment_size })
    }

    /// Create a writer sized for a negotiated link MTU
    pub fn for_link_mtu(negotiated_mtu: Option<usize>) -> Self {
        Self {
            fragment_size: effective_fragment_size(negotiated_mtu),
        }
    }

    /// Fragment size this writer emits
    pub fn fragment_size(&self) -> usize {
        self.fragment_size
    }

    /// Emit `payload` through `sink`, one fragment per notification
    ///
    /// Returns the number of fragments actually sent. Stops early without
    /// error when the sink reports the subscriber is no longer notifying.
    pub async fn write_all<S: NotifySink>(&self, payload: &[u8], sink: &mut S) -> Result<usize> {
        let total = fragment_count(payload.len(), self.fragment_size);
        let mut sent = 0;

        for fragment in FragmentStream::new(payload, self.fragment_size)? {
            if !sink.send_fragment(fragment).await? {
                debug!(
                    "subscriber stopped notifying after {}/{} fragments",
                    sent, total
                );
                return Ok(sent);
            }
            sent += 1;
        }

        debug!("sent {} fragment(s), {} bytes total", sent, payload.len());
        Ok(sent)
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    /// Sink that records fragments and can stop notifying after a set count
    struct RecordingSink {
        fragments: Vec<Vec<u8>>,
        stop_after: Option<usize>,
    }

    impl RecordingSink {
        fn new() -> Self {
            Self {
                fragments: Vec::new(),
                stop_after: None,
            }
        }

        fn stopping_after(count: usize) -> Self {
            Self {
                fragments: Vec::new(),
                stop_after: Some(count),
            }
        }
    }

    #[async_trait]
    impl NotifySink for RecordingSink {
        async fn send_fragment(&mut self, fragment: &[u8]) -> Result<bool> {
            if let Some(limit) = self.stop_after {
                if self.fragments.len() >= limit {
                    return Ok(false);
                }
            }
            self.fragments.push(fragment.to_vec());
            Ok(true)
        }
    }

    #[test]
    fn test_effective_fragment_size() {
        assert_eq!(effective_fragment_size(Some(185)), 180);
        assert_eq!(effective_fragment_size(Some(23)), 18);
        assert_eq!(effective_fragment_size(None), DEFAULT_FRAGMENT_SIZE);
        // Pathological MTU reports never collapse to zero
        assert_eq!(effective_fragment_size(Some(5)), 1);
        assert_eq!(effective_fragment_size(Some(0)), 1);
    }

    #[test]
    fn test_exact_coverage_across_lengths() {
        // Includes L < M, L = M, exact multiples, off-by-one either side,
        // and the empty payload.
        for fragment_size in [1usize, 3, 7, 20, 180] {
            for payload_len in [0usize, 1, 5, 19, 20, 21, 40, 59, 60, 61, 400] {
                let payload: Vec<u8> = (0..payload_len).map(|i| (i % 251) as u8).collect();
                let fragments: Vec<&[u8]> = FragmentStream::new(&payload, fragment_size)
                    .unwrap()
                    .collect();

                assert_eq!(
                    fragments.len(),
                    fragment_count(payload_len, fragment_size),
                    "count mismatch for L={payload_len} M={fragment_size}"
                );

                // Every fragment but the last is full-size; the last is
                // L mod M, or M when L is an exact multiple.
                for fragment in fragments.iter().take(fragments.len().saturating_sub(1)) {
                    assert_eq!(fragment.len(), fragment_size);
                }
                if let Some(last) = fragments.last() {
                    let expected = match payload_len % fragment_size {
                        0 => fragment_size,
                        tail => tail,
                    };
                    assert_eq!(last.len(), expected);
                }

                let reassembled: Vec<u8> = fragments.concat();
                assert_eq!(reassembled, payload, "coverage broken for L={payload_len} M={fragment_size}");
            }
        }
    }

    #[test]
    fn test_exact_multiple_has_no_empty_tail() {
        let payload = vec![0xAA; 60];
        let fragments: Vec<&[u8]> = FragmentStream::new(&payload, 20).unwrap().collect();
        assert_eq!(fragments.len(), 3);
        assert!(fragments.iter().all(|f| f.len() == 20));
    }

    #[test]
    fn test_zero_fragment_size_rejected() {
        assert!(FragmentStream::new(b"data", 0).is_err());
        assert!(FragmentWriter::new(0).is_err());
    }

    #[tokio::test]
    async fn test_writer_sends_every_fragment_in_order() {
        // Scenario B: 53 bytes at M=20 -> ceil(53/20) = 3 notifications.
        let payload: Vec<u8> = (0..53u8).collect();
        let writer = FragmentWriter::new(20).unwrap();
        let mut sink = RecordingSink::new();

        let sent = writer.write_all(&payload, &mut sink).await.unwrap();
        assert_eq!(sent, 3);
        assert_eq!(sink.fragments.len(), 3);
        assert_eq!(sink.fragments[0].len(), 20);
        assert_eq!(sink.fragments[1].len(), 20);
        assert_eq!(sink.fragments[2].len(), 13);
        assert_eq!(sink.fragments.concat(), payload);
    }

    #[tokio::test]
    async fn test_writer_aborts_when_subscriber_stops() {
        // Scenario C: the still-notifying flag flips after fragment 2;
        // nothing after that may be sent.
        let payload = vec![0x55; 100];
        let writer = FragmentWriter::new(20).unwrap();
        let mut sink = RecordingSink::stopping_after(2);

        let sent = writer.write_all(&payload, &mut sink).await.unwrap();
        assert_eq!(sent, 2);
        assert_eq!(sink.fragments.len(), 2);
    }

    #[tokio::test]
    async fn test_writer_for_link_mtu() {
        let writer = FragmentWriter::for_link_mtu(Some(185));
        assert_eq!(writer.fragment_size(), 180);

        let writer = FragmentWriter::for_link_mtu(None);
        assert_eq!(writer.fragment_size(), DEFAULT_FRAGMENT_SIZE);
    }

    #[tokio::test]
    async fn test_empty_payload_sends_nothing() {
        let writer = FragmentWriter::new(20).unwrap();
        let mut sink = RecordingSink::new();
        let sent = writer.write_all(&[], &mut sink).await.unwrap();
        assert_eq!(sent, 0);
        assert!(sink.fragments.is_empty());
    }
}
