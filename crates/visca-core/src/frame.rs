//! VISCA frame boundary detection.
//!
//! # What is a frame? (for beginners)
//!
//! A serial line is just a stream of bytes; nothing on the wire says where one
//! message stops and the next begins.  VISCA solves this with a terminator:
//! every command and every reply ends with the byte `0xFF`, and `0xFF` never
//! appears inside a message body.
//!
//! ```text
//! 81 01 04 07 02 FF      zoom tele (command, camera 1)
//! 90 41 FF               ACK from camera 1, socket 1
//! 90 51 FF               completion from camera 1, socket 1
//! ```
//!
//! The bridge does not interpret any other byte.  [`FrameAssembler`]
//! accumulates bytes read from the serial port and reports when the first
//! terminator has been seen.  Anything read after that terminator in the same
//! chunk belongs to a later message and is handed back to the caller.

/// The byte value that ends every VISCA message.
pub const FRAME_TERMINATOR: u8 = 0xFF;

/// Accumulates serial bytes until the first frame terminator.
///
/// # Examples
///
/// ```rust
/// use visca_core::FrameAssembler;
///
/// let mut assembler = FrameAssembler::new();
/// let surplus = assembler.push(&[0x90, 0x41]);
/// assert!(surplus.is_empty());
/// assert!(!assembler.is_complete());
///
/// let surplus = assembler.push(&[0xFF, 0x90, 0x51, 0xFF]);
/// assert_eq!(surplus, &[0x90, 0x51, 0xFF]);
/// assert_eq!(assembler.finish(), Some(vec![0x90, 0x41, 0xFF]));
/// ```
#[derive(Debug, Default)]
pub struct FrameAssembler {
    buf: Vec<u8>,
    complete: bool,
}

impl FrameAssembler {
    /// Creates an empty assembler.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends `chunk` up to and including the first terminator.
    ///
    /// Returns the bytes of `chunk` that were *not* consumed: everything after
    /// the terminator, or the whole chunk if the frame was already complete.
    pub fn push<'a>(&mut self, chunk: &'a [u8]) -> &'a [u8] {
        if self.complete {
            return chunk;
        }
        match chunk.iter().position(|&b| b == FRAME_TERMINATOR) {
            Some(end) => {
                self.buf.extend_from_slice(&chunk[..=end]);
                self.complete = true;
                &chunk[end + 1..]
            }
            None => {
                self.buf.extend_from_slice(chunk);
                &[]
            }
        }
    }

    /// Returns `true` once a terminator has been consumed.
    pub fn is_complete(&self) -> bool {
        self.complete
    }

    /// Returns `true` if no bytes have been accumulated.
    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// Number of bytes accumulated so far.
    pub fn len(&self) -> usize {
        self.buf.len()
    }

    /// Consumes the assembler and returns the accumulated bytes.
    ///
    /// Returns `None` when nothing arrived.  A partial frame (no terminator) is
    /// still returned as-is; the caller decides what a timeout means.
    pub fn finish(self) -> Option<Vec<u8>> {
        if self.buf.is_empty() {
            None
        } else {
            Some(self.buf)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_chunk_with_terminator_completes() {
        // Arrange
        let mut assembler = FrameAssembler::new();

        // Act
        let surplus = assembler.push(&[0x90, 0x41, 0xFF]);

        // Assert
        assert!(surplus.is_empty());
        assert!(assembler.is_complete());
        assert_eq!(assembler.finish(), Some(vec![0x90, 0x41, 0xFF]));
    }

    #[test]
    fn test_terminator_split_across_chunks() {
        let mut assembler = FrameAssembler::new();

        assembler.push(&[0x90]);
        assert!(!assembler.is_complete());
        assembler.push(&[0x50, 0x02]);
        assert!(!assembler.is_complete());
        assembler.push(&[0xFF]);

        assert!(assembler.is_complete());
        assert_eq!(assembler.len(), 4);
    }

    #[test]
    fn test_bytes_after_first_terminator_are_returned_as_surplus() {
        let mut assembler = FrameAssembler::new();

        let surplus = assembler.push(&[0x90, 0x41, 0xFF, 0x90, 0x51, 0xFF]);

        assert_eq!(surplus, &[0x90, 0x51, 0xFF]);
        assert_eq!(assembler.finish(), Some(vec![0x90, 0x41, 0xFF]));
    }

    #[test]
    fn test_push_after_completion_consumes_nothing() {
        let mut assembler = FrameAssembler::new();
        assembler.push(&[0x90, 0x41, 0xFF]);

        let surplus = assembler.push(&[0x01, 0x02]);

        assert_eq!(surplus, &[0x01, 0x02]);
        assert_eq!(assembler.len(), 3);
    }

    #[test]
    fn test_partial_frame_is_kept_without_terminator() {
        let mut assembler = FrameAssembler::new();
        assembler.push(&[0x90, 0x60]);

        assert!(!assembler.is_complete());
        assert_eq!(assembler.finish(), Some(vec![0x90, 0x60]));
    }

    #[test]
    fn test_empty_assembler_finishes_to_none() {
        let assembler = FrameAssembler::new();
        assert!(assembler.is_empty());
        assert_eq!(assembler.finish(), None);
    }

    #[test]
    fn test_lone_terminator_is_a_frame() {
        let mut assembler = FrameAssembler::new();
        assembler.push(&[0xFF]);
        assert_eq!(assembler.finish(), Some(vec![0xFF]));
    }
}
