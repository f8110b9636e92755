//! Diagnostic log queue.
//!
//! Firmware tasks queue short text messages here; the host retrieves them
//! one at a time with the Poll command. The queue is bounded, and a message
//! dropped on overflow is reported to the host as a `* ` prefix on the next
//! message that does get through. The logger should not be used for
//! chit-chat.

use heapless::{Deque, String};

/// Queue depth in messages.
pub const LOG_QUEUE_DEPTH: usize = 8;

/// Longest single message, in bytes.
pub const LOG_MSG_MAX: usize = 96;

/// Bounded FIFO of diagnostic messages.
pub struct LogQueue {
    queue: Deque<String<LOG_MSG_MAX>, LOG_QUEUE_DEPTH>,
    lost: bool,
}

impl Default for LogQueue {
    fn default() -> Self {
        Self::new()
    }
}

impl LogQueue {
    /// Create an empty queue.
    pub fn new() -> Self {
        Self {
            queue: Deque::new(),
            lost: false,
        }
    }

    /// True if nothing is waiting for the host.
    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    /// Number of queued messages.
    pub fn len(&self) -> usize {
        self.queue.len()
    }

    /// Queue a message, truncating it to [`LOG_MSG_MAX`] bytes. Returns
    /// false if the queue was full and the message was dropped.
    pub fn log(&mut self, msg: &str) -> bool {
        let mut entry: String<LOG_MSG_MAX> = String::new();
        let take = floor_char_boundary(msg, LOG_MSG_MAX);
        // Cannot fail: take is at most the capacity.
        let _ = entry.push_str(&msg[..take]);
        if self.queue.push_back(entry).is_err() {
            self.lost = true;
            return false;
        }
        true
    }

    /// Move the oldest message into `buf`, returning the byte count (zero if
    /// the queue is empty). If messages were lost since the last drain, the
    /// output is prefixed with `* `.
    pub fn drain_next(&mut self, buf: &mut [u8]) -> usize {
        let Some(msg) = self.queue.pop_front() else {
            return 0;
        };
        let mut n = 0;
        if self.lost {
            for &b in b"* " {
                if n < buf.len() {
                    buf[n] = b;
                    n += 1;
                }
            }
            self.lost = false;
        }
        for &b in msg.as_bytes() {
            if n == buf.len() {
                break;
            }
            buf[n] = b;
            n += 1;
        }
        n
    }
}

/// Largest index `<= max` that sits on a char boundary of `s`.
fn floor_char_boundary(s: &str, max: usize) -> usize {
    if s.len() <= max {
        return s.len();
    }
    let mut i = max;
    while !s.is_char_boundary(i) {
        i -= 1;
    }
    i
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_queue_drains_nothing() {
        let mut q = LogQueue::new();
        let mut buf = [0u8; 32];
        assert!(q.is_empty());
        assert_eq!(q.drain_next(&mut buf), 0);
    }

    #[test]
    fn test_fifo_order() {
        let mut q = LogQueue::new();
        assert!(q.log("first"));
        assert!(q.log("second"));
        let mut buf = [0u8; 32];
        let n = q.drain_next(&mut buf);
        assert_eq!(&buf[..n], b"first");
        let n = q.drain_next(&mut buf);
        assert_eq!(&buf[..n], b"second");
        assert!(q.is_empty());
    }

    #[test]
    fn test_overflow_sets_loss_marker() {
        let mut q = LogQueue::new();
        for i in 0..LOG_QUEUE_DEPTH {
            assert!(q.log(if i % 2 == 0 { "even" } else { "odd" }));
        }
        assert!(!q.log("dropped"));

        let mut buf = [0u8; 32];
        let n = q.drain_next(&mut buf);
        assert_eq!(&buf[..2], b"* ");
        assert_eq!(&buf[2..n], b"even");

        // Marker reported once only.
        let n = q.drain_next(&mut buf);
        assert_eq!(&buf[..n], b"odd");
    }

    #[test]
    fn test_long_message_truncated() {
        let mut q = LogQueue::new();
        let long: std::string::String = core::iter::repeat('x').take(200).collect();
        assert!(q.log(&long));
        let mut buf = [0u8; 256];
        assert_eq!(q.drain_next(&mut buf), LOG_MSG_MAX);
    }

    #[test]
    fn test_drain_respects_small_buffer() {
        let mut q = LogQueue::new();
        q.log("a longer diagnostic line");
        let mut buf = [0u8; 8];
        assert_eq!(q.drain_next(&mut buf), 8);
        assert_eq!(&buf, b"a longer");
    }
}
