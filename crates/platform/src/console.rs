//! Serial diagnostic console
//!
//! The board's UART0 is a character-oriented log sink. It is what an
//! operator sees on the bench: the boot banner, the I/O heartbeat dots, and
//! the single letter the watchdog prints when it gives up on a task.
//!
//! Writes take `&self` and must be callable from interrupt context (the
//! watchdog handler writes to it), so implementations may not block on a
//! lock held by a task. On the target this is a polled FIFO write.

/// Character-oriented log sink.
pub trait Console {
    /// Write one byte.
    fn write_byte(&self, byte: u8);

    /// Write a string, expanding `\n` to `\r\n`.
    fn write_str(&self, s: &str) {
        for byte in s.bytes() {
            if byte == b'\n' {
                self.write_byte(b'\r');
            }
            self.write_byte(byte);
        }
    }
}
