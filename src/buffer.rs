//! Staged input and collected output.

use crate::error::{Channel, InterpreterError};

/// Default capacity of each channel buffer in bytes.
pub const DEFAULT_BUFFER_CAPACITY: usize = 5000;

/// What `,` does once the staged input is exhausted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EofBehavior {
    /// Write 0 into the current cell.
    #[default]
    Zero,
    /// Leave the current cell untouched.
    Unchanged,
}

impl EofBehavior {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "zero" | "0" => Some(Self::Zero),
            "unchanged" | "keep" => Some(Self::Unchanged),
            _ => None,
        }
    }
}

/// Bytes staged by the host before a run, consumed by `,`.
#[derive(Debug, Clone)]
pub struct InputBuffer {
    bytes: Vec<u8>,
    read: usize,
    capacity: usize,
}

impl InputBuffer {
    pub fn new(capacity: usize) -> Self {
        Self {
            bytes: Vec::new(),
            read: 0,
            capacity,
        }
    }

    /// Append `bytes` to the staged input.
    ///
    /// Fails without staging anything if the total would exceed capacity.
    pub fn stage(&mut self, bytes: &[u8]) -> Result<(), InterpreterError> {
        if self.bytes.len() + bytes.len() > self.capacity {
            return Err(InterpreterError::BufferFull {
                channel: Channel::Input,
                capacity: self.capacity,
                ip: None,
            });
        }
        self.bytes.extend_from_slice(bytes);
        Ok(())
    }

    /// Next unread byte, or `None` at end of input.
    pub fn next_byte(&mut self) -> Option<u8> {
        let byte = self.bytes.get(self.read).copied()?;
        self.read += 1;
        Some(byte)
    }

    /// Move the read cursor back to the first staged byte.
    pub fn rewind(&mut self) {
        self.read = 0;
    }

    pub fn remaining(&self) -> usize {
        self.bytes.len() - self.read
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

/// Bytes emitted by `.` during a run.
#[derive(Debug, Clone)]
pub struct OutputBuffer {
    bytes: Vec<u8>,
    capacity: usize,
}

impl OutputBuffer {
    pub fn new(capacity: usize) -> Self {
        Self {
            bytes: Vec::new(),
            capacity,
        }
    }

    /// Append one byte. `ip` is the emitting instruction, for error reporting.
    pub fn emit(&mut self, byte: u8, ip: usize) -> Result<(), InterpreterError> {
        if self.bytes.len() >= self.capacity {
            return Err(InterpreterError::BufferFull {
                channel: Channel::Output,
                capacity: self.capacity,
                ip: Some(ip),
            });
        }
        self.bytes.push(byte);
        Ok(())
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn input_yields_bytes_then_none() {
        let mut input = InputBuffer::new(8);
        input.stage(b"hi").unwrap();
        assert_eq!(input.next_byte(), Some(b'h'));
        assert_eq!(input.next_byte(), Some(b'i'));
        assert_eq!(input.next_byte(), None);
        assert_eq!(input.remaining(), 0);

        input.rewind();
        assert_eq!(input.remaining(), 2);
    }

    #[test]
    fn staging_past_capacity_is_rejected_whole() {
        let mut input = InputBuffer::new(3);
        input.stage(b"ab").unwrap();
        let err = input.stage(b"cd").unwrap_err();
        assert!(matches!(err, InterpreterError::BufferFull { channel: Channel::Input, capacity: 3, .. }));
        assert_eq!(input.remaining(), 2);
    }

    #[test]
    fn output_refuses_byte_past_capacity() {
        let mut output = OutputBuffer::new(1);
        output.emit(7, 0).unwrap();
        let err = output.emit(8, 1).unwrap_err();
        assert!(matches!(err, InterpreterError::BufferFull { channel: Channel::Output, ip: Some(1), .. }));
        assert_eq!(output.as_bytes(), &[7]);
    }

    #[test]
    fn eof_behavior_parses_names() {
        assert_eq!(EofBehavior::parse("Zero"), Some(EofBehavior::Zero));
        assert_eq!(EofBehavior::parse(" unchanged "), Some(EofBehavior::Unchanged));
        assert_eq!(EofBehavior::parse("error"), None);
    }
}
