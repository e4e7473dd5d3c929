/// Fixed-capacity byte memory with a single data pointer.
///
/// Cells start at zero. The pointer always stays inside `[0, len)`; any
/// move that would leave that range is refused and the tape is unchanged.
#[derive(Debug, Clone)]
pub struct Tape {
    cells: Vec<u8>,
    pointer: usize,
}

/// Default number of cells.
pub const DEFAULT_TAPE_CELLS: usize = 5000;

impl Tape {
    pub fn new(cells: usize) -> Self {
        Self {
            cells: vec![0; cells.max(1)],
            pointer: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn pointer(&self) -> usize {
        self.pointer
    }

    pub fn cells(&self) -> &[u8] {
        &self.cells
    }

    /// Shift the pointer by `delta` cells.
    ///
    /// Returns `false` without moving when the target falls outside the tape.
    pub fn shift(&mut self, delta: isize) -> bool {
        match self.pointer.checked_add_signed(delta) {
            Some(target) if target < self.cells.len() => {
                self.pointer = target;
                true
            }
            _ => false,
        }
    }

    pub fn read(&self) -> u8 {
        self.cells[self.pointer]
    }

    pub fn write(&mut self, value: u8) {
        self.cells[self.pointer] = value;
    }

    /// Add one to the current cell, wrapping 255 to 0. Returns the new value.
    pub fn increment(&mut self) -> u8 {
        let after = self.read().wrapping_add(1);
        self.write(after);
        after
    }

    /// Subtract one from the current cell, wrapping 0 to 255. Returns the new value.
    pub fn decrement(&mut self) -> u8 {
        let after = self.read().wrapping_sub(1);
        self.write(after);
        after
    }
}

impl Default for Tape {
    fn default() -> Self {
        Self::new(DEFAULT_TAPE_CELLS)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_zeroed_at_cell_zero() {
        let tape = Tape::new(4);
        assert_eq!(tape.pointer(), 0);
        assert_eq!(tape.cells(), &[0, 0, 0, 0]);
    }

    #[test]
    fn shift_left_from_zero_is_refused() {
        let mut tape = Tape::new(4);
        assert!(!tape.shift(-1));
        assert_eq!(tape.pointer(), 0);
    }

    #[test]
    fn shift_past_last_cell_is_refused() {
        let mut tape = Tape::new(3);
        assert!(tape.shift(2));
        assert!(!tape.shift(1));
        assert_eq!(tape.pointer(), 2);
    }

    #[test]
    fn wrapping_subtraction() {
        let mut tape = Tape::new(1);
        assert_eq!(tape.decrement(), 255);
    }

    #[test]
    fn wrapping_addition() {
        let mut tape = Tape::new(1);
        tape.write(255);
        assert_eq!(tape.increment(), 0);
    }
}
