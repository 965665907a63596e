/// Index of the featured book on the dashboard. The number of books can change
/// between calls, so every operation takes the current length and wraps.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Carousel {
    current: usize,
}

impl Carousel {
    pub fn current(&self, len: usize) -> Option<usize> {
        if len == 0 {
            None
        } else {
            Some(self.current % len)
        }
    }

    pub fn next(&mut self, len: usize) -> Option<usize> {
        let index = self.current(len)?;
        self.current = (index + 1) % len;
        Some(self.current)
    }

    pub fn prev(&mut self, len: usize) -> Option<usize> {
        let index = self.current(len)?;
        self.current = (index + len - 1) % len;
        Some(self.current)
    }

    pub fn go_to(&mut self, index: usize, len: usize) -> Option<usize> {
        if index >= len {
            return None;
        }
        self.current = index;
        Some(index)
    }
}
