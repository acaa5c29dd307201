pub const MIN_FONT_SIZE: u16 = 8;
pub const DEFAULT_FONT_SIZE: u16 = 12;

/// The shared font size of the text area.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FontZoom {
    size: u16,
}

impl FontZoom {
    pub fn new(size: u16) -> Self {
        Self {
            size: size.max(MIN_FONT_SIZE),
        }
    }

    pub fn size(&self) -> u16 {
        self.size
    }

    pub fn zoom_in(&mut self) -> u16 {
        self.size = self.size.saturating_add(1);
        self.size
    }

    pub fn zoom_out(&mut self) -> u16 {
        self.size = self.size.saturating_sub(1).max(MIN_FONT_SIZE);
        self.size
    }
}

impl Default for FontZoom {
    fn default() -> Self {
        Self::new(DEFAULT_FONT_SIZE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zoom_out_floors_at_minimum() {
        let mut zoom = FontZoom::new(10);
        for _ in 0..10 {
            zoom.zoom_out();
        }
        assert_eq!(zoom.size(), MIN_FONT_SIZE);
    }

    #[test]
    fn test_zoom_in_is_unbounded() {
        let mut zoom = FontZoom::default();
        for _ in 0..200 {
            zoom.zoom_in();
        }
        assert_eq!(zoom.size(), DEFAULT_FONT_SIZE + 200);
    }

    #[test]
    fn test_zoom_in_saturates_instead_of_wrapping() {
        let mut zoom = FontZoom::new(u16::MAX);
        assert_eq!(zoom.zoom_in(), u16::MAX);
    }

    #[test]
    fn test_initial_size_is_clamped() {
        assert_eq!(FontZoom::new(3).size(), MIN_FONT_SIZE);
    }
}
