//! Enabled flag shared by the scanner and the pagination driver.
//!
//! Owned by the session and passed by reference into each call; only the
//! external control flips it.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Toggle {
    enabled: bool,
}

impl Toggle {
    pub fn new(enabled: bool) -> Self {
        Self { enabled }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn set(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    /// Flip the flag and return the new state.
    pub fn toggle(&mut self) -> bool {
        self.enabled = !self.enabled;
        self.enabled
    }

    pub fn label(&self) -> &'static str {
        if self.enabled { "ON" } else { "OFF" }
    }
}

impl Default for Toggle {
    fn default() -> Self {
        Self::new(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn toggles_and_labels() {
        let mut t = Toggle::default();
        assert!(t.is_enabled());
        assert_eq!(t.label(), "ON");
        assert!(!t.toggle());
        assert_eq!(t.label(), "OFF");
        t.set(true);
        assert!(t.is_enabled());
    }
}
