//! GPIO pin abstractions
//!
//! The dashboard only reads pins: four timer switches plus the rotary
//! encoder and its push switch. All of them are wired active-low.

/// Digital input pin
pub trait InputPin {
    /// Check if the pin reads high (logic 1)
    fn is_high(&self) -> bool;

    /// Check if the pin reads low (logic 0)
    fn is_low(&self) -> bool {
        !self.is_high()
    }

    /// Check if the attached switch is closed
    ///
    /// Switches pull the line to ground, so closed reads low.
    fn is_active(&self) -> bool {
        self.is_low()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Level(bool);

    impl InputPin for Level {
        fn is_high(&self) -> bool {
            self.0
        }
    }

    #[test]
    fn test_active_low() {
        assert!(Level(false).is_active());
        assert!(!Level(true).is_active());
        assert!(Level(true).is_high());
        assert!(Level(false).is_low());
    }
}
