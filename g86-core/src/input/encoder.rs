//! Rotary encoder decoding
//!
//! Quadrature state machine with noise rejection. Feed it the A/B levels
//! on every poll (every 1-5 ms).

/// Direction of one detent
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Rotation {
    Clockwise,
    CounterClockwise,
}

/// Encoder state machine states
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Idle,
    CwStep1,
    CwStep2,
    CcwStep1,
    CcwStep2,
}

/// Quadrature decoder
#[derive(Debug, Clone)]
pub struct QuadratureDecoder {
    state: State,
    last_a: bool,
    last_b: bool,
}

impl Default for QuadratureDecoder {
    fn default() -> Self {
        Self::new()
    }
}

impl QuadratureDecoder {
    /// Both channels idle high (pull-ups)
    pub const fn new() -> Self {
        Self {
            state: State::Idle,
            last_a: true,
            last_b: true,
        }
    }

    /// Feed the current channel levels
    pub fn update(&mut self, a: bool, b: bool) -> Option<Rotation> {
        if a == self.last_a && b == self.last_b {
            return None;
        }
        self.last_a = a;
        self.last_b = b;
        self.decode(a, b)
    }

    /// CW:  A leads B. Idle (1,1) -> (0,1) -> (0,0) -> either high
    /// CCW: B leads A. Idle (1,1) -> (1,0) -> (0,0) -> either high
    fn decode(&mut self, a: bool, b: bool) -> Option<Rotation> {
        match self.state {
            State::Idle => {
                if !a && b {
                    self.state = State::CwStep1;
                } else if a && !b {
                    self.state = State::CcwStep1;
                }
                None
            }
            State::CwStep1 => {
                if !a && !b {
                    self.state = State::CwStep2;
                } else if a && b {
                    // Bounce
                    self.state = State::Idle;
                }
                None
            }
            State::CwStep2 => {
                if a || b {
                    self.state = State::Idle;
                    return Some(Rotation::Clockwise);
                }
                None
            }
            State::CcwStep1 => {
                if !a && !b {
                    self.state = State::CcwStep2;
                } else if a && b {
                    self.state = State::Idle;
                }
                None
            }
            State::CcwStep2 => {
                if a || b {
                    self.state = State::Idle;
                    return Some(Rotation::CounterClockwise);
                }
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn feed(decoder: &mut QuadratureDecoder, levels: &[(bool, bool)]) -> Vec<Rotation> {
        levels
            .iter()
            .filter_map(|&(a, b)| decoder.update(a, b))
            .collect()
    }

    #[test]
    fn test_clockwise_detent() {
        let mut decoder = QuadratureDecoder::new();
        let steps = feed(
            &mut decoder,
            &[(false, true), (false, false), (true, false), (true, true)],
        );
        assert_eq!(steps, vec![Rotation::Clockwise]);
    }

    #[test]
    fn test_counter_clockwise_detent() {
        let mut decoder = QuadratureDecoder::new();
        let steps = feed(
            &mut decoder,
            &[(true, false), (false, false), (false, true), (true, true)],
        );
        assert_eq!(steps, vec![Rotation::CounterClockwise]);
    }

    #[test]
    fn test_bounce_ignored() {
        let mut decoder = QuadratureDecoder::new();
        let steps = feed(
            &mut decoder,
            &[(false, true), (true, true), (false, true), (true, true)],
        );
        assert!(steps.is_empty());
    }

    #[test]
    fn test_repeated_levels_ignored() {
        let mut decoder = QuadratureDecoder::new();
        let steps = feed(
            &mut decoder,
            &[
                (false, true),
                (false, true),
                (false, false),
                (false, false),
                (true, false),
                (true, true),
                (false, true),
                (false, false),
                (true, true),
            ],
        );
        assert_eq!(steps, vec![Rotation::Clockwise, Rotation::Clockwise]);
    }
}
