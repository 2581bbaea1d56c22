//! Smoothing biquad for the novelty stream
//!
//! A fixed low-Q biquad applied sample-by-sample to the onset detection
//! function before peak picking. It knocks down frame-rate jitter so the
//! picker's median bias tracks the slow drift and local maxima stand out.
//! Filter state persists across frames and is only cleared on detector
//! reset.

/// Direct-form-I biquad filter
#[derive(Debug, Clone)]
pub struct BiquadFilter {
    b0: f64,
    b1: f64,
    b2: f64,
    a1: f64,
    a2: f64,
    x1: f64,
    x2: f64,
    y1: f64,
    y2: f64,
}

impl BiquadFilter {
    /// Create a biquad from feedforward `b` and feedback `a` coefficients
    ///
    /// `a` is normalized, i.e. the leading feedback coefficient is 1.
    pub fn new(b0: f64, b1: f64, b2: f64, a1: f64, a2: f64) -> Self {
        Self {
            b0,
            b1,
            b2,
            a1,
            a2,
            x1: 0.0,
            x2: 0.0,
            y1: 0.0,
            y2: 0.0,
        }
    }

    /// The fixed filter used on the novelty stream ahead of the peak picker
    pub fn novelty_smoother() -> Self {
        Self::new(0.15998789, 0.31997577, 0.15998789, -0.59488361, 0.23484048)
    }

    /// Filter order (number of coefficients per side)
    pub fn order(&self) -> usize {
        3
    }

    /// Filter one sample, advancing the internal state
    pub fn process_sample(&mut self, x: f64) -> f64 {
        let y = self.b0 * x + self.b1 * self.x1 + self.b2 * self.x2
            - self.a1 * self.y1
            - self.a2 * self.y2;
        self.x2 = self.x1;
        self.x1 = x;
        self.y2 = self.y1;
        self.y1 = y;
        y
    }

    /// Filter a buffer in place
    pub fn apply(&mut self, data: &mut [f64]) {
        for x in data.iter_mut() {
            *x = self.process_sample(*x);
        }
    }

    /// Zero the delay lines
    pub fn reset(&mut self) {
        self.x1 = 0.0;
        self.x2 = 0.0;
        self.y1 = 0.0;
        self.y2 = 0.0;
    }
}
