use chrono::{DateTime, Utc};

pub const EPSILON: f32 = 1e-6;

#[derive(Clone, Debug)]
pub struct Jiggle {
    state: u32,
}

impl Jiggle {
    const A: u32 = 1_664_525;
    const C: u32 = 1_013_904_223;

    pub fn new(seed: u32) -> Self {
        Self { state: seed }
    }

    pub fn next_unit(&mut self) -> f32 {
        self.state = self.state.wrapping_mul(Self::A).wrapping_add(Self::C);
        (self.state as f64 / (u32::MAX as f64 + 1.0)) as f32
    }

    /// Next value in `(-scale/2, scale/2)`, never exactly zero.
    pub fn next_offset(&mut self, scale: f32) -> f32 {
        let offset = (self.next_unit() - 0.5) * scale;
        if offset == 0.0 { scale * 0.25 } else { offset }
    }
}

impl Default for Jiggle {
    fn default() -> Self {
        Self::new(0x5eed_1234)
    }
}

pub fn format_timestamp(millis: f64) -> String {
    DateTime::<Utc>::from_timestamp_millis(millis.floor() as i64)
        .map_or_else(|| format!("{millis}"), |time| time.format("%y-%m-%d %H:00").to_string())
}
