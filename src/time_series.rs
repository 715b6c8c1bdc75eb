use serde::Serialize;

/// WPM measured `t` seconds into a test
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct WpmSample {
    pub t: f64,
    pub wpm: f64,
}

impl WpmSample {
    pub fn new(t: f64, wpm: f64) -> Self {
        Self { t, wpm }
    }
}

impl From<WpmSample> for (f64, f64) {
    fn from(p: WpmSample) -> Self {
        (p.t, p.wpm)
    }
}

/// Keeps the last sample of every whole second so the trace stays small
/// no matter how fast someone types.
pub fn push_sample(trace: &mut Vec<WpmSample>, sample: WpmSample) {
    match trace.last_mut() {
        Some(last) if last.t.ceil() == sample.t.ceil() => *last = sample,
        _ => trace.push(sample),
    }
}
