use typeamp::time_series::WpmSample;

/// X (seconds) and Y (WPM) upper bounds for the results chart
pub fn compute_chart_params(trace: &[WpmSample], test_secs: Option<f64>) -> (f64, f64) {
    let highest_wpm = trace.iter().map(|p| p.wpm).fold(0.0, f64::max);

    let overall_duration = match trace.last() {
        Some(p) => p.t,
        None => test_secs.unwrap_or(1.0),
    };

    (overall_duration.max(1.0), highest_wpm.round().max(1.0))
}

pub fn format_label(val: f64) -> String {
    if (val - val.round()).abs() < f64::EPSILON {
        format!("{}", val.round())
    } else {
        format!("{val:.2}")
    }
}
