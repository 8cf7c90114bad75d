/// Format elapsed seconds as `MM:SS`.
///
/// Minutes wrap at 60; hours are not shown. Negative or non-finite input
/// renders as `00:00`.
pub fn format_timestamp(seconds: f64) -> String {
    if !seconds.is_finite() || seconds < 0.0 {
        return "00:00".to_string();
    }
    let total = seconds.floor() as u64;
    let minutes = (total / 60) % 60;
    let secs = total % 60;
    format!("{minutes:02}:{secs:02}")
}

/// `duration` if it is a usable, finite, positive length.
pub fn known_duration(duration: f64) -> Option<f64> {
    (duration.is_finite() && duration > 0.0).then_some(duration)
}

/// Playback position as a percentage of `duration`.
pub fn progress_percent(current: f64, duration: f64) -> Option<f64> {
    let duration = known_duration(duration)?;
    Some((current / duration * 100.0).clamp(0.0, 100.0))
}

/// Clamp a seek target to `[0, duration]`, or to `[0, ∞)` while the
/// duration is unknown.
pub fn clamp_seek(target: f64, duration: f64) -> f64 {
    let target = if target.is_nan() { 0.0 } else { target };
    match known_duration(duration) {
        Some(duration) => target.clamp(0.0, duration),
        None => target.max(0.0),
    }
}
