use super::VoiceSegment;

/// Merge segments separated by at most `max_gap` seconds.
///
/// Segments are sorted by start time first. A merged segment spans both inputs and keeps
/// the larger confidence and the larger RMS level of the two; inputs are never edited,
/// each fold produces a new segment.
///
/// Invariant: the output is sorted and non-overlapping.
pub fn merge_segments(mut segments: Vec<VoiceSegment>, max_gap: f64) -> Vec<VoiceSegment> {
    segments.sort_by(|a, b| a.start_time.total_cmp(&b.start_time));

    let mut merged: Vec<VoiceSegment> = Vec::with_capacity(segments.len());
    for seg in segments {
        if let Some(prev) = merged.last_mut()
            && seg.start_time - prev.end_time <= max_gap
        {
            *prev = VoiceSegment {
                start_time: prev.start_time,
                end_time: prev.end_time.max(seg.end_time),
                confidence: prev.confidence.max(seg.confidence),
                rms_level: prev.rms_level.max(seg.rms_level),
            };
            continue;
        }
        merged.push(seg);
    }

    merged
}
