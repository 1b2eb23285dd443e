use super::Segment;

/// Concatenate segments back into feature file text
///
/// Preserved segments come out exactly as they were read; generated
/// blocks are laid out with four spaces per nesting level.
pub fn render(segments: &[Segment]) -> String {
    segments.iter().map(Segment::to_fea).collect()
}
