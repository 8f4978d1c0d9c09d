#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Message {
    /// Presentation refresh
    Tick,
    ToggleCapture,
    SpeakCurrent,
}
