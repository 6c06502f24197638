use chrono::{DateTime, Utc};

/// Boundary below which every trade has already been folded into the series.
///
/// The raw service timestamp is kept verbatim so the next `created_at > watermark`
/// filter sees exactly what the service produced, with no precision lost.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AggregationCursor {
    watermark: Option<(String, DateTime<Utc>)>,
}

impl AggregationCursor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn watermark(&self) -> Option<&str> {
        self.watermark.as_ref().map(|(raw, _)| raw.as_str())
    }

    pub fn instant(&self) -> Option<DateTime<Utc>> {
        self.watermark.as_ref().map(|(_, instant)| *instant)
    }

    pub fn is_set(&self) -> bool {
        self.watermark.is_some()
    }

    /// Move the watermark forward. Returns `false` (and keeps the current
    /// value) when `instant` would not advance it.
    pub fn advance(&mut self, raw: &str, instant: DateTime<Utc>) -> bool {
        match &self.watermark {
            Some((_, current)) if instant <= *current => false,
            _ => {
                self.watermark = Some((raw.to_string(), instant));
                true
            }
        }
    }

    pub fn reset(&mut self) {
        self.watermark = None;
    }
}
