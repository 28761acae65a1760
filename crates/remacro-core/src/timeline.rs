//! Timeline - the ordered list of macro events
//!
//! Insertion order is playback order. Edits take positions as 0-based
//! indices; positions past the end are ignored rather than treated as errors.

use crate::error::{Error, Result};
use crate::events::MacroEvent;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Timeline {
    events: Vec<MacroEvent>,
}

impl Timeline {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_events(events: Vec<MacroEvent>) -> Self {
        Self { events }
    }

    pub fn push(&mut self, event: MacroEvent) -> usize {
        self.events.push(event);
        self.events.len() - 1
    }

    /// Remove the events at `indices`. Duplicates and out-of-range positions
    /// are skipped. Returns how many events were removed.
    pub fn delete(&mut self, indices: &[usize]) -> usize {
        let mut valid: Vec<usize> = indices
            .iter()
            .copied()
            .filter(|&i| i < self.events.len())
            .collect();
        valid.sort_unstable_by(|a, b| b.cmp(a));
        valid.dedup();
        for &i in &valid {
            self.events.remove(i);
        }
        valid.len()
    }

    pub fn set_delay(&mut self, index: usize, delay: f64) -> Result<()> {
        if !delay.is_finite() || delay < 0.0 {
            return Err(Error::validation("Delay must be a number of seconds, 0 or more"));
        }
        let len = self.events.len();
        let event = self.events.get_mut(index).ok_or_else(|| {
            Error::validation(format!("No event at position {} (have {})", index + 1, len))
        })?;
        event.set_delay_before(delay);
        Ok(())
    }

    /// Add `delta` seconds to each selected event independently, clamping
    /// each result at zero. Returns how many events were changed.
    pub fn add_delay(&mut self, indices: &[usize], delta: f64) -> Result<usize> {
        if !delta.is_finite() {
            return Err(Error::validation("Delay change must be a finite number"));
        }
        let mut seen = Vec::with_capacity(indices.len());
        for &i in indices {
            if seen.contains(&i) {
                continue;
            }
            if let Some(event) = self.events.get_mut(i) {
                event.add_delay(delta);
                seen.push(i);
            }
        }
        Ok(seen.len())
    }

    pub fn clear(&mut self) {
        self.events.clear();
    }

    pub fn pop(&mut self) -> Option<MacroEvent> {
        self.events.pop()
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&MacroEvent> {
        self.events.get(index)
    }

    pub fn events(&self) -> &[MacroEvent] {
        &self.events
    }

    pub fn iter(&self) -> std::slice::Iter<'_, MacroEvent> {
        self.events.iter()
    }

    /// Sum of all waits at real-time speed
    pub fn total_delay(&self) -> f64 {
        self.events.iter().map(MacroEvent::delay_before).sum()
    }
}

impl<'a> IntoIterator for &'a Timeline {
    type Item = &'a MacroEvent;
    type IntoIter = std::slice::Iter<'a, MacroEvent>;

    fn into_iter(self) -> Self::IntoIter {
        self.events.iter()
    }
}

/// Parse user-entered delay text for a single-event edit.
pub fn parse_delay(text: &str) -> Result<f64> {
    let text = text.trim();
    if text.is_empty() {
        return Err(Error::validation("Enter a delay in seconds (0 or more)"));
    }
    let delay: f64 = text
        .parse()
        .map_err(|_| Error::validation(format!("'{}' is not a valid number of seconds", text)))?;
    if !delay.is_finite() {
        return Err(Error::validation("Delay must be a finite number"));
    }
    if delay < 0.0 {
        return Err(Error::validation("Delay cannot be negative"));
    }
    Ok(delay)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;

    fn sample() -> Timeline {
        Timeline::from_events(vec![
            MacroEvent::click(0, 0, 0.0),
            MacroEvent::click(1, 1, 0.05),
            MacroEvent::key_down('a', 1.0),
            MacroEvent::key_up('a', 0.1),
        ])
    }

    #[test]
    fn delete_removes_several_positions_and_ignores_out_of_range() {
        let mut t = sample();
        let removed = t.delete(&[3, 1, 1, 42]);
        assert_eq!(removed, 2);
        assert_eq!(t.len(), 2);
        assert_eq!(t.get(0), Some(&MacroEvent::click(0, 0, 0.0)));
        assert_eq!(t.get(1), Some(&MacroEvent::key_down('a', 1.0)));
    }

    #[test]
    fn add_delay_zero_is_identity() {
        let mut t = sample();
        let before = t.clone();
        t.add_delay(&[0, 1, 2, 3], 0.0).unwrap();
        assert_eq!(t, before);
    }

    #[test]
    fn add_delay_clamps_each_event() {
        let mut t = sample();
        assert_eq!(t.add_delay(&[1], -1000.0).unwrap(), 1);
        assert_eq!(t.get(1).unwrap().delay_before(), 0.0);

        let changed = t.add_delay(&[2, 3, 9], -0.5).unwrap();
        assert_eq!(changed, 2);
        assert_eq!(t.get(2).unwrap().delay_before(), 0.5);
        assert_eq!(t.get(3).unwrap().delay_before(), 0.0);
    }

    #[test]
    fn add_delay_applies_once_per_index() {
        let mut t = sample();
        t.add_delay(&[2, 2], 1.0).unwrap();
        assert_eq!(t.get(2).unwrap().delay_before(), 2.0);
    }

    #[test]
    fn set_delay_rejects_bad_values_without_mutation() {
        let mut t = sample();
        let before = t.clone();
        assert_eq!(t.set_delay(1, -1.0).unwrap_err().code, ErrorCode::Validation);
        assert_eq!(t.set_delay(1, f64::NAN).unwrap_err().code, ErrorCode::Validation);
        assert_eq!(t.set_delay(10, 1.0).unwrap_err().code, ErrorCode::Validation);
        assert_eq!(t, before);

        t.set_delay(1, 2.5).unwrap();
        assert_eq!(t.get(1).unwrap().delay_before(), 2.5);
    }

    #[test]
    fn parse_delay_validates_text() {
        assert_eq!(parse_delay(" 0.75 ").unwrap(), 0.75);
        assert_eq!(parse_delay("0").unwrap(), 0.0);
        for bad in ["", "   ", "abc", "-1", "inf", "NaN"] {
            assert_eq!(parse_delay(bad).unwrap_err().code, ErrorCode::Validation, "{bad:?}");
        }
    }

    #[test]
    fn total_delay_sums_waits() {
        assert!((sample().total_delay() - 1.15).abs() < 1e-9);
    }
}
