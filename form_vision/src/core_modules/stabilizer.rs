// THEORY:
// Per-frame predictions flicker: a single noisy window can briefly favor a
// neighbouring activity. The `LabelStabilizer` adds hysteresis on top of the
// classifier so that the displayed label only changes once a challenger has won a
// configured number of consecutive frames.
//
// Key principles:
// 1.  **Displayed vs. candidate**: The stabilizer remembers the label it is showing and
//     the label currently trying to replace it, with a run length for the challenger.
// 2.  **First frame wins outright**: With nothing displayed yet, the first label is shown
//     immediately.
// 3.  **Session scoped**: One stabilizer per session; it is never shared.

use tracing::debug;

/// Hysteresis filter over a stream of labels.
#[derive(Debug, Clone)]
pub struct LabelStabilizer<L> {
    displayed: Option<L>,
    candidate: Option<L>,
    /// Consecutive frames the candidate has been the raw best label.
    support: u32,
    threshold: u32,
}

impl<L: Copy + PartialEq + std::fmt::Debug> LabelStabilizer<L> {
    /// `threshold` is the run length a challenger needs; values below 1 act as 1.
    pub fn new(threshold: u32) -> Self {
        Self {
            displayed: None,
            candidate: None,
            support: 0,
            threshold: threshold.max(1),
        }
    }

    /// Feeds one raw label and returns the label to display.
    pub fn update(&mut self, label: L) -> L {
        let Some(displayed) = self.displayed else {
            self.displayed = Some(label);
            self.candidate = Some(label);
            self.support = 1;
            return label;
        };

        if self.candidate == Some(label) {
            self.support += 1;
        } else {
            self.candidate = Some(label);
            self.support = 1;
        }

        if label != displayed && self.support >= self.threshold {
            debug!(from = ?displayed, to = ?label, support = self.support, "displayed label switched");
            self.displayed = Some(label);
            self.support = 0;
            return label;
        }
        displayed
    }

    pub fn displayed(&self) -> Option<L> {
        self.displayed
    }

    pub fn candidate(&self) -> Option<L> {
        self.candidate
    }

    pub fn support(&self) -> u32 {
        self.support
    }

    pub fn threshold(&self) -> u32 {
        self.threshold
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(labels: &[char], threshold: u32) -> Vec<char> {
        let mut stabilizer = LabelStabilizer::new(threshold);
        labels.iter().map(|l| stabilizer.update(*l)).collect()
    }

    #[test]
    fn first_label_is_displayed_immediately() {
        let mut stabilizer = LabelStabilizer::new(3);
        assert_eq!(stabilizer.displayed(), None);
        assert_eq!(stabilizer.update('A'), 'A');
        assert_eq!(stabilizer.candidate(), Some('A'));
        assert_eq!(stabilizer.support(), 1);
    }

    #[test]
    fn short_interruption_is_suppressed() {
        assert_eq!(run(&['A', 'A', 'B', 'A', 'A', 'A'], 3), vec!['A'; 6]);
    }

    #[test]
    fn sustained_challenger_switches_on_third_frame() {
        let displayed = run(&['A', 'A', 'A', 'B', 'B', 'B', 'B'], 3);
        assert_eq!(displayed, vec!['A', 'A', 'A', 'A', 'A', 'B', 'B']);
    }

    #[test]
    fn support_resets_after_switch() {
        let mut stabilizer = LabelStabilizer::new(2);
        for label in ['A', 'B', 'B'] {
            stabilizer.update(label);
        }
        assert_eq!(stabilizer.displayed(), Some('B'));
        assert_eq!(stabilizer.support(), 0);
        // The displayed label keeps accumulating support without switching again.
        stabilizer.update('B');
        assert_eq!(stabilizer.support(), 1);
    }

    #[test]
    fn threshold_one_follows_every_change() {
        assert_eq!(run(&['A', 'B', 'A', 'C'], 1), vec!['A', 'B', 'A', 'C']);
    }

    #[test]
    fn zero_threshold_is_treated_as_one() {
        assert_eq!(LabelStabilizer::<char>::new(0).threshold(), 1);
    }
}
