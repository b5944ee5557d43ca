//! Windowing engine: deterministic segmentation into overlapping windows

use biosig_core::{ChannelSelection, Recording, SigError, SigResult, Window};

/// Derived segmentation parameters for one (recording, config) pair
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowPlan {
    /// Epochs per full window
    pub window_epochs: usize,
    /// Epochs shared between consecutive windows
    pub overlap_epochs: usize,
    /// Epochs advanced between window starts
    pub step: usize,
    /// Number of windows that will be emitted
    pub iterations: usize,
}

impl WindowPlan {
    /// Derive a plan from window length (seconds), overlap fraction and the
    /// recording's epoch geometry.
    ///
    /// When the window length covers the whole recording, the plan collapses
    /// to a single window spanning it.
    pub fn new(
        window_len: f32,
        overlap: f32,
        epoch_count: usize,
        epoch_duration: f32,
    ) -> SigResult<Self> {
        if window_len <= 0.0 {
            return Err(SigError::config(format!(
                "window length must be positive, got {}",
                window_len
            )));
        }
        if !(0.0..1.0).contains(&overlap) {
            return Err(SigError::config(format!(
                "overlap must be in [0, 1), got {}",
                overlap
            )));
        }
        if epoch_count == 0 {
            return Err(SigError::data("cannot window an empty recording"));
        }

        let window_epochs = ((window_len / epoch_duration).round() as usize).max(1);
        if window_epochs >= epoch_count {
            return Ok(WindowPlan {
                window_epochs: epoch_count,
                overlap_epochs: 0,
                step: epoch_count,
                iterations: 1,
            });
        }

        let overlap_epochs = (overlap * window_epochs as f32) as usize;
        let step = (window_epochs - overlap_epochs).max(1);
        let iterations = (epoch_count - overlap_epochs).div_ceil(step);

        Ok(WindowPlan {
            window_epochs,
            overlap_epochs,
            step,
            iterations,
        })
    }
}

/// Lazy, finite, restartable sequence of windows over one recording.
///
/// Windows are produced in ascending start-offset order; the iterator's own
/// index is the only accumulator. The trailing window is clipped to the
/// recording's end and still emitted when it holds at least one epoch.
pub struct WindowIter<'a> {
    recording: &'a Recording,
    channel_indices: Vec<usize>,
    plan: WindowPlan,
    index: usize,
}

impl<'a> WindowIter<'a> {
    /// Build a window iterator, resolving the enabled channels up front.
    ///
    /// A selected channel missing from the recording is a configuration
    /// error, reported before any window is produced.
    pub fn new(
        recording: &'a Recording,
        selection: &ChannelSelection,
        plan: WindowPlan,
    ) -> SigResult<Self> {
        if selection.enabled_count() == 0 {
            return Err(SigError::config("channel selection has no enabled channels"));
        }
        let mut channel_indices = Vec::with_capacity(selection.enabled_count());
        for name in selection.enabled() {
            let index = recording
                .channel_names()
                .iter()
                .position(|n| n == name)
                .ok_or_else(|| {
                    SigError::config(format!(
                        "selected channel '{}' not present in recording",
                        name
                    ))
                })?;
            channel_indices.push(index);
        }

        Ok(WindowIter {
            recording,
            channel_indices,
            plan,
            index: 0,
        })
    }

    /// The plan this iterator follows
    pub fn plan(&self) -> &WindowPlan {
        &self.plan
    }

    /// Rewind to the first window
    pub fn restart(&mut self) {
        self.index = 0;
    }
}

impl Iterator for WindowIter<'_> {
    type Item = Window;

    fn next(&mut self) -> Option<Window> {
        if self.index >= self.plan.iterations {
            return None;
        }
        let epoch_count = self.recording.epoch_count();
        let start = self.index * self.plan.step;
        let end = (start + self.plan.window_epochs).min(epoch_count);
        self.index += 1;

        if start >= end {
            return None;
        }

        let data = self
            .channel_indices
            .iter()
            .map(|&ch| {
                // Index validated at construction
                self.recording.channel_data(ch).unwrap()[start..end].to_vec()
            })
            .collect();

        Some(Window {
            start,
            end,
            recording_id: self.recording.id,
            data,
        })
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.plan.iterations - self.index;
        (remaining, Some(remaining))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn recording(epochs: usize, channels: usize, epoch_duration: f32) -> Recording {
        let names: Vec<String> = (1..=channels).map(|i| format!("CH{}", i)).collect();
        let data: Vec<Vec<f32>> = (0..channels)
            .map(|c| (0..epochs).map(|e| (c * 10_000 + e) as f32).collect())
            .collect();
        Recording::new(names, data, epoch_duration).unwrap()
    }

    #[test]
    fn test_plan_512_epochs_half_overlap() {
        // 512 epochs at 0.0625s/epoch, 1s window, 0.5 overlap
        let plan = WindowPlan::new(1.0, 0.5, 512, 0.0625).unwrap();
        assert_eq!(plan.window_epochs, 16);
        assert_eq!(plan.overlap_epochs, 8);
        assert_eq!(plan.step, 8);
        assert_eq!(plan.iterations, 63);
    }

    #[test]
    fn test_window_boundaries_512_epochs() {
        let rec = recording(512, 8, 0.0625);
        let selection = ChannelSelection::emg_cuff(8);
        let plan = WindowPlan::new(1.0, 0.5, 512, 0.0625).unwrap();
        let windows: Vec<Window> = WindowIter::new(&rec, &selection, plan).unwrap().collect();

        assert_eq!(windows.len(), 63);
        assert_eq!((windows[0].start, windows[0].end), (0, 16));
        assert_eq!((windows[1].start, windows[1].end), (8, 24));
        assert_eq!((windows[2].start, windows[2].end), (16, 32));
        let last = windows.last().unwrap();
        assert_eq!((last.start, last.end), (496, 512));
        assert_eq!(last.channel_count(), 8);
    }

    #[test]
    fn test_starts_strictly_increasing_and_clipped() {
        let rec = recording(100, 2, 0.002);
        let selection = ChannelSelection::emg_cuff(2);
        let plan = WindowPlan::new(0.06, 0.25, 100, 0.002).unwrap();
        let windows: Vec<Window> = WindowIter::new(&rec, &selection, plan).unwrap().collect();

        assert_eq!(windows.len(), plan.iterations);
        for pair in windows.windows(2) {
            assert!(pair[1].start > pair[0].start);
        }
        assert!(windows.last().unwrap().end <= rec.epoch_count());
    }

    #[test]
    fn test_trailing_short_window_is_emitted() {
        // 17 epochs, window of 16, half overlap: second window is [8, 17)
        let rec = recording(17, 1, 0.0625);
        let selection = ChannelSelection::emg_cuff(1);
        let plan = WindowPlan::new(1.0, 0.5, 17, 0.0625).unwrap();
        let windows: Vec<Window> = WindowIter::new(&rec, &selection, plan).unwrap().collect();

        assert_eq!(windows.len(), 2);
        assert_eq!((windows[1].start, windows[1].end), (8, 17));
        assert_eq!(windows[1].len(), 9);
    }

    #[test]
    fn test_oversized_window_covers_whole_recording() {
        let rec = recording(64, 1, 0.01);
        let selection = ChannelSelection::emg_cuff(1);
        let plan = WindowPlan::new(10.0, 0.5, 64, 0.01).unwrap();
        assert_eq!(plan.iterations, 1);

        let windows: Vec<Window> =
            WindowIter::new(&rec, &selection, plan).unwrap().collect();
        assert_eq!(windows.len(), 1);
        assert_eq!((windows[0].start, windows[0].end), (0, 64));
    }

    #[test]
    fn test_restart() {
        let rec = recording(64, 1, 0.01);
        let selection = ChannelSelection::emg_cuff(1);
        let plan = WindowPlan::new(0.16, 0.5, 64, 0.01).unwrap();
        let mut iter = WindowIter::new(&rec, &selection, plan).unwrap();

        let first_pass: Vec<usize> = iter.by_ref().map(|w| w.start).collect();
        iter.restart();
        let second_pass: Vec<usize> = iter.map(|w| w.start).collect();
        assert_eq!(first_pass, second_pass);
    }

    #[test]
    fn test_invalid_parameters() {
        assert!(WindowPlan::new(0.0, 0.5, 100, 0.01).is_err());
        assert!(WindowPlan::new(1.0, 1.0, 100, 0.01).is_err());
        assert!(WindowPlan::new(1.0, -0.1, 100, 0.01).is_err());
    }

    #[test]
    fn test_unknown_selected_channel_is_config_error() {
        let rec = recording(64, 2, 0.01);
        let selection = ChannelSelection::all(&["CH1", "CH9"]);
        let plan = WindowPlan::new(0.16, 0.5, 64, 0.01).unwrap();
        let result = WindowIter::new(&rec, &selection, plan);
        assert!(matches!(result, Err(SigError::ConfigError { .. })));
    }

    #[test]
    fn test_window_rows_follow_selection_order() {
        let rec = recording(32, 3, 0.01);
        let mut selection = ChannelSelection::emg_cuff(3);
        selection.set_enabled("CH2", false);
        let plan = WindowPlan::new(0.08, 0.0, 32, 0.01).unwrap();
        let window = WindowIter::new(&rec, &selection, plan)
            .unwrap()
            .next()
            .unwrap();

        assert_eq!(window.channel_count(), 2);
        // Row 0 is CH1, row 1 is CH3 (CH2 disabled)
        assert_eq!(window.channel(0).unwrap()[0], 0.0);
        assert_eq!(window.channel(1).unwrap()[0], 20_000.0);
    }
}
