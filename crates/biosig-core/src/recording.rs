//! Recording: immutable container for a completed multi-channel capture

use crate::error::{SigError, SigResult};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A completed multi-channel recording.
///
/// Data is channel-major: one sample sequence per named channel, all of equal
/// length. Each sample position is one epoch with a fixed nominal duration.
/// Recordings are immutable once constructed; preprocessing produces derived
/// recordings rather than mutating in place.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Recording {
    /// Unique identifier, carried onto every window sliced from this recording
    pub id: Uuid,
    channel_names: Vec<String>,
    data: Vec<Vec<f32>>,
    epoch_duration: f32,
}

impl Recording {
    /// Create a new recording from channel-major data.
    ///
    /// Every channel must have the same number of epochs and the epoch
    /// duration must be positive.
    pub fn new(
        channel_names: Vec<String>,
        data: Vec<Vec<f32>>,
        epoch_duration: f32,
    ) -> SigResult<Self> {
        if channel_names.is_empty() {
            return Err(SigError::data("recording has no channels"));
        }
        if channel_names.len() != data.len() {
            return Err(SigError::data(format!(
                "{} channel names but {} data channels",
                channel_names.len(),
                data.len()
            )));
        }
        let first_len = data[0].len();
        if first_len == 0 {
            return Err(SigError::data("recording has no epochs"));
        }
        for (name, channel) in channel_names.iter().zip(&data) {
            if channel.len() != first_len {
                return Err(SigError::data(format!(
                    "channel '{}' has {} epochs, expected {}",
                    name,
                    channel.len(),
                    first_len
                )));
            }
        }
        if epoch_duration <= 0.0 {
            return Err(SigError::data(format!(
                "epoch duration must be positive, got {}",
                epoch_duration
            )));
        }

        Ok(Recording {
            id: Uuid::new_v4(),
            channel_names,
            data,
            epoch_duration,
        })
    }

    /// Build a recording derived from this one (e.g. after preprocessing),
    /// keeping the source identity
    pub fn derived(
        &self,
        channel_names: Vec<String>,
        data: Vec<Vec<f32>>,
        epoch_duration: f32,
    ) -> SigResult<Self> {
        let mut recording = Recording::new(channel_names, data, epoch_duration)?;
        recording.id = self.id;
        Ok(recording)
    }

    /// Number of epochs per channel
    pub fn epoch_count(&self) -> usize {
        self.data[0].len()
    }

    /// Total duration in seconds
    pub fn duration(&self) -> f32 {
        self.epoch_count() as f32 * self.epoch_duration
    }

    /// Nominal duration of one epoch in seconds
    pub fn epoch_duration(&self) -> f32 {
        self.epoch_duration
    }

    /// Effective sampling rate in Hz
    pub fn sampling_rate(&self) -> f32 {
        1.0 / self.epoch_duration
    }

    /// Number of channels
    pub fn channel_count(&self) -> usize {
        self.data.len()
    }

    /// Channel names in storage order
    pub fn channel_names(&self) -> &[String] {
        &self.channel_names
    }

    /// Sample sequence for a channel by storage index
    pub fn channel_data(&self, index: usize) -> SigResult<&[f32]> {
        self.data.get(index).map(|v| v.as_slice()).ok_or_else(|| {
            SigError::data(format!(
                "channel index {} out of bounds (0-{})",
                index,
                self.data.len() - 1
            ))
        })
    }

    /// Sample sequence for a channel by name
    pub fn channel_by_name(&self, name: &str) -> SigResult<&[f32]> {
        let index = self
            .channel_names
            .iter()
            .position(|n| n == name)
            .ok_or_else(|| SigError::data(format!("no channel named '{}'", name)))?;
        self.channel_data(index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_channel_recording() -> Recording {
        Recording::new(
            vec!["CH1".to_string(), "CH2".to_string()],
            vec![vec![0.0; 100], vec![1.0; 100]],
            0.002,
        )
        .unwrap()
    }

    #[test]
    fn test_recording_creation() {
        let recording = two_channel_recording();
        assert_eq!(recording.epoch_count(), 100);
        assert_eq!(recording.channel_count(), 2);
        assert!((recording.duration() - 0.2).abs() < 1e-6);
        assert!((recording.sampling_rate() - 500.0).abs() < 1e-3);
    }

    #[test]
    fn test_ragged_channels_rejected() {
        let result = Recording::new(
            vec!["CH1".to_string(), "CH2".to_string()],
            vec![vec![0.0; 100], vec![0.0; 99]],
            0.002,
        );
        assert!(matches!(result, Err(SigError::DataError { .. })));
    }

    #[test]
    fn test_channel_lookup() {
        let recording = two_channel_recording();
        assert_eq!(recording.channel_by_name("CH2").unwrap()[0], 1.0);
        assert!(recording.channel_by_name("CH3").is_err());
        assert!(recording.channel_data(2).is_err());
    }

    #[test]
    fn test_derived_keeps_identity() {
        let recording = two_channel_recording();
        let derived = recording
            .derived(
                vec!["CH1".to_string()],
                vec![vec![0.5; 50]],
                0.004,
            )
            .unwrap();
        assert_eq!(derived.id, recording.id);
        assert_eq!(derived.epoch_count(), 50);
    }
}
