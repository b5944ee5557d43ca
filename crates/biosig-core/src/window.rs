//! Window: a contiguous span of epochs sliced from a recording

use uuid::Uuid;

/// A 2-D slice (channel x sample) of a recording.
///
/// Windows may overlap with their neighbors. Rows follow the enabled-channel
/// position order of the selection that produced them.
#[derive(Debug, Clone)]
pub struct Window {
    /// First epoch index (inclusive)
    pub start: usize,
    /// Last epoch index (exclusive)
    pub end: usize,
    /// Identity of the source recording
    pub recording_id: Uuid,
    /// Per-channel sample data, channel rows in selection order
    pub data: Vec<Vec<f32>>,
}

impl Window {
    /// Number of epochs in this window
    pub fn len(&self) -> usize {
        self.end - self.start
    }

    /// True when the window holds no epochs
    pub fn is_empty(&self) -> bool {
        self.end == self.start
    }

    /// Number of channel rows
    pub fn channel_count(&self) -> usize {
        self.data.len()
    }

    /// Sample data for one channel row
    pub fn channel(&self, position: usize) -> Option<&[f32]> {
        self.data.get(position).map(|v| v.as_slice())
    }
}
