//! Channel selection: a named subset of physical channels with stable positions

use serde::{Deserialize, Serialize};

/// Ordered set of named channels with per-channel enable flags.
///
/// Enabled channels are assigned consecutive positions in declaration order,
/// and that order is fixed for the lifetime of a pipeline run. All downstream
/// indexing (window rows, feature vector columns) follows it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChannelSelection {
    entries: Vec<ChannelEntry>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct ChannelEntry {
    name: String,
    enabled: bool,
}

impl ChannelSelection {
    /// Create a selection with every named channel enabled
    pub fn all(names: &[&str]) -> Self {
        ChannelSelection {
            entries: names
                .iter()
                .map(|n| ChannelEntry {
                    name: n.to_string(),
                    enabled: true,
                })
                .collect(),
        }
    }

    /// Create a selection from explicit (name, enabled) pairs
    pub fn with_flags(flags: Vec<(String, bool)>) -> Self {
        ChannelSelection {
            entries: flags
                .into_iter()
                .map(|(name, enabled)| ChannelEntry { name, enabled })
                .collect(),
        }
    }

    /// The 8-electrode EEG headset montage
    pub fn eeg_headset() -> Self {
        Self::all(&["CP3", "C3", "F5", "PO3", "PO4", "F6", "C4", "CP4"])
    }

    /// Generic n-channel EMG cuff (CH1..CHn)
    pub fn emg_cuff(channel_count: usize) -> Self {
        let names: Vec<String> = (1..=channel_count).map(|i| format!("CH{}", i)).collect();
        ChannelSelection {
            entries: names
                .into_iter()
                .map(|name| ChannelEntry {
                    name,
                    enabled: true,
                })
                .collect(),
        }
    }

    /// Enable or disable a channel by name; returns false if unknown
    pub fn set_enabled(&mut self, name: &str, enabled: bool) -> bool {
        for entry in &mut self.entries {
            if entry.name == name {
                entry.enabled = enabled;
                return true;
            }
        }
        false
    }

    /// Enabled channel names in position order
    pub fn enabled(&self) -> impl Iterator<Item = &str> {
        self.entries
            .iter()
            .filter(|e| e.enabled)
            .map(|e| e.name.as_str())
    }

    /// Number of enabled channels
    pub fn enabled_count(&self) -> usize {
        self.entries.iter().filter(|e| e.enabled).count()
    }

    /// Total number of declared channels, enabled or not
    pub fn declared_count(&self) -> usize {
        self.entries.len()
    }

    /// Position of an enabled channel, counted over enabled channels only
    pub fn position(&self, name: &str) -> Option<usize> {
        self.enabled().position(|n| n == name)
    }

    /// Enabled channel name at the given position
    pub fn name_at(&self, position: usize) -> Option<&str> {
        self.enabled().nth(position)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_positions_follow_declaration_order() {
        let sel = ChannelSelection::eeg_headset();
        assert_eq!(sel.enabled_count(), 8);
        assert_eq!(sel.position("CP3"), Some(0));
        assert_eq!(sel.position("CP4"), Some(7));
        assert_eq!(sel.name_at(1), Some("C3"));
    }

    #[test]
    fn test_disabled_channels_are_skipped() {
        let mut sel = ChannelSelection::emg_cuff(4);
        assert!(sel.set_enabled("CH2", false));
        assert_eq!(sel.enabled_count(), 3);
        // CH3 shifts down into position 1
        assert_eq!(sel.position("CH3"), Some(1));
        assert_eq!(sel.position("CH2"), None);
    }

    #[test]
    fn test_unknown_channel() {
        let mut sel = ChannelSelection::emg_cuff(2);
        assert!(!sel.set_enabled("CH9", false));
        assert_eq!(sel.position("CH9"), None);
    }
}
