//! Lookup from speaker identity to mixer control channel.

use std::collections::HashMap;

/// Static mapping from speaker id to fader channel.
///
/// Unmapped ids are a configuration problem, not a runtime failure: callers skip them and
/// carry on with the rest of the batch.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FaderMapping {
    channels: HashMap<String, u32>,
}

impl FaderMapping {
    pub fn new(channels: HashMap<String, u32>) -> Self {
        Self { channels }
    }

    /// Returns the channel for `id`, or `None` when it is unmapped.
    pub fn resolve(&self, id: &str) -> Option<u32> {
        self.channels.get(id).copied()
    }

    /// Like [`resolve`](Self::resolve), but reports an unmapped id as a warning.
    pub fn resolve_or_warn(&self, id: &str) -> Option<u32> {
        let channel = self.resolve(id);
        if channel.is_none() {
            log::warn!("No fader mapping found for speaker id: {id}");
        }
        channel
    }

    /// Resolves a batch of ids, logging and skipping the unmapped ones.
    pub fn resolve_all<'a, I>(&self, ids: I) -> Vec<(&'a str, u32)>
    where
        I: IntoIterator<Item = &'a str>,
    {
        ids.into_iter()
            .filter_map(|id| self.resolve_or_warn(id).map(|channel| (id, channel)))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.channels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.channels.is_empty()
    }
}

/// Hard-wired patch of the main hall: nexo1..nexo8 on channels 16..23.
pub fn default_fader_channels() -> HashMap<String, u32> {
    (1..=8u32).map(|n| (format!("nexo{n}"), 15 + n)).collect()
}

pub fn default_fader_mapping() -> FaderMapping {
    FaderMapping::new(default_fader_channels())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_mapping() {
        let map = default_fader_mapping();
        assert_eq!(map.len(), 8);
        assert_eq!(map.resolve("nexo1"), Some(16));
        assert_eq!(map.resolve("nexo8"), Some(23));
        assert_eq!(map.resolve("nexo9"), None);
    }

    #[test]
    fn test_resolve_all_skips_unmapped() {
        let map = default_fader_mapping();
        let resolved = map.resolve_all(["nexo2", "ghost", "nexo4"]);

        assert_eq!(resolved, vec![("nexo2", 17), ("nexo4", 19)]);
    }

    #[test]
    fn test_empty_mapping() {
        let map = FaderMapping::default();
        assert!(map.is_empty());
        assert!(map.resolve_all(["nexo1"]).is_empty());
    }
}
