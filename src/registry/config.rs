//! Registry configuration

/// Configuration for the session registry
#[derive(Debug, Clone, Default)]
pub struct RegistryConfig {
    /// Maximum frames held in each publisher's keyframe cache
    /// (`None` = unbounded)
    pub keyframe_cache_max_frames: Option<usize>,
}

impl RegistryConfig {
    /// Cap the keyframe cache; the oldest frames are dropped first
    pub fn keyframe_cache_max_frames(mut self, max: usize) -> Self {
        self.keyframe_cache_max_frames = Some(max);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_unbounded() {
        assert_eq!(RegistryConfig::default().keyframe_cache_max_frames, None);
    }

    #[test]
    fn test_builder() {
        let config = RegistryConfig::default().keyframe_cache_max_frames(300);
        assert_eq!(config.keyframe_cache_max_frames, Some(300));
    }
}
