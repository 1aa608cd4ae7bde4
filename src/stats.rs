//! Frame statistics for HUD display and profiling

use std::time::Duration;

/// Per-frame render statistics
///
/// Frame-scoped values are reset by `begin_frame`; the frame rate is sampled
/// over half-second windows.
#[derive(Debug, Default)]
pub struct RenderStats {
    /// Wall-clock time per pass for the current frame, in draw order
    pub pass_times: Vec<(&'static str, Duration)>,

    /// Meshes beyond the shadow atlas budget this frame
    pub shadow_meshes_dropped: usize,
    /// Point lights beyond the instance buffer cap this frame
    pub light_instances_dropped: usize,

    pub frame_rate: f32,
    pub total_frames: u64,

    window_elapsed: f32,
    window_frames: u32,
}

impl RenderStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn begin_frame(&mut self) {
        self.pass_times.clear();
        self.shadow_meshes_dropped = 0;
        self.light_instances_dropped = 0;
    }

    pub fn record_pass(&mut self, name: &'static str, time: Duration) {
        self.pass_times.push((name, time));
    }

    pub fn end_frame(&mut self, delta_seconds: f32) {
        self.total_frames += 1;
        self.window_frames += 1;
        self.window_elapsed += delta_seconds;

        if self.window_elapsed >= 0.5 {
            self.frame_rate = self.window_frames as f32 / self.window_elapsed;
            self.window_elapsed = 0.0;
            self.window_frames = 0;
        }
    }

    /// Total measured GPU submission time for the frame
    pub fn gpu_time(&self) -> Duration {
        self.pass_times.iter().map(|(_, time)| *time).sum()
    }

    pub fn pass_time(&self, name: &str) -> Option<Duration> {
        self.pass_times
            .iter()
            .find(|(pass, _)| *pass == name)
            .map(|(_, time)| *time)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frame_rate_samples_over_half_second_windows() {
        let mut stats = RenderStats::new();
        for _ in 0..30 {
            stats.begin_frame();
            stats.end_frame(1.0 / 60.0);
        }
        assert!(stats.frame_rate > 59.0 && stats.frame_rate < 61.0);
        assert_eq!(stats.total_frames, 30);
    }

    #[test]
    fn begin_frame_resets_per_frame_values() {
        let mut stats = RenderStats::new();
        stats.record_pass("lights", Duration::from_millis(2));
        stats.shadow_meshes_dropped = 5;
        stats.begin_frame();
        assert!(stats.pass_times.is_empty());
        assert_eq!(stats.shadow_meshes_dropped, 0);
    }
}
