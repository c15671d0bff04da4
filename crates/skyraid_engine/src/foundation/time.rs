//! Frame timing

use std::time::Instant;

/// Frame timer driving the per-frame `dt`
///
/// The timer either follows the wall clock (`tick`) or advances by a fixed
/// step (`tick_fixed`), which is what headless runs and tests use.
pub struct Timer {
    last_frame: Instant,
    delta_time: f32,
    total_time: f32,
    frame_count: u64,
    fps_window: f32,
    fps_frames: u32,
    fps: u32,
}

impl Default for Timer {
    fn default() -> Self {
        Self::new()
    }
}

impl Timer {
    /// Create a new timer
    pub fn new() -> Self {
        Self {
            last_frame: Instant::now(),
            delta_time: 0.0,
            total_time: 0.0,
            frame_count: 0,
            fps_window: 0.0,
            fps_frames: 0,
            fps: 0,
        }
    }

    /// Advance by the wall-clock time since the previous tick
    pub fn tick(&mut self) {
        let now = Instant::now();
        let elapsed = now.duration_since(self.last_frame).as_secs_f32();
        self.last_frame = now;
        self.advance(elapsed);
    }

    /// Advance by exactly `dt` seconds
    pub fn tick_fixed(&mut self, dt: f32) {
        self.last_frame = Instant::now();
        self.advance(dt.max(0.0));
    }

    fn advance(&mut self, dt: f32) {
        self.delta_time = dt;
        self.total_time += dt;
        self.frame_count += 1;

        self.fps_window += dt;
        self.fps_frames += 1;
        if self.fps_window >= 1.0 {
            self.fps = self.fps_frames;
            self.fps_frames = 0;
            self.fps_window -= 1.0;
        }
    }

    /// Get the time since the last frame in seconds
    pub fn delta_time(&self) -> f32 {
        self.delta_time
    }

    /// Get the total elapsed time since timer creation
    pub fn total_time(&self) -> f32 {
        self.total_time
    }

    /// Get the current frame count
    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }

    /// Frames counted over the last full second
    pub fn frame_rate(&self) -> u32 {
        self.fps
    }
}
