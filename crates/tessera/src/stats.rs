//! # Frame Statistics
//!
//! Per-frame counters and their running totals.

use tessera_render::{DmaStats, FrameReport};

/// What one frame did.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct FrameStats {
    /// Frame number, starting at 0.
    pub frame: u64,
    /// Seconds since the previous frame.
    pub dt: f32,
    /// Compositor output for this frame.
    pub render: FrameReport,
    /// Live entities after commit.
    pub entities: usize,
    /// Live sprites after commit.
    pub sprites: usize,
    /// Entities that died during their own update.
    pub entities_died: usize,
    /// Entities reclaimed by commit.
    pub entities_freed: usize,
    /// Sprites reclaimed by commit.
    pub sprites_freed: usize,
    /// Rasterization time in microseconds.
    pub render_us: u64,
    /// Whole frame time in microseconds.
    pub total_us: u64,
}

/// Accumulator for frame statistics.
#[derive(Clone, Debug)]
pub struct FrameStatsAccumulator {
    /// Total frames recorded.
    pub frames_recorded: u64,
    /// Sum of total frame times.
    pub total_us_sum: u64,
    /// Sum of render times.
    pub render_us_sum: u64,
    /// Min frame time.
    pub min_frame_us: u64,
    /// Max frame time.
    pub max_frame_us: u64,
    /// DMA counters over all frames.
    pub dma: DmaStats,
    /// Most entities seen after a commit.
    pub peak_entities: usize,
    /// Most sprites seen after a commit.
    pub peak_sprites: usize,
}

impl FrameStatsAccumulator {
    /// Creates a new accumulator.
    #[must_use]
    pub fn new() -> Self {
        Self {
            frames_recorded: 0,
            total_us_sum: 0,
            render_us_sum: 0,
            min_frame_us: u64::MAX,
            max_frame_us: 0,
            dma: DmaStats::default(),
            peak_entities: 0,
            peak_sprites: 0,
        }
    }

    /// Records a frame's statistics.
    pub fn record(&mut self, stats: &FrameStats) {
        self.frames_recorded += 1;
        self.total_us_sum += stats.total_us;
        self.render_us_sum += stats.render_us;
        self.min_frame_us = self.min_frame_us.min(stats.total_us);
        self.max_frame_us = self.max_frame_us.max(stats.total_us);
        self.dma.accumulate(&stats.render.dma);
        self.peak_entities = self.peak_entities.max(stats.entities);
        self.peak_sprites = self.peak_sprites.max(stats.sprites);
    }

    /// Returns average frame time in milliseconds.
    #[must_use]
    pub fn avg_frame_ms(&self) -> f64 {
        if self.frames_recorded == 0 {
            return 0.0;
        }
        (self.total_us_sum as f64 / self.frames_recorded as f64) / 1000.0
    }

    /// Returns average render time in milliseconds.
    #[must_use]
    pub fn avg_render_ms(&self) -> f64 {
        if self.frames_recorded == 0 {
            return 0.0;
        }
        (self.render_us_sum as f64 / self.frames_recorded as f64) / 1000.0
    }

    /// Returns average FPS.
    #[must_use]
    pub fn avg_fps(&self) -> f64 {
        let avg_ms = self.avg_frame_ms();
        if avg_ms <= 0.0 {
            return 0.0;
        }
        1000.0 / avg_ms
    }
}

impl Default for FrameStatsAccumulator {
    fn default() -> Self {
        Self::new()
    }
}
