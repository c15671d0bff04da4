//! # Render Backend Abstraction
//!
//! The frame driver talks to the GPU only through [`RenderBackend`]. A frame is
//!
//! ```text
//! begin_frame -> submit(commands) -> present -> move_to_next_frame
//! ```
//!
//! `move_to_next_frame` signals the fence of the buffer just presented and
//! blocks until the next buffer's previous work has completed, so at most
//! `buffer_count()` frames are ever in flight.

use super::{CommandList, RenderError};

/// Graphics backend driven once per frame
pub trait RenderBackend {
    /// Number of swap-chain buffers (and so the in-flight frame limit)
    fn buffer_count(&self) -> usize;

    /// Index of the swap-chain buffer being recorded
    fn frame_index(&self) -> usize;

    /// Reset the command allocator for the current buffer and open a frame
    fn begin_frame(&mut self) -> Result<(), RenderError>;

    /// Execute one recorded command list
    fn submit(&mut self, commands: &CommandList) -> Result<(), RenderError>;

    /// Present the current buffer
    fn present(&mut self) -> Result<(), RenderError>;

    /// Signal this frame's fence and wait until the next buffer is free
    fn move_to_next_frame(&mut self) -> Result<(), RenderError>;

    /// Block until all submitted work has finished
    fn wait_for_gpu(&mut self) -> Result<(), RenderError>;

    /// Swap-chain size changed
    fn resize(&mut self, _width: u32, _height: u32) -> Result<(), RenderError> {
        Ok(())
    }
}

/// Counters collected by [`HeadlessBackend`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FrameStats {
    /// Frames presented
    pub frames_presented: u64,
    /// Command lists executed
    pub lists_submitted: u64,
    /// Commands executed
    pub commands_submitted: u64,
    /// Draw commands executed
    pub draws_submitted: u64,
    /// Most frames observed in flight at once
    pub max_in_flight: u64,
}

/// Backend without a device
///
/// Commands are counted and dropped. The simulated GPU finishes a frame only
/// when the CPU waits for it, which is the worst case for the fence logic.
#[derive(Debug)]
pub struct HeadlessBackend {
    buffer_count: usize,
    frame_index: usize,
    fence_values: Vec<u64>,
    next_fence: u64,
    completed_fence: u64,
    in_frame: bool,
    stats: FrameStats,
    last_list_len: usize,
}

impl HeadlessBackend {
    /// Create a backend with `buffer_count` swap-chain buffers (at least 1)
    pub fn new(buffer_count: usize) -> Self {
        let buffer_count = buffer_count.max(1);
        log::info!("Headless backend with {buffer_count} swap-chain buffers");
        Self {
            buffer_count,
            frame_index: 0,
            fence_values: vec![0; buffer_count],
            next_fence: 0,
            completed_fence: 0,
            in_frame: false,
            stats: FrameStats::default(),
            last_list_len: 0,
        }
    }

    /// Counters so far
    pub const fn stats(&self) -> FrameStats {
        self.stats
    }

    /// Length of the most recently submitted list
    pub const fn last_list_len(&self) -> usize {
        self.last_list_len
    }

    fn in_flight(&self) -> u64 {
        self.next_fence - self.completed_fence
    }
}

impl RenderBackend for HeadlessBackend {
    fn buffer_count(&self) -> usize {
        self.buffer_count
    }

    fn frame_index(&self) -> usize {
        self.frame_index
    }

    fn begin_frame(&mut self) -> Result<(), RenderError> {
        if self.in_frame {
            return Err(RenderError::FrameAlreadyBegun(self.stats.frames_presented));
        }
        self.in_frame = true;
        Ok(())
    }

    fn submit(&mut self, commands: &CommandList) -> Result<(), RenderError> {
        if !self.in_frame {
            return Err(RenderError::FrameNotBegun);
        }
        self.stats.lists_submitted += 1;
        self.stats.commands_submitted += commands.len() as u64;
        self.stats.draws_submitted += commands.draw_count() as u64;
        self.last_list_len = commands.len();
        log::trace!("Submitted {} commands ({} draws)", commands.len(), commands.draw_count());
        Ok(())
    }

    fn present(&mut self) -> Result<(), RenderError> {
        if !self.in_frame {
            return Err(RenderError::FrameNotBegun);
        }
        self.in_frame = false;
        self.stats.frames_presented += 1;
        Ok(())
    }

    fn move_to_next_frame(&mut self) -> Result<(), RenderError> {
        self.next_fence += 1;
        self.fence_values[self.frame_index] = self.next_fence;
        self.stats.max_in_flight = self.stats.max_in_flight.max(self.in_flight());

        self.frame_index = (self.frame_index + 1) % self.buffer_count;
        let required = self.fence_values[self.frame_index];
        if self.completed_fence < required {
            // Waiting on the fence completes everything up to it.
            self.completed_fence = required;
        }
        Ok(())
    }

    fn wait_for_gpu(&mut self) -> Result<(), RenderError> {
        self.completed_fence = self.next_fence;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::RenderCommand;

    fn run_frame(backend: &mut HeadlessBackend) {
        let mut list = CommandList::new();
        list.push(RenderCommand::SetRootSignature);
        backend.begin_frame().unwrap();
        backend.submit(&list).unwrap();
        backend.present().unwrap();
        backend.move_to_next_frame().unwrap();
    }

    #[test]
    fn test_frames_in_flight_bounded_by_buffers() {
        let mut backend = HeadlessBackend::new(2);
        for _ in 0..10 {
            run_frame(&mut backend);
            assert!(backend.in_flight() <= 2);
        }
        assert_eq!(backend.stats().frames_presented, 10);
        assert_eq!(backend.stats().max_in_flight, 2);
        assert_eq!(backend.frame_index(), 0);
    }

    #[test]
    fn test_submit_outside_frame_is_rejected() {
        let mut backend = HeadlessBackend::new(2);
        assert_eq!(backend.submit(&CommandList::new()), Err(RenderError::FrameNotBegun));
        backend.begin_frame().unwrap();
        assert_eq!(backend.begin_frame(), Err(RenderError::FrameAlreadyBegun(0)));
    }

    #[test]
    fn test_wait_for_gpu_drains() {
        let mut backend = HeadlessBackend::new(3);
        run_frame(&mut backend);
        run_frame(&mut backend);
        backend.wait_for_gpu().unwrap();
        assert_eq!(backend.in_flight(), 0);
    }
}
