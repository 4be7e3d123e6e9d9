//! Synthetic moving-blocks pattern, the provider of last resort.

use async_trait::async_trait;

use super::FrameSource;
use crate::error::ProjectorResult;
use crate::frame::Frame;

const BLOCKS: u32 = 5;
const HALF_SIDE: i64 = 30;

/// Always-available source drawing coloured squares that move with each
/// acquisition. Output depends only on the tick count.
#[derive(Debug, Clone)]
pub struct TestPatternSource {
    width: u32,
    height: u32,
    tick: u64,
}

impl TestPatternSource {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            tick: 0,
        }
    }

    pub fn tick(&self) -> u64 {
        self.tick
    }

    /// Render the pattern for `tick` without advancing.
    pub fn render(&self, tick: u64) -> ProjectorResult<Frame> {
        let (w, h) = (i64::from(self.width), i64::from(self.height));
        let t = tick as i64;
        let blocks: Vec<(i64, i64, [u8; 3])> = (0..i64::from(BLOCKS))
            .map(|i| {
                let cx = (t + i * 100).rem_euclid(w.max(1));
                let cy = (t + i * 50).rem_euclid(h.max(1));
                let colour = [
                    ((t + i * 50) % 256) as u8,
                    ((t + i * 100) % 256) as u8,
                    ((t + i * 150) % 256) as u8,
                ];
                (cx, cy, colour)
            })
            .collect();

        Frame::from_fn(self.width, self.height, |x, y| {
            let (x, y) = (i64::from(x), i64::from(y));
            blocks
                .iter()
                .rev()
                .find(|(cx, cy, _)| (x - cx).abs() <= HALF_SIDE && (y - cy).abs() <= HALF_SIDE)
                .map(|(_, _, c)| *c)
                .unwrap_or([0, 0, 0])
        })
    }
}

#[async_trait]
impl FrameSource for TestPatternSource {
    async fn acquire(&mut self) -> ProjectorResult<Frame> {
        let frame = self.render(self.tick)?;
        self.tick = self.tick.wrapping_add(1);
        Ok(frame)
    }

    fn name(&self) -> String {
        format!("test-pattern {}x{}", self.width, self.height)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_pattern_moves_between_ticks() {
        let mut source = TestPatternSource::new(320, 240);
        let first = source.acquire().await.unwrap();
        let second = source.acquire().await.unwrap();
        assert_eq!(source.tick(), 2);
        assert_ne!(first, second);
        assert_eq!(first, source.render(0).unwrap());
    }

    #[test]
    fn test_block_is_drawn_at_origin() {
        let source = TestPatternSource::new(320, 240);
        let frame = source.render(10).unwrap();
        assert_eq!(frame.pixel(10, 10), [10, 10, 10]);
        assert_eq!(frame.pixel(319, 120), [0, 0, 0]);
    }
}
