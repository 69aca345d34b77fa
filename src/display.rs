use std::fmt;

use crate::config::EdgePolicy;

pub const WIDTH: usize = 64;
pub const HEIGHT: usize = 32;

/// Value of a lit pixel. Unlit pixels are `0`.
pub const PIXEL_ON: u32 = 0xFFFF_FFFF;

/// A monochrome 64×32 framebuffer, row-major from the top-left corner.
///
/// Only the interpreter writes to it; whoever renders it gets a read-only
/// view through [`Framebuffer::pixels`] or [`Framebuffer::is_set`].
#[derive(Clone, PartialEq, Eq)]
pub struct Framebuffer {
  pixels: Box<[u32; WIDTH * HEIGHT]>,
}

impl Framebuffer {
  pub fn new() -> Self {
    Self {
      pixels: Box::new([0; WIDTH * HEIGHT]),
    }
  }

  pub fn width(&self) -> usize {
    WIDTH
  }

  pub fn height(&self) -> usize {
    HEIGHT
  }

  pub fn pixels(&self) -> &[u32] {
    &self.pixels[..]
  }

  /// Whether the pixel at `(x, y)` is lit, `false` when off the grid
  pub fn is_set(&self, x: usize, y: usize) -> bool {
    x < WIDTH && y < HEIGHT && self.pixels[y * WIDTH + x] != 0
  }

  pub fn clear(&mut self) {
    self.pixels.fill(0);
  }

  /// XOR a sprite onto the grid with its top-left corner at `(x0, y0)`.
  ///
  /// Each byte is one row, most significant bit leftmost. Returns `true` if
  /// any lit pixel was turned off.
  pub fn draw(&mut self, x0: usize, y0: usize, sprite: &[u8], edges: EdgePolicy) -> bool {
    let mut collision = false;
    for (row, byte) in sprite.iter().enumerate() {
      for col in 0..8 {
        if byte & (0x80 >> col) == 0 {
          continue;
        }
        let (x, y) = match edges {
          EdgePolicy::Clip => (x0 + col, y0 + row),
          EdgePolicy::Wrap => ((x0 + col) % WIDTH, (y0 + row) % HEIGHT),
        };
        if x >= WIDTH || y >= HEIGHT {
          continue;
        }
        let pixel = &mut self.pixels[y * WIDTH + x];
        if *pixel == PIXEL_ON {
          collision = true;
        }
        *pixel ^= PIXEL_ON;
      }
    }
    collision
  }
}

impl Default for Framebuffer {
  fn default() -> Self {
    Self::new()
  }
}

impl fmt::Debug for Framebuffer {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let lit = self.pixels.iter().filter(|p| **p != 0).count();
    f.debug_struct("Framebuffer").field("lit", &lit).finish()
  }
}

/// Draws lit pixels as `#` and unlit ones as `.`, one line per row
impl fmt::Display for Framebuffer {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    for row in self.pixels.chunks(WIDTH) {
      for pixel in row {
        f.write_str(if *pixel == 0 { "." } else { "#" })?;
      }
      writeln!(f)?;
    }
    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn new_is_blank() {
    let fb = Framebuffer::new();
    assert_eq!(fb.pixels().len(), 2048);
    assert!(fb.pixels().iter().all(|p| *p == 0));
  }

  #[test]
  fn draw_msb_first() {
    let mut fb = Framebuffer::new();
    let collision = fb.draw(0, 0, &[0b1000_0001], EdgePolicy::Clip);
    assert!(!collision);
    assert!(fb.is_set(0, 0));
    assert!(!fb.is_set(1, 0));
    assert!(fb.is_set(7, 0));
    assert_eq!(fb.pixels()[7], PIXEL_ON);
  }

  #[test]
  fn draw_twice_collides_and_erases() {
    let mut fb = Framebuffer::new();
    let sprite = [0xF0, 0x90, 0x90, 0x90, 0xF0];
    assert!(!fb.draw(10, 5, &sprite, EdgePolicy::Clip));
    assert!(fb.draw(10, 5, &sprite, EdgePolicy::Clip));
    assert_eq!(fb, Framebuffer::new());
  }

  #[test]
  fn clip_drops_offscreen() {
    let mut fb = Framebuffer::new();
    fb.draw(60, 30, &[0xFF, 0xFF, 0xFF], EdgePolicy::Clip);
    // 4 columns × 2 rows survive
    let lit = fb.pixels().iter().filter(|p| **p != 0).count();
    assert_eq!(lit, 8);
    assert!(fb.is_set(63, 31));
    assert!(!fb.is_set(0, 0));
  }

  #[test]
  fn wrap_comes_round() {
    let mut fb = Framebuffer::new();
    fb.draw(62, 31, &[0xC0 | 0x20, 0x80], EdgePolicy::Wrap);
    assert!(fb.is_set(62, 31));
    assert!(fb.is_set(63, 31));
    assert!(fb.is_set(0, 31));
    assert!(fb.is_set(62, 0));
  }

  #[test]
  fn clear() {
    let mut fb = Framebuffer::new();
    fb.draw(0, 0, &[0xFF; 15], EdgePolicy::Clip);
    fb.clear();
    assert_eq!(fb, Framebuffer::default());
  }

  #[test]
  fn render_text() {
    let mut fb = Framebuffer::new();
    fb.draw(0, 0, &[0x80], EdgePolicy::Clip);
    let text = fb.to_string();
    let first = text.lines().next().unwrap();
    assert_eq!(first.len(), WIDTH);
    assert!(first.starts_with("#."));
    assert_eq!(text.lines().count(), HEIGHT);
  }
}
