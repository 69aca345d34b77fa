/// Raw CHIP-8 machine code, as handed to [`crate::vm::Vm::load_region`].
///
/// No header or format, the bytes land verbatim at
/// [`crate::vm::PROGRAM_START`].
pub trait Region {
  fn bytes(&self) -> &[u8];
}

/// An owned program image, typically read straight from a `.ch8` file
pub struct Chunk {
  bytes: Vec<u8>,
}

impl From<Vec<u8>> for Chunk {
  fn from(bytes: Vec<u8>) -> Self {
    Self { bytes }
  }
}

impl Region for Chunk {
  fn bytes(&self) -> &[u8] {
    &self.bytes
  }
}

// lets tests and embedders load a borrowed image without copying it into a
// `Chunk` first
impl Region for [u8] {
  fn bytes(&self) -> &[u8] {
    self
  }
}
