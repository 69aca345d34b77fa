/// Every instruction the interpreter knows how to execute.
///
/// Operand fields are carried by [`Instruction`], this only names the
/// operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Opcode {
  /// | Pattern | Semantics/RTL | Assembly |
  /// |---------|---------------|----------|
  /// | `00E0`  | `display ← 0` | `cls`    |
  ClearScreen,

  /// | Pattern | Semantics/RTL             | Assembly |
  /// |---------|---------------------------|----------|
  /// | `00EE`  | `pc ← stack[--sp]`        | `ret`    |
  Return,

  /// | Pattern | Semantics/RTL | Assembly   |
  /// |---------|---------------|------------|
  /// | `1nnn`  | `pc ← nnn`    | `jp nnn`   |
  Jump,

  /// | Pattern | Semantics/RTL                   | Assembly   |
  /// |---------|---------------------------------|------------|
  /// | `2nnn`  | `stack[sp++] ← pc; pc ← nnn`    | `call nnn` |
  Call,

  /// | Pattern | Semantics/RTL                  | Assembly     |
  /// |---------|--------------------------------|--------------|
  /// | `3xkk`  | `if v[x] == kk : pc ← pc + 2`  | `se vx, kk`  |
  SkipIfEqualImmediate,

  /// | Pattern | Semantics/RTL                  | Assembly     |
  /// |---------|--------------------------------|--------------|
  /// | `4xkk`  | `if v[x] != kk : pc ← pc + 2`  | `sne vx, kk` |
  SkipIfNotEqualImmediate,

  /// | Pattern | Semantics/RTL                    | Assembly     |
  /// |---------|----------------------------------|--------------|
  /// | `5xy0`  | `if v[x] == v[y] : pc ← pc + 2`  | `se vx, vy`  |
  SkipIfEqual,

  /// | Pattern | Semantics/RTL | Assembly     |
  /// |---------|---------------|--------------|
  /// | `6xkk`  | `v[x] ← kk`   | `ld vx, kk`  |
  LoadImmediate,

  /// | Pattern | Semantics/RTL        | Assembly      |
  /// |---------|----------------------|---------------|
  /// | `7xkk`  | `v[x] ← v[x] + kk`   | `add vx, kk`  |
  ///
  /// Wraps, and does not touch `v[F]`.
  AddImmediate,

  /// | Pattern | Semantics/RTL  | Assembly     |
  /// |---------|----------------|--------------|
  /// | `8xy0`  | `v[x] ← v[y]`  | `ld vx, vy`  |
  Move,

  /// | Pattern | Semantics/RTL         | Assembly     |
  /// |---------|-----------------------|--------------|
  /// | `8xy1`  | `v[x] ← v[x] \| v[y]` | `or vx, vy`  |
  Or,

  /// | Pattern | Semantics/RTL         | Assembly     |
  /// |---------|-----------------------|--------------|
  /// | `8xy2`  | `v[x] ← v[x] & v[y]`  | `and vx, vy` |
  And,

  /// | Pattern | Semantics/RTL         | Assembly     |
  /// |---------|-----------------------|--------------|
  /// | `8xy3`  | `v[x] ← v[x] ^ v[y]`  | `xor vx, vy` |
  Xor,

  /// | Pattern | Semantics/RTL                             | Assembly     |
  /// |---------|-------------------------------------------|--------------|
  /// | `8xy4`  | `v[x] ← v[x] + v[y]; v[F] ← carry`        | `add vx, vy` |
  Add,

  /// | Pattern | Semantics/RTL                              | Assembly     |
  /// |---------|--------------------------------------------|--------------|
  /// | `8xy5`  | `v[x] ← v[x] − v[y]; v[F] ← v[x] > v[y]`   | `sub vx, vy` |
  Sub,

  /// | Pattern | Semantics/RTL                        | Assembly  |
  /// |---------|--------------------------------------|-----------|
  /// | `8xy6`  | `v[x] ← v[x] >> 1; v[F] ← v[x] & 1`  | `shr vx`  |
  ShiftRight,

  /// | Pattern | Semantics/RTL                              | Assembly      |
  /// |---------|--------------------------------------------|---------------|
  /// | `8xy7`  | `v[x] ← v[y] − v[x]; v[F] ← v[y] > v[x]`   | `subn vx, vy` |
  SubReverse,

  /// | Pattern | Semantics/RTL                         | Assembly  |
  /// |---------|---------------------------------------|-----------|
  /// | `8xyE`  | `v[x] ← v[x] << 1; v[F] ← v[x] >> 7`  | `shl vx`  |
  ShiftLeft,

  /// | Pattern | Semantics/RTL                    | Assembly     |
  /// |---------|----------------------------------|--------------|
  /// | `9xy0`  | `if v[x] != v[y] : pc ← pc + 2`  | `sne vx, vy` |
  SkipIfNotEqual,

  /// | Pattern | Semantics/RTL | Assembly    |
  /// |---------|---------------|-------------|
  /// | `Annn`  | `i ← nnn`     | `ld i, nnn` |
  LoadIndex,

  /// | Pattern | Semantics/RTL       | Assembly      |
  /// |---------|---------------------|---------------|
  /// | `Bnnn`  | `pc ← nnn + v[0]`   | `jp v0, nnn`  |
  JumpOffset,

  /// | Pattern | Semantics/RTL           | Assembly      |
  /// |---------|-------------------------|---------------|
  /// | `Cxkk`  | `v[x] ← random & kk`    | `rnd vx, kk`  |
  Random,

  /// | Pattern | Semantics/RTL                                   | Assembly        |
  /// |---------|-------------------------------------------------|-----------------|
  /// | `Dxyn`  | `display ^= m[i..i + n] @ (v[x], v[y])`         | `drw vx, vy, n` |
  ///
  /// `v[F]` is set when any lit pixel gets turned off.
  Draw,

  /// | Pattern | Semantics/RTL  | Assembly    |
  /// |---------|----------------|-------------|
  /// | `Fx07`  | `v[x] ← dt`    | `ld vx, dt` |
  LoadDelay,

  /// | Pattern | Semantics/RTL | Assembly    |
  /// |---------|---------------|-------------|
  /// | `Fx15`  | `dt ← v[x]`   | `ld dt, vx` |
  SetDelay,

  /// | Pattern | Semantics/RTL      | Assembly    |
  /// |---------|--------------------|-------------|
  /// | `Fx1E`  | `i ← i + v[x]`     | `add i, vx` |
  AddIndex,

  /// | Pattern | Semantics/RTL     | Assembly   |
  /// |---------|-------------------|------------|
  /// | `Fx29`  | `i ← v[x] × 5`    | `ld f, vx` |
  LoadGlyph,

  /// | Pattern | Semantics/RTL                                  | Assembly   |
  /// |---------|------------------------------------------------|------------|
  /// | `Fx33`  | `m[i], m[i+1], m[i+2] ← bcd(v[x])`             | `ld b, vx` |
  StoreBcd,

  /// | Pattern | Semantics/RTL            | Assembly     |
  /// |---------|--------------------------|--------------|
  /// | `Fx55`  | `m[i..=i+x] ← v[0..=x]`  | `ld [i], vx` |
  StoreRegisters,

  /// | Pattern | Semantics/RTL            | Assembly     |
  /// |---------|--------------------------|--------------|
  /// | `Fx65`  | `v[0..=x] ← m[i..=i+x]`  | `ld vx, [i]` |
  LoadRegisters,

  /// Anything that doesn't match a pattern above.
  Unknown,
}

impl From<u16> for Opcode {
  fn from(word: u16) -> Self {
    let n = word & 0x000F;
    let kk = word & 0x00FF;
    match word >> 12 {
      0x0 => match word {
        0x00E0 => Self::ClearScreen,
        0x00EE => Self::Return,
        _ => Self::Unknown,
      },
      0x1 => Self::Jump,
      0x2 => Self::Call,
      0x3 => Self::SkipIfEqualImmediate,
      0x4 => Self::SkipIfNotEqualImmediate,
      0x5 if n == 0x0 => Self::SkipIfEqual,
      0x6 => Self::LoadImmediate,
      0x7 => Self::AddImmediate,
      0x8 => match n {
        0x0 => Self::Move,
        0x1 => Self::Or,
        0x2 => Self::And,
        0x3 => Self::Xor,
        0x4 => Self::Add,
        0x5 => Self::Sub,
        0x6 => Self::ShiftRight,
        0x7 => Self::SubReverse,
        0xE => Self::ShiftLeft,
        _ => Self::Unknown,
      },
      0x9 if n == 0x0 => Self::SkipIfNotEqual,
      0xA => Self::LoadIndex,
      0xB => Self::JumpOffset,
      0xC => Self::Random,
      0xD => Self::Draw,
      0xF => match kk {
        0x07 => Self::LoadDelay,
        0x15 => Self::SetDelay,
        0x1E => Self::AddIndex,
        0x29 => Self::LoadGlyph,
        0x33 => Self::StoreBcd,
        0x55 => Self::StoreRegisters,
        0x65 => Self::LoadRegisters,
        _ => Self::Unknown,
      },
      _ => Self::Unknown,
    }
  }
}

/// A decoded instruction word, split into every field an opcode might use
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Instruction {
  pub word: u16,
  pub opcode: Opcode,
  /// lowest 12 bits, an address
  pub nnn: u16,
  /// lowest nibble
  pub n: u8,
  pub x: usize,
  pub y: usize,
  /// lowest byte
  pub kk: u8,
}

impl From<u16> for Instruction {
  fn from(word: u16) -> Self {
    Self {
      word,
      opcode: word.into(),
      nnn: word & 0x0FFF,
      n: (word & 0x000F) as u8,
      x: ((word & 0x0F00) >> 8) as usize,
      y: ((word & 0x00F0) >> 4) as usize,
      kk: (word & 0x00FF) as u8,
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn fields() {
    let inst = Instruction::from(0xD12A);
    assert_eq!(inst.opcode, Opcode::Draw);
    assert_eq!(inst.nnn, 0x12A);
    assert_eq!(inst.n, 0xA);
    assert_eq!(inst.x, 0x1);
    assert_eq!(inst.y, 0x2);
    assert_eq!(inst.kk, 0x2A);
  }

  #[test]
  fn system_words() {
    assert_eq!(Opcode::from(0x00E0), Opcode::ClearScreen);
    assert_eq!(Opcode::from(0x00EE), Opcode::Return);
    // 0nnn machine routines are not supported
    assert_eq!(Opcode::from(0x0123), Opcode::Unknown);
  }

  #[test]
  fn arithmetic_subcodes() {
    #[rustfmt::skip]
    let table = [
      (0x8120, Opcode::Move),
      (0x8121, Opcode::Or),
      (0x8122, Opcode::And),
      (0x8123, Opcode::Xor),
      (0x8124, Opcode::Add),
      (0x8125, Opcode::Sub),
      (0x8126, Opcode::ShiftRight),
      (0x8127, Opcode::SubReverse),
      (0x812E, Opcode::ShiftLeft),
      (0x8128, Opcode::Unknown),
      (0x812F, Opcode::Unknown),
    ];
    for (word, opcode) in table {
      assert_eq!(Opcode::from(word), opcode, "{word:#06x}");
    }
  }

  #[test]
  fn register_compare_needs_zero_nibble() {
    assert_eq!(Opcode::from(0x5120), Opcode::SkipIfEqual);
    assert_eq!(Opcode::from(0x5121), Opcode::Unknown);
    assert_eq!(Opcode::from(0x9120), Opcode::SkipIfNotEqual);
    assert_eq!(Opcode::from(0x912F), Opcode::Unknown);
  }

  #[test]
  fn misc_subcodes() {
    assert_eq!(Opcode::from(0xF307), Opcode::LoadDelay);
    assert_eq!(Opcode::from(0xF315), Opcode::SetDelay);
    assert_eq!(Opcode::from(0xF31E), Opcode::AddIndex);
    assert_eq!(Opcode::from(0xF329), Opcode::LoadGlyph);
    assert_eq!(Opcode::from(0xF333), Opcode::StoreBcd);
    assert_eq!(Opcode::from(0xF355), Opcode::StoreRegisters);
    assert_eq!(Opcode::from(0xF365), Opcode::LoadRegisters);
    // keypad and sound timer are not part of this machine
    assert_eq!(Opcode::from(0xF30A), Opcode::Unknown);
    assert_eq!(Opcode::from(0xF318), Opcode::Unknown);
    assert_eq!(Opcode::from(0xE19E), Opcode::Unknown);
  }
}
