use std::fmt;

use log::{debug, trace, warn};
use rand::rngs::StdRng;
use rand::{RngCore, SeedableRng};

use crate::config::{Config, OpcodePolicy};
use crate::display::{Framebuffer, HEIGHT, WIDTH};
use crate::opcode::{Instruction, Opcode};
use crate::region::Region;

/// The type of a single general purpose register in our virtual machine
pub type Register = u8;

pub const MEMORY_SIZE: usize = 4096;

/// Where programs are loaded, and where execution starts
pub const PROGRAM_START: u16 = 0x200;

pub const STACK_DEPTH: usize = 16;

/// `v[F]`, the flag register
const VF: usize = 0xF;

/// Bytes per hexadecimal glyph
const GLYPH_SIZE: u16 = 5;

/// Glyphs for 0-F, installed at address 0
#[rustfmt::skip]
const FONT: [u8; 80] = [
  0xF0, 0x90, 0x90, 0x90, 0xF0, // 0
  0x20, 0x60, 0x20, 0x20, 0x70, // 1
  0xF0, 0x10, 0xF0, 0x80, 0xF0, // 2
  0xF0, 0x10, 0xF0, 0x10, 0xF0, // 3
  0x90, 0x90, 0xF0, 0x10, 0x10, // 4
  0xF0, 0x80, 0xF0, 0x10, 0xF0, // 5
  0xF0, 0x80, 0xF0, 0x90, 0xF0, // 6
  0xF0, 0x10, 0x20, 0x40, 0x40, // 7
  0xF0, 0x90, 0xF0, 0x90, 0xF0, // 8
  0xF0, 0x90, 0xF0, 0x10, 0xF0, // 9
  0xF0, 0x90, 0xF0, 0x90, 0x90, // A
  0xE0, 0x90, 0xE0, 0x90, 0xE0, // B
  0xF0, 0x80, 0x80, 0x80, 0xF0, // C
  0xE0, 0x90, 0x90, 0x90, 0xE0, // D
  0xF0, 0x80, 0xF0, 0x80, 0xF0, // E
  0xF0, 0x80, 0xF0, 0x80, 0x80, // F
];

/// A virtual machine for the CHIP-8 instruction set.
///
/// There is no clock in here. Every call to [`Vm::step`] runs exactly one
/// instruction and ticks the delay timer once, so whoever owns the machine
/// decides how fast it goes.
pub struct Vm {
  pc: u16,
  i: u16,
  sp: u8,
  registers: [Register; 16],
  stack: [u16; STACK_DEPTH],
  timer: u8,
  memory: Box<[u8; MEMORY_SIZE]>,
  display: Framebuffer,
  config: Config,
  rng: Box<dyn RngCore + Send>,
}

impl Vm {
  /// Create a new virtual machine with the font installed, seeded from the OS
  pub fn new() -> Self {
    Self::with_config(Config::default())
  }

  pub fn with_config(config: Config) -> Self {
    let rng = match config.seed {
      Some(seed) => StdRng::seed_from_u64(seed),
      None => StdRng::from_entropy(),
    };
    Self::with_rng(config, rng)
  }

  /// Create a virtual machine drawing its random bytes from `rng`
  pub fn with_rng<G>(config: Config, rng: G) -> Self
  where
    G: RngCore + Send + 'static,
  {
    let mut vm = Self {
      pc: PROGRAM_START,
      i: 0,
      sp: 0,
      registers: [0; 16],
      stack: [0; STACK_DEPTH],
      timer: 0,
      memory: Box::new([0; MEMORY_SIZE]),
      display: Framebuffer::new(),
      config,
      rng: Box::new(rng),
    };
    vm.memory[..FONT.len()].copy_from_slice(&FONT);
    vm
  }

  /// Put everything back the way [`Vm::with_config`] left it, program
  /// included. The random source carries on where it was.
  pub fn reset(&mut self) {
    debug!("reset");
    self.pc = PROGRAM_START;
    self.i = 0;
    self.sp = 0;
    self.registers = [0; 16];
    self.stack = [0; STACK_DEPTH];
    self.timer = 0;
    self.memory.fill(0);
    self.memory[..FONT.len()].copy_from_slice(&FONT);
    self.display.clear();
  }

  /// [`Vm::reset`], and restart the random source from `seed`
  pub fn reset_with_seed(&mut self, seed: u64) {
    self.reset();
    self.rng = Box::new(StdRng::seed_from_u64(seed));
  }

  /// Copy `bytes` into memory starting at `base`. Nothing else is touched.
  pub fn load(&mut self, bytes: &[u8], base: u16) -> Result<(), Error> {
    let start = base as usize;
    let too_large = Error::ImageTooLarge {
      base: start,
      len: bytes.len(),
    };
    let end = start.checked_add(bytes.len()).ok_or(too_large)?;
    let target = self.memory.get_mut(start..end).ok_or(too_large)?;
    target.copy_from_slice(bytes);
    debug!("loaded {} bytes at {:#05x}", bytes.len(), start);
    Ok(())
  }

  /// Load a program image at [`PROGRAM_START`]
  pub fn load_region<R>(&mut self, region: &R) -> Result<(), Error>
  where
    R: Region + ?Sized,
  {
    self.load(region.bytes(), PROGRAM_START)
  }

  /// Step through a single opcode/instruction.
  ///
  /// On failure the machine is left as it was before the call, with `pc`
  /// still on the offending instruction.
  pub fn step(&mut self) -> Result<(), Error> {
    let pc = self.pc;
    let word = self.read_word(pc as usize)?;
    let inst = Instruction::from(word);
    trace!("{:#05x}: {:04x} {:?}", pc, word, inst.opcode);
    self.pc = pc.wrapping_add(2);

    let result = Task::new(self, inst, pc).run();
    if let Err(err) = result {
      self.pc = pc;
      return Err(err);
    }

    self.timer = self.timer.saturating_sub(1);
    Ok(())
  }

  pub fn pc(&self) -> u16 {
    self.pc
  }

  pub fn i(&self) -> u16 {
    self.i
  }

  pub fn sp(&self) -> u8 {
    self.sp
  }

  pub fn timer(&self) -> u8 {
    self.timer
  }

  pub fn registers(&self) -> &[Register; 16] {
    &self.registers
  }

  /// `v[x]`, only the low nibble of `x` is used
  pub fn register(&self, x: usize) -> Register {
    self.registers[x & 0xF]
  }

  pub fn memory(&self) -> &[u8] {
    &self.memory[..]
  }

  pub fn display(&self) -> &Framebuffer {
    &self.display
  }

  pub fn config(&self) -> &Config {
    &self.config
  }

  pub fn read_byte(&self, address: usize) -> Result<u8, Error> {
    Ok(self.slice(address, 1)?[0])
  }

  fn read_word(&self, address: usize) -> Result<u16, Error> {
    let bytes = self.slice(address, 2)?;
    Ok(u16::from_be_bytes([bytes[0], bytes[1]]))
  }

  fn slice(&self, address: usize, len: usize) -> Result<&[u8], Error> {
    self
      .memory
      .get(address..address + len)
      .ok_or(Error::MemoryOutOfRange {
        address: address.max(MEMORY_SIZE),
      })
  }

  fn slice_mut(&mut self, address: usize, len: usize) -> Result<&mut [u8], Error> {
    self
      .memory
      .get_mut(address..address + len)
      .ok_or(Error::MemoryOutOfRange {
        address: address.max(MEMORY_SIZE),
      })
  }
}

impl Default for Vm {
  fn default() -> Self {
    Self::new()
  }
}

impl fmt::Debug for Vm {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("Vm")
      .field("pc", &format_args!("{:#05x}", self.pc))
      .field("i", &format_args!("{:#05x}", self.i))
      .field("sp", &self.sp)
      .field("registers", &self.registers)
      .field("stack", &&self.stack[..self.sp as usize])
      .field("timer", &self.timer)
      .field("display", &self.display)
      .field("config", &self.config)
      .finish_non_exhaustive()
  }
}

/// A fault raised while loading or executing
#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
  #[error("image of {len} bytes at {base:#05x} does not fit in memory")]
  ImageTooLarge { base: usize, len: usize },

  #[error("call stack overflowed at {pc:#05x}")]
  StackOverflow { pc: u16 },

  #[error("return with an empty call stack at {pc:#05x}")]
  StackUnderflow { pc: u16 },

  #[error("memory access out of range at {address:#05x}")]
  MemoryOutOfRange { address: usize },

  #[error("unknown opcode {word:#06x} at {pc:#05x}")]
  UnknownOpcode { word: u16, pc: u16 },
}

struct Task<'vm> {
  vm: &'vm mut Vm,
  inst: Instruction,
  // address the instruction was fetched from
  pc: u16,
}

impl<'vm> Task<'vm> {
  fn new(vm: &'vm mut Vm, inst: Instruction, pc: u16) -> Self {
    Self { vm, inst, pc }
  }

  #[inline]
  fn vx(&self) -> Register {
    self.vm.registers[self.inst.x]
  }

  #[inline]
  fn vy(&self) -> Register {
    self.vm.registers[self.inst.y]
  }

  /// Write the flag, then `v[x]` from whatever `op` makes of the registers
  /// afterwards. When `x` is `F` the result overwrites the flag.
  fn flag_then<F>(&mut self, flag: bool, op: F)
  where
    F: Fn(Register, Register) -> Register,
  {
    self.vm.registers[VF] = flag as Register;
    self.vm.registers[self.inst.x] = op(self.vx(), self.vy());
  }

  fn skip_if(&mut self, condition: bool) {
    if condition {
      self.vm.pc = self.vm.pc.wrapping_add(2);
    }
  }

  fn run(&mut self) -> Result<(), Error> {
    match self.inst.opcode {
      Opcode::ClearScreen => clear_screen(self),
      Opcode::Return => ret(self)?,
      Opcode::Jump => jump(self),
      Opcode::Call => call(self)?,
      Opcode::SkipIfEqualImmediate => self.skip_if(self.vx() == self.inst.kk),
      Opcode::SkipIfNotEqualImmediate => self.skip_if(self.vx() != self.inst.kk),
      Opcode::SkipIfEqual => self.skip_if(self.vx() == self.vy()),
      Opcode::SkipIfNotEqual => self.skip_if(self.vx() != self.vy()),
      Opcode::LoadImmediate => load_immediate(self),
      Opcode::AddImmediate => add_immediate(self),
      Opcode::Move => bitwise(self, |_, y| y),
      Opcode::Or => bitwise(self, |x, y| x | y),
      Opcode::And => bitwise(self, |x, y| x & y),
      Opcode::Xor => bitwise(self, |x, y| x ^ y),
      Opcode::Add => add(self),
      Opcode::Sub => sub(self),
      Opcode::ShiftRight => shift_right(self),
      Opcode::SubReverse => sub_reverse(self),
      Opcode::ShiftLeft => shift_left(self),
      Opcode::LoadIndex => load_index(self),
      Opcode::JumpOffset => jump_offset(self),
      Opcode::Random => random(self),
      Opcode::Draw => draw(self)?,
      Opcode::LoadDelay => load_delay(self),
      Opcode::SetDelay => set_delay(self),
      Opcode::AddIndex => add_index(self),
      Opcode::LoadGlyph => load_glyph(self),
      Opcode::StoreBcd => store_bcd(self)?,
      Opcode::StoreRegisters => store_registers(self)?,
      Opcode::LoadRegisters => load_registers(self)?,
      Opcode::Unknown => unknown(self)?,
    }
    Ok(())
  }
}

// display ← 0
fn clear_screen(task: &mut Task<'_>) {
  task.vm.display.clear();
}

// pc ← stack[--sp]
fn ret(task: &mut Task<'_>) -> Result<(), Error> {
  if task.vm.sp == 0 {
    return Err(Error::StackUnderflow { pc: task.pc });
  }
  task.vm.sp -= 1;
  task.vm.pc = task.vm.stack[task.vm.sp as usize];
  debug!("{:#05x}: return to {:#05x}", task.pc, task.vm.pc);
  Ok(())
}

// pc ← nnn
fn jump(task: &mut Task<'_>) {
  task.vm.pc = task.inst.nnn;
}

// stack[sp++] ← pc; pc ← nnn
fn call(task: &mut Task<'_>) -> Result<(), Error> {
  let sp = task.vm.sp as usize;
  if sp >= STACK_DEPTH {
    return Err(Error::StackOverflow { pc: task.pc });
  }
  // pc has already moved past the call
  task.vm.stack[sp] = task.vm.pc;
  task.vm.sp += 1;
  task.vm.pc = task.inst.nnn;
  debug!("{:#05x}: call {:#05x}, depth {}", task.pc, task.inst.nnn, task.vm.sp);
  Ok(())
}

// v[x] ← kk
fn load_immediate(task: &mut Task<'_>) {
  task.vm.registers[task.inst.x] = task.inst.kk;
}

// v[x] ← v[x] + kk
fn add_immediate(task: &mut Task<'_>) {
  task.vm.registers[task.inst.x] = task.vx().wrapping_add(task.inst.kk);
}

// v[x] ← v[x] op v[y]
fn bitwise<F>(task: &mut Task<'_>, op: F)
where
  F: Fn(Register, Register) -> Register,
{
  task.vm.registers[task.inst.x] = op(task.vx(), task.vy());
}

// v[F] ← carry; v[x] ← v[x] + v[y]
fn add(task: &mut Task<'_>) {
  let (sum, carry) = task.vx().overflowing_add(task.vy());
  task.flag_then(carry, |_, _| sum);
}

// v[F] ← v[x] > v[y]; v[x] ← v[x] − v[y]
fn sub(task: &mut Task<'_>) {
  let flag = task.vx() > task.vy();
  task.flag_then(flag, |vx, vy| vx.wrapping_sub(vy));
}

// v[F] ← v[y] > v[x]; v[x] ← v[y] − v[x]
fn sub_reverse(task: &mut Task<'_>) {
  let flag = task.vy() > task.vx();
  task.flag_then(flag, |vx, vy| vy.wrapping_sub(vx));
}

// v[F] ← lsb; v[x] ← v[x] >> 1
fn shift_right(task: &mut Task<'_>) {
  let flag = task.vx() & 0x01 != 0;
  task.flag_then(flag, |vx, _| vx >> 1);
}

// v[F] ← msb; v[x] ← v[x] << 1
fn shift_left(task: &mut Task<'_>) {
  let flag = task.vx() & 0x80 != 0;
  task.flag_then(flag, |vx, _| vx << 1);
}

// i ← nnn
fn load_index(task: &mut Task<'_>) {
  task.vm.i = task.inst.nnn;
}

// pc ← nnn + v[0]
fn jump_offset(task: &mut Task<'_>) {
  task.vm.pc = task.inst.nnn + task.vm.registers[0] as u16;
}

// v[x] ← random & kk
fn random(task: &mut Task<'_>) {
  let byte = task.vm.rng.next_u32() as u8;
  task.vm.registers[task.inst.x] = byte & task.inst.kk;
}

// display ^= m[i..i + n] at (v[x] mod 64, v[y] mod 32); v[F] ← collision
fn draw(task: &mut Task<'_>) -> Result<(), Error> {
  let rows = task.inst.n as usize;
  let mut sprite = [0u8; 15];
  sprite[..rows].copy_from_slice(task.vm.slice(task.vm.i as usize, rows)?);

  let x0 = task.vx() as usize % WIDTH;
  let y0 = task.vy() as usize % HEIGHT;
  let edges = task.vm.config.edges;
  let collision = task.vm.display.draw(x0, y0, &sprite[..rows], edges);
  task.vm.registers[VF] = collision as Register;
  Ok(())
}

// v[x] ← dt
fn load_delay(task: &mut Task<'_>) {
  task.vm.registers[task.inst.x] = task.vm.timer;
}

// dt ← v[x]
fn set_delay(task: &mut Task<'_>) {
  task.vm.timer = task.vx();
}

// i ← i + v[x]
//
// no range check here, only on the next access through i
fn add_index(task: &mut Task<'_>) {
  task.vm.i = task.vm.i.wrapping_add(task.vx() as u16);
}

// i ← v[x] × 5
fn load_glyph(task: &mut Task<'_>) {
  task.vm.i = task.vx() as u16 * GLYPH_SIZE;
}

// m[i], m[i+1], m[i+2] ← hundreds, tens, units of v[x]
fn store_bcd(task: &mut Task<'_>) -> Result<(), Error> {
  let vx = task.vx();
  let i = task.vm.i as usize;
  let digits = task.vm.slice_mut(i, 3)?;
  digits[0] = vx / 100;
  digits[1] = vx / 10 % 10;
  digits[2] = vx % 10;
  Ok(())
}

// m[i..=i+x] ← v[0..=x]
fn store_registers(task: &mut Task<'_>) -> Result<(), Error> {
  let count = task.inst.x + 1;
  let registers = task.vm.registers;
  let i = task.vm.i as usize;
  task
    .vm
    .slice_mut(i, count)?
    .copy_from_slice(&registers[..count]);
  Ok(())
}

// v[0..=x] ← m[i..=i+x]
fn load_registers(task: &mut Task<'_>) -> Result<(), Error> {
  let count = task.inst.x + 1;
  let i = task.vm.i as usize;
  let mut values = [0u8; 16];
  values[..count].copy_from_slice(task.vm.slice(i, count)?);
  task.vm.registers[..count].copy_from_slice(&values[..count]);
  Ok(())
}

fn unknown(task: &mut Task<'_>) -> Result<(), Error> {
  match task.vm.config.opcodes {
    OpcodePolicy::Lenient => {
      warn!("{:#05x}: ignoring unknown opcode {:04x}", task.pc, task.inst.word);
      Ok(())
    }
    OpcodePolicy::Strict => Err(Error::UnknownOpcode {
      word: task.inst.word,
      pc: task.pc,
    }),
  }
}
