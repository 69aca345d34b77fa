//! Bare-bones implementation of the CHIP-8 interpreter core
//!
//! <http://devernay.free.fr/hacks/chip8/C8TECH10.HTM>
//!
//! One call to [`vm::Vm::step`] is one fetch/decode/execute cycle. Pacing,
//! rendering and input are left to whoever drives the machine.

pub mod config;
pub mod display;
pub mod opcode;
pub mod region;
pub mod vm;
