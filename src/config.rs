/// What to do with sprite pixels that land past the right or bottom edge
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EdgePolicy {
  /// drop them
  #[default]
  Clip,
  /// wrap around to the opposite edge
  Wrap,
}

/// What to do with an instruction word that doesn't decode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OpcodePolicy {
  /// treat it as a nop that still costs a cycle
  #[default]
  Lenient,
  /// fault with [`crate::vm::Error::UnknownOpcode`]
  Strict,
}

/// Construction-time knobs for a [`crate::vm::Vm`]
#[derive(Debug, Clone, Copy, Default)]
pub struct Config {
  /// seed for the random source; `None` pulls one from the OS
  pub seed: Option<u64>,
  pub edges: EdgePolicy,
  pub opcodes: OpcodePolicy,
}

impl Config {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn with_seed(mut self, seed: u64) -> Self {
    self.seed = Some(seed);
    self
  }

  pub fn with_edge_policy(mut self, edges: EdgePolicy) -> Self {
    self.edges = edges;
    self
  }

  pub fn with_opcode_policy(mut self, opcodes: OpcodePolicy) -> Self {
    self.opcodes = opcodes;
    self
  }
}
