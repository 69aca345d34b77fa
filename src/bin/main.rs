use std::error::Error;
use std::{env, fs, process};

use interpreter::region::Chunk;
use interpreter::vm::Vm;

/// How many cycles to run when none are asked for
const DEFAULT_CYCLES: usize = 10;

fn main() -> Result<(), Box<dyn Error>> {
  env_logger::init();

  let mut args = env::args().skip(1);
  let Some(path) = args.next() else {
    eprintln!("usage: main <rom> [cycles]");
    process::exit(1);
  };
  let cycles = match args.next() {
    Some(count) => count.parse()?,
    None => DEFAULT_CYCLES,
  };

  let chunk: Chunk = fs::read(&path)?.into();
  let mut vm = Vm::new();
  vm.load_region(&chunk)?;

  for cycle in 0..cycles {
    vm.step()?;
    println!("cycle {cycle} - pc: {:#05x}", vm.pc());
  }

  print!("{}", vm.display());
  dbg!(vm);
  Ok(())
}
