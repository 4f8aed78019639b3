mod log;
mod path;
mod replace;

use std::hint::black_box;

/// Seed for the derived stack observables below. Debuggers following the
/// exec chain read this symbol to tell the pre-exec image apart from the
/// companion's.
static GLOBAL_I: i32 = 100;

fn main() -> color_eyre::Result<()> {
  color_eyre::install()?;
  log::initialize_logging()?;

  // Never branched on. These only exist as inspectable stack values for an
  // attached debugger, so black_box keeps the optimizer from folding them
  // away.
  let local_j = black_box(GLOBAL_I + 1);
  let local_k = black_box(local_j + 1);

  replace::run()?;

  // Only reached when all three replacement attempts fell through.
  black_box((local_j, local_k));
  Ok(())
}
