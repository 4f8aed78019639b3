// Companion image for the follow-exec trigger. A debugger that followed the
// exec lands here; the output shows which argv actually arrived.

use std::hint::black_box;

/// Same symbol name as the trigger's observable, different value, so a
/// debugger can tell which image it is looking at.
static GLOBAL_I: i32 = 0;

fn main() {
  let local_j = black_box(GLOBAL_I + 1);
  println!("Hello from execd-prog...");
  for (i, arg) in std::env::args_os().enumerate() {
    println!("  argv[{i}]: {}", arg.to_string_lossy());
  }
  black_box(local_j);
}
