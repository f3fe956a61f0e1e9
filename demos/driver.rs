//! A console driver for `falloc`, in the spirit of the teacher crate's own
//! `examples/bump.rs`: walks through a handful of allocate/release calls and
//! narrates what the allocator does at each step. Not part of the core
//! (`spec.md` §1 explicitly scopes "any demonstration/driver program and its
//! console output" out), kept around purely as a manual exploration tool.

use std::alloc::Layout;
use std::io::Read;

use falloc::FreeListAllocator;

fn block_until_enter_pressed() {
  println!("\n>>> Press ENTER to continue...");
  let _ = std::io::stdin().bytes().next();
}

fn main() {
  env_logger::init();

  let mut allocator = FreeListAllocator::new();

  unsafe {
    println!("[start] empty allocator, nothing mapped yet");
    block_until_enter_pressed();

    // 1) Allocate a u32.
    let layout_u32 = Layout::new::<u32>();
    let first = allocator.allocate(layout_u32).expect("allocate u32");
    println!("\n[1] allocate u32 -> {first:p}");
    (first.as_ptr() as *mut u32).write(0xDEADBEEF);
    println!("[1] value written = 0x{:X}", (first.as_ptr() as *mut u32).read());
    block_until_enter_pressed();

    // 2) Allocate 12 bytes.
    let layout_12 = Layout::array::<u8>(12).unwrap();
    let second = allocator.allocate(layout_12).expect("allocate [u8; 12]");
    println!("\n[2] allocate [u8; 12] -> {second:p}");
    std::ptr::write_bytes(second.as_ptr(), 0xAB, layout_12.size());
    block_until_enter_pressed();

    // 3) Allocate a u64.
    let layout_u64 = Layout::new::<u64>();
    let third = allocator.allocate(layout_u64).expect("allocate u64");
    println!("\n[3] allocate u64 -> {third:p}");
    (third.as_ptr() as *mut u64).write(0x1122334455667788);
    println!(
      "[3] value = 0x{:X}, address % align = {}",
      (third.as_ptr() as *mut u64).read(),
      third.as_ptr() as usize % layout_u64.align()
    );
    block_until_enter_pressed();

    // 4) Release the first block, then allocate something small: unlike
    //    the teacher's bump allocator, this allocator can reuse it.
    println!("\n[4] release first block at {first:p}");
    allocator.release(first);
    block_until_enter_pressed();

    let layout_2 = Layout::array::<u8>(2).unwrap();
    let fourth = allocator.allocate(layout_2).expect("allocate [u8; 2]");
    println!("\n[5] allocate [u8; 2] -> {fourth:p}");
    println!(
      "[5] reused the freed block? {}",
      if fourth == first { "yes" } else { "no" }
    );
    block_until_enter_pressed();

    // 6) Allocate something large enough to force another OS chunk.
    let layout_big = Layout::array::<u8>(64 * 1024).unwrap();
    let big = allocator.allocate(layout_big).expect("allocate 64 KiB");
    println!("\n[6] allocate 64 KiB -> {big:p}");
    block_until_enter_pressed();

    // Clean up the rest.
    for ptr in [second, third, fourth, big] {
      allocator.release(ptr);
    }
    println!("\n[end] released every remaining block; process exit reclaims the OS chunks.");
  }
}
