//! Demonstrates the three external contracts `pngbin` expects a caller to
//! supply: a descriptor factory, PNG slot sinks/sources, and consumption of
//! the resulting chained stream.
//!
//! Run with: cargo run --example chain_demo -- --slot-width 64 --slot-height 64

use std::fs::File;
use std::path::PathBuf;

use clap::Parser;
use pngbin::chain::{ChainReader, ChainWriter};
use pngbin::png::{PngReader, PngWriter, Source};
use pngbin::PngSlot;

#[derive(Parser)]
#[command(about = "Stores a payload across a chain of PNG slots and reads it back")]
struct Args {
    /// Width of each PNG slot.
    #[arg(long, default_value_t = 64)]
    slot_width: u32,

    /// Height of each PNG slot.
    #[arg(long, default_value_t = 64)]
    slot_height: u32,

    /// Directory to write the chained PNG files into.
    #[arg(long, default_value = "chain_demo_out")]
    out_dir: PathBuf,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::try_init().ok();
    let args = Args::parse();

    std::fs::create_dir_all(&args.out_dir)?;

    let payload: Vec<u8> = (0..500_000u32).map(|i| (i % 256) as u8).collect();
    println!("payload: {} bytes", payload.len());

    let slot_width = args.slot_width;
    let slot_height = args.slot_height;
    let out_dir = args.out_dir.clone();

    // The descriptor source: an unbounded sequence of same-shaped slots.
    // A real catalog would vary shape per slot or stop at a known count.
    let descriptors = std::iter::repeat(PngSlot::new(slot_width, slot_height));

    let out_dir_for_write = out_dir.clone();
    let mut writer = ChainWriter::new(descriptors, move |index, slot| {
        let path = out_dir_for_write.join(format!("slot-{index:04}.png"));
        let file = File::create(&path)?;
        Ok(PngWriter::new(file, slot.width, slot.height)?)
    })?;
    writer.write(&payload)?;
    writer.finish()?;

    let slot_count = (payload.len() as u64).div_ceil(PngSlot::new(slot_width, slot_height).capacity());
    println!("wrote {slot_count} PNG slot(s) under {}", out_dir.display());

    let descriptors = std::iter::repeat(PngSlot::new(slot_width, slot_height));
    let mut reader = ChainReader::new(descriptors, move |index, _slot| {
        let path = out_dir.join(format!("slot-{index:04}.png"));
        let file = File::open(&path)?;
        Ok(PngReader::open(Source::Stream(file))?)
    });

    let mut readback = vec![0u8; payload.len()];
    reader.read_at(0, &mut readback)?;
    assert_eq!(readback, payload);
    println!("read back {} bytes, matches original payload", readback.len());

    Ok(())
}
