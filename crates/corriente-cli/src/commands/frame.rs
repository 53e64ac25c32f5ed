//! `corriente frame` - inspect the on-air frame for a payload.

use anyhow::Context;
use clap::Args;

use crate::framing::{build_frame, manchester_chips};

/// Arguments for the `frame` subcommand.
#[derive(Args)]
pub struct FrameArgs {
    /// Payload text to frame.
    pub message: String,

    /// Frame sync word (hex).
    #[arg(long, default_value = "c1fa")]
    pub sync: String,

    /// Also print the Manchester chip stream.
    #[arg(long)]
    pub chips: bool,
}

/// Runs the subcommand.
pub fn run(args: FrameArgs) -> anyhow::Result<()> {
    let sync = u16::from_str_radix(&args.sync, 16).context("invalid sync word")?;
    let bits = build_frame(args.message.as_bytes(), sync);

    println!("frame: {} bits", bits.len());
    println!("bits:  {bits}");
    let bytes = bits.to_bytes().expect("frame is whole bytes");
    print!("hex:   ");
    for byte in &bytes {
        print!("{byte:02x}");
    }
    println!();

    if args.chips {
        let chips = manchester_chips(&bits);
        println!("chips: {} samples", chips.len());
        let line: Vec<String> = chips
            .iter()
            .map(|&chip| if chip > 0.0 { "+".into() } else { "-".into() })
            .collect();
        println!("       {}", line.join(""));
    }
    Ok(())
}
