//! `corriente crc` - checksum computation and validation.

use anyhow::{Context, bail};
use clap::Args;
use corriente_bitstream::{Bits, Crc};

/// Arguments for the `crc` subcommand.
#[derive(Args)]
pub struct CrcArgs {
    /// Data as a hex string (whole bytes).
    pub data: String,

    /// Checksum width in bits.
    #[arg(long, default_value_t = 8)]
    pub width: usize,

    /// Divisor polynomial with the top bit explicit, as hex.
    #[arg(long, default_value = "107")]
    pub polynomial: String,

    /// Validate this checksum (hex) instead of computing one.
    #[arg(long)]
    pub check: Option<String>,
}

fn parse_hex(text: &str) -> anyhow::Result<Vec<u8>> {
    if text.len() % 2 != 0 {
        bail!("hex string needs an even number of digits");
    }
    (0..text.len())
        .step_by(2)
        .map(|i| u8::from_str_radix(&text[i..i + 2], 16).context("invalid hex digit"))
        .collect()
}

/// Runs the subcommand.
pub fn run(args: CrcArgs) -> anyhow::Result<()> {
    let data = Bits::from_bytes(&parse_hex(&args.data)?);
    let polynomial = u64::from_str_radix(&args.polynomial, 16).context("invalid polynomial")?;
    let crc = Crc::new(args.width, polynomial).context("building CRC")?;

    match args.check {
        Some(expected) => {
            let expected = u64::from_str_radix(&expected, 16).context("invalid checksum")?;
            let checksum = Bits::from_uint(expected, args.width).context("checksum width")?;
            if crc.validate(&data, &checksum) {
                println!("ok");
            } else {
                let actual = crc.calculate(&data).to_uint().expect("width <= 64");
                bail!("checksum mismatch: expected {expected:#x}, computed {actual:#x}");
            }
        }
        None => {
            let checksum = crc.calculate(&data);
            println!("{:0width$x}", checksum.to_uint()?, width = args.width.div_ceil(4));
        }
    }
    Ok(())
}
