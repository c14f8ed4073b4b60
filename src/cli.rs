use clap::builder::styling::AnsiColor;
use clap::builder::Styles;
use clap::{Parser, Subcommand, ValueEnum};

use twobit::{Endianness, Policy};

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// colouring of the help
const STYLES: Styles = Styles::styled()
    .header(AnsiColor::Yellow.on_default().bold())
    .usage(AnsiColor::BrightMagenta.on_default().bold())
    .literal(AnsiColor::BrightMagenta.on_default())
    .placeholder(AnsiColor::White.on_default());

#[derive(Parser)]
#[command(
    version = VERSION,
    about = "convert between FASTA and the 2bit genome sequence format",
    arg_required_else_help = true,
    styles = STYLES
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Write the sequences of a .2bit file as FASTA
    #[command(name = "to-fa", visible_alias = "twoBitToFa", arg_required_else_help = true)]
    ToFa {
        /// the input .2bit file
        #[arg(short, long)]
        input: String,

        /// the output FASTA file (".fasta" is appended if missing); stdout if not given
        #[arg(short, long)]
        output: Option<String>,

        /// bases per FASTA line; 0 writes each sequence on a single line
        #[arg(short, long, default_value_t = 80)]
        width: usize,

        /// overwrite the output file if it already exists
        #[arg(long)]
        overwrite: bool,

        /// only write the named sequence
        #[arg(long)]
        seq: Option<String>,

        /// 0-based start of the region of --seq to write
        #[arg(long, requires = "seq")]
        start: Option<u32>,

        /// 0-based, exclusive end of the region of --seq to write
        #[arg(long, requires = "seq")]
        end: Option<u32>,
    },

    /// Encode one or more FASTA files into a .2bit file
    #[command(name = "from-fa", visible_alias = "faToTwoBit", arg_required_else_help = true)]
    FromFa {
        /// the input FASTA files, comma separated (compressed input is detected)
        #[arg(short, long, value_delimiter = ',', required = true)]
        input: Vec<String>,

        /// the output .2bit file (".2bit" is appended if missing)
        #[arg(short, long)]
        output: String,

        /// overwrite the output file if it already exists
        #[arg(long)]
        overwrite: bool,

        /// trim sequence names at the first whitespace
        #[arg(long)]
        trim_name_at_whitespace: bool,

        /// store lowercase bases as uppercase instead of recording mask regions
        #[arg(long)]
        no_mask: bool,

        /// how to store characters other than ACGTN
        #[arg(long, value_enum, default_value = "mark-as-n")]
        policy: PolicyArg,

        /// write integers big-endian (a byte-swapped file on most machines)
        #[arg(long)]
        big_endian: bool,
    },
}

#[derive(ValueEnum, Clone, Copy)]
pub enum PolicyArg {
    /// store as N
    MarkAsN,
    /// skip the whole sequence
    Ignore,
    /// fail
    Break,
    /// replace with a random base
    Random,
    /// replace with A
    SetA,
    /// replace with C
    SetC,
    /// replace with G
    SetG,
    /// replace with T
    SetT,
}
impl From<PolicyArg> for Policy {
    fn from(arg: PolicyArg) -> Self {
        match arg {
            PolicyArg::MarkAsN => Policy::MarkAsN,
            PolicyArg::Ignore => Policy::IgnoreSequence,
            PolicyArg::Break => Policy::BreakOnInvalid,
            PolicyArg::Random => Policy::RandomDraw,
            PolicyArg::SetA => Policy::SetToA,
            PolicyArg::SetC => Policy::SetToC,
            PolicyArg::SetG => Policy::SetToG,
            PolicyArg::SetT => Policy::SetToT,
        }
    }
}

/// Byte order selected by the `--big-endian` flag
pub fn endian(big_endian: bool) -> Endianness {
    if big_endian {
        Endianness::Big
    } else {
        Endianness::Little
    }
}
