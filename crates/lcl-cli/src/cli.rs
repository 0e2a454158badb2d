use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use lcl_types::ExpandMode;

#[derive(Parser)]
#[command(
    name = "lcl",
    about = "Listing Catalog Ledger: digests, addresses, records, and the signer service",
    version,
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[arg(long, global = true, default_value = "text")]
    pub format: OutputFormat,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum ModeArg {
    None,
    AppendUuid,
    Utf8UriEncoded,
}

impl From<ModeArg> for ExpandMode {
    fn from(mode: ModeArg) -> Self {
        match mode {
            ModeArg::None => ExpandMode::None,
            ModeArg::AppendUuid => ExpandMode::AppendUuid,
            ModeArg::Utf8UriEncoded => ExpandMode::Utf8UriEncoded,
        }
    }
}

#[derive(Subcommand)]
pub enum Command {
    /// Content digest of a string
    Digest(DigestArgs),
    /// Derive an account address
    Address(AddressArgs),
    /// Pack or unpack attribute bitsets
    Attrs(AttrsArgs),
    /// Scan prefix for a category query
    Prefix(PrefixArgs),
    /// Decode hex-encoded account data
    Decode(DecodeArgs),
    /// Generate a signing key
    Keygen,
    /// Run the signer service
    Serve(ServeArgs),
}

#[derive(Args)]
pub struct DigestArgs {
    pub text: String,
}

#[derive(Args)]
pub struct AddressArgs {
    #[command(subcommand)]
    pub kind: AddressKind,
    /// Base58 program id; the built-in default when absent.
    #[arg(long, global = true)]
    pub program_id: Option<String>,
}

#[derive(Subcommand)]
pub enum AddressKind {
    /// URL entry holding `content` under `mode`
    Url {
        content: String,
        #[arg(long, default_value = "none")]
        mode: ModeArg,
    },
    /// Listing record
    Listing {
        #[arg(long)]
        catalog: u64,
        #[arg(long)]
        uuid: String,
    },
    /// Catalog account
    Catalog { id: u64 },
}

#[derive(Args)]
pub struct AttrsArgs {
    #[command(subcommand)]
    pub action: AttrsAction,
}

#[derive(Subcommand)]
pub enum AttrsAction {
    /// Attribute names to a byte
    Pack {
        names: Vec<String>,
        #[arg(long, default_value = "1")]
        table: u8,
    },
    /// A byte to attribute names
    Unpack {
        bits: u8,
        #[arg(long, default_value = "1")]
        table: u8,
    },
}

#[derive(Args)]
pub struct PrefixArgs {
    /// Category URI
    pub category: String,
    /// Locality URIs, at most three
    #[arg(long = "filter")]
    pub filters: Vec<String>,
    #[arg(long)]
    pub catalog: Option<u64>,
}

#[derive(Args)]
pub struct DecodeArgs {
    /// Hex-encoded account data
    pub hex: Option<String>,
    /// Read hex from a file instead
    #[arg(long, conflicts_with = "hex")]
    pub file: Option<PathBuf>,
}

#[derive(Args)]
pub struct ServeArgs {
    /// TOML service configuration
    #[arg(long)]
    pub config: Option<PathBuf>,
    /// Overrides `bind_addr` from the configuration
    #[arg(long)]
    pub bind: Option<String>,
}
