use clap::{Args, Subcommand};
use std::path::PathBuf;

use crate::exit::CliResult;
use crate::output::OutputFormat;

pub mod decode;
pub mod encode;
pub mod schema;
pub mod version;

#[derive(Subcommand, Debug)]
pub enum Command {
    /// List the message definitions of a dialect.
    Schema(SchemaArgs),
    /// Decode messages from a capture file or stdin.
    Decode(DecodeArgs),
    /// Encode a single message.
    Encode(EncodeArgs),
    /// Show version information.
    Version(VersionArgs),
}

pub fn run(command: Command, format: OutputFormat) -> CliResult<i32> {
    match command {
        Command::Schema(args) => schema::run(args, format),
        Command::Decode(args) => decode::run(args, format),
        Command::Encode(args) => encode::run(args, format),
        Command::Version(args) => version::run(args),
    }
}

#[derive(Args, Debug)]
pub struct SchemaArgs {
    /// Dialect file (JSON).
    pub dialect: PathBuf,
}

#[derive(Args, Debug)]
pub struct DecodeArgs {
    /// Dialect file (JSON).
    pub dialect: PathBuf,
    /// Capture file to decode, or `-` for stdin.
    pub input: PathBuf,
    /// Exit after decoding N messages.
    #[arg(long)]
    pub count: Option<usize>,
    /// Only print messages with this id.
    #[arg(long)]
    pub id: Option<u8>,
}

#[derive(Args, Debug)]
pub struct EncodeArgs {
    /// Dialect file (JSON).
    pub dialect: PathBuf,
    /// Message name.
    #[arg(long, short = 'm')]
    pub message: String,
    /// Field values as a JSON object. Unset fields are zero.
    #[arg(long, default_value = "{}")]
    pub fields: String,
    /// Sequence number.
    #[arg(long, default_value = "0")]
    pub sequence: u8,
    /// Sending system id.
    #[arg(long, default_value = "1")]
    pub system_id: u8,
    /// Sending component id.
    #[arg(long, default_value = "1")]
    pub component_id: u8,
}

#[derive(Args, Debug)]
pub struct VersionArgs {
    /// Show extended build information.
    #[arg(long)]
    pub extended: bool,
}
