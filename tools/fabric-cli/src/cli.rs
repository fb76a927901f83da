//! Command line definitions.

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// SecureFabric envelope tool
#[derive(Parser, Debug)]
#[command(name = "fabric", version)]
#[command(about = "Generate keys, seal and open SecureFabric envelopes, run conformance vectors")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Generate an Ed25519 signing key and write its 32-byte seed to a file
    Keygen(KeygenArgs),
    /// Build a signed envelope and print it as JSON
    Seal(SealArgs),
    /// Verify a JSON envelope and print its contents
    Open(OpenArgs),
    /// Run the conformance vectors
    Conformance(ConformanceArgs),
}

#[derive(Args, Debug, Clone)]
pub struct KeygenArgs {
    /// Output file for the secret seed
    #[arg(long)]
    pub out: PathBuf,

    /// Overwrite an existing file
    #[arg(long)]
    pub force: bool,
}

#[derive(Args, Debug, Clone)]
pub struct SealArgs {
    /// Secret key file (32-byte seed or 64-byte keypair)
    #[arg(long, env = "SF_SIGNING_KEY")]
    pub key: PathBuf,

    /// Destination topic
    #[arg(long)]
    pub topic: String,

    /// UTF-8 message body
    #[arg(long)]
    pub message: String,

    /// Tenant scope carried in the AAD
    #[arg(long)]
    pub tenant: Option<String>,

    /// Payload MIME type carried in the AAD
    #[arg(long)]
    pub content_type: Option<String>,

    /// Sequence number to issue; defaults to one past the value recorded in
    /// `<key>.seq`
    #[arg(long)]
    pub seq: Option<u64>,

    /// Hex content key; encrypts the message end to end
    #[arg(long)]
    pub content_key: Option<String>,

    /// Version of the content key
    #[arg(long, default_value_t = 1)]
    pub key_version: u32,
}

#[derive(Args, Debug, Clone)]
pub struct OpenArgs {
    /// Envelope JSON file, or `-` for stdin
    #[arg(long)]
    pub envelope: PathBuf,

    /// Accept only these sender public keys (hex); repeatable
    #[arg(long = "trusted")]
    pub trusted: Vec<String>,

    /// Hex content key for encrypted envelopes
    #[arg(long)]
    pub content_key: Option<String>,

    /// Version of the content key
    #[arg(long, default_value_t = 1)]
    pub key_version: u32,
}

#[derive(Args, Debug, Clone)]
pub struct ConformanceArgs {
    /// Vector file; defaults to the bundled vectors
    #[arg(long)]
    pub vectors: Option<PathBuf>,

    /// Print the report as JSON
    #[arg(long)]
    pub json: bool,
}
