//! Digest command

use clap::Args;
use std::path::PathBuf;
use std::process::ExitCode;
use veristamp_core::fingerprint::digest_file;

#[derive(Debug, Args)]
pub struct HashArgs {
    /// File to fingerprint
    pub file: PathBuf,
}

pub fn execute(args: HashArgs) -> Result<ExitCode, Box<dyn std::error::Error>> {
    let digest = digest_file(&args.file)?;
    println!("{}  {}", digest, args.file.display());
    Ok(ExitCode::SUCCESS)
}
