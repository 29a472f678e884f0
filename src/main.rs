// Copyright 2024-2025 Contributors to the tpmquote project.
// SPDX-License-Identifier: Apache-2.0

use clap::Parser;
use std::error::Error;
use std::fs;
use std::process::ExitCode;
use tpmquote::quote::{Attest, Evidence, Verdict};
use tpmquote::store::{IKeyStore, MemoKeyStore, PcrValues};

#[derive(Parser)]
enum TpmQuoteCli {
    Verify(VerifyArgs),
    Decode(DecodeArgs),
}

#[derive(Debug, clap::Args)]
#[command(author, version, long_about = None,
    about = "Verify the supplied TPM quote with the matching attestation \
    key and appraise its PCR state against the configured baseline")]
struct VerifyArgs {
    #[arg(short, long, default_value = "quote_message.dat")]
    message: String,

    #[arg(short, long, default_value = "quote_signature.dat")]
    signature: String,

    /// PCR values reported by the device next to the quote
    #[arg(short, long, default_value = "pcrs.json")]
    pcrs: String,

    /// Challenge nonce the quote must echo, hex encoded
    #[arg(short, long)]
    nonce: String,

    #[arg(short, long, default_value = "akstore.json")]
    akstore: String,

    #[arg(short, long, default_value = "default")]
    key_id: String,

    #[arg(short, long, default_value = "pcr_values.json")]
    baseline: String,

    /// Require the baseline to cover every quoted register
    #[arg(long)]
    strict: bool,
}

#[derive(Debug, clap::Args)]
#[command(author, version, long_about = None,
    about = "Decode and print the supplied TPM quote structure without \
    verifying anything (debugging aid, not a trust decision)")]
struct DecodeArgs {
    #[arg(short, long, default_value = "quote_message.dat")]
    message: String,
}

fn main() -> ExitCode {
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));

    match TpmQuoteCli::parse() {
        TpmQuoteCli::Verify(args) => match verify(&args) {
            Ok(Verdict::Accepted) => {
                println!("verification successful");
                ExitCode::SUCCESS
            }
            Ok(Verdict::Rejected(reason)) => {
                // the reason stays in the logs; callers relaying the outcome
                // to remote peers must not echo it
                log::warn!("quote rejected: {reason}");
                println!("verification failed");
                ExitCode::FAILURE
            }
            Err(e) => {
                eprintln!("verification failed: {e}");
                ExitCode::FAILURE
            }
        },

        TpmQuoteCli::Decode(args) => match decode(&args) {
            Ok(_) => ExitCode::SUCCESS,
            Err(e) => {
                eprintln!("decoding failed: {e}");
                ExitCode::FAILURE
            }
        },
    }
}

fn verify(args: &VerifyArgs) -> Result<Verdict, Box<dyn Error>> {
    let j = fs::read_to_string(&args.akstore)?;

    let mut aks: MemoKeyStore = Default::default();
    aks.load_json(&j)?;

    let ak = aks
        .lookup(&args.key_id)
        .ok_or_else(|| format!("no attestation key enrolled under key-id {}", args.key_id))?;

    let j = fs::read_to_string(&args.baseline)?;
    let baseline = PcrValues::parse(&j)?;

    let message = fs::read(&args.message)?;
    let signature = fs::read(&args.signature)?;

    let j = fs::read_to_string(&args.pcrs)?;
    let pcrs = PcrValues::parse(&j)?;

    let nonce = hex::decode(&args.nonce)?;

    let e = Evidence::new(message, signature, pcrs);

    Ok(e.appraise(&ak, &nonce, &baseline, args.strict))
}

fn decode(args: &DecodeArgs) -> Result<(), Box<dyn Error>> {
    let message = fs::read(&args.message)?;

    let claims = Attest::decode(&message)?;

    println!("{claims:#?}");

    Ok(())
}
