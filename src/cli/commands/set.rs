//! `eimg set API=<key>`: store the NASA API key.

use crate::cli::output;
use crate::cli::{parse_assignment, prompt_new_passphrase, Context};
use crate::crypto;
use crate::errors::{EimgError, Result};
use crate::vault::CredentialVault;

/// Execute the `set` command.
pub fn execute(ctx: &mut Context, assignment: &str, insecure_plaintext: bool) -> Result<()> {
    let api_key = parse_assignment(assignment)?;

    if !CredentialVault::validate_format(api_key) {
        return Err(EimgError::InvalidInput(
            "invalid API key format, check your NASA API key".into(),
        ));
    }

    let mut config = ctx.store.load()?;

    if insecure_plaintext {
        output::warning("Storing API key WITHOUT encryption.");
        config.set_plaintext(api_key);
        ctx.store.save(&config)?;
        tracing::warn!("API key stored in plain text");
        output::success(&format!("API key saved to {}", ctx.store.path().display()));
        return Ok(());
    }

    if !crypto::ENABLED {
        output::tip("Use `eimg set API=<key> --insecure-plaintext` to store it unencrypted.");
        return Err(EimgError::PrimitiveUnavailable(
            "cannot encrypt the API key".into(),
        ));
    }

    let passphrase = prompt_new_passphrase()?;
    let record = ctx.vault.encrypt(api_key, &passphrase)?;
    config.set_record(&record);
    ctx.store.save(&config)?;
    ctx.vault.remember_passphrase(passphrase);

    tracing::info!(scheme = %record.scheme, "encrypted API key stored");
    output::success(&format!(
        "Encrypted API key saved to {}",
        ctx.store.path().display()
    ));
    output::tip("Check it works: eimg validate");

    Ok(())
}
