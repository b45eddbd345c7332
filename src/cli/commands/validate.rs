//! `eimg validate`: check the stored key against the API.

use crate::cli::output;
use crate::cli::Context;
use crate::epic::KeyStatus;
use crate::errors::{EimgError, Result};

/// Execute the `validate` command.
pub fn execute(ctx: &mut Context) -> Result<()> {
    let client = ctx.client()?;

    output::info("Validating API key...");
    match client.validate_key()? {
        KeyStatus::Valid => {
            output::success("API key is valid and working!");
            Ok(())
        }
        KeyStatus::Rejected => Err(EimgError::CommandFailed(
            "API key is invalid, expired, or rate limited".into(),
        )),
        KeyStatus::Unexpected(status) => Err(EimgError::HttpStatus { status }),
    }
}
