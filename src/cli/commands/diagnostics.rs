//! `eimg test`: self-diagnostics.

use comfy_table::{ContentArrangement, Table};
use console::style;
use crate::cli::output;
use crate::cli::Context;
use crate::config::Settings;
use crate::crypto;
use crate::errors::{EimgError, Result};
use crate::vault::CredentialVault;

const SELF_TEST_KEY: &str = "EIMGSELFTEST0123456789";
const SELF_TEST_PASSPHRASE: &str = "eimg-self-test";

/// Outcome of a single check.
struct Check {
    name: &'static str,
    ok: bool,
    detail: String,
}

/// Execute the `test` command.
pub fn execute(ctx: &Context) -> Result<()> {
    output::info("Running diagnostics...");

    let checks = vec![
        check_home(ctx),
        check_dir("Cache directory", &ctx.cache_dir()),
        check_dir("Logs directory", &ctx.logs_dir()),
        check_settings(ctx),
        check_encryption(ctx),
    ];

    let mut table = Table::new();
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec!["Check", "Result", "Detail"]);
    for c in &checks {
        let result = if c.ok {
            style("ok").green().to_string()
        } else {
            style("FAILED").red().bold().to_string()
        };
        table.add_row(vec![c.name.to_string(), result, c.detail.clone()]);
    }
    println!("{table}");

    let failed = checks.iter().filter(|c| !c.ok).count();
    if failed > 0 {
        return Err(EimgError::CommandFailed(format!("{failed} check(s) failed")));
    }
    output::success("All checks passed");
    Ok(())
}

fn check_home(ctx: &Context) -> Check {
    let created = std::fs::create_dir_all(&ctx.home).is_ok();
    Check {
        name: "Home directory writable",
        ok: created && ctx.store.is_writable(),
        detail: ctx.home.display().to_string(),
    }
}

fn check_dir(name: &'static str, dir: &std::path::Path) -> Check {
    Check {
        name,
        ok: dir.is_dir(),
        detail: dir.display().to_string(),
    }
}

fn check_settings(ctx: &Context) -> Check {
    match Settings::load(&ctx.home) {
        Ok(_) => Check {
            name: "Settings",
            ok: true,
            detail: "parsed".into(),
        },
        Err(e) => Check {
            name: "Settings",
            ok: false,
            detail: e.to_string(),
        },
    }
}

fn check_encryption(ctx: &Context) -> Check {
    if !crypto::ENABLED {
        return Check {
            name: "Encryption self-test",
            ok: false,
            detail: "encryption is not compiled into this build".into(),
        };
    }

    let vault = CredentialVault::new(ctx.vault.scheme(), ctx.settings.argon2_params());
    let outcome = vault
        .encrypt(SELF_TEST_KEY, SELF_TEST_PASSPHRASE)
        .and_then(|record| vault.decrypt(&record, SELF_TEST_PASSPHRASE));

    match outcome {
        Ok(plain) if plain.as_str() == SELF_TEST_KEY => Check {
            name: "Encryption self-test",
            ok: true,
            detail: format!("scheme {} round trip", vault.scheme()),
        },
        Ok(_) => Check {
            name: "Encryption self-test",
            ok: false,
            detail: "round trip returned different data".into(),
        },
        Err(e) => Check {
            name: "Encryption self-test",
            ok: false,
            detail: e.to_string(),
        },
    }
}
