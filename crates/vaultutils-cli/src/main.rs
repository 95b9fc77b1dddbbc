//! `vaultutils` CLI: Vault housekeeping from the command line.
//!
//! Three subcommands, each a thin wrapper over a `vaultutils-core` tool:
//! `delete` removes a secret tree, `copy` moves a Kubernetes secret into
//! Vault, and `token` creates or revokes the scoped token trio for a path.

#![allow(clippy::print_stdout, clippy::print_stderr)]

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::builder::BoolishValueParser;
use clap::{Parser, Subcommand};
use tracing::debug;
use tracing_subscriber::EnvFilter;

use vaultutils_client::VaultClient;
use vaultutils_core::path::{ensure_prefix, has_prefix};
use vaultutils_core::{
    DEFAULT_MOUNT_PREFIX, ManifestSource, SecretCopier, TokenAdmin, TreeDeleter, VaultConfig,
    Verb,
};

// ── ANSI color helpers ───────────────────────────────────────────────

const RESET: &str = "\x1b[0m";
const BOLD: &str = "\x1b[1m";
const DIM: &str = "\x1b[2m";
const RED: &str = "\x1b[31m";
const GREEN: &str = "\x1b[32m";

// ── CLI structure ────────────────────────────────────────────────────

/// Vault secret housekeeping.
#[derive(Parser)]
#[command(
    name = "vaultutils",
    version,
    about = "vaultutils CLI: delete secret trees, copy Kubernetes secrets, manage scoped tokens",
    long_about = None,
    after_help = format!(
        "{DIM}Environment variables:{RESET}\n  \
         VAULT_ADDR     Vault endpoint URL\n  \
         VAULT_TOKEN    Vault token\n  \
         VAULT_CAPATH   Path to the Vault CA certificate\n  \
         DEBUG          Enable debug logging\n\n\
         {DIM}Examples:{RESET}\n  \
         vaultutils delete myapp/old\n  \
         vaultutils copy db-creds secret/myapp/db --manifest-dir ./exported\n  \
         vaultutils token create secret/myapp"
    ),
)]
struct Cli {
    /// URL of the Vault endpoint.
    #[arg(long, env = "VAULT_ADDR", global = true)]
    url: Option<String>,

    /// Vault token to use.
    #[arg(long, env = "VAULT_TOKEN", global = true, hide_env_values = true)]
    token: Option<String>,

    /// Path to the Vault CA certificate.
    #[arg(long, env = "VAULT_CAPATH", global = true)]
    cacert: Option<PathBuf>,

    /// Enable debug logging.
    #[arg(long, env = "DEBUG", global = true, value_parser = BoolishValueParser::new())]
    debug: bool,

    /// Emit logs as JSON lines.
    #[arg(long, env = "VAULTUTILS_LOG_JSON", global = true, value_parser = BoolishValueParser::new())]
    log_json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Delete a secret path and everything under it.
    Delete {
        /// Secret path; `secret/` is prepended if missing.
        path: String,
    },
    /// Copy a Kubernetes secret into Vault, one entry per key.
    Copy {
        /// Name of the Kubernetes secret.
        k8s_secret_name: String,
        /// Destination path in Vault.
        vault_secret_path: String,
        /// Directory of `kubectl get secret NAME -o json` exports.
        #[arg(long, env = "KUBE_SECRET_DIR", default_value = ".")]
        manifest_dir: PathBuf,
        /// Only accept secrets from this namespace.
        #[arg(long, env = "KUBE_NAMESPACE")]
        namespace: Option<String>,
    },
    /// Create or revoke the read/write/admin token trio for a path.
    Token {
        /// `create` or `revoke`.
        verb: String,
        /// Secret path the tokens are scoped to.
        path: String,
    },
}

// ── Output helpers ───────────────────────────────────────────────────

fn success(msg: &str) {
    println!("  {GREEN}✓{RESET} {msg}");
}

fn kv_line(key: &str, value: &str) {
    println!("    {DIM}{key:<10}{RESET} {value}");
}

// ── Command dispatch ─────────────────────────────────────────────────

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.debug, cli.log_json);
    debug!("debug logging started");

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{RED}{BOLD}Error:{RESET} {e:#}");
            ExitCode::FAILURE
        }
    }
}

fn init_tracing(debug: bool, json: bool) {
    let level = if debug { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("warn,vaultutils={level}")));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

async fn run(cli: Cli) -> Result<()> {
    let Cli {
        url,
        token,
        cacert,
        command,
        ..
    } = cli;

    match command {
        Commands::Delete { path } => {
            let client = connect(url, token, cacert)?;
            cmd_delete(client, &path).await
        }
        Commands::Copy {
            k8s_secret_name,
            vault_secret_path,
            manifest_dir,
            namespace,
        } => {
            let client = connect(url, token, cacert)?;
            let mut source = ManifestSource::new(manifest_dir);
            if let Some(ns) = namespace {
                source = source.in_namespace(ns);
            }
            cmd_copy(client, source, &k8s_secret_name, &vault_secret_path).await
        }
        Commands::Token { verb, path } => {
            let verb: Verb = verb.parse()?;
            let client = connect(url, token, cacert)?;
            cmd_token(client, verb, &path).await
        }
    }
}

fn connect(
    url: Option<String>,
    token: Option<String>,
    cacert: Option<PathBuf>,
) -> Result<Arc<VaultClient>> {
    let config = VaultConfig::from_options(url, token, cacert)?;
    debug!(url = %config.url, "acquiring Vault client");
    let client = VaultClient::from_config(&config).context("failed to build Vault client")?;
    Ok(Arc::new(client))
}

// ── Commands ─────────────────────────────────────────────────────────

async fn cmd_delete(client: Arc<VaultClient>, path: &str) -> Result<()> {
    let path = if has_prefix(path, DEFAULT_MOUNT_PREFIX) {
        path.to_owned()
    } else {
        debug!("adding '{DEFAULT_MOUNT_PREFIX}' to front of path");
        ensure_prefix(path, DEFAULT_MOUNT_PREFIX)
    };

    let deleter = TreeDeleter::connect(client).await?;
    let report = deleter
        .delete_tree(&path)
        .await
        .with_context(|| format!("failed to delete {path}"))?;

    success(&format!(
        "Removed {BOLD}{}{RESET} secret(s) under {BOLD}{path}{RESET}",
        report.leaves_deleted
    ));
    Ok(())
}

async fn cmd_copy(
    client: Arc<VaultClient>,
    source: ManifestSource,
    name: &str,
    destination: &str,
) -> Result<()> {
    let copier = SecretCopier::connect(client, Arc::new(source)).await?;
    let written = copier
        .copy(name, destination)
        .await
        .with_context(|| format!("failed to copy {name} to {destination}"))?;

    success(&format!(
        "Copied {BOLD}{written}{RESET} key(s) from {name} to {BOLD}{destination}{RESET}"
    ));
    Ok(())
}

async fn cmd_token(client: Arc<VaultClient>, verb: Verb, path: &str) -> Result<()> {
    let admin = TokenAdmin::connect(client.clone(), client).await?;

    match verb {
        Verb::Create => {
            let issued = admin
                .create(path)
                .await
                .with_context(|| format!("failed to create tokens for {path}"))?;
            success(&format!("Created token trio for {BOLD}{path}{RESET}"));
            for (role, token) in &issued {
                kv_line(role.as_str(), &format!("accessor {}", token.accessor));
            }
        }
        Verb::Revoke => {
            let revoked = admin
                .revoke(path)
                .await
                .with_context(|| format!("failed to revoke tokens for {path}"))?;
            success(&format!(
                "Revoked {BOLD}{revoked}{RESET} token(s) for {BOLD}{path}{RESET}"
            ));
        }
    }
    Ok(())
}
