// crates/evidence-gate-cli/src/main.rs
// ============================================================================
// Module: Evidence Gate CLI Entry Point
// Description: Command dispatcher for pack integrity, verification, and gates.
// Purpose: Provide a safe, localized CLI for offline evidence workflows.
// Dependencies: clap, evidence-gate-config, evidence-gate-core, serde, thiserror.
// ============================================================================

//! ## Overview
//! The evidence gate CLI recomputes pack integrity, re-adjudicates packs with
//! the bundled ruleset, runs the governance gates, and classifies reason
//! codes. All user-facing strings are routed through the i18n catalog.
//!
//! Exit codes: `0` success, `1` failure or mismatch, `2` usage error.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::io::Write;
use std::path::Path;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::ArgAction;
use clap::Args;
use clap::CommandFactory;
use clap::Parser;
use clap::Subcommand;
use evidence_gate_cli::t;
use evidence_gate_config::EvidenceGateConfig;
use evidence_gate_core::BUNDLED_RULESET_VERSION;
use evidence_gate_core::GateAuditSink;
use evidence_gate_core::GateEngine;
use evidence_gate_core::GateKind;
use evidence_gate_core::MANIFEST_FILE;
use evidence_gate_core::PackAuditEvent;
use evidence_gate_core::PackAuditEventParams;
use evidence_gate_core::PackDigest;
use evidence_gate_core::PackRootHasher;
use evidence_gate_core::PackVerificationStatus;
use evidence_gate_core::TaxonomyClassifier;
use evidence_gate_core::VerdictStatus;
use evidence_gate_core::VerifyAuditEvent;
use evidence_gate_core::VerifyAuditEventParams;
use evidence_gate_core::adjudicate_ruleset_1_0;
use evidence_gate_core::compute_verdict_hash;
use evidence_gate_core::diff_sums;
use evidence_gate_core::hashing::is_sha256_hex;
use evidence_gate_core::hashing::short_hash;
use evidence_gate_core::pack::INTEGRITY_DIR;
use evidence_gate_core::pack::ROOT_HASH_FILE;
use evidence_gate_core::pack::SUMS_FILE;
use evidence_gate_core::write_reports;
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Exit code for usage errors.
const EXIT_USAGE: u8 = 2;
/// Source label of offline verification output.
const RULESET_SOURCE: &str = "bundled";

// ============================================================================
// SECTION: CLI Types
// ============================================================================

/// Top-level CLI definition.
#[derive(Parser, Debug)]
#[command(name = "evidence-gate", disable_help_subcommand = true, disable_version_flag = true)]
struct Cli {
    /// Print version information and exit.
    #[arg(long = "version", action = ArgAction::SetTrue, global = true)]
    show_version: bool,
    /// Selected subcommand to execute.
    #[command(subcommand)]
    command: Option<Commands>,
}

/// Supported CLI subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Pack integrity utilities.
    Pack {
        /// Selected pack subcommand.
        #[command(subcommand)]
        command: PackCommand,
    },
    /// Re-adjudicate a pack offline with the bundled ruleset.
    Verify(VerifyCommand),
    /// Governance gate utilities.
    Gate {
        /// Selected gate subcommand.
        #[command(subcommand)]
        command: GateCommand,
    },
    /// Reason-code taxonomy utilities.
    Taxonomy {
        /// Selected taxonomy subcommand.
        #[command(subcommand)]
        command: TaxonomyCommand,
    },
    /// Configuration utilities.
    Config {
        /// Selected config subcommand.
        #[command(subcommand)]
        command: ConfigCommand,
    },
}

/// Pack subcommands.
#[derive(Subcommand, Debug)]
enum PackCommand {
    /// Recompute the pack root hash and compare it with the stored value.
    Recompute(PackRecomputeCommand),
}

/// Gate subcommands.
#[derive(Subcommand, Debug)]
enum GateCommand {
    /// Run the selected gates and write their reports.
    Run(GateRunCommand),
    /// List the known gate ids.
    List,
}

/// Taxonomy subcommands.
#[derive(Subcommand, Debug)]
enum TaxonomyCommand {
    /// Classify reason codes.
    Classify(TaxonomyClassifyCommand),
}

/// Config subcommands.
#[derive(Subcommand, Debug)]
enum ConfigCommand {
    /// Validate an evidence gate configuration file.
    Validate(ConfigArgs),
}

/// Shared config path argument.
#[derive(Args, Debug)]
struct ConfigArgs {
    /// Optional config file path (defaults to evidence-gate.toml or env override).
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,
}

/// Arguments for pack recomputation.
#[derive(Args, Debug)]
struct PackRecomputeCommand {
    /// Pack root directory.
    #[arg(value_name = "PACK_DIR")]
    pack_dir: PathBuf,
    /// Persist `integrity/sha256sums.txt` and `integrity/pack.sha256`.
    #[arg(long, action = ArgAction::SetTrue)]
    write: bool,
    /// Config selection.
    #[command(flatten)]
    config: ConfigArgs,
}

/// Arguments for offline verification.
#[derive(Args, Debug)]
struct VerifyCommand {
    /// Pack root directory.
    #[arg(value_name = "PACK_DIR")]
    pack_dir: PathBuf,
    /// Ruleset version; only the bundled version is accepted.
    #[arg(long, value_name = "VERSION")]
    ruleset: String,
    /// Expected verdict hash; a mismatch exits with failure.
    #[arg(long, value_name = "HEX")]
    expect_verdict_hash: Option<String>,
    /// Config selection.
    #[command(flatten)]
    config: ConfigArgs,
}

/// Arguments for gate runs.
#[derive(Args, Debug)]
struct GateRunCommand {
    /// Gate ids to run (repeatable; defaults to the enabled gates).
    #[arg(long = "gate", value_name = "ID")]
    gates: Vec<String>,
    /// Report output directory (overrides `gates.output_dir`).
    #[arg(long, value_name = "DIR")]
    output_dir: Option<PathBuf>,
    /// Config selection.
    #[command(flatten)]
    config: ConfigArgs,
}

/// Arguments for taxonomy classification.
#[derive(Args, Debug)]
struct TaxonomyClassifyCommand {
    /// Reason codes to classify.
    #[arg(value_name = "CODE", required = true)]
    codes: Vec<String>,
    /// Config selection.
    #[command(flatten)]
    config: ConfigArgs,
}

// ============================================================================
// SECTION: Output Types
// ============================================================================

/// Offline verification output.
#[derive(Debug, Serialize)]
struct VerifyOutput<'a> {
    /// Always `bundled`.
    ruleset_source: &'static str,
    /// Ruleset version applied.
    ruleset_version: &'a str,
    /// Pack identifier from the manifest.
    pack_id: &'a str,
    /// Recomputed pack root hash.
    pack_root_hash: &'a str,
    /// Recomputed verdict hash.
    verdict_hash: &'a str,
    /// Topline verdict.
    topline_verdict: VerdictStatus,
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// CLI error wrapper for localized error messages.
#[derive(Debug, Error)]
#[error("{message}")]
struct CliError {
    /// Human-readable error message.
    message: String,
}

impl CliError {
    /// Constructs a new [`CliError`] from a localized message.
    const fn new(message: String) -> Self {
        Self {
            message,
        }
    }
}

/// CLI result alias for fallible operations.
type CliResult<T> = Result<T, CliError>;

// ============================================================================
// SECTION: Entry Point
// ============================================================================

/// CLI entry point returning an exit code.
fn main() -> ExitCode {
    match run() {
        Ok(code) => code,
        Err(err) => emit_error(&err.to_string()),
    }
}

/// Executes the CLI command dispatcher.
fn run() -> CliResult<ExitCode> {
    let cli = Cli::parse();

    if cli.show_version {
        let version = env!("CARGO_PKG_VERSION");
        write_stdout_line(&t!("main.version", version = version))
            .map_err(|err| CliError::new(output_error("stdout", &err)))?;
        return Ok(ExitCode::SUCCESS);
    }

    let Some(command) = cli.command else {
        show_help()?;
        return Ok(ExitCode::SUCCESS);
    };

    match command {
        Commands::Pack {
            command,
        } => command_pack(command),
        Commands::Verify(command) => command_verify(&command),
        Commands::Gate {
            command,
        } => command_gate(command),
        Commands::Taxonomy {
            command,
        } => command_taxonomy(command),
        Commands::Config {
            command,
        } => command_config(command),
    }
}

/// Emits the top-level help message for the CLI.
fn show_help() -> CliResult<()> {
    let mut command = Cli::command();
    command.print_help().map_err(|err| CliError::new(output_error("stdout", &err)))?;
    write_stdout_line("").map_err(|err| CliError::new(output_error("stdout", &err)))?;
    Ok(())
}

// ============================================================================
// SECTION: Pack Commands
// ============================================================================

/// Dispatches pack subcommands.
fn command_pack(command: PackCommand) -> CliResult<ExitCode> {
    match command {
        PackCommand::Recompute(command) => command_pack_recompute(&command),
    }
}

/// Executes the pack recompute command.
fn command_pack_recompute(command: &PackRecomputeCommand) -> CliResult<ExitCode> {
    let config = load_config(command.config.config.as_deref())?;
    let hasher = config.pack_hasher();
    let audit = open_audit(&config)?;
    let pack_dir = &command.pack_dir;
    require_pack_dir(pack_dir)?;

    let verification = hasher.verify(pack_dir).map_err(|err| {
        CliError::new(t!("pack.recompute.failed", path = pack_dir.display(), error = err))
    })?;
    let digest = &verification.computed;
    write_stdout_bytes(digest.entries.render().as_bytes())
        .map_err(|err| CliError::new(output_error("stdout", &err)))?;
    emit_stdout(&t!("pack.recompute.files", count = digest.entries.len()))?;
    emit_stdout(&t!("pack.recompute.root_hash", hash = digest.root_hash))?;
    match (&verification.status, &verification.stored) {
        (PackVerificationStatus::Match, _) => emit_stdout(&t!("pack.recompute.match"))?,
        (PackVerificationStatus::Mismatch, Some(stored)) => {
            emit_stdout(&t!(
                "pack.recompute.mismatch",
                stored = short_hash(stored),
                computed = short_hash(&digest.root_hash)
            ))?;
            emit_sums_diff(&hasher, pack_dir, digest)?;
        }
        _ => emit_stdout(&t!("pack.recompute.no_stored"))?,
    }

    if command.write {
        hasher.write(pack_dir, digest).map_err(|err| {
            CliError::new(t!("pack.recompute.write_failed", error = err))
        })?;
        emit_stdout(&t!(
            "pack.recompute.written",
            sums = format!("{INTEGRITY_DIR}/{SUMS_FILE}"),
            root = format!("{INTEGRITY_DIR}/{ROOT_HASH_FILE}")
        ))?;
    } else {
        emit_stdout(&t!("pack.recompute.dry_run"))?;
    }

    audit.record_pack(&PackAuditEvent::new(PackAuditEventParams {
        pack_dir: pack_dir.display().to_string(),
        root_hash: digest.root_hash.clone(),
        file_count: digest.entries.len(),
        comparison: verification.status,
        written: command.write,
    }));

    let mismatch = verification.status == PackVerificationStatus::Mismatch;
    Ok(if mismatch && !command.write { ExitCode::FAILURE } else { ExitCode::SUCCESS })
}

/// Prints entry-level differences against the stored sums document.
fn emit_sums_diff(
    hasher: &PackRootHasher,
    pack_dir: &Path,
    digest: &PackDigest,
) -> CliResult<()> {
    let stored = match hasher.read_sums(pack_dir) {
        Ok(Some(stored)) => stored,
        Ok(None) => return Ok(()),
        Err(err) => {
            return write_stderr_line(&t!("pack.recompute.sums_unreadable", error = err))
                .map_err(|err| CliError::new(output_error("stderr", &err)));
        }
    };
    let diff = diff_sums(&stored, &digest.entries);
    for path in &diff.added {
        emit_stdout(&t!("pack.recompute.added", path = path))?;
    }
    for path in &diff.removed {
        emit_stdout(&t!("pack.recompute.removed", path = path))?;
    }
    for path in &diff.changed {
        emit_stdout(&t!("pack.recompute.changed", path = path))?;
    }
    Ok(())
}

// ============================================================================
// SECTION: Verify Command
// ============================================================================

/// Executes offline verification with the bundled ruleset.
fn command_verify(command: &VerifyCommand) -> CliResult<ExitCode> {
    if command.ruleset != BUNDLED_RULESET_VERSION {
        write_stderr_line(&t!(
            "verify.ruleset_unsupported",
            supported = BUNDLED_RULESET_VERSION,
            version = command.ruleset
        ))
        .map_err(|err| CliError::new(output_error("stderr", &err)))?;
        return Ok(ExitCode::from(EXIT_USAGE));
    }
    let expected = command.expect_verdict_hash.as_deref().map(str::trim);
    if let Some(value) = expected
        && !is_sha256_hex(value)
    {
        write_stderr_line(&t!("verify.expect_invalid", value = value))
            .map_err(|err| CliError::new(output_error("stderr", &err)))?;
        return Ok(ExitCode::from(EXIT_USAGE));
    }

    let pack_dir = &command.pack_dir;
    require_pack_dir(pack_dir)?;
    if !pack_dir.join(MANIFEST_FILE).is_file() {
        return Err(CliError::new(t!("verify.manifest_missing", path = pack_dir.display())));
    }
    let config = load_config(command.config.config.as_deref())?;
    let audit = open_audit(&config)?;

    let result = adjudicate_ruleset_1_0(pack_dir, &config.pack_hasher())
        .map_err(|err| CliError::new(t!("verify.failed", error = err)))?;
    let verdict_hash = result.verdict_hash.clone().unwrap_or_else(|| compute_verdict_hash(&result));
    let output = VerifyOutput {
        ruleset_source: RULESET_SOURCE,
        ruleset_version: &result.ruleset_version,
        pack_id: &result.pack_id,
        pack_root_hash: &result.pack_root_hash,
        verdict_hash: &verdict_hash,
        topline_verdict: result.topline_verdict,
    };
    write_canonical_json(&output, "verify")?;

    let expected_match = expected.map(|value| value == verdict_hash);
    audit.record_verify(&VerifyAuditEvent::new(VerifyAuditEventParams {
        pack_id: result.pack_id.clone(),
        ruleset_version: result.ruleset_version.clone(),
        pack_root_hash: result.pack_root_hash.clone(),
        verdict_hash: verdict_hash.clone(),
        topline_verdict: result.topline_verdict,
        expected_match,
    }));

    match (expected, expected_match) {
        (Some(value), Some(false)) => {
            write_stderr_line(&t!(
                "verify.expect_mismatch",
                expected = value,
                computed = verdict_hash
            ))
            .map_err(|err| CliError::new(output_error("stderr", &err)))?;
            Ok(ExitCode::FAILURE)
        }
        _ => Ok(ExitCode::SUCCESS),
    }
}

// ============================================================================
// SECTION: Gate Commands
// ============================================================================

/// Dispatches gate subcommands.
fn command_gate(command: GateCommand) -> CliResult<ExitCode> {
    match command {
        GateCommand::Run(command) => command_gate_run(&command),
        GateCommand::List => command_gate_list(),
    }
}

/// Runs the selected gates, writes reports, and prints the outcome.
fn command_gate_run(command: &GateRunCommand) -> CliResult<ExitCode> {
    let config = load_config(command.config.config.as_deref())?;
    let selection = if command.gates.is_empty() {
        config.enabled_gates()
    } else {
        command.gates.iter().map(|id| parse_gate(id)).collect::<CliResult<Vec<_>>>()?
    };
    let engine_config = config
        .engine_config()
        .map_err(|err| CliError::new(t!("gate.engine_failed", error = err)))?;
    let engine = GateEngine::new(engine_config, config.evaluation_source(), open_audit(&config)?);
    let outcome = engine.run(&selection);

    let output_dir =
        command.output_dir.clone().unwrap_or_else(|| PathBuf::from(config.gates.output_dir.trim()));
    write_reports(&output_dir, &outcome)
        .map_err(|err| CliError::new(t!("gate.run.write_failed", error = err)))?;

    for report in &outcome.reports {
        emit_stdout(&t!(
            "gate.run.line",
            gate = report.gate_id(),
            status = report.status(),
            issues = report.issues().len()
        ))?;
        for issue in report.issues() {
            emit_stdout(&t!("gate.run.issue", issue = issue))?;
        }
    }
    let aggregate = &outcome.aggregate;
    emit_stdout(&t!(
        "gate.run.aggregate",
        status = aggregate.status,
        bootstrap = aggregate.bootstrap
    ))?;
    if !aggregate.blocking.is_empty() {
        emit_stdout(&t!("gate.run.blocking", gates = aggregate.blocking.join(", ")))?;
    }
    emit_stdout(&t!("gate.run.reports", path = output_dir.display()))?;

    Ok(if aggregate.passed() { ExitCode::SUCCESS } else { ExitCode::FAILURE })
}

/// Lists the known gate ids.
fn command_gate_list() -> CliResult<ExitCode> {
    for kind in GateKind::ALL {
        emit_stdout(kind.id())?;
    }
    Ok(ExitCode::SUCCESS)
}

/// Parses a gate id from the command line.
fn parse_gate(id: &str) -> CliResult<GateKind> {
    GateKind::parse(id).ok_or_else(|| {
        let known = GateKind::ALL.iter().map(|kind| kind.id()).collect::<Vec<_>>().join(", ");
        CliError::new(t!("gate.unknown", gate = id, known = known))
    })
}

// ============================================================================
// SECTION: Taxonomy Commands
// ============================================================================

/// Dispatches taxonomy subcommands.
fn command_taxonomy(command: TaxonomyCommand) -> CliResult<ExitCode> {
    match command {
        TaxonomyCommand::Classify(command) => command_taxonomy_classify(&command),
    }
}

/// Prints one canonical JSON classification per code.
fn command_taxonomy_classify(command: &TaxonomyClassifyCommand) -> CliResult<ExitCode> {
    let config = load_config(command.config.config.as_deref())?;
    let taxonomy = config
        .build_taxonomy()
        .map_err(|err| CliError::new(t!("taxonomy.build_failed", error = err)))?;
    let classifier = TaxonomyClassifier::new(taxonomy);
    for code in &command.codes {
        let classification = classifier.classify(code);
        let mut value = serde_json::to_value(&classification).map_err(|err| {
            CliError::new(t!("output.render_failed", kind = "taxonomy", error = err))
        })?;
        if let Value::Object(map) = &mut value {
            map.insert("code".to_string(), Value::String(code.clone()));
        }
        write_canonical_json(&value, "taxonomy")?;
    }
    Ok(ExitCode::SUCCESS)
}

// ============================================================================
// SECTION: Config Commands
// ============================================================================

/// Dispatches config subcommands.
fn command_config(command: ConfigCommand) -> CliResult<ExitCode> {
    match command {
        ConfigCommand::Validate(command) => command_config_validate(&command),
    }
}

/// Executes the config validation command.
fn command_config_validate(command: &ConfigArgs) -> CliResult<ExitCode> {
    let config = load_config(command.config.as_deref())?;
    emit_stdout(&t!("config.validate.ok"))?;
    match &config.source_path {
        Some(path) => emit_stdout(&t!("config.validate.source", path = path.display()))?,
        None => emit_stdout(&t!("config.validate.defaults"))?,
    }
    Ok(ExitCode::SUCCESS)
}

// ============================================================================
// SECTION: Shared Helpers
// ============================================================================

/// Loads and validates configuration.
fn load_config(path: Option<&Path>) -> CliResult<EvidenceGateConfig> {
    EvidenceGateConfig::load(path)
        .map_err(|err| CliError::new(t!("config.load_failed", error = err)))
}

/// Opens the configured audit sink.
fn open_audit(config: &EvidenceGateConfig) -> CliResult<Box<dyn GateAuditSink>> {
    config.audit_sink().map_err(|err| CliError::new(t!("audit.open_failed", error = err)))
}

/// Fails unless `path` is a directory.
fn require_pack_dir(path: &Path) -> CliResult<()> {
    if path.is_dir() {
        Ok(())
    } else {
        Err(CliError::new(t!("pack.missing", path = path.display())))
    }
}

// ============================================================================
// SECTION: Output Helpers
// ============================================================================

/// Writes a single line to stdout, mapping failures to [`CliError`].
fn emit_stdout(message: &str) -> CliResult<()> {
    write_stdout_line(message).map_err(|err| CliError::new(output_error("stdout", &err)))
}

/// Writes a single line to stdout.
fn write_stdout_line(message: &str) -> std::io::Result<()> {
    let mut stdout = std::io::stdout();
    writeln!(&mut stdout, "{message}")
}

/// Writes raw bytes to stdout without adding a newline.
fn write_stdout_bytes(bytes: &[u8]) -> std::io::Result<()> {
    let mut stdout = std::io::stdout();
    stdout.write_all(bytes)
}

/// Writes a value to stdout as one line of RFC 8785 canonical JSON.
fn write_canonical_json<T: Serialize>(value: &T, kind: &str) -> CliResult<()> {
    let mut bytes = serde_jcs::to_vec(value)
        .map_err(|err| CliError::new(t!("output.render_failed", kind = kind, error = err)))?;
    bytes.push(b'\n');
    write_stdout_bytes(&bytes).map_err(|err| CliError::new(output_error("stdout", &err)))
}

/// Writes a single line to stderr.
fn write_stderr_line(message: &str) -> std::io::Result<()> {
    let mut stderr = std::io::stderr();
    writeln!(&mut stderr, "{message}")
}

/// Formats a localized output error message.
fn output_error(stream: &str, error: &std::io::Error) -> String {
    let stream_label = match stream {
        "stdout" => t!("output.stream.stdout"),
        "stderr" => t!("output.stream.stderr"),
        _ => t!("output.stream.unknown"),
    };
    t!("output.write_failed", stream = stream_label, error = error)
}

/// Emits an error message to stderr and returns a failure exit code.
fn emit_error(message: &str) -> ExitCode {
    // Deliberately ignored: with stderr gone, the exit code is the only signal left.
    let _ = write_stderr_line(message);
    ExitCode::FAILURE
}
