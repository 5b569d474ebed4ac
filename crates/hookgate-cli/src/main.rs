//! hookgate - pre-action policy gates for coding-assistant tool calls
//!
//! Each gate subcommand reads one hook event from stdin and exits 0 (allow)
//! or 2 (block, with a JSON diagnostic on stderr).
//!
//! ## Commands
//!
//! - `git`: commit/push policy gate
//! - `protect-specs`: spec-freeze gate for file-editing tools
//! - `enforce-workflow`: require a spec and completed workflow steps before
//!   source edits
//! - `lint-message`: check a commit message file against the commit convention

use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::error::ErrorKind;
use clap::{Parser, Subcommand};
use tracing::Level;

use hookgate_core::obs::emit_policy_load_failed;
use hookgate_core::{
    strip_comment_lines, FreezePolicy, GateDecision, GatePolicy, GitCli, GitPolicyGate,
    MessageRules, SpecFreezeGate, WorkflowGate, WorkflowPolicy, EXIT_ALLOW,
};

#[derive(Parser)]
#[command(name = "hookgate")]
#[command(author = "Stevedores Org")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Pre-action policy gates for coding-assistant hooks", long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit JSON-formatted log lines
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Gate `git commit` / `git push` shell commands (reads a hook event on stdin)
    Git {
        /// JSON policy file overriding the built-in commit convention
        #[arg(long, env = "HOOKGATE_POLICY")]
        policy: Option<PathBuf>,

        /// Repository to inspect (default: current directory)
        #[arg(long, default_value = ".")]
        repo_dir: PathBuf,
    },

    /// Block edits to frozen specification documents (reads a hook event on stdin)
    ProtectSpecs {
        /// JSON policy file overriding the protected path patterns
        #[arg(long, env = "HOOKGATE_FREEZE_POLICY")]
        freeze_policy: Option<PathBuf>,
    },

    /// Require a spec and completed workflow steps before source edits (reads a hook event on stdin)
    EnforceWorkflow {
        /// JSON policy file overriding the workflow rules
        #[arg(long, env = "HOOKGATE_WORKFLOW_POLICY")]
        workflow_policy: Option<PathBuf>,
    },

    /// Check a commit message file against the commit convention
    LintMessage {
        /// Message file, e.g. the path git passes to a commit-msg hook
        file: PathBuf,

        /// JSON policy file overriding the built-in commit convention
        #[arg(long, env = "HOOKGATE_POLICY")]
        policy: Option<PathBuf>,
    },
}

fn main() -> ExitCode {
    // clap's own exit status for usage errors is 2, which a hook caller reads
    // as "block". Usage errors exit 1 instead.
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            let _ = e.print();
            return match e.kind() {
                ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => ExitCode::SUCCESS,
                _ => ExitCode::FAILURE,
            };
        }
    };

    let level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::WARN
    };
    hookgate_core::init_tracing(cli.json, level);

    let result = match cli.command {
        Commands::Git { policy, repo_dir } => cmd_git(policy.as_deref(), &repo_dir),
        Commands::ProtectSpecs { freeze_policy } => cmd_protect_specs(freeze_policy.as_deref()),
        Commands::EnforceWorkflow { workflow_policy } => {
            cmd_enforce_workflow(workflow_policy.as_deref())
        }
        Commands::LintMessage { file, policy } => cmd_lint_message(&file, policy.as_deref()),
    };

    match result {
        Ok(code) => code,
        Err(e) => {
            eprintln!("hookgate: {e:#}");
            ExitCode::FAILURE
        }
    }
}

fn cmd_git(policy_path: Option<&Path>, repo_dir: &Path) -> Result<ExitCode> {
    let raw = read_stdin();
    let repo = GitCli::new(repo_dir);

    let gate = match GitPolicyGate::new(load_gate_policy(policy_path), repo.clone()) {
        Ok(gate) => gate,
        Err(e) => {
            emit_policy_load_failed(&display(policy_path), &e);
            GitPolicyGate::new(GatePolicy::default(), repo)
                .context("built-in git policy failed to compile")?
        }
    };

    Ok(emit_decision(gate.evaluate_raw(&raw)))
}

fn cmd_protect_specs(policy_path: Option<&Path>) -> Result<ExitCode> {
    let raw = read_stdin();

    let policy = match policy_path {
        Some(path) => FreezePolicy::from_json_file(path).unwrap_or_else(|e| {
            emit_policy_load_failed(&path.display().to_string(), &e);
            FreezePolicy::default()
        }),
        None => FreezePolicy::default(),
    };
    let gate = match SpecFreezeGate::new(policy) {
        Ok(gate) => gate,
        Err(e) => {
            emit_policy_load_failed(&display(policy_path), &e);
            SpecFreezeGate::new(FreezePolicy::default())
                .context("built-in freeze policy failed to compile")?
        }
    };

    Ok(emit_decision(gate.evaluate_raw(&raw)))
}

fn cmd_enforce_workflow(policy_path: Option<&Path>) -> Result<ExitCode> {
    let raw = read_stdin();
    let cwd = std::env::current_dir().context("Failed to resolve the current directory")?;

    let policy = match policy_path {
        Some(path) => WorkflowPolicy::from_json_file(path).unwrap_or_else(|e| {
            emit_policy_load_failed(&path.display().to_string(), &e);
            WorkflowPolicy::default()
        }),
        None => WorkflowPolicy::default(),
    };
    let gate = match WorkflowGate::new(policy, cwd.clone()) {
        Ok(gate) => gate,
        Err(e) => {
            emit_policy_load_failed(&display(policy_path), &e);
            WorkflowGate::new(WorkflowPolicy::default(), cwd)
                .context("built-in workflow policy failed to compile")?
        }
    };

    Ok(emit_decision(gate.evaluate_raw(&raw)))
}

fn cmd_lint_message(file: &Path, policy_path: Option<&Path>) -> Result<ExitCode> {
    let text = std::fs::read_to_string(file)
        .with_context(|| format!("Failed to read message file {}", file.display()))?;

    let policy = load_gate_policy(policy_path);
    let rules = MessageRules::new(&policy).context("Failed to compile message rules")?;
    let violations = rules.validate(&strip_comment_lines(&text));

    if violations.is_empty() {
        return Ok(ExitCode::SUCCESS);
    }

    println!("commit message violates the commit convention:");
    for v in &violations {
        println!("  - {v}");
    }
    Ok(ExitCode::FAILURE)
}

/// Load a gate policy, falling back to the built-in one on any failure.
fn load_gate_policy(path: Option<&Path>) -> GatePolicy {
    let Some(path) = path else {
        return GatePolicy::default();
    };
    GatePolicy::from_json_file(path).unwrap_or_else(|e| {
        emit_policy_load_failed(&path.display().to_string(), &e);
        GatePolicy::default()
    })
}

/// Read the hook event. A broken stdin reads as empty, which allows.
fn read_stdin() -> String {
    let mut raw = String::new();
    if let Err(e) = std::io::stdin().read_to_string(&mut raw) {
        hookgate_core::obs::emit_input_malformed(&e);
        raw.clear();
    }
    raw
}

fn emit_decision(decision: GateDecision) -> ExitCode {
    match &decision {
        GateDecision::Allow(_) => ExitCode::from(EXIT_ALLOW as u8),
        GateDecision::Block(payload) => {
            eprintln!("{}", payload.to_json());
            ExitCode::from(decision.exit_code() as u8)
        }
    }
}

fn display(path: Option<&Path>) -> String {
    path.map(|p| p.display().to_string())
        .unwrap_or_else(|| "<built-in>".to_string())
}
