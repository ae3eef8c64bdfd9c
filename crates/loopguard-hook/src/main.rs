//! `loopguard` binary.
//!
//! Point SABnzbd's pre-queue script at a wrapper running
//! `loopguard prequeue`, and the post-processing script at one running
//! `loopguard postprocess`. Download fields come from the `SAB_*`
//! environment; settings from `--config` (default
//! `prevent_download_loops.json` next to the binary) and `LOOPGUARD_*`.

use std::{io, path::PathBuf, process::ExitCode};

use anyhow::Context as _;
use clap::{Args, Parser, Subcommand};
use loopguard_arr::ArrBlocklister;
use loopguard_core::store::HistoryStore;
use loopguard_hook::{
  AdmissionGate, CompletionReporter, Dispatcher, DownloadInfo, Settings, host, logging,
};
use loopguard_notify::ConfiguredNotifier;
use loopguard_store_file::FileStore;

#[derive(Parser)]
#[command(author, version, about = "Download loop prevention for SABnzbd")]
struct Cli {
  /// Path to the JSON or TOML settings file.
  #[arg(short, long, env = "LOOPGUARD_CONFIG")]
  config: Option<PathBuf>,

  #[command(subcommand)]
  command: Command,
}

#[derive(Subcommand)]
enum Command {
  /// Decide whether a download may be queued; answers on stdout.
  Prequeue(DownloadArgs),
  /// Record the final status of a finished download.
  Postprocess(DownloadArgs),
  /// Drop expired history entries and exit.
  Sweep,
}

#[derive(Args)]
struct DownloadArgs {
  #[arg(long, env = "SAB_FINAL_NAME", default_value = "")]
  name:          String,
  #[arg(long, env = "SAB_CAT", default_value = "")]
  category:      String,
  #[arg(long, env = "SAB_DUPLICATE_KEY", default_value = "")]
  duplicate_key: String,
  #[arg(long, env = "SAB_FILENAME", default_value = "")]
  filename:      String,
  #[arg(long, env = "SAB_COMPLETE_DIR", default_value = "")]
  complete_dir:  String,
  #[arg(long, env = "SAB_PP_STATUS", default_value = "0")]
  pp_status:     String,

  /// Positional arguments passed by the host; unused.
  #[arg(hide = true, trailing_var_arg = true, allow_hyphen_values = true)]
  host_args: Vec<String>,
}

impl From<DownloadArgs> for DownloadInfo {
  fn from(a: DownloadArgs) -> Self {
    Self {
      name:          a.name,
      category:      a.category,
      duplicate_key: a.duplicate_key,
      filename:      a.filename,
      complete_dir:  a.complete_dir,
      pp_status:     a.pp_status,
    }
  }
}

fn dispatcher(settings: &Settings) -> Dispatcher<ConfiguredNotifier> {
  let notifier = match ConfiguredNotifier::from_config(&settings.notifier, settings.verify_ssl) {
    Ok(n) => n,
    Err(e) => {
      tracing::error!(error = %e, "notifier disabled");
      None
    }
  };

  let dispatcher = Dispatcher::new(notifier).with_priority(settings.notifier.priority);
  if settings.wants_raw_data {
    dispatcher.with_raw_data(host::host_vars())
  } else {
    dispatcher
  }
}

async fn run(command: Command, settings: &Settings) -> anyhow::Result<()> {
  let now = chrono::Utc::now().timestamp();
  let store = FileStore::new(settings.history_file.clone());

  match command {
    Command::Prequeue(args) => {
      let blocklister = ArrBlocklister::new(
        settings.radarr_instances.clone(),
        settings.sonarr_instances.clone(),
        settings.verify_ssl,
      );
      let gate = AdmissionGate::new(store, blocklister, dispatcher(settings), settings);
      let download: DownloadInfo = args.into();
      let answer = gate.answer(&download, now).await;
      answer
        .response
        .write_to(io::stdout().lock())
        .context("failed to answer host")?;
      gate.follow_up(&download, answer, now).await;
    }
    Command::Postprocess(args) => {
      let reporter = CompletionReporter::new(store, dispatcher(settings), settings);
      reporter.report(&args.into(), now).await;
    }
    Command::Sweep => {
      let report = store
        .sweep(settings.window_seconds(), now)
        .await
        .context("failed to sweep history")?;
      println!("dropped {} expired entries, {} kept", report.dropped, report.kept);
    }
  }

  Ok(())
}

fn exit_code(fatal: bool) -> ExitCode {
  if fatal { ExitCode::FAILURE } else { ExitCode::SUCCESS }
}

#[tokio::main]
async fn main() -> ExitCode {
  let cli = Cli::parse();
  // Only a pre-queue check that never answered is reported to the host.
  let fatal = matches!(cli.command, Command::Prequeue(_));

  let config_path = cli.config.unwrap_or_else(Settings::default_path);
  let settings = match Settings::load(&config_path) {
    Ok(settings) => settings,
    Err(e) => {
      logging::init_fallback();
      tracing::error!(
        path = %config_path.display(),
        error = %e,
        "failed to load settings"
      );
      return exit_code(fatal);
    }
  };
  // Flushes the file writer on drop; must outlive every log call below.
  let _guard = logging::init(&settings);

  match run(cli.command, &settings).await {
    Ok(()) => ExitCode::SUCCESS,
    Err(e) => {
      tracing::error!(error = %format!("{e:#}"), "critical error");
      exit_code(fatal)
    }
  }
}
