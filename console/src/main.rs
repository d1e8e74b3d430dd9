//! mdpress Console - Entry Point
//!
//! A headless deployment console for the mdpress publishing platform.
//! Watches a project's deployment jobs and reports status changes.

use std::collections::HashMap;
use std::env;
use std::time::Duration;

use mdpress_console::app::options::{AppOptions, LifecycleOptions, StorageOptions};
use mdpress_console::app::run::{activate_once, issues_once, run, STARTUP_HINT_KEY};
use mdpress_console::logs::{init_logging, LogOptions};
use mdpress_console::models::issue::IssueSeverity;
use mdpress_console::render;
use mdpress_console::storage::layout::StorageLayout;
use mdpress_console::storage::prefs::{Preferences, DEFAULT_DISMISSAL_TTL};
use mdpress_console::storage::settings::Settings;
use mdpress_console::utils::version_info;
use mdpress_console::watch::watcher::WatchSettings;
use mdpress_console::workers::watch;

use secrecy::SecretString;
use tracing::{error, info};

#[tokio::main]
async fn main() {
    // Parse command line arguments
    let args: Vec<String> = env::args().collect();
    let mut cli_args: HashMap<String, String> = HashMap::new();

    for arg in args.iter().skip(1) {
        if let Some((key, value)) = arg.split_once('=') {
            // Handle --key=value format
            let clean_key = key.trim_start_matches('-');
            cli_args.insert(clean_key.to_string(), value.to_string());
        } else if arg.starts_with("--") {
            // Handle standalone flags like --version
            let clean_key = arg.trim_start_matches('-');
            cli_args.insert(clean_key.to_string(), "true".to_string());
        }
    }

    // Print version and exit
    let version = version_info();
    if cli_args.contains_key("version") {
        println!("{}", serde_json::to_string_pretty(&version).unwrap());
        return;
    }

    let layout = StorageLayout::default();
    let settings_file = layout.settings_file();

    // Write a default settings file
    if cli_args.contains_key("init") {
        if settings_file.exists().await {
            eprintln!(
                "Settings file already exists at {}",
                settings_file.path().display()
            );
            return;
        }
        if let Err(e) = settings_file.write_json(&Settings::default()).await {
            eprintln!("Unable to write settings file: {e}");
            return;
        }
        println!(
            "Wrote default settings to {}",
            settings_file.path().display()
        );
        return;
    }

    // Retrieve the settings file
    let settings = match settings_file.read_json::<Settings>().await {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!("Unable to read settings file: {}", e);
            eprintln!("Run: mdpress-console --init");
            return;
        }
    };

    // Initialize logging
    let log_options = LogOptions {
        log_level: settings.log_level.clone(),
        log_dir: Some(layout.logs_dir()),
        ..Default::default()
    };
    let _log_guard = match init_logging(log_options) {
        Ok(guard) => guard,
        Err(e) => {
            println!("Failed to initialize logging: {e}");
            None
        }
    };

    // Persist hint dismissal
    let quiet_hints = cli_args.contains_key("quiet-hints");
    if quiet_hints {
        let prefs = Preferences::new(layout.prefs_file(), DEFAULT_DISMISSAL_TTL);
        if let Err(e) = prefs.dismiss(STARTUP_HINT_KEY).await {
            error!("Unable to persist hint dismissal: {}", e);
        }
    }

    let project_id = cli_args
        .get("project")
        .cloned()
        .or_else(|| settings.project_id.clone());
    let Some(project_id) = project_id else {
        error!("No project configured; pass --project=<id> or set project_id in settings");
        return;
    };

    let initial_page = cli_args
        .get("page")
        .and_then(|p| p.parse().ok())
        .unwrap_or(1);

    let options = AppOptions {
        lifecycle: LifecycleOptions::default(),
        backend_base_url: settings.backend.base_url.clone(),
        preview_base_url: settings.backend.preview_base_url.clone(),
        api_token: settings.api_token.clone().map(SecretString::from),
        project_id,
        initial_page,
        storage: StorageOptions {
            layout: layout.clone(),
        },
        watch_settings: WatchSettings {
            max_candidate_age: Duration::from_secs(settings.watch.max_candidate_age_secs),
            page_size: settings.watch.page_size,
        },
        watch_worker: watch::Options {
            interval: Duration::from_secs(settings.watch.interval_secs),
            initial_delay: Duration::from_secs(settings.watch.initial_delay_secs),
        },
        show_hints: settings.show_hints && !quiet_hints,
    };

    // One-shot activation mode
    if let Some(job_id) = cli_args.get("activate") {
        if let Err(e) = activate_once(options, job_id).await {
            error!("Activation failed: {e}");
            println!("{}", render::destructive(&e.to_string()));
            std::process::exit(1);
        }
        return;
    }

    // One-shot issue listing mode
    if let Some(job_id) = cli_args.get("issues") {
        let min_severity = match cli_args.get("severity") {
            Some(s) => match s.parse::<IssueSeverity>() {
                Ok(severity) => severity,
                Err(e) => {
                    println!("{}", render::destructive(&e));
                    std::process::exit(1);
                }
            },
            None => IssueSeverity::Info,
        };
        if let Err(e) = issues_once(options, job_id, min_severity).await {
            error!("Issue listing failed: {e}");
            println!("{}", render::destructive(&e.to_string()));
            std::process::exit(1);
        }
        return;
    }

    info!("Running mdpress console with options: {:?}", options);
    let result = run(options, await_shutdown_signal()).await;
    if let Err(e) = result {
        error!("Console exited with error: {e}");
    }
}

async fn await_shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};
        let mut sigterm = match signal(SignalKind::terminate()) {
            Ok(s) => s,
            Err(e) => {
                error!("Unable to install SIGTERM handler: {}", e);
                return;
            }
        };
        let mut sigint = match signal(SignalKind::interrupt()) {
            Ok(s) => s,
            Err(e) => {
                error!("Unable to install SIGINT handler: {}", e);
                return;
            }
        };

        tokio::select! {
            _ = sigterm.recv() => {
                info!("SIGTERM received, shutting down...");
            }
            _ = sigint.recv() => {
                info!("SIGINT received, shutting down...");
            }
        }
    }

    #[cfg(not(unix))]
    {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Unable to listen for Ctrl+C: {}", e);
            return;
        }
        info!("Ctrl+C received, shutting down...");
    }
}
