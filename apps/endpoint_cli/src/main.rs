use std::{
    fs,
    path::{Path, PathBuf},
    sync::Arc,
};

use anyhow::{bail, Context, Result};
use clap::Parser;
use client_core::{
    config::{load_settings, Settings},
    reconcile, BroadcastNotifier, ConnectivityGatedGateway, EditorForm, EventLog, HttpGateway,
    MissingGateway, ReconciliationEngine, RemoteOperationGateway,
};
use shared::domain::{EndpointConfiguration, EndpointName};
use tokio::sync::Mutex;
use tracing::{info, warn};

#[derive(Parser, Debug)]
#[command(about = "View and edit subscription and alarm settings for a vehicle data endpoint")]
struct Args {
    #[arg(long)]
    endpoint: String,
    /// Overrides the configured device URL.
    #[arg(long)]
    device_url: Option<String>,
    /// JSON snapshot of the endpoint's cached configuration, rewritten after the edit.
    #[arg(long)]
    state: Option<PathBuf>,
    #[arg(long, conflicts_with = "unsubscribe")]
    subscribe: bool,
    #[arg(long)]
    unsubscribe: bool,
    #[arg(long)]
    interval: Option<String>,
    /// Tick the alarm box: creates an alarm, or removes the existing one.
    #[arg(long, conflicts_with = "keep_alarm")]
    alarm: bool,
    /// Untick the alarm box, which opens ticked when an alarm exists.
    #[arg(long)]
    keep_alarm: bool,
    #[arg(long)]
    alarm_kind: Option<String>,
    #[arg(long)]
    threshold: Option<String>,
    /// Print the planned operations without contacting the device.
    #[arg(long)]
    dry_run: bool,
}

fn load_snapshot(path: Option<&Path>, endpoint: &str) -> Result<EndpointConfiguration> {
    let Some(path) = path.filter(|p| p.exists()) else {
        return Ok(EndpointConfiguration::new(EndpointName::new(endpoint)));
    };

    let raw = fs::read_to_string(path)
        .with_context(|| format!("failed to read state file {}", path.display()))?;
    let config: EndpointConfiguration = serde_json::from_str(&raw)
        .with_context(|| format!("malformed state file {}", path.display()))?;
    if config.endpoint().as_str() != endpoint {
        bail!(
            "state file {} belongs to endpoint {}, not {endpoint}",
            path.display(),
            config.endpoint()
        );
    }
    Ok(config)
}

fn apply_edits(form: &mut EditorForm, args: &Args) {
    if args.subscribe {
        form.subscribe_checked = true;
    }
    if args.unsubscribe {
        form.subscribe_checked = false;
    }
    if let Some(interval) = &args.interval {
        form.interval_text = interval.clone();
    }
    if args.alarm {
        form.alarm_checked = true;
    }
    if args.keep_alarm {
        form.alarm_checked = false;
    }
    if let Some(kind) = &args.alarm_kind {
        form.alarm_kind = Some(kind.clone());
    }
    if let Some(threshold) = &args.threshold {
        form.threshold_text = threshold.clone();
    }
}

fn build_gateway(settings: &Settings) -> Arc<dyn RemoteOperationGateway> {
    let device_url = settings.device_url.trim();
    let inner: Arc<dyn RemoteOperationGateway> = if device_url.is_empty() {
        warn!("no device_url configured; remote calls will fail");
        Arc::new(MissingGateway)
    } else {
        Arc::new(HttpGateway::new(device_url))
    };
    Arc::new(ConnectivityGatedGateway::new(inner, Arc::new(settings.probe())))
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt().with_env_filter("info").init();
    let args = Args::parse();

    let mut settings = load_settings();
    if let Some(url) = &args.device_url {
        settings.device_url = url.clone();
    }

    let current = load_snapshot(args.state.as_deref(), &args.endpoint)?;
    let notifier = Arc::new(BroadcastNotifier::new(64));
    let log = Arc::new(EventLog::new());
    let engine = ReconciliationEngine::new(
        build_gateway(&settings),
        Arc::clone(&notifier) as _,
        Arc::clone(&log) as _,
        settings.codec(),
    );

    let mut form = engine.open_editor(&current, &settings.default_interval);
    println!("{}", form.title);
    println!(
        "  subscribed: {} (interval {}s)",
        form.subscribe_checked, form.interval_text
    );
    println!("  {}", form.alarm_summary);
    apply_edits(&mut form, &args);

    if args.dry_run {
        let plan = reconcile::plan(&current, &form, engine.codec())?;
        println!("{}", serde_json::to_string_pretty(&plan.operations)?);
        if let Some(err) = plan.alarm_rejection {
            println!("alarm change skipped: {err}");
        }
        return Ok(());
    }

    let mut notifications = notifier.subscribe();
    let printer = tokio::spawn(async move {
        while let Ok(notification) = notifications.recv().await {
            if notification.is_error {
                eprintln!("! {}", notification.message);
            } else {
                println!("* {}", notification.message);
            }
        }
    });

    let config = Arc::new(Mutex::new(current));
    let settled = match engine.submit(&config, &form).await {
        Ok(submission) => Ok(submission.outcomes().await),
        Err(err) => Err(err),
    };
    // Closing the notifier ends the printer once it has drained.
    drop(engine);
    drop(notifier);
    let _ = printer.await;
    let outcomes = settled?;
    info!(
        issued = outcomes.len(),
        applied = outcomes.iter().filter(|o| o.is_applied()).count(),
        "editor: operations settled"
    );

    for entry in log.entries() {
        println!(
            "{} {:?} {}",
            entry.timestamp.to_rfc3339(),
            entry.level,
            entry.message
        );
    }

    let snapshot = serde_json::to_string_pretty(&*config.lock().await)?;
    match &args.state {
        Some(path) => fs::write(path, snapshot)
            .with_context(|| format!("failed to write state file {}", path.display()))?,
        None => println!("{snapshot}"),
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use client_core::AlarmTypeCodec;
    use shared::domain::AlarmKind;

    fn args(extra: &[&str]) -> Args {
        let mut argv = vec!["endpoint_cli", "--endpoint", "EngineSpeed"];
        argv.extend_from_slice(extra);
        Args::parse_from(argv)
    }

    #[test]
    fn flags_edit_the_opened_form() {
        let mut cfg = EndpointConfiguration::new(EndpointName::new("EngineSpeed"));
        cfg.mark_alarm_created(AlarmKind::Above, 5.0);
        let codec = AlarmTypeCodec::default();
        let mut form = EditorForm::open(&cfg, "10", &codec);
        assert!(form.alarm_checked);

        apply_edits(
            &mut form,
            &args(&["--subscribe", "--interval", "30", "--keep-alarm"]),
        );
        assert!(form.subscribe_checked);
        assert_eq!(form.interval_text, "30");
        assert!(!form.alarm_checked);

        let plan = reconcile::plan(&cfg, &form, &codec).expect("plan");
        assert_eq!(plan.operations.len(), 1);
    }

    #[tokio::test]
    async fn empty_device_url_falls_back_to_missing_gateway() {
        let settings = Settings {
            device_url: "  ".into(),
            platform_model: "sdk".into(),
            ..Settings::default()
        };

        let err = build_gateway(&settings)
            .unsubscribe(&EndpointName::new("EngineSpeed"))
            .await
            .expect_err("must fail");
        assert_eq!(
            err.to_string(),
            "device gateway unavailable for endpoint EngineSpeed"
        );
    }

    #[test]
    fn missing_state_file_starts_fresh() {
        let cfg = load_snapshot(Some(Path::new("/nonexistent/state.json")), "FuelLevel")
            .expect("fresh config");
        assert_eq!(cfg, EndpointConfiguration::new(EndpointName::new("FuelLevel")));
    }

    #[test]
    fn state_file_for_other_endpoint_is_rejected() {
        let path = std::env::temp_dir().join(format!(
            "endpoint_cli_state_{}.json",
            std::process::id()
        ));
        let cfg = EndpointConfiguration::new(EndpointName::new("VehicleSpeed"));
        fs::write(&path, serde_json::to_string(&cfg).expect("json")).expect("write");

        let err = load_snapshot(Some(&path), "EngineSpeed").expect_err("must reject");
        assert!(err.to_string().contains("VehicleSpeed"), "unexpected: {err}");

        fs::remove_file(&path).expect("cleanup");
    }
}
