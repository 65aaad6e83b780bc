use super::config::load_config;
use crate::output::Output;
use chrono::{DateTime, FixedOffset, Local};
use color_eyre::eyre::{eyre, WrapErr};
use color_eyre::Result;
use live_select_config::{default_scheduler_config, SchedulerConfig};
use live_select_core::{run_once, HandoffCollector, RunSettings};
use live_select_sources::{create_supplier, SnapshotSupplier};
use std::path::Path;
use std::sync::Arc;
use tokio::sync::Mutex;
use tokio_cron_scheduler::{Job, JobScheduler};
use tracing::{error, info, warn};

/// One selection run at a time against the configured history file.
struct SelectionRunner {
    settings: RunSettings,
    supplier: Box<dyn SnapshotSupplier>,
    busy: Mutex<()>,
}

impl SelectionRunner {
    async fn run(&self, trigger: &'static str) {
        // A tick that lands while the previous run is still going is skipped, not queued
        let Ok(_running) = self.busy.try_lock() else {
            warn!(
                operation = "scheduled_run_skipped",
                trigger,
                "Previous selection run still in progress, skipping this tick"
            );
            return;
        };

        info!(operation = "scheduled_run_start", trigger, "Starting selection run");
        let mut collector = HandoffCollector::new(false);
        let now: DateTime<FixedOffset> = Local::now().into();
        match run_once(&self.settings, self.supplier.as_ref(), &mut collector, now).await {
            Ok(outcome) => {
                info!(
                    operation = "scheduled_run_complete",
                    trigger,
                    candidates = outcome.candidates.len(),
                    visited = outcome.visited,
                    duration_ms = outcome.duration.as_millis() as u64,
                    "Selection run completed successfully"
                );
            }
            Err(e) => {
                error!(
                    operation = "scheduled_run_error",
                    trigger,
                    error = %e,
                    "Selection run failed"
                );
            }
        }
    }
}

pub struct Scheduler {
    scheduler: JobScheduler,
    runner: Arc<SelectionRunner>,
    config: SchedulerConfig,
}

impl Scheduler {
    async fn new(runner: SelectionRunner, config: SchedulerConfig) -> Result<Self> {
        let scheduler = JobScheduler::new()
            .await
            .map_err(|e| eyre!("Failed to create job scheduler: {}", e))?;

        Ok(Self {
            scheduler,
            runner: Arc::new(runner),
            config,
        })
    }

    /// Run until Ctrl-C.
    async fn start(&mut self) -> Result<()> {
        if self.config.run_on_startup {
            info!(operation = "scheduler_startup", "Running initial selection on startup");
            self.runner.run("startup").await;
        }

        let runner = self.runner.clone();
        let job = Job::new_async(self.config.schedule.as_str(), move |_uuid, _scheduler| {
            let runner = runner.clone();
            Box::pin(async move {
                runner.run("schedule").await;
            })
        })
        .map_err(|e| eyre!("Invalid cron schedule '{}': {}", self.config.schedule, e))?;

        self.scheduler
            .add(job)
            .await
            .map_err(|e| eyre!("Failed to add scheduled job: {}", e))?;
        self.scheduler
            .start()
            .await
            .map_err(|e| eyre!("Failed to start scheduler: {}", e))?;
        info!(
            operation = "scheduler_started",
            schedule = %self.config.schedule,
            "Scheduler started successfully"
        );

        tokio::signal::ctrl_c().await?;
        info!(operation = "scheduler_shutdown", "Interrupt received, stopping scheduler");
        self.scheduler
            .shutdown()
            .await
            .map_err(|e| eyre!("Failed to stop scheduler: {}", e))?;
        Ok(())
    }
}

pub async fn run_daemon(
    config_path: &Path,
    schedule_override: Option<String>,
    no_startup_run: bool,
    output: &Output,
) -> Result<()> {
    let config = load_config(config_path)?;
    config.validate().wrap_err("Invalid configuration")?;

    let scheduler_config = config.scheduler.clone().unwrap_or_else(default_scheduler_config);
    let scheduler_config = SchedulerConfig {
        schedule: schedule_override.unwrap_or(scheduler_config.schedule),
        run_on_startup: scheduler_config.run_on_startup && !no_startup_run,
    };

    let supplier = create_supplier(&config, None).wrap_err("Failed to create snapshot supplier")?;
    let runner = SelectionRunner {
        settings: RunSettings::from_config(&config),
        supplier,
        busy: Mutex::new(()),
    };

    output.info(format!(
        "Daemon running for category {} on schedule '{}' (Ctrl-C to stop)",
        config.category, scheduler_config.schedule
    ));

    let mut scheduler = Scheduler::new(runner, scheduler_config)
        .await
        .wrap_err("Failed to create scheduler")?;
    scheduler.start().await.wrap_err("Scheduler stopped with an error")?;

    output.success("Daemon stopped");
    Ok(())
}
