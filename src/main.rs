use lube_pump::bus::{LogCommandSink, NullPoller};
use lube_pump::config;
use lube_pump::controller::{Controller, run_control_loop};
use std::str::FromStr;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;

fn init_tracing(level: &str) {
    let max_level = tracing::Level::from_str(level).unwrap_or(tracing::Level::INFO);
    let subscriber = tracing_subscriber::fmt()
        .with_target(false)
        .with_max_level(max_level)
        .finish();
    let _ = tracing::subscriber::set_global_default(subscriber);
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = config::load_default()?;
    init_tracing(&config.logging.level);
    tracing::info!(app = %config.app.name, "lube-pump starting");

    let lube = config.lubrication.resolve()?;
    let update_interval = lube.update_interval;
    let debug_mode = lube.debug_mode;

    let stop = Arc::new(AtomicBool::new(false));
    spawn_signal_task(Arc::clone(&stop));

    #[cfg(feature = "hal")]
    {
        let bus = lube_pump::bus::hal::HalBus::new()?;
        let mut controller =
            Controller::new(bus, LogCommandSink, NullPoller, lube, Instant::now())?;
        tracing::info!(
            interval_ms = update_interval.as_millis(),
            "Control loop running against LinuxCNC HAL"
        );
        run_control_loop(&mut controller, update_interval, debug_mode, &stop);
    }

    #[cfg(not(feature = "hal"))]
    {
        tracing::warn!("Built without the `hal` feature - driving a simulated bus");
        let bus = lube_pump::bus::mock::MockBus::new();
        bus.set_machine_on(true);
        bus.set_pressure_ok(true);
        let mut controller = Controller::new(
            bus.clone(),
            LogCommandSink,
            NullPoller,
            lube,
            Instant::now(),
        )?;
        tracing::info!(
            interval_ms = update_interval.as_millis(),
            "Control loop running against the simulated bus"
        );
        run_control_loop(&mut controller, update_interval, debug_mode, &stop);
    }

    tracing::info!("lube-pump stopped");
    Ok(())
}

/// Raise the stop flag on Ctrl-C so the control loop can wind down and
/// force the pump off before the process exits.
fn spawn_signal_task(stop: Arc<AtomicBool>) {
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("Interrupt received, stopping control loop");
            stop.store(true, Ordering::Relaxed);
        }
    });
}
