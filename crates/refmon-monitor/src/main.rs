//! Headless reference data monitor
//!
//! Opens the rig's serial links (or simulated boards with `--demo`), prints
//! each new thermistor and infrared frame as a 6x6 grid, and logs samples
//! until interrupted.
//!
//! Usage:
//!   refmon-monitor --config rig.json
//!   refmon-monitor --demo --diagnose
//!   refmon-monitor --config rig.json --heat 2:1:60
//!   refmon-monitor --config rig.json --once

mod args;
mod session;

use anyhow::{bail, Context, Result};
use refmon_core::demo::{RigBoard, SimulatedRig};
use refmon_core::diagnostics::DiagnosticReport;
use refmon_core::prelude::*;
use refmon_core::protocol::{list_ports, CommunicationChannel};
use refmon_core::readings::TemperatureFrame;
use std::time::Duration;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use args::{print_help, HeatRequest, Options};
use session::SessionLog;

/// A full ping cycle takes about two and a half seconds
const DIAGNOSE_WAIT: Duration = Duration::from_secs(5);

/// Grid columns when printing a frame
const GRID_COLUMNS: usize = 6;

struct Links {
    adc: Option<LinkHandle<AdcFrame>>,
    infrared: Option<LinkHandle<InfraredFrame>>,
    heater: Option<HeaterLink>,
}

impl Links {
    fn start(config: &MonitorConfig, demo: bool, faults: &FaultLog) -> Result<Self> {
        let adc_channel = channel_for(config.adc_link.as_ref(), demo, RigBoard::Adc, faults)?;
        let adc = match adc_channel {
            Some(channel) => Some(spawn_link(
                AdcLayout::new(config.conversion),
                channel,
                Some(PollSchedule::new()),
                faults.clone(),
            )?),
            None => None,
        };
        let infrared_channel =
            channel_for(config.infrared_link.as_ref(), demo, RigBoard::Infrared, faults)?;
        let infrared = match infrared_channel {
            Some(channel) => Some(spawn_link(InfraredLayout, channel, None, faults.clone())?),
            None => None,
        };
        let heater = channel_for(config.heater_link.as_ref(), demo, RigBoard::Heater, faults)?
            .map(|channel| HeaterLink::new(channel, faults.clone()));

        if adc.is_none() && infrared.is_none() {
            bail!("no sensor links configured (use --config or --demo)");
        }
        Ok(Self {
            adc,
            infrared,
            heater,
        })
    }

    fn apply_heat(&mut self, requests: &[HeatRequest]) -> Result<()> {
        if requests.is_empty() {
            return Ok(());
        }
        let Some(heater) = self.heater.as_mut() else {
            bail!("no heater link configured");
        };
        let mut bank = HeaterBank::new();
        for request in requests {
            if let Some(cmd) = bank.confirm(request.tray, request.heater, request.percent)? {
                heater.send(cmd)?;
                info!(
                    "tray {} heater {} set to {}%",
                    request.tray, request.heater, request.percent
                );
            }
        }
        Ok(())
    }

    fn shutdown(&mut self) {
        if let Some(link) = self.adc.as_mut() {
            if let Err(e) = link.shutdown() {
                warn!("{}", e);
            }
        }
        if let Some(link) = self.infrared.as_mut() {
            if let Err(e) = link.shutdown() {
                warn!("{}", e);
            }
        }
    }
}

fn channel_for(
    config: Option<&LinkConfig>,
    demo: bool,
    board: RigBoard,
    faults: &FaultLog,
) -> Result<Option<Box<dyn CommunicationChannel>>> {
    let channel: Box<dyn CommunicationChannel> = match (demo, config) {
        (true, _) => Box::new(SimulatedRig::new(board)),
        (false, Some(link)) => open_link(link)
            .with_context(|| format!("failed to open {}", link.port_name))?,
        (false, None) => return Ok(None),
    };
    faults.note(format!("{:?} link on {}", board, channel.name()));
    Ok(Some(channel))
}

fn print_grid(title: &str, sequence: u64, temperatures: &[Option<f64>]) {
    println!("{} frame {}", title, sequence);
    for row in temperatures.chunks(GRID_COLUMNS) {
        let cells: Vec<String> = row
            .iter()
            .map(|t| match t {
                Some(v) => format!("{:7.2}", v),
                None => format!("{:>7}", "--"),
            })
            .collect();
        println!("  {}", cells.join(" "));
    }
}

fn print_report(name: &str, report: &DiagnosticReport) {
    println!("{} link:", name);
    for (check, outcome) in report.checks() {
        println!("  {:<24} {}", check, outcome.label());
    }
}

fn print_ports() {
    let ports = list_ports();
    if ports.is_empty() {
        println!("No serial ports found");
    }
    for port in ports {
        match (&port.product, port.vid, port.pid) {
            (Some(product), Some(vid), Some(pid)) => {
                println!("{}  {} ({:04x}:{:04x})", port.name, product, vid, pid)
            }
            _ => println!("{}", port.name),
        }
    }
}

async fn diagnose(links: &Links) {
    tokio::time::sleep(DIAGNOSE_WAIT).await;
    if let Some(link) = &links.adc {
        print_report("Thermistor", &run_diagnostics(&link.snapshot()));
    }
    if let Some(link) = &links.infrared {
        print_report("Infrared", &run_diagnostics(&link.snapshot()));
    }
}

async fn monitor(
    links: &Links,
    config: &MonitorConfig,
    session: &mut SessionLog,
    once: bool,
) -> Result<()> {
    let mut ticker =
        tokio::time::interval(Duration::from_millis(config.refresh_interval_ms.max(1)));
    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    let mut adc_seen = 0;
    let mut infrared_seen = 0;
    loop {
        tokio::select! {
            _ = ticker.tick() => {
                let mut sample = None;
                if let Some(link) = &links.adc {
                    let snapshot = link.snapshot();
                    if snapshot.sequence != adc_seen {
                        adc_seen = snapshot.sequence;
                        let temperatures = snapshot.frame.temperatures();
                        print_grid("Thermistor", snapshot.sequence, &temperatures);
                        sample = Some(temperatures);
                    }
                }
                if let Some(link) = &links.infrared {
                    let snapshot = link.snapshot();
                    if snapshot.sequence != infrared_seen {
                        infrared_seen = snapshot.sequence;
                        let temperatures = snapshot.frame.temperatures();
                        print_grid("Infrared", snapshot.sequence, &temperatures);
                        if links.adc.is_none() {
                            sample = Some(temperatures);
                        }
                    }
                }
                if let Some(values) = sample {
                    session.record(values)?;
                    if once {
                        match session.save_latest()? {
                            Some(path) => info!("saved sample to {}", path.display()),
                            None => warn!("no log_dir configured, sample not saved"),
                        }
                        return Ok(());
                    }
                }
            }
            result = &mut ctrl_c => {
                result.context("failed to listen for Ctrl-C")?;
                info!("interrupted, stopping links");
                return Ok(());
            }
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let options = Options::parse(std::env::args().skip(1))?;
    if options.help {
        print_help();
        return Ok(());
    }
    if options.list_ports {
        print_ports();
        return Ok(());
    }

    let config = match &options.config {
        Some(path) => MonitorConfig::load(path)
            .with_context(|| format!("failed to load {}", path.display()))?,
        None => MonitorConfig::default(),
    };

    let faults = FaultLog::with_session_start();
    let mut links = Links::start(&config, options.demo, &faults)?;
    links.apply_heat(&options.heat)?;

    let mut session = SessionLog::new(config.log_dir.as_deref(), config.record_continuously)?;
    let outcome = if options.diagnose {
        diagnose(&links).await;
        Ok(())
    } else {
        monitor(&links, &config, &mut session, options.once).await
    };

    links.shutdown();
    faults.note("monitor session ended");

    let samples = session.samples();
    for path in session.finish(&faults)? {
        info!("wrote {}", path.display());
    }

    let recorded = faults.faults();
    println!("{} samples logged, {} faults recorded", samples, recorded.len());
    for record in recorded.iter().rev().take(10).rev() {
        println!(
            "  {} [{}] {}",
            record.timestamp.format("%H:%M:%S%.3f"),
            record.site,
            record.message
        );
    }

    outcome
}
