//! `haptic-sim`: drive the bridge with a simulated stylus and log what it
//! reports.
//!
//! Usage: `haptic-sim [options.toml | preset] [seconds]`
//!
//! A bare preset name is looked up in `$HAPTIC_SIM_PRESETS`, or `presets/`
//! when that is unset.

use std::f64::consts::TAU;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use glam::DVec3;
use haptic_bridge::device::sim::SimulatedDevice;
use haptic_bridge::device::ThreadScheduler;
use haptic_bridge::input::ButtonMask;
use haptic_bridge::molecule::AtomRecord;
use haptic_bridge::observer::HapticObserver;
use haptic_bridge::options::Options;
use haptic_bridge::{BridgeError, HapticBridge};
use web_time::{Duration, Instant};

/// Logs every event it receives.
struct LoggingObserver;

impl HapticObserver for LoggingObserver {
    fn on_move(&self, position: DVec3, azimuth: f64, elevation: f64, zoom: f64) {
        log::debug!(
            "move to ({:.2}, {:.2}, {:.2}) az {azimuth:+.2} el {elevation:+.2} \
             zoom {zoom:.2}",
            position.x,
            position.y,
            position.z
        );
    }

    fn on_first_button_down(&self) {
        log::info!("primary button down");
    }

    fn on_first_button_up(&self) {
        log::info!("primary button up");
    }

    fn on_second_button_down(&self, atom: Option<usize>) {
        match atom {
            Some(id) => log::info!("secondary button down on atom {id}"),
            None => log::info!("secondary button down in empty space"),
        }
    }

    fn on_second_button_up(&self) {
        log::info!("secondary button up");
    }
}

/// A ring of atoms lying under the simulated sweep.
fn ring_molecule(radius: f64, count: usize) -> Vec<AtomRecord> {
    (0..count)
        .map(|id| {
            let angle = TAU * id as f64 / count as f64;
            AtomRecord::new(
                id,
                DVec3::new(radius * angle.cos(), radius * angle.sin(), 0.0),
                0.8,
            )
        })
        .collect()
}

/// Gradients pointing radially outward, growing with `t`.
fn radial_gradients(atoms: &[AtomRecord], t: f64) -> Vec<f64> {
    let strength = 0.5 + 0.5 * (t * 0.7).sin();
    atoms
        .iter()
        .flat_map(|atom| {
            let g = atom.position.normalize_or_zero() * strength;
            [g.x, g.y, g.z]
        })
        .collect()
}

fn run(options: &Options, seconds: f64) -> Result<(), BridgeError> {
    let sim = &options.simulator;
    let (driver, device) = SimulatedDevice::new(sim.max_continuous_force);

    // One lap every four seconds at the servo rate, with a slow push-pull
    // on z. Primary clicks every second; secondary held in the third
    // quarter of each lap.
    let rate = f64::from(sim.rate_hz.max(1));
    let radius = sim.workspace_radius;
    device.set_script(Some(Box::new(move |frame: u64| {
        let t = frame as f64 / rate;
        let angle = TAU * t / 4.0;
        let position = DVec3::new(
            radius * angle.cos(),
            radius * angle.sin(),
            radius * 0.1 * (TAU * t / 3.0).sin(),
        );
        let mut buttons = ButtonMask::NONE;
        if t.fract() < 0.1 {
            buttons = buttons.with(ButtonMask::PRIMARY);
        }
        if (t / 4.0).fract() >= 0.5 && (t / 4.0).fract() < 0.75 {
            buttons = buttons.with(ButtonMask::SECONDARY);
        }
        (position, buttons)
    })));

    let bridge = Arc::new(HapticBridge::new(
        driver,
        ThreadScheduler::new(sim.rate_hz),
        options,
    )?);
    let atoms = ring_molecule(radius / options.servo.scale_factor, 12);
    bridge.set_molecule(&atoms)?;
    let _ = bridge.register_observer(Arc::new(LoggingObserver));
    bridge.set_gradient_computation_enabled(true);
    bridge.init()?;

    let start = Instant::now();
    let deadline = start + Duration::from_secs_f64(seconds);
    while Instant::now() < deadline && bridge.is_running() {
        let t = start.elapsed().as_secs_f64();
        bridge.set_gradients(&radial_gradients(&atoms, t))?;
        std::thread::sleep(Duration::from_millis(250));
        if let Some(pointer) = bridge.latest_pointer() {
            log::info!(
                "tick {}: pointer ({:.2}, {:.2}, {:.2}), atom {:?}, force {:.3}",
                pointer.tick,
                pointer.position.x,
                pointer.position.y,
                pointer.position.z,
                pointer.selected_atom,
                pointer.force.map_or(0.0, DVec3::length)
            );
        }
    }

    if let Some(fault) = bridge.fault() {
        log::error!("servo loop stopped on fault: {fault}");
    }
    bridge.shutdown();
    log::info!(
        "rendered {} force writes over {} frames",
        device.force_writes(),
        device.frames()
    );
    Ok(())
}

/// Options from a TOML path, or from a named preset.
fn resolve_options(arg: &str) -> Result<Options, BridgeError> {
    let path = Path::new(arg);
    if path.extension().is_some_and(|ext| ext == "toml") {
        return Options::load(path);
    }
    let dir = std::env::var_os("HAPTIC_SIM_PRESETS")
        .map_or_else(|| PathBuf::from("presets"), PathBuf::from);
    Options::load_preset(&dir, arg)
}

fn main() {
    env_logger::init();

    let mut args = std::env::args().skip(1);
    let options = match args.next() {
        Some(arg) => match resolve_options(&arg) {
            Ok(options) => options,
            Err(e) => {
                log::error!("{arg}: {e}");
                std::process::exit(1);
            }
        },
        None => Options::default(),
    };
    let seconds = match args.next().map(|s| s.parse::<f64>()) {
        Some(Ok(s)) if s.is_finite() && s > 0.0 => s,
        None => 3.0,
        Some(_) => {
            log::error!("Usage: haptic-sim [options.toml | preset] [seconds]");
            std::process::exit(1);
        }
    };

    if let Err(e) = run(&options, seconds) {
        log::error!("{e}");
        std::process::exit(1);
    }
}
