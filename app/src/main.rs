mod demo;

use anyhow::Context as _;
use clap::Parser;
use demo::DemoPhrase;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tenor_core::{AppCore, AppPorts, Command, Event};
use tenor_infra_audio_cpal::CpalAudioOutputPort;
use tenor_infra_midi_midir::MidirMidiInputPort;
use tenor_infra_scene_static::SceneLoad;
use tenor_infra_storage_fs::FsStorage;
use tenor_infra_synth_fm::FmSaxSynth;
use tenor_ports::audio::AudioOutputPort;
use tenor_ports::midi::MidiInputPort;
use tenor_ports::storage::{SettingsDto, StoragePort};
use tenor_ports::types::Volume01;

const FRAME: Duration = Duration::from_millis(16);
const DEMO_TAIL: Duration = Duration::from_millis(500);

/// Tenor saxophone driven by MIDI input, with fingering highlights.
#[derive(Parser, Debug)]
#[command(name = "tenor-key", version)]
struct Args {
    /// JSON scene description; the built-in key layout is used otherwise.
    #[arg(long)]
    scene: Option<PathBuf>,

    /// Print MIDI inputs and audio outputs, then exit.
    #[arg(long)]
    list_devices: bool,

    /// Write diagnostics into this directory before exiting.
    #[arg(long, value_name = "DIR")]
    export_diagnostics: Option<PathBuf>,

    /// Play a short scripted phrase.
    #[arg(long)]
    demo: bool,

    /// Stop after this many frames.
    #[arg(long)]
    frames: Option<u64>,

    /// Master volume in [0, 1].
    #[arg(long)]
    volume: Option<f32>,

    /// Print core events as JSON lines on stdout.
    #[arg(long)]
    print_events: bool,
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    let storage: Option<Box<dyn StoragePort>> = match FsStorage::default_base_dir() {
        Ok(dir) => Some(Box::new(FsStorage::new(dir))),
        Err(err) => {
            log::warn!("settings will not persist: {err}");
            None
        }
    };
    let settings = storage
        .as_ref()
        .and_then(|storage| storage.load_settings().ok())
        .unwrap_or_default();

    let audio_port = Arc::new(CpalAudioOutputPort::new());
    let midi_port = Arc::new(
        MidirMidiInputPort::new(settings.midi_client_name.clone())
            .with_poll_interval(Duration::from_millis(settings.device_poll_interval_ms)),
    );

    if args.list_devices {
        return list_devices(audio_port.as_ref(), midi_port.as_ref());
    }

    let synth = Arc::new(FmSaxSynth::new(settings.sample_rate_hz));
    let mut app = AppCore::new(AppPorts {
        audio: audio_port,
        midi: midi_port,
        synth,
        storage,
    });

    if let Some(volume) = args.volume {
        app.handle_command(Command::SetMasterVolume {
            volume: Volume01::new(volume),
        })?;
    }

    if !app.init_midi() {
        log::info!("no MIDI input; pointer and demo input only");
    }

    let scene_path = args.scene.clone().or_else(|| scene_from(&settings));
    let mut scene_load = Some(SceneLoad::spawn(scene_path));

    let mut demo = args.demo.then(DemoPhrase::new);
    if demo.is_some() && !app.init_audio() {
        log::warn!("demo runs without sound");
    }

    let started = Instant::now();
    let mut last_frame = started;
    let mut frame: u64 = 0;
    let mut demo_done: Option<Instant> = None;

    loop {
        let now = Instant::now();
        let dt = now.duration_since(last_frame).as_secs_f64();
        last_frame = now;

        if let Some(result) = scene_load.as_mut().and_then(|load| load.try_finish()) {
            scene_load = None;
            match result {
                Ok(scene) => app.attach_scene(Arc::new(scene)),
                Err(err) => app.scene_failed(&err),
            }
        }

        if let Some(phrase) = demo.as_mut() {
            for command in phrase.step(started.elapsed().as_secs_f64()) {
                app.handle_command(command)?;
            }
        }

        app.tick(dt);
        report(app.drain_events(), args.print_events)?;

        frame += 1;
        if args.frames.is_some_and(|limit| frame >= limit) {
            break;
        }
        let demo_finished = demo.as_ref().is_some_and(|phrase| phrase.is_finished());
        if args.frames.is_none() && demo_finished {
            // let the last release ring out
            let done = *demo_done.get_or_insert_with(Instant::now);
            if done.elapsed() >= DEMO_TAIL {
                break;
            }
        }

        let spent = now.elapsed();
        if spent < FRAME {
            std::thread::sleep(FRAME - spent);
        }
    }

    if let Some(dir) = args.export_diagnostics {
        app.handle_command(Command::ExportDiagnostics {
            path: dir.to_string_lossy().into_owned(),
        })
        .with_context(|| format!("exporting diagnostics to {}", dir.display()))?;
    }

    app.shutdown();
    report(app.drain_events(), args.print_events)?;
    Ok(())
}

fn scene_from(settings: &SettingsDto) -> Option<PathBuf> {
    settings.scene_path.as_ref().map(PathBuf::from)
}

fn list_devices(audio: &dyn AudioOutputPort, midi: &dyn MidiInputPort) -> anyhow::Result<()> {
    match midi.list_inputs() {
        Ok(inputs) if inputs.is_empty() => println!("MIDI inputs: none"),
        Ok(inputs) => {
            println!("MIDI inputs:");
            for input in inputs {
                println!(
                    "  {} ({})",
                    input.name,
                    input.manufacturer.as_deref().unwrap_or("unknown")
                );
            }
        }
        Err(err) => println!("MIDI inputs unavailable: {err}"),
    }

    let outputs = audio.list_outputs().context("listing audio outputs")?;
    println!("Audio outputs:");
    for output in outputs {
        println!(
            "  {} [{}] {} Hz",
            output.name, output.id, output.default_config.sample_rate_hz
        );
    }
    Ok(())
}

fn report(events: Vec<Event>, print: bool) -> anyhow::Result<()> {
    for event in events {
        if print {
            println!("{}", serde_json::to_string(&event)?);
        } else {
            log::debug!("{event:?}");
        }
    }
    Ok(())
}
