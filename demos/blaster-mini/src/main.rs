use anyhow::Result;
use clap::Parser;
use log::{debug, info};
use tracing_subscriber::EnvFilter;

use quill_engine::{GameRunner, PoemManifest};

use blaster_mini::autopilot::Autopilot;
use blaster_mini::game::{
    BlasterMini, EVENT_SCORE, EVENT_STANZA_COMPLETE, POEM_JSON, SOUND_SPLAT,
};

/// Headless run of the poem blaster: simulates frames, logs the action.
#[derive(Parser, Debug)]
#[command(name = "blaster-mini", version, about)]
struct Args {
    /// Number of frames to simulate.
    #[arg(long, default_value_t = 3600)]
    frames: u32,
    /// Simulated frames per second.
    #[arg(long, default_value_t = 60.0)]
    fps: f32,
    /// Seed for effect jitter.
    #[arg(long, default_value_t = 42)]
    seed: u64,
    /// Disable the built-in autopilot (the ship just sits there).
    #[arg(long)]
    no_autopilot: bool,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();
    let poem = PoemManifest::from_json(POEM_JSON)?;
    info!(
        "{} by {} ({} stanzas)",
        poem.title,
        poem.author.as_deref().unwrap_or("anonymous"),
        poem.stanzas.len()
    );

    let mut runner = GameRunner::new(BlasterMini::new(poem, args.seed));
    runner.init();
    let mut pilot = Autopilot::new();
    let dt = 1.0 / args.fps;

    for _ in 0..args.frames {
        if !args.no_autopilot {
            for event in pilot.drive(runner.game(), runner.ctx()) {
                runner.push_input(event);
            }
        }
        runner.tick(dt);

        for sound in runner.sounds() {
            if sound.0 == SOUND_SPLAT {
                debug!("splat");
            }
        }
        for event in runner.events() {
            if event.kind == EVENT_SCORE {
                info!("score {} (+{})", event.a, event.b);
            } else if event.kind == EVENT_STANZA_COMPLETE {
                info!("stanza {} cleared", event.a);
            }
        }
    }

    info!(
        "simulated {} frames; final score {}, stanza {}",
        args.frames,
        runner.game().score(),
        runner.game().stanza_number()
    );
    Ok(())
}
