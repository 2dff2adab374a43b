//! Render a few seconds of an effect offscreen and report frame statistics.
//!
//! Usage: `cargo run --example headless -- [effect] [config json]`,
//! e.g. `cargo run --example headless -- cosmic '{"starCount": 1500}'`.

use backdrop::{rand::SeedableRng, EffectKind, EffectRng, HeadlessSurface, Player};
use std::time::Duration;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let mut args = std::env::args().skip(1);
    let kind: EffectKind = match args.next() {
        Some(name) => name.parse()?,
        None => EffectKind::Fractal,
    };
    let config = args.next();

    let mut engine = kind.create(config.as_deref())?;
    let surface = HeadlessSurface::new(640.0, 360.0, 2.0).keeping_frames();
    engine.init(surface, EffectRng::from_entropy())?;
    engine.set_mouse_interaction(true)?;
    engine.set_mouse_position(480.0, 120.0)?;

    let mut player = Player::new(engine);
    player.start()?;
    let stats = player.run_for(Duration::from_secs(2))?;

    // halve the frame rate and shrink the surface midway
    let engine = player.engine_mut();
    engine.update_config_json(r#"{"fps": 30}"#)?;
    if let Some(surface) = engine.surface_mut() {
        surface.set_size(320.0, 180.0);
    }
    engine.resize()?;
    let slow = player.run_for(Duration::from_secs(2))?;

    let engine = player.engine();
    println!("{kind}: {stats:?} at 60 fps, {slow:?} at 30 fps");
    if let Some(frame) = engine.surface().and_then(|s| s.last_frame()) {
        let lit = frame.pixels().iter().filter(|p| p[..3] != [0, 0, 0]).count();
        println!(
            "last frame {}x{}, {lit} non-black pixels",
            frame.width(),
            frame.height()
        );
    }
    println!("config: {}", engine.config_json()?);
    Ok(())
}
