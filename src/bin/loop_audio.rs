// Loop a background track to a target duration and write the result as WAV
//
// Usage: loop_audio <input> <seconds> [output.wav]

use std::path::PathBuf;
use reel_compositor::audio::{loop_to_duration, AudioLoader};

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .init();

    let mut args = std::env::args().skip(1);
    let (Some(input), Some(seconds)) = (args.next(), args.next()) else {
        eprintln!("usage: loop_audio <input> <seconds> [output.wav]");
        std::process::exit(2);
    };
    let seconds: f64 = seconds.parse()?;
    let output = args.next().map(PathBuf::from).unwrap_or_else(|| PathBuf::from("looped.wav"));

    println!("🎵 Looping {} to {:.2}s", input, seconds);

    let audio = AudioLoader::load(&input).await?;
    println!("   Loaded: {:.2}s, {} Hz, {} channels, {} frames",
             audio.duration, audio.sample_rate, audio.channels, audio.frame_count());

    let (looped, plan) = loop_to_duration(&audio, seconds)?;
    println!("   Plan: {} native frames -> {} target frames, {} repeat(s)",
             plan.native_frames, plan.target_frames, plan.repeats);

    looped.write_wav(&output)?;
    println!("   ✅ Wrote {:.3}s to {}", looped.duration, output.display());

    Ok(())
}
