//! NES emulator entry point.
//!
//! Loads a cartridge and runs whole frames against a display window.
//! Usage: vireo <path/to/game.nes> [--pal] [--scale N]

use std::env;
use std::process;
use std::time::{Duration, Instant};

use ansi_term::Colour::Red;
use minifb::{Key, Scale, Window, WindowOptions};
use vireo::nes::Nes;
use vireo::ppu::ppu::{HEIGHT, Region, WIDTH};

/// NTSC runs at ~60.0988 Hz, PAL at ~50.007 Hz.
fn frame_duration(region: Region) -> Duration {
    match region {
        Region::Ntsc => Duration::from_nanos(16_639_267),
        Region::Pal => Duration::from_nanos(19_997_200),
    }
}

fn window_scale(n: &str) -> Option<Scale> {
    match n {
        "1" => Some(Scale::X1),
        "2" => Some(Scale::X2),
        "4" => Some(Scale::X4),
        "8" => Some(Scale::X8),
        _ => None,
    }
}

fn main() {
    let mut region = Region::Ntsc;
    let mut scale = Scale::X2;
    let mut path = None;
    let mut args = env::args().skip(1);
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--pal" => region = Region::Pal,
            "--ntsc" => region = Region::Ntsc,
            "--scale" => {
                scale = args.next().as_deref().and_then(window_scale).unwrap_or_else(|| {
                    eprintln!("{} --scale takes 1, 2, 4 or 8", Red.bold().paint("ERROR"));
                    process::exit(2);
                });
            }
            _ => path = Some(arg),
        }
    }
    let Some(path) = path else {
        eprintln!(
            "{} usage: vireo <rom.nes> [--pal] [--scale N]",
            Red.bold().paint("ERROR")
        );
        process::exit(2);
    };

    let mut nes = match Nes::load(&path, region) {
        Ok(nes) => nes,
        Err(err) => {
            eprintln!("{} {path}: {err}", Red.bold().paint("ERROR"));
            process::exit(1);
        }
    };

    let mut window = Window::new(
        "Vireo",
        WIDTH,
        HEIGHT,
        WindowOptions {
            resize: true,
            scale,
            scale_mode: minifb::ScaleMode::AspectRatioStretch,
            ..WindowOptions::default()
        },
    )
    .expect("Failed to create window");

    let frame_duration = frame_duration(region);
    let mut framebuffer = vec![0u32; WIDTH * HEIGHT];

    while window.is_open() && !window.is_key_down(Key::Escape) {
        let frame_start = Instant::now();

        nes.run_frame();
        nes.render_rgb(&mut framebuffer);
        window
            .update_with_buffer(&framebuffer, WIDTH, HEIGHT)
            .expect("Failed to update window");

        // Pace to the region's frame rate (emulation is far faster than real NES)
        let elapsed = frame_start.elapsed();
        if elapsed < frame_duration {
            std::thread::sleep(frame_duration - elapsed);
        }
    }
}
