use std::{
    fs,
    io::{self, BufRead as _, Write as _},
    path::{Path, PathBuf},
    sync::mpsc::{self, Receiver, RecvTimeoutError, Sender},
    thread,
    time::Duration,
};

use anyhow::{Context as _, bail};
use clap::Parser;
use image::RgbImage;
use indicatif::{ProgressBar, ProgressStyle};
use phongtrace::{
    RenderProgress, RenderSettings, RenderStatus, render, scene::loading::load_scene,
};

#[derive(Parser, Debug)]
#[command(about = "Ray traces a scene file with Phong shading and hard shadows")]
struct CliArguments {
    /// Scene file to render, picked from the scenes directory if not given
    scene: Option<PathBuf>,

    #[arg(long, default_value = "scenes")]
    scenes_dir: PathBuf,

    /// Directory that model file names in scenes are relative to
    #[arg(long, default_value = "models")]
    models_dir: PathBuf,

    /// Output PNG, `<renders-dir>/<scene name>.png` by default
    #[arg(short, long)]
    output: Option<PathBuf>,

    #[arg(long, default_value = "renders")]
    renders_dir: PathBuf,

    /// Seed of the pixel order, for reproducible partial renders
    #[arg(long)]
    seed: Option<u64>,
}

/// Everything the controller reacts to.
enum Input {
    Line(String),
    Interrupt,
    /// Stdin reached end of file
    Closed,
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = CliArguments::parse();

    let (sender, inputs) = mpsc::channel();
    {
        let sender = sender.clone();
        ctrlc::set_handler(move || {
            let _ = sender.send(Input::Interrupt);
        })
        .context("Setting Ctrl-C handler")?;
    }
    spawn_stdin_reader(sender)?;

    let scene_path = match args.scene {
        Some(path) => path,
        None => select_scene(&args.scenes_dir, &inputs)?,
    };
    let scene = load_scene(&scene_path, &args.models_dir)
        .with_context(|| format!("Loading scene {}", scene_path.display()))?;

    let output = args.output.clone().unwrap_or_else(|| {
        let stem = scene_path.file_stem().unwrap_or(scene_path.as_os_str());
        args.renders_dir.join(format!("{}.png", stem.to_string_lossy()))
    });

    let bar = ProgressBar::new(scene.camera.pixel_count() as u64);
    bar.set_style(ProgressStyle::with_template(
        "{wide_bar} {percent:>3}% [{elapsed_precise} / {eta_precise}]",
    )?);

    let settings = RenderSettings {
        shuffle_seed: args.seed,
    };
    let mut render_progress = render(scene, settings, {
        let bar = bar.clone();
        move |progress| bar.set_position(progress.finished as u64)
    })?;
    bar.println("Ray tracing scene... (press Enter to pause)");

    control(&render_progress, &inputs, &bar, &output)?;

    render_progress.wait()?;
    bar.finish();

    match render_progress.status() {
        RenderStatus::Cancelled => log::warn!(
            "Render cancelled at {:.1} %, saving the partial image",
            render_progress.progress_percent()
        ),
        _ => log::info!("Render done"),
    }
    save_image(&render_progress.snapshot(), &output)?;

    Ok(())
}

/// Reacts to user input until the render finishes or gets cancelled.
fn control(
    render_progress: &RenderProgress,
    inputs: &Receiver<Input>,
    bar: &ProgressBar,
    output: &Path,
) -> anyhow::Result<()> {
    loop {
        match inputs.recv_timeout(Duration::from_millis(100)) {
            Ok(Input::Line(_)) => {
                if !pause_menu(render_progress, inputs, bar, output)? {
                    render_progress.cancel();
                    return Ok(());
                }
            }
            Ok(Input::Interrupt) => {
                render_progress.cancel();
                return Ok(());
            }
            // Nobody to pause us anymore, just let it finish
            Ok(Input::Closed) | Err(RecvTimeoutError::Timeout) => {
                if render_progress.is_finished() {
                    return Ok(());
                }
            }
            Err(RecvTimeoutError::Disconnected) => return Ok(()),
        }
    }
}

/// Returns false if the user wants to quit.
fn pause_menu(
    render_progress: &RenderProgress,
    inputs: &Receiver<Input>,
    bar: &ProgressBar,
    output: &Path,
) -> anyhow::Result<bool> {
    render_progress.pause();
    if render_progress.status() != RenderStatus::Paused {
        return Ok(true);
    }

    bar.println(format!(
        "Paused at {:.1} %. Enter 's' to save a snapshot, 'q' to quit or anything else to continue.",
        render_progress.progress_percent()
    ));

    loop {
        match inputs.recv() {
            Ok(Input::Line(line)) => match line.trim() {
                "s" | "S" => {
                    let path = snapshot_path(output);
                    bar.suspend(|| save_image(&render_progress.snapshot(), &path))?;
                }
                "q" | "Q" => return Ok(false),
                _ => {
                    bar.println("Resuming ray trace...");
                    render_progress.resume();
                    return Ok(true);
                }
            },
            Ok(Input::Interrupt) | Err(_) => return Ok(false),
            Ok(Input::Closed) => {
                render_progress.resume();
                return Ok(true);
            }
        }
    }
}

fn spawn_stdin_reader(sender: Sender<Input>) -> anyhow::Result<()> {
    thread::Builder::new()
        .name("stdin".to_string())
        .spawn(move || {
            for line in io::stdin().lock().lines() {
                let Ok(line) = line else {
                    break;
                };
                if sender.send(Input::Line(line)).is_err() {
                    return;
                }
            }
            let _ = sender.send(Input::Closed);
        })
        .context("Spawning stdin reader")?;
    Ok(())
}

/// Lists the scene files in the directory and asks the user to pick one.
fn select_scene(scenes_dir: &Path, inputs: &Receiver<Input>) -> anyhow::Result<PathBuf> {
    let mut scenes = fs::read_dir(scenes_dir)
        .with_context(|| format!("{} is not a directory", scenes_dir.display()))?
        .filter_map(|entry| entry.ok().map(|entry| entry.path()))
        .filter(|path| path.is_file() && path.extension().is_some_and(|ext| ext == "txt"))
        .collect::<Vec<_>>();
    scenes.sort();

    if scenes.is_empty() {
        bail!("No scene files in {}", scenes_dir.display());
    }

    loop {
        println!("Select a scene file from the options below.");
        for (i, path) in scenes.iter().enumerate() {
            let name = path.file_name().unwrap_or(path.as_os_str());
            println!("[{i}] {}", name.to_string_lossy());
        }
        print!("Your selection: ");
        io::stdout().flush()?;

        let line = match inputs.recv() {
            Ok(Input::Line(line)) => line,
            Ok(Input::Interrupt | Input::Closed) | Err(_) => bail!("No scene selected"),
        };
        if let Some(path) = line.trim().parse::<usize>().ok().and_then(|i| scenes.get(i)) {
            println!("\nScene {} selected.\n", path.display());
            return Ok(path.clone());
        }
    }
}

fn snapshot_path(output: &Path) -> PathBuf {
    let stem = output
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_default();
    output.with_file_name(format!("{stem}_snapshot.png"))
}

fn save_image(image: &RgbImage, path: &Path) -> anyhow::Result<()> {
    if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("Creating directory {}", parent.display()))?;
    }
    image
        .save(path)
        .with_context(|| format!("Saving {}", path.display()))?;
    log::info!("Saved {}", path.display());
    Ok(())
}
