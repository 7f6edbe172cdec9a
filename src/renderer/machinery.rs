use std::{
    sync::{
        Arc, Condvar, Mutex,
        atomic::{AtomicUsize, Ordering},
    },
    thread::{self, JoinHandle},
    time::Duration,
};

use anyhow::Context as _;
use image::RgbImage;
use rand::{SeedableRng as _, rngs::SmallRng};

use crate::{
    camera::CameraRay,
    renderer::{RenderSettings, worker},
    scene::Scene,
};

/// Starts rendering the scene on a single background thread.
///
/// Returns immediately, the returned handle is used to control the render and
/// to read the frame buffer. `ray_finished_callback` is called from the render thread
/// after every traced ray.
pub fn render<F: Fn(Progress) + Send + 'static>(
    scene: Scene,
    settings: RenderSettings,
    ray_finished_callback: F,
) -> anyhow::Result<RenderProgress> {
    let resolution = scene.camera.get_resolution();
    let mut rng = match settings.shuffle_seed {
        Some(seed) => SmallRng::seed_from_u64(seed),
        None => SmallRng::from_os_rng(),
    };
    let rays = scene.camera.shuffled_rays(&mut rng);

    log::info!(
        "Rendering {}x{} pixels, {} objects, {} lights",
        resolution.x,
        resolution.y,
        scene.objects.len(),
        scene.lights.len()
    );

    let state = Arc::new(RenderState {
        scene,
        rays,
        image: Mutex::new(RgbImage::new(resolution.x, resolution.y)),
        finished_rays: AtomicUsize::new(0),
        control: Mutex::new(Control {
            request: Request::Run,
            status: RenderStatus::Running,
        }),
        control_changed: Condvar::new(),
    });

    let thread = {
        let state = Arc::clone(&state);
        thread::Builder::new()
            .name("render".to_string())
            .spawn(move || worker::run(&state, ray_finished_callback))
            .context("Spawning render thread")?
    };

    Ok(RenderProgress {
        render_state: state,
        thread: Some(thread),
    })
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum RenderStatus {
    Running,
    /// Worker is parked between two rays.
    Paused,
    Completed,
    /// Stopped before the last ray, the frame buffer holds a partial image.
    Cancelled,
}

impl RenderStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, RenderStatus::Completed | RenderStatus::Cancelled)
    }
}

/// Number of traced rays out of the total.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Progress {
    pub finished: usize,
    pub total: usize,
}

impl Progress {
    pub fn percent(&self) -> f32 {
        if self.total == 0 {
            100.0
        } else {
            100.0 * (self.finished as f32) / (self.total as f32)
        }
    }
}

/// Controller side of a running render.
/// Dropping it cancels the render and waits for the worker.
pub struct RenderProgress {
    render_state: Arc<RenderState>,
    thread: Option<JoinHandle<()>>,
}

impl RenderProgress {
    pub fn progress(&self) -> Progress {
        Progress {
            finished: self.render_state.finished_rays(),
            total: self.render_state.rays.len(),
        }
    }

    pub fn progress_percent(&self) -> f32 {
        self.progress().percent()
    }

    pub fn status(&self) -> RenderStatus {
        self.render_state.lock_control().status
    }

    /// Asks the worker to stop at the next ray boundary and blocks until it does
    /// (or until the render ends).
    /// No pixel is written while paused.
    pub fn pause(&self) {
        let state = &self.render_state;
        let mut control = state.lock_control();
        if control.status.is_terminal() || control.request == Request::Cancel {
            return;
        }
        control.request = Request::Pause;

        while control.status == RenderStatus::Running {
            if self.is_finished() {
                // The worker is gone without reporting, nothing left to wait for
                return;
            }
            control = state
                .control_changed
                .wait_timeout(control, Duration::from_millis(50))
                .expect("Poisoned lock!")
                .0;
        }
    }

    pub fn resume(&self) {
        let mut control = self.render_state.lock_control();
        if control.request != Request::Pause {
            return;
        }
        control.request = Request::Run;
        if control.status == RenderStatus::Paused {
            control.status = RenderStatus::Running;
        }
        self.render_state.control_changed.notify_all();
    }

    /// Signal the worker to stop.
    /// The ray being traced is still finished, but no new ones will be started.
    /// Does not block.
    pub fn cancel(&self) {
        let mut control = self.render_state.lock_control();
        if control.status.is_terminal() {
            return;
        }
        control.request = Request::Cancel;
        self.render_state.control_changed.notify_all();
    }

    /// Wait for the worker to finish.
    /// Blocks until the render completes or is cancelled.
    pub fn wait(&mut self) -> anyhow::Result<()> {
        if let Some(thread) = self.thread.take() {
            thread
                .join()
                .map_err(|_| anyhow::anyhow!("Render thread panicked"))?;
        }
        Ok(())
    }

    pub fn is_finished(&self) -> bool {
        self.thread
            .as_ref()
            .is_none_or(|thread| thread.is_finished())
    }

    pub fn image(&self) -> &Mutex<RgbImage> {
        &self.render_state.image
    }

    /// Copy of the frame buffer as it is now.
    pub fn snapshot(&self) -> RgbImage {
        self.image().lock().expect("Poisoned lock!").clone()
    }
}

impl Drop for RenderProgress {
    fn drop(&mut self) {
        self.cancel();
        if let Err(e) = self.wait() {
            log::error!("{e:#}");
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum Request {
    Run,
    Pause,
    Cancel,
}

#[derive(Debug)]
struct Control {
    /// What the controller wants
    request: Request,
    /// What the worker is doing
    status: RenderStatus,
}

/// Shared between the controller and the render thread.
pub(super) struct RenderState {
    pub scene: Scene,
    /// Camera rays in the order they get traced
    pub rays: Vec<CameraRay>,

    pub image: Mutex<RgbImage>,
    finished_rays: AtomicUsize,

    control: Mutex<Control>,
    control_changed: Condvar,
}

impl RenderState {
    fn lock_control(&self) -> std::sync::MutexGuard<'_, Control> {
        self.control.lock().expect("Poisoned lock!")
    }

    /// Called by the worker at every ray boundary.
    /// Parks while paused, returns false if the render should stop.
    pub fn checkpoint(&self) -> bool {
        let mut control = self.lock_control();
        loop {
            match control.request {
                Request::Run => {
                    control.status = RenderStatus::Running;
                    return true;
                }
                Request::Cancel => {
                    control.status = RenderStatus::Cancelled;
                    self.control_changed.notify_all();
                    return false;
                }
                Request::Pause => {
                    if control.status != RenderStatus::Paused {
                        log::debug!("Render paused at {} rays", self.finished_rays());
                        control.status = RenderStatus::Paused;
                        self.control_changed.notify_all();
                    }
                    control = self.control_changed.wait(control).expect("Poisoned lock!");
                }
            }
        }
    }

    /// Returns the number of finished rays including this one.
    pub fn mark_ray_finished(&self) -> usize {
        self.finished_rays.fetch_add(1, Ordering::AcqRel) + 1
    }

    pub fn finished_rays(&self) -> usize {
        self.finished_rays.load(Ordering::Acquire)
    }

    pub fn finish(&self) {
        let mut control = self.lock_control();
        control.status = RenderStatus::Completed;
        self.control_changed.notify_all();
    }
}
