use indicatif::{ProgressBar, ProgressStyle};
use std::sync::Mutex;

/// Hooks the pipeline calls as it moves through its stages.
///
/// Segmentation and encoding never report progress themselves; only the
/// pipeline holds an observer, and it is optional.
#[cfg_attr(test, mockall::automock)]
pub trait ProgressObserver: Send + Sync {
    /// A task begins; `total` is the number of steps when known
    fn on_start(&self, task: &str, total: Option<u64>);

    /// `steps` more steps of the current task are done
    fn on_update(&self, steps: u64);

    /// The current task finished successfully
    fn on_complete(&self, message: &str);

    /// The current task failed
    fn on_fail(&self, message: &str);
}

/// Terminal progress reporting through indicatif
pub struct ConsoleProgress {
    show_progress: bool,
    current: Mutex<Option<ProgressBar>>,
}

impl ConsoleProgress {
    pub fn new(show_progress: bool) -> Self {
        Self {
            show_progress,
            current: Mutex::new(None),
        }
    }

    fn take_current(&self) -> Option<ProgressBar> {
        self.current.lock().ok().and_then(|mut current| current.take())
    }
}

impl ProgressObserver for ConsoleProgress {
    fn on_start(&self, task: &str, total: Option<u64>) {
        match total {
            Some(total) if self.show_progress => {
                let pb = ProgressBar::new(total);
                if let Ok(style) = ProgressStyle::default_bar()
                    .template("{msg} [{bar:40.cyan/blue}] {pos}/{len}")
                {
                    pb.set_style(style.progress_chars("#>-"));
                }
                pb.set_message(task.to_string());

                if let Ok(mut current) = self.current.lock() {
                    if let Some(previous) = current.replace(pb) {
                        previous.finish_and_clear();
                    }
                }
            }
            _ => println!("Starting task: {}", task),
        }
    }

    fn on_update(&self, steps: u64) {
        if !self.show_progress {
            return;
        }
        if let Ok(current) = self.current.lock() {
            if let Some(pb) = current.as_ref() {
                pb.inc(steps);
            }
        }
    }

    fn on_complete(&self, message: &str) {
        if let Some(pb) = self.take_current() {
            pb.finish_and_clear();
        }
        println!("Completed task: {}", message);
    }

    fn on_fail(&self, message: &str) {
        if let Some(pb) = self.take_current() {
            pb.abandon();
        }
        eprintln!("Failed task: {}", message);
    }
}
