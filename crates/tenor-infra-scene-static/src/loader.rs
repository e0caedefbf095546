use crate::{SceneDescription, StaticScene};
use std::path::PathBuf;
use std::sync::mpsc::{self, Receiver, TryRecvError};
use std::thread;
use tenor_ports::scene::SceneError;

/// Builds a scene on a worker thread so the frame loop keeps running meanwhile.
pub struct SceneLoad {
    rx: Option<Receiver<Result<StaticScene, SceneError>>>,
}

impl SceneLoad {
    /// `None` loads the built-in layout.
    pub fn spawn(source: Option<PathBuf>) -> Self {
        let (tx, rx) = mpsc::channel();
        let spawned = thread::Builder::new()
            .name("scene-load".to_string())
            .spawn(move || {
                let result = match source {
                    Some(path) => {
                        log::info!("loading scene from {}", path.display());
                        SceneDescription::from_path(&path)
                            .and_then(|desc| StaticScene::from_description(&desc))
                    }
                    None => StaticScene::builtin(),
                };
                let _ = tx.send(result);
            });

        // the sender went down with the closure, so the receiver reports the failure
        if let Err(err) = spawned {
            log::error!("could not start scene loader: {err}");
        }
        Self { rx: Some(rx) }
    }

    /// Non-blocking. Yields the outcome exactly once.
    pub fn try_finish(&mut self) -> Option<Result<StaticScene, SceneError>> {
        let rx = self.rx.as_ref()?;
        match rx.try_recv() {
            Ok(result) => {
                self.rx = None;
                Some(result)
            }
            Err(TryRecvError::Empty) => None,
            Err(TryRecvError::Disconnected) => {
                self.rx = None;
                Some(Err(SceneError::Load("scene loader exited".to_string())))
            }
        }
    }

    /// Blocks until the worker is done.
    pub fn wait(mut self) -> Result<StaticScene, SceneError> {
        match self.rx.take() {
            Some(rx) => rx
                .recv()
                .unwrap_or_else(|_| Err(SceneError::Load("scene loader exited".to_string()))),
            None => Err(SceneError::Load("scene already taken".to_string())),
        }
    }

    pub fn is_pending(&self) -> bool {
        self.rx.is_some()
    }
}
