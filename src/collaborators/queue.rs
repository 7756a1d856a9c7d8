//! Single-owner call queue for recognizers that are not safe to call
//! concurrently.
//!
//! One dedicated thread owns the model; workers submit requests over a
//! channel and block on a per-request reply channel.

use std::thread::JoinHandle;

use crossbeam_channel::{bounded, unbounded, Sender};
use tracing::debug;

use super::{CollaboratorError, CollaboratorResult, EntityMention, EntityRecognizer};

type Reply = CollaboratorResult<Vec<EntityMention>>;

struct Job {
    text: String,
    reply: Sender<Reply>,
}

/// Serializes every `recognize` call onto one owner thread.
pub struct QueuedRecognizer {
    name: String,
    jobs: Option<Sender<Job>>,
    owner: Option<JoinHandle<()>>,
}

impl QueuedRecognizer {
    /// Moves `recognize` onto a dedicated owner thread.
    ///
    /// The closure only needs to be `Send`, so models with interior state
    /// that is not `Sync` can be used.
    pub fn spawn<F>(name: impl Into<String>, mut recognize: F) -> Self
    where
        F: FnMut(&str) -> Reply + Send + 'static,
    {
        let name = name.into();
        let (tx, rx) = unbounded::<Job>();
        let thread_name = format!("{}-owner", name);
        let owner = std::thread::Builder::new()
            .name(thread_name)
            .spawn(move || {
                for job in rx {
                    let result = recognize(&job.text);
                    // The caller may have gone away; nothing to do then.
                    let _ = job.reply.send(result);
                }
                debug!("recognizer owner thread exiting");
            })
            .ok();

        Self {
            name,
            jobs: owner.as_ref().map(|_| tx),
            owner,
        }
    }

    /// Wraps an existing recognizer so its calls never overlap.
    pub fn wrap<R: EntityRecognizer + 'static>(inner: R) -> Self {
        let name = format!("queued-{}", inner.name());
        Self::spawn(name, move |text| inner.recognize(text))
    }

    fn unavailable() -> CollaboratorError {
        CollaboratorError::Unavailable {
            collaborator: "entity-recognizer",
        }
    }
}

impl EntityRecognizer for QueuedRecognizer {
    fn recognize(&self, text: &str) -> Reply {
        let jobs = self.jobs.as_ref().ok_or_else(Self::unavailable)?;
        let (reply_tx, reply_rx) = bounded(1);
        jobs.send(Job {
            text: text.to_string(),
            reply: reply_tx,
        })
        .map_err(|_| Self::unavailable())?;
        reply_rx.recv().map_err(|_| Self::unavailable())?
    }

    fn name(&self) -> &str {
        &self.name
    }
}

impl Drop for QueuedRecognizer {
    fn drop(&mut self) {
        // Closing the channel ends the owner loop.
        self.jobs.take();
        if let Some(owner) = self.owner.take() {
            let _ = owner.join();
        }
    }
}
