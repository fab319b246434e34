use tokio::sync::mpsc::UnboundedSender;

use super::error::SubmissionError;

/// Progress checkpoints, in the order they are reported.
pub const PROGRESS_HEALTHY: u8 = 20;
pub const PROGRESS_RESPONSE_RECEIVED: u8 = 80;
pub const PROGRESS_DONE: u8 = 100;

/// What a submission reports while it runs. A terminal event is always last.
#[derive(Debug, Clone, PartialEq)]
pub enum SubmissionEvent {
    Progress(u8),
    Succeeded { count: usize },
    Failed(SubmissionError),
}

impl SubmissionEvent {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, SubmissionEvent::Progress(_))
    }
}

/// Receives submission events. Implemented for closures and channel senders.
pub trait SubmissionObserver: Send + Sync {
    fn on_event(&self, event: SubmissionEvent);
}

impl<F> SubmissionObserver for F
where
    F: Fn(SubmissionEvent) + Send + Sync,
{
    fn on_event(&self, event: SubmissionEvent) {
        self(event)
    }
}

impl SubmissionObserver for UnboundedSender<SubmissionEvent> {
    fn on_event(&self, event: SubmissionEvent) {
        // receiver dropped means nobody is listening
        let _ = self.send(event);
    }
}

pub struct NoopObserver;

impl SubmissionObserver for NoopObserver {
    fn on_event(&self, _event: SubmissionEvent) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_closure_observer_receives_events() {
        let seen = std::sync::Mutex::new(Vec::new());
        let observer = |event: SubmissionEvent| seen.lock().unwrap().push(event);
        observer.on_event(SubmissionEvent::Progress(20));
        observer.on_event(SubmissionEvent::Succeeded { count: 2 });
        assert_eq!(
            *seen.lock().unwrap(),
            vec![
                SubmissionEvent::Progress(20),
                SubmissionEvent::Succeeded { count: 2 }
            ]
        );
    }

    #[test]
    fn test_channel_observer_tolerates_closed_receiver() {
        let (tx, rx) = tokio::sync::mpsc::unbounded_channel();
        drop(rx);
        tx.on_event(SubmissionEvent::Progress(80));
    }

    #[test]
    fn test_terminal_events() {
        assert!(!SubmissionEvent::Progress(100).is_terminal());
        assert!(SubmissionEvent::Succeeded { count: 0 }.is_terminal());
        assert!(SubmissionEvent::Failed(SubmissionError::EmptyResponse).is_terminal());
    }
}
