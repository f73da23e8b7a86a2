use gitviz_core::RefId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Readiness {
    #[default]
    NotReady,
    Ready,
}

/// Structural changes that can arrive before there is a surface to draw on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeferredAction {
    AddRef(RefId),
    RemoveRef(RefId),
}

/// Buffers actions while not ready; `enter_ready` hands them back exactly once.
#[derive(Debug)]
pub struct DeferredQueue<A> {
    state: Readiness,
    pending: Vec<A>,
}

impl<A> Default for DeferredQueue<A> {
    fn default() -> Self {
        Self {
            state: Readiness::NotReady,
            pending: Vec::new(),
        }
    }
}

impl<A> DeferredQueue<A> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_ready(&self) -> bool {
        self.state == Readiness::Ready
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    pub fn contains(&self, action: &A) -> bool
    where
        A: PartialEq,
    {
        self.pending.contains(action)
    }

    /// Queues `action` while not ready; otherwise hands it straight back to run now.
    pub fn submit(&mut self, action: A) -> Option<A> {
        match self.state {
            Readiness::Ready => Some(action),
            Readiness::NotReady => {
                self.pending.push(action);
                None
            }
        }
    }

    /// The NotReady -> Ready transition. The queue is moved out before the
    /// caller runs anything, so work submitted while replaying is kept.
    pub fn enter_ready(&mut self) -> Vec<A> {
        if self.state == Readiness::Ready {
            return Vec::new();
        }
        self.state = Readiness::Ready;
        std::mem::take(&mut self.pending)
    }

    pub fn exit_ready(&mut self) {
        self.state = Readiness::NotReady;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn queues_until_ready_then_replays_in_order() {
        let mut q = DeferredQueue::new();
        assert_eq!(q.submit(1), None);
        assert_eq!(q.submit(2), None);
        assert_eq!(q.submit(3), None);
        assert_eq!(q.len(), 3);

        assert_eq!(q.enter_ready(), vec![1, 2, 3]);
        assert!(q.is_empty());
        assert!(q.is_ready());
    }

    #[test]
    fn ready_queue_hands_actions_back() {
        let mut q = DeferredQueue::new();
        q.enter_ready();
        assert_eq!(q.submit("now"), Some("now"));
        assert!(q.is_empty());
    }

    #[test]
    fn second_enter_drains_nothing() {
        let mut q = DeferredQueue::new();
        q.submit('a');
        assert_eq!(q.enter_ready().len(), 1);
        assert!(q.enter_ready().is_empty());
    }

    #[test]
    fn exit_goes_back_to_buffering() {
        let mut q = DeferredQueue::new();
        q.enter_ready();
        q.exit_ready();
        assert!(!q.is_ready());
        assert_eq!(q.submit(7), None);
        assert_eq!(q.enter_ready(), vec![7]);
    }
}
