//! Background task queue.
//!
//! The scroll core is single-threaded apart from one suspension point:
//! slice placement assembly. [`TaskQueue`] ships a job to a worker
//! thread and delivers its completion back to the main loop when the
//! owner calls [`TaskQueue::poll`]. Completions are drained in
//! submission order, never concurrently with main-loop code.

use crossbeam_channel::{unbounded, Receiver, Sender};
use std::collections::HashMap;
use std::thread::JoinHandle;

type Job = Box<dyn FnOnce() -> Box<dyn std::any::Any + Send> + Send>;
type Completion = Box<dyn FnOnce(Box<dyn std::any::Any + Send>)>;

enum WorkerMessage {
    Run(u64, Job),
    Shutdown,
}

pub struct TaskQueue {
    jobs: Sender<WorkerMessage>,
    done: Receiver<(u64, Box<dyn std::any::Any + Send>)>,
    completions: HashMap<u64, Completion>,
    finished: Vec<(u64, Box<dyn std::any::Any + Send>)>,
    next_id: u64,
    next_to_deliver: u64,
    worker: Option<JoinHandle<()>>,
}

impl Default for TaskQueue {
    fn default() -> Self {
        Self::new()
    }
}

impl TaskQueue {
    pub fn new() -> Self {
        let (job_tx, job_rx) = unbounded::<WorkerMessage>();
        let (done_tx, done_rx) = unbounded();

        let worker = std::thread::Builder::new()
            .name("slipstream-worker".into())
            .spawn(move || {
                while let Ok(msg) = job_rx.recv() {
                    match msg {
                        WorkerMessage::Run(id, job) => {
                            let result = job();
                            if done_tx.send((id, result)).is_err() {
                                break;
                            }
                        }
                        WorkerMessage::Shutdown => break,
                    }
                }
            })
            .expect("failed to spawn worker thread");

        Self {
            jobs: job_tx,
            done: done_rx,
            completions: HashMap::new(),
            finished: Vec::new(),
            next_id: 0,
            next_to_deliver: 0,
            worker: Some(worker),
        }
    }

    /// Runs `background` on the worker thread and `complete` on the
    /// main loop during a later [`poll`](Self::poll).
    pub fn perform<T: Send + 'static>(
        &mut self,
        background: impl FnOnce() -> T + Send + 'static,
        complete: impl FnOnce(T) + 'static,
    ) {
        let id = self.next_id;
        self.next_id += 1;

        self.completions.insert(
            id,
            Box::new(move |boxed| {
                let value = boxed
                    .downcast::<T>()
                    .unwrap_or_else(|_| unreachable!("completion type mismatch"));
                complete(*value);
            }),
        );

        let job: Job = Box::new(move || Box::new(background()));
        if self.jobs.send(WorkerMessage::Run(id, job)).is_err() {
            log::warn!("task queue worker is gone; dropping job {id}");
            self.completions.remove(&id);
        }
    }

    /// Delivers finished completions, in submission order. Returns the
    /// number of completions run.
    pub fn poll(&mut self) -> usize {
        while let Ok(done) = self.done.try_recv() {
            self.finished.push(done);
        }
        self.finished.sort_by_key(|(id, _)| *id);

        let mut delivered = 0;
        while let Some(pos) = self
            .finished
            .iter()
            .position(|(id, _)| *id == self.next_to_deliver)
        {
            let (id, result) = self.finished.remove(pos);
            self.next_to_deliver += 1;
            if let Some(complete) = self.completions.remove(&id) {
                complete(result);
                delivered += 1;
            }
        }
        delivered
    }

    /// Whether any job is still in flight or undelivered.
    pub fn is_idle(&self) -> bool {
        self.completions.is_empty()
    }
}

impl Drop for TaskQueue {
    fn drop(&mut self) {
        let _ = self.jobs.send(WorkerMessage::Shutdown);
        if let Some(worker) = self.worker.take() {
            let _ = worker.join();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;
    use std::time::Duration;

    fn pump(queue: &mut TaskQueue) {
        let deadline = std::time::Instant::now() + Duration::from_secs(5);
        while !queue.is_idle() {
            queue.poll();
            assert!(std::time::Instant::now() < deadline, "worker stalled");
            std::thread::sleep(Duration::from_millis(1));
        }
    }

    #[test]
    fn completion_runs_on_poll() {
        let mut queue = TaskQueue::new();
        let out = Rc::new(RefCell::new(0));
        let out2 = out.clone();
        queue.perform(|| 21 * 2, move |v| *out2.borrow_mut() = v);
        pump(&mut queue);
        assert_eq!(*out.borrow(), 42);
    }

    #[test]
    fn completions_preserve_submission_order() {
        let mut queue = TaskQueue::new();
        let order = Rc::new(RefCell::new(Vec::new()));
        for i in 0..8 {
            let order = order.clone();
            queue.perform(
                move || {
                    // Later jobs finish no earlier than older ones on a
                    // single worker, but ordering must hold regardless.
                    i
                },
                move |v| order.borrow_mut().push(v),
            );
        }
        pump(&mut queue);
        assert_eq!(*order.borrow(), (0..8).collect::<Vec<_>>());
    }

    #[test]
    fn idle_after_drain() {
        let mut queue = TaskQueue::new();
        queue.perform(|| (), |_| {});
        pump(&mut queue);
        assert!(queue.is_idle());
    }
}
