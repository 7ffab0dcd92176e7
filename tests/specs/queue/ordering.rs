//! Operation queue specs
//!
//! Completions fire once, after dependencies, and exclusive admission never
//! lets two reports of one kind coexist.

use crate::prelude::*;
use courier_engine::{Operation, OperationContext, OperationQueue, Submission};
use std::sync::Mutex;

struct Step {
    label: &'static str,
    log: Arc<Mutex<Vec<String>>>,
}

#[async_trait::async_trait]
impl Operation for Step {
    fn name(&self) -> &str {
        self.label
    }

    async fn execute(&mut self, _ctx: &OperationContext) -> Result<(), OperationError> {
        tokio::task::yield_now().await;
        self.log.lock().unwrap().push(format!("run:{}", self.label));
        Ok(())
    }
}

#[tokio::test]
async fn completion_fires_once_after_dependencies_finish() {
    let log = Arc::new(Mutex::new(Vec::new()));
    let first_queue = OperationQueue::serial("first");
    let second_queue = OperationQueue::serial("second");

    let write = first_queue.enqueue(
        Submission::new(Step {
            label: "write",
            log: log.clone(),
        })
        .on_complete({
            let log = log.clone();
            move |_| log.lock().unwrap().push("done:write".into())
        }),
    );
    let report = second_queue.enqueue(
        Submission::new(Step {
            label: "report",
            log: log.clone(),
        })
        .depends_on(&write)
        .on_complete({
            let log = log.clone();
            move |_| log.lock().unwrap().push("done:report".into())
        }),
    );

    report.wait_finished().await;

    let log = log.lock().unwrap().clone();
    similar_asserts::assert_eq!(log, vec!["run:write", "done:write", "run:report", "done:report"]);
}

#[tokio::test]
async fn repeated_flushes_admit_one_report() {
    let s = Scheduler::started();
    s.events.submit(CustomEvent::new("a"), false).await.unwrap();
    s.transport.hold();

    let admitted: Vec<_> = (0..20).filter_map(|_| s.events.flush()).collect();
    assert_eq!(admitted.len(), 1);

    s.transport.release();
    s.idle().await;
    assert_eq!(s.transport.max_in_flight(), 1);
}
