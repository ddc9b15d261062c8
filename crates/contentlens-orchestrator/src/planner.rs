use contentlens_core::Capability;

/// Partition an ordered task plan into batches that may run concurrently.
///
/// Parallel-safe capabilities accumulate into one batch; translate and
/// compliance flush the pending batch and get a singleton batch of their
/// own. An empty plan yields no batches.
pub fn plan(task_plan: &[Capability]) -> Vec<Vec<Capability>> {
    let mut batches = Vec::new();
    let mut pending: Vec<Capability> = Vec::new();

    for &capability in task_plan {
        if capability.is_parallel_safe() {
            pending.push(capability);
        } else {
            if !pending.is_empty() {
                batches.push(std::mem::take(&mut pending));
            }
            batches.push(vec![capability]);
        }
    }

    if !pending.is_empty() {
        batches.push(pending);
    }
    batches
}
