use std::future::Future;
use std::sync::{Arc, Mutex};
use tokio::runtime::Runtime;

// The dashboard shell calls into the foundation synchronously (FFI), so the
// foundation owns its runtime. Wrapped in Arc for safe sharing across threads.
static RUNTIME: Mutex<Option<Arc<Runtime>>> = Mutex::new(None);

pub fn async_init() {
    let mut rt_lock = RUNTIME.lock().expect("Failed to lock runtime");
    if rt_lock.is_some() {
        // Already initialized by a previous shell instance
        return;
    }
    let rt = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .thread_name("netmirage")
        .build()
        .expect("Failed to build runtime");
    *rt_lock = Some(Arc::new(rt));
}

fn runtime() -> Arc<Runtime> {
    let rt_lock = RUNTIME.lock().expect("Failed to lock runtime");
    rt_lock.as_ref().expect("Runtime not initialized").clone()
}

pub fn async_exec<R, F>(async_fn: F) -> R
where
    R: 'static,
    F: Future<Output = R> + 'static,
{
    runtime().block_on(async_fn)
}

pub fn async_spawn<F>(async_fn: F) -> tokio::task::JoinHandle<F::Output>
where
    F: Future + Send + 'static,
    F::Output: Send + 'static,
{
    runtime().spawn(async_fn)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_exec_and_spawn() {
        async_init();
        // Double init must be a no-op
        async_init();

        let value = async_exec(async { 21 * 2 });
        assert_eq!(value, 42);

        let handle = async_spawn(async { "done" });
        let joined = async_exec(async move { handle.await.unwrap() });
        assert_eq!(joined, "done");
    }
}
