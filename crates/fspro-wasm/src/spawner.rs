use futures::task::{LocalFutureObj, LocalSpawn, SpawnError};

/// Runs detached tasks on the page's microtask queue
#[derive(Debug, Clone, Copy, Default)]
pub struct BrowserSpawner;

impl LocalSpawn for BrowserSpawner {
    fn spawn_local_obj(&self, future: LocalFutureObj<'static, ()>) -> Result<(), SpawnError> {
        wasm_bindgen_futures::spawn_local(future);
        Ok(())
    }
}
