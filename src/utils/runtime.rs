use anyhow::Result;

/// The tracker polls from a single task, so one thread is all the CLI needs.
pub fn single_thread_runtime() -> Result<tokio::runtime::Runtime> {
    Ok(tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?)
}
