use anyhow::Result;

/// Everything in punchclock runs on one thread: ticks, key presses and ledger writes are handled
/// by a single event loop, so they can never interleave.
pub fn single_thread_runtime() -> Result<tokio::runtime::Runtime> {
    Ok(tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?)
}
