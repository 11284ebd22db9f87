/// Errors returned by the store handle.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Dispatch list store has stopped")]
    Closed,
}
