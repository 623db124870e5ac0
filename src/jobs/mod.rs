/*!
 * Captioning job lifecycle.
 *
 * - `state`: the status state machine and its persisted codes
 * - `store`: the storage contract the pipeline writes through
 * - `models`: views handed to callers
 * - `manager`: job creation and queries
 */

pub mod manager;
pub mod models;
pub mod state;
pub mod store;

pub use manager::JobManager;
pub use models::{CreatedJob, DownloadInfo, JobStatusView};
pub use state::JobStatus;
pub use store::JobStore;
