mod local;

pub use local::LocalStorage;

use crate::error::Result;
use crate::models::RequestRecord;

/// Trait abstracting where the rolling tracker and the archive live.
pub trait RecordStore {
    fn get(&self) -> Result<Vec<RequestRecord>>;
    fn get_archive(&self) -> Result<Vec<RequestRecord>>;
    fn set(&self, records: &[RequestRecord]) -> Result<()>;
    fn append_archive(&self, record: &RequestRecord) -> Result<()>;
}
