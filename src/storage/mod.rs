//!  Storage is organized through [task_storage::TaskStorageImpl].
//!  The basic idea is:
//!   - There is a data directory with a single `tasks.jsonl` file.
//!   - Every line is one task record, see [entities::TaskEntity].
//!   - Reading never fails because of one bad record, writing never produces one.

pub mod entities;
pub mod task_storage;
