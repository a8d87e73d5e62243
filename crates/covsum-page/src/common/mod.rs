mod task;

pub use task::{JobId, JobSeq, RequestId, RequestSeq};
