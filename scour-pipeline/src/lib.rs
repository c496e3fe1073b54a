pub mod backup;
pub mod executor;
pub mod filter;
pub mod media;
pub mod pipeline;
pub mod source;


pub use backup::BackupLog;
pub use executor::{Throttle, TokioThrottle};
pub use media::MediaArchiver;
pub use pipeline::Cleaner;
