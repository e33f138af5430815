pub mod shard_pool;
pub mod shutdown;
pub mod stream_runner;

pub use shard_pool::ShardPool;
pub use shutdown::Shutdown;
pub use stream_runner::StreamRunner;
