pub mod rule_files;
pub mod transaction_files;
pub mod xlsx_codec;

pub use rule_files::*;
pub use transaction_files::*;
pub use xlsx_codec::*;
