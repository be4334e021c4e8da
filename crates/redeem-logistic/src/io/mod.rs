pub mod delimited;

pub use delimited::{read_delimited_rows, DelimitedReaderConfig};
