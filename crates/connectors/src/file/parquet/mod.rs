pub mod convert;
pub mod error;
pub mod reader;
pub mod sink;

use parquet::{
    basic::Compression,
    file::properties::{WriterProperties, WriterVersion},
};

/// Writer settings shared by every file the exporter produces.
pub fn writer_properties() -> WriterProperties {
    WriterProperties::builder()
        .set_writer_version(WriterVersion::PARQUET_2_0)
        .set_compression(Compression::SNAPPY)
        .build()
}
