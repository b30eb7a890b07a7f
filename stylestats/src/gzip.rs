use std::io::{self, Write};

use flate2::Compression;
use flate2::write::GzEncoder;

/// Size in bytes of `text` once gzip-compressed at the best level
pub fn gzip_size(text: &str) -> io::Result<usize> {
    let mut encoder = GzEncoder::new(Vec::new(), Compression::best());
    encoder.write_all(text.as_bytes())?;
    Ok(encoder.finish()?.len())
}
