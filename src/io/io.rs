use crate::error::{DemuxError, Result};
use flate2::read::MultiGzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;
use seq_io::fastq::Reader;
use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};

/// Bytes held in flight on either side of the extraction loop
pub const STREAM_BUF_SIZE: usize = 131_072;

pub fn is_gzip_path(path: &str) -> bool {
    path.to_ascii_lowercase().ends_with(".gz")
}

/// Open a FASTQ file, transparently decompressing gzip if the path ends in `.gz`
pub fn open_fastq(path: &str) -> Result<Reader<Box<dyn Read + Send>>> {
    let file = File::open(path)?;
    let reader: Box<dyn Read + Send> = if is_gzip_path(path) {
        Box::new(MultiGzDecoder::new(BufReader::with_capacity(
            STREAM_BUF_SIZE,
            file,
        )))
    } else {
        Box::new(file)
    };
    Ok(Reader::with_capacity(reader, STREAM_BUF_SIZE))
}

/// Gzip compressed output, always compressed whatever the extension
pub struct GzFastqWriter {
    inner: BufWriter<GzEncoder<File>>,
}

impl GzFastqWriter {
    pub fn create(path: &str) -> Result<Self> {
        let file = File::create(path)?;
        let encoder = GzEncoder::new(file, Compression::default());
        Ok(Self {
            inner: BufWriter::with_capacity(STREAM_BUF_SIZE, encoder),
        })
    }

    /// Flush and write the gzip trailer; without it the output is truncated
    pub fn finish(self) -> Result<()> {
        let encoder = self
            .inner
            .into_inner()
            .map_err(|e| DemuxError::stream("compression", e.into_error()))?;
        let mut file = encoder
            .finish()
            .map_err(|e| DemuxError::stream("compression", e))?;
        file.flush()?;
        Ok(())
    }
}

impl Write for GzFastqWriter {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.inner.write(buf)
    }

    fn flush(&mut self) -> std::io::Result<()> {
        self.inner.flush()
    }
}
