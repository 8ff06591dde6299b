//! Boundary to the binary layer. The core never touches wire layout;
//! it hands byte streams to a [`Codec`] and gets datasets back.

use dicom::object::{from_reader, DefaultDicomObject};

use crate::error::Result;

const PREAMBLE_LEN: usize = 128;
const MAGIC: &[u8; 4] = b"DICM";

/// Decode/encode seam. Implementations map their failures onto
/// [`crate::Error::Decode`] and [`crate::Error::Encode`]; those pass
/// through to the embedder verbatim.
pub trait Codec {
    fn decode(&self, bytes: &[u8]) -> Result<DefaultDicomObject>;
    fn encode(&self, object: &DefaultDicomObject) -> Result<Vec<u8>>;
}

/// Standard Part-10 file codec: file meta group plus data set, with the
/// 128-byte preamble tolerated on input and written on output.
#[derive(Debug, Clone, Copy, Default)]
pub struct PartTenCodec;

impl Codec for PartTenCodec {
    fn decode(&self, bytes: &[u8]) -> Result<DefaultDicomObject> {
        Ok(from_reader(strip_preamble(bytes))?)
    }

    fn encode(&self, object: &DefaultDicomObject) -> Result<Vec<u8>> {
        let mut out = Vec::new();
        object.write_all(&mut out)?;
        Ok(out)
    }
}

fn strip_preamble(bytes: &[u8]) -> &[u8] {
    if bytes.len() >= PREAMBLE_LEN + MAGIC.len()
        && &bytes[PREAMBLE_LEN..PREAMBLE_LEN + MAGIC.len()] == MAGIC
    {
        &bytes[PREAMBLE_LEN..]
    } else {
        bytes
    }
}
