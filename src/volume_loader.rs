use crate::enums::Orientation;

use bytemuck::{Pod, Zeroable};
use ndarray::{Array2, Array3, s};
use num_complex::Complex64;
use rayon::prelude::*;
use std::{collections::BTreeMap, fs, path::Path};
use thiserror::Error;

const HEADER_SIZE: usize = 32;
const COMPLEX_SIZE: usize = 8;

#[derive(Debug, Error)]
pub enum LoaderError {
    #[error("scan file is {0} bytes, too short for the 32 byte header")]
    TruncatedHeader(usize),

    #[error("scan body holds {found} bytes but the header promises {expected}")]
    TruncatedBody { expected: usize, found: usize },

    #[error("header field {field} holds an invalid voxel count {value}")]
    InvalidCount { field: &'static str, value: i32 },

    #[error("header voxel counts describe a body too large to address")]
    BodyTooLarge,

    #[error("parameter file is missing key {0:?}")]
    MissingKey(&'static str),

    #[error("parameter {key:?} has invalid value {value:?}")]
    InvalidValue { key: &'static str, value: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// The 32 byte little-endian header of a Prospa `.1d`/`.2d`/`.3d` file.
#[repr(C)]
#[derive(Clone, Copy, Debug, Pod, Zeroable)]
struct RawHeader {
    tags: [[u8; 4]; 3],
    fields: [i32; 5],
}

impl RawHeader {
    fn field(&self, index: usize) -> i32 {
        i32::from_le(self.fields[index])
    }
}

/// Raw complex samples decoded from a scan file.
///
/// Samples are laid out as `(phase-2, phase-1, read)`.
#[derive(Clone, Debug)]
pub struct ScanData {
    pub tags: [[u8; 4]; 3],
    pub data: Array3<Complex64>,
}

impl ScanData {
    pub fn counts(&self) -> [usize; 3] {
        let (phase_2, phase_1, read) = self.data.dim();
        [phase_2, phase_1, read]
    }
}

/// Acquisition parameters read from a `.par` file.
#[derive(Clone, Debug, PartialEq)]
pub struct ScanParameters {
    pub orientation: Orientation,
    /// Field of view along phase-2, phase-1 and read.
    pub fov: [f64; 3],
    /// Voxel counts along phase-2, phase-1 and read.
    pub counts: [usize; 3],
    /// Every key/value pair in the file, including the ones above.
    pub entries: BTreeMap<String, String>,
}

pub struct ScanLoader;

impl ScanLoader {
    /// Load the complex samples of a scan file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or is shorter than the
    /// header says it should be
    pub fn load_data(path: impl AsRef<Path>) -> Result<ScanData, LoaderError> {
        let bytes = fs::read(path.as_ref())?;
        Self::decode_data(&bytes)
    }

    pub fn decode_data(bytes: &[u8]) -> Result<ScanData, LoaderError> {
        if bytes.len() < HEADER_SIZE {
            return Err(LoaderError::TruncatedHeader(bytes.len()));
        }
        let header: RawHeader = bytemuck::pod_read_unaligned(&bytes[..HEADER_SIZE]);

        let read = Self::count(&header, 1, "read")?;
        let phase_1 = Self::count(&header, 2, "phase-1")?;
        let phase_2 = Self::count(&header, 3, "phase-2")?;

        let chunk_size = COMPLEX_SIZE
            .checked_mul(read)
            .and_then(|size| size.checked_mul(phase_1))
            .ok_or(LoaderError::BodyTooLarge)?;
        let expected = chunk_size
            .checked_mul(phase_2)
            .ok_or(LoaderError::BodyTooLarge)?;
        let body = &bytes[HEADER_SIZE..];
        if body.len() < expected {
            return Err(LoaderError::TruncatedBody {
                expected,
                found: body.len(),
            });
        }

        let slices: Vec<Array2<Complex64>> = body[..expected]
            .par_chunks_exact(chunk_size)
            .map(|chunk| Self::decode_slice(chunk, phase_1, read))
            .collect();
        let mut data = Array3::<Complex64>::zeros((phase_2, phase_1, read));
        for (i, slice) in slices.iter().enumerate() {
            data.slice_mut(s![i, .., ..]).assign(slice);
        }

        Ok(ScanData {
            tags: header.tags,
            data,
        })
    }

    fn count(header: &RawHeader, index: usize, field: &'static str) -> Result<usize, LoaderError> {
        let value = header.field(index);
        usize::try_from(value)
            .ok()
            .filter(|&count| count > 0)
            .ok_or(LoaderError::InvalidCount { field, value })
    }

    // Interleaved (real, imaginary) f32 pairs, read index varying fastest.
    fn decode_slice(chunk: &[u8], phase_1: usize, read: usize) -> Array2<Complex64> {
        let floats: Vec<f32> = chunk
            .chunks_exact(4)
            .map(|b| f32::from_le_bytes([b[0], b[1], b[2], b[3]]))
            .collect();
        Array2::from_shape_fn((phase_1, read), |(p, r)| {
            let idx = 2 * (p * read + r);
            Complex64::new(floats[idx] as f64, floats[idx + 1] as f64)
        })
    }

    /// Load acquisition parameters from a `.par` file.
    pub fn load_parameters(path: impl AsRef<Path>) -> Result<ScanParameters, LoaderError> {
        let text = fs::read_to_string(path.as_ref())?;
        Self::parse_parameters(&text)
    }

    /// Parse `KEY = VALUE` / `KEY = "VALUE"` lines.
    ///
    /// A zero phase field of view is derived from the phase count and the
    /// read cell size (`FOVr / Nread`).
    pub fn parse_parameters(text: &str) -> Result<ScanParameters, LoaderError> {
        let entries: BTreeMap<String, String> = text
            .lines()
            .filter_map(|line| line.split_once('='))
            .map(|(key, value)| {
                let value = value.trim().trim_matches('"');
                (key.trim().to_string(), value.to_string())
            })
            .filter(|(key, _)| !key.is_empty())
            .collect();

        let orient = Self::entry(&entries, "orient")?;
        let orientation = orient
            .to_lowercase()
            .parse::<Orientation>()
            .map_err(|_| LoaderError::InvalidValue {
                key: "orient",
                value: orient.to_string(),
            })?;

        let fov_read = Self::number(&entries, "FOVr")?;
        let fov_phase_1 = Self::number(&entries, "FOVp1")?;
        let fov_phase_2 = Self::number(&entries, "FOVp2")?;
        let n_read = Self::integer(&entries, "Nread")?;
        let n_phase_1 = Self::integer(&entries, "Nphase1")?;
        let n_phase_2 = Self::integer(&entries, "Nphase2")?;

        let default_cell_size = if n_read > 0 {
            fov_read / n_read as f64
        } else {
            0.0
        };
        let derive = |fov: f64, count: usize| {
            if fov != 0.0 {
                fov
            } else {
                count as f64 * default_cell_size
            }
        };

        Ok(ScanParameters {
            orientation,
            fov: [
                derive(fov_phase_2, n_phase_2),
                derive(fov_phase_1, n_phase_1),
                fov_read,
            ],
            counts: [n_phase_2, n_phase_1, n_read],
            entries,
        })
    }

    fn entry<'a>(
        entries: &'a BTreeMap<String, String>,
        key: &'static str,
    ) -> Result<&'a str, LoaderError> {
        entries
            .get(key)
            .map(String::as_str)
            .ok_or(LoaderError::MissingKey(key))
    }

    fn number(entries: &BTreeMap<String, String>, key: &'static str) -> Result<f64, LoaderError> {
        let value = Self::entry(entries, key)?;
        value.parse::<f64>().map_err(|_| LoaderError::InvalidValue {
            key,
            value: value.to_string(),
        })
    }

    fn integer(
        entries: &BTreeMap<String, String>,
        key: &'static str,
    ) -> Result<usize, LoaderError> {
        let value = Self::entry(entries, key)?;
        value.parse::<usize>().map_err(|_| LoaderError::InvalidValue {
            key,
            value: value.to_string(),
        })
    }
}

/// Encode samples in the scan file layout. Used to write fixtures.
pub fn encode_data(tags: [[u8; 4]; 3], data: &Array3<Complex64>) -> Vec<u8> {
    let (phase_2, phase_1, read) = data.dim();
    let header = RawHeader {
        tags,
        fields: [0, read as i32, phase_1 as i32, phase_2 as i32, 0].map(i32::to_le),
    };
    let mut bytes = bytemuck::bytes_of(&header).to_vec();
    for value in data.iter() {
        bytes.extend_from_slice(&(value.re as f32).to_le_bytes());
        bytes.extend_from_slice(&(value.im as f32).to_le_bytes());
    }
    bytes
}
