//! Compute backend identifiers

use crate::error::{Error, Result};
use std::fmt;
use std::str::FromStr;

/// A selectable compute implementation underlying the array runtime
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Backend {
    /// CUDA-class GPU backend
    Cuda,
    /// OpenCL-class GPU backend
    OpenCl,
    /// CPU fallback backend
    Cpu,
}

/// All backends, highest "Auto" priority first
pub const ALL_BACKENDS: [Backend; 3] = [Backend::Cuda, Backend::OpenCl, Backend::Cpu];

impl Backend {
    /// Display name
    pub const fn name(self) -> &'static str {
        match self {
            Self::Cuda => "CUDA",
            Self::OpenCl => "OpenCL",
            Self::Cpu => "CPU",
        }
    }

    /// Whether arrays on this backend live in accelerator memory
    pub const fn is_gpu(self) -> bool {
        !matches!(self, Self::Cpu)
    }
}

impl fmt::Display for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Backend {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let lowered = s.trim().to_ascii_lowercase();
        match lowered.trim_start_matches("af_backend_") {
            "cuda" => Ok(Self::Cuda),
            "opencl" => Ok(Self::OpenCl),
            "cpu" => Ok(Self::Cpu),
            _ => Err(Error::invalid_argument(
                "backend",
                format!("unknown backend \"{s}\""),
            )),
        }
    }
}
