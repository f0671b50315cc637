//! Fourier transform blocks
//!
//! Both blocks process one frame of `num_bins` input elements per cycle and
//! wait until a whole frame is available. Results are scaled by the
//! normalization factor only; no implicit `1/n` is applied.

use crate::array::GpuArray;
use crate::bridge::{ArrayBlock, ArrayBlockNode};
use crate::dtype::{BufferDType, DTypeSupport, validate_dtype};
use crate::error::{Error, Result};
use crate::flow::PortId;
use crate::ops::{self, FftDirection};

fn check_frame(dtype: BufferDType, num_bins: usize, block: &'static str) -> Result<()> {
    if dtype.dimension() != 1 {
        return Err(Error::invalid_argument(
            "dtype",
            format!("{block} needs scalar samples, got {dtype}"),
        ));
    }
    if num_bins == 0 {
        return Err(Error::invalid_argument("num_bins", "must be > 0"));
    }
    if !num_bins.is_power_of_two() {
        tracing::warn!(block, num_bins, "most efficient when num_bins is a power of 2");
    }
    Ok(())
}

/// Next frame of input `0`, consumed; `None` until `num_bins` are queued
fn take_frame(base: &mut ArrayBlock, num_bins: usize) -> Result<Option<GpuArray>> {
    if base.work_info().min_elements < num_bins {
        return Ok(None);
    }
    let frame = base.input_array(0usize, false)?.slice(0, num_bins)?;
    base.ports_mut()
        .input_mut(&PortId::Index(0))?
        .consume(num_bins)?;
    Ok(Some(frame))
}

/// Complex FFT or inverse FFT over frames of `num_bins`
#[derive(Debug)]
pub struct FftBlock {
    base: ArrayBlock,
    num_bins: usize,
    norm: f64,
    direction: FftDirection,
}

impl FftBlock {
    /// Create a block on `device` for complex `dtype` samples
    pub fn new(
        device: &str,
        dtype: impl Into<BufferDType>,
        num_bins: usize,
        norm: f64,
        direction: FftDirection,
    ) -> Result<Self> {
        let dtype = dtype.into();
        validate_dtype(dtype.dtype(), DTypeSupport::COMPLEX_FLOAT, "fft")?;
        check_frame(dtype, num_bins, "fft")?;

        let mut base = ArrayBlock::new(device, &[dtype.dtype()])?;
        base.setup_input(0usize, dtype)?;
        base.setup_output(0usize, dtype)?;
        Ok(Self {
            base,
            num_bins,
            norm,
            direction,
        })
    }

    /// Frame length
    pub fn num_bins(&self) -> usize {
        self.num_bins
    }

    /// Transform direction
    pub fn direction(&self) -> FftDirection {
        self.direction
    }

    /// Output scale factor
    pub fn normalization_factor(&self) -> f64 {
        self.norm
    }

    /// Change the output scale factor; takes effect on the next frame
    pub fn set_normalization_factor(&mut self, norm: f64) {
        tracing::debug!(from = self.norm, to = norm, "fft normalization changed");
        self.norm = norm;
    }
}

impl ArrayBlockNode for FftBlock {
    fn array_block(&self) -> &ArrayBlock {
        &self.base
    }

    fn array_block_mut(&mut self) -> &mut ArrayBlock {
        &mut self.base
    }

    fn process(&mut self) -> Result<()> {
        let Some(frame) = take_frame(&mut self.base, self.num_bins)? else {
            return Ok(());
        };
        let output = ops::fft(&frame, self.direction, self.norm)?;
        self.base.post_array(0usize, &output)
    }
}

/// Real FFT: real frames to half spectra, or half spectra back to real frames
///
/// Forward frames of `num_bins` samples produce `num_bins / 2 + 1` bins.
/// Inverse frames of `num_bins` bins produce `2 * (num_bins - 1) + num_bins % 2`
/// samples.
#[derive(Debug)]
pub struct RfftBlock {
    base: ArrayBlock,
    num_bins: usize,
    norm: f64,
    direction: FftDirection,
}

impl RfftBlock {
    /// Create a block on `device`; `dtype` is the float type underlying both ports
    pub fn new(
        device: &str,
        dtype: impl Into<BufferDType>,
        num_bins: usize,
        norm: f64,
        direction: FftDirection,
    ) -> Result<Self> {
        let real = dtype.into();
        validate_dtype(real.dtype(), DTypeSupport::FLOAT, "rfft")?;
        check_frame(real, num_bins, "rfft")?;
        let complex = real.with_dtype(
            real.dtype()
                .to_complex()
                .ok_or_else(|| Error::unsupported_dtype(real.dtype(), "rfft"))?,
        );
        let (input, output) = match direction {
            FftDirection::Forward => (real, complex),
            FftDirection::Inverse => (complex, real),
        };

        let mut base = ArrayBlock::new(device, &[real.dtype()])?;
        base.setup_input(0usize, input)?;
        base.setup_output(0usize, output)?;
        Ok(Self {
            base,
            num_bins,
            norm,
            direction,
        })
    }

    /// Input frame length
    pub fn num_bins(&self) -> usize {
        self.num_bins
    }

    /// Transform direction
    pub fn direction(&self) -> FftDirection {
        self.direction
    }

    /// Elements produced per frame
    pub fn output_len(&self) -> usize {
        match self.direction {
            FftDirection::Forward => ops::rfft_len(self.num_bins),
            FftDirection::Inverse => ops::irfft_len(self.num_bins),
        }
    }

    /// Output scale factor
    pub fn normalization_factor(&self) -> f64 {
        self.norm
    }

    /// Change the output scale factor; takes effect on the next frame
    pub fn set_normalization_factor(&mut self, norm: f64) {
        tracing::debug!(from = self.norm, to = norm, "rfft normalization changed");
        self.norm = norm;
    }
}

impl ArrayBlockNode for RfftBlock {
    fn array_block(&self) -> &ArrayBlock {
        &self.base
    }

    fn array_block_mut(&mut self) -> &mut ArrayBlock {
        &mut self.base
    }

    fn process(&mut self) -> Result<()> {
        let Some(frame) = take_frame(&mut self.base, self.num_bins)? else {
            return Ok(());
        };
        let output = match self.direction {
            FftDirection::Forward => ops::rfft(&frame, self.norm)?,
            FftDirection::Inverse => ops::irfft(&frame, self.norm)?,
        };
        self.base.post_array(0usize, &output)
    }
}
