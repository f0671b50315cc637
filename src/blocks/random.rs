//! Random source block

use crate::bridge::{ArrayBlock, ArrayBlockNode};
use crate::dtype::{BufferDType, DType, DTypeSupport, validate_dtype};
use crate::error::{Error, Result};
use crate::ops::{Distribution, EngineKind, RandomEngine};
use std::time::{SystemTime, UNIX_EPOCH};

/// Elements generated per cycle unless configured otherwise
pub const DEFAULT_ELEMENTS_PER_WORK: usize = 1024;

fn time_seed() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |elapsed| elapsed.as_micros() as u64)
}

/// Emits `elements_per_work` random values on output `0` every cycle
#[derive(Debug)]
pub struct RandomSourceBlock {
    base: ArrayBlock,
    dtype: DType,
    distribution: Distribution,
    engine: RandomEngine,
    elements_per_work: usize,
}

impl RandomSourceBlock {
    /// Create a source on `device`, seeded from the current time
    pub fn new(device: &str, dtype: DType, distribution: Distribution) -> Result<Self> {
        validate_dtype(dtype, DTypeSupport::ALL, "random")?;
        validate_dtype(dtype, distribution.support(), distribution.name())?;

        let mut base = ArrayBlock::new(device, &[dtype])?;
        base.setup_output(0usize, BufferDType::scalar(dtype))?;
        Ok(Self {
            base,
            dtype,
            distribution,
            engine: RandomEngine::new(EngineKind::default(), time_seed()),
            elements_per_work: DEFAULT_ELEMENTS_PER_WORK,
        })
    }

    /// Current distribution
    pub fn distribution(&self) -> Distribution {
        self.distribution
    }

    /// Switch distribution; the output type must support it
    pub fn set_distribution(&mut self, distribution: Distribution) -> Result<()> {
        validate_dtype(self.dtype, distribution.support(), distribution.name())?;
        tracing::debug!(from = %self.distribution, to = %distribution, "distribution changed");
        self.distribution = distribution;
        Ok(())
    }

    /// Current generator algorithm
    pub fn engine_kind(&self) -> EngineKind {
        self.engine.kind()
    }

    /// Switch generator algorithm, keeping the seed
    pub fn set_engine_kind(&mut self, kind: EngineKind) {
        tracing::debug!(from = %self.engine.kind(), to = %kind, "random engine changed");
        self.engine.set_kind(kind);
    }

    /// Seed in use
    pub fn seed(&self) -> u64 {
        self.engine.seed()
    }

    /// Restart the engine from `seed`
    pub fn reseed(&mut self, seed: u64) {
        self.engine.reseed(seed);
    }

    /// Restart the engine from the current time in microseconds
    pub fn reseed_with_time(&mut self) {
        self.engine.reseed(time_seed());
    }

    /// Elements emitted per cycle
    pub fn elements_per_work(&self) -> usize {
        self.elements_per_work
    }

    /// Change the elements emitted per cycle
    pub fn set_elements_per_work(&mut self, elements: usize) -> Result<()> {
        if elements == 0 {
            return Err(Error::invalid_argument("elements_per_work", "must be > 0"));
        }
        self.elements_per_work = elements;
        Ok(())
    }
}

impl ArrayBlockNode for RandomSourceBlock {
    fn array_block(&self) -> &ArrayBlock {
        &self.base
    }

    fn array_block_mut(&mut self) -> &mut ArrayBlock {
        &mut self.base
    }

    fn process(&mut self) -> Result<()> {
        let output = self.engine.generate(
            self.base.context(),
            self.dtype,
            self.distribution,
            self.elements_per_work,
        )?;
        self.base.post_array(0usize, &output)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bridge::AUTO_DEVICE;
    use crate::flow::{Block, PortId};

    fn next_chunk(block: &mut RandomSourceBlock) -> Vec<f32> {
        block.work().unwrap();
        block
            .ports_mut()
            .output_mut(&PortId::Index(0))
            .unwrap()
            .pop_buffer()
            .unwrap()
            .to_vec::<f32>()
            .unwrap()
    }

    #[test]
    fn test_normal_needs_float() {
        assert!(RandomSourceBlock::new(AUTO_DEVICE, DType::I16, Distribution::Normal).is_err());

        let mut block =
            RandomSourceBlock::new(AUTO_DEVICE, DType::I16, Distribution::Uniform).unwrap();
        assert!(block.set_distribution(Distribution::Normal).is_err());
        assert_eq!(block.distribution(), Distribution::Uniform);
    }

    #[test]
    fn test_reseed_repeats_output() {
        let mut block =
            RandomSourceBlock::new(AUTO_DEVICE, DType::F32, Distribution::Uniform).unwrap();
        block.set_elements_per_work(64).unwrap();
        block.activate().unwrap();

        block.reseed(7);
        let first = next_chunk(&mut block);
        block.reseed(7);
        assert_eq!(next_chunk(&mut block), first);
        assert_eq!(first.len(), 64);
        assert!(first.iter().all(|x| (0.0..1.0).contains(x)));

        block.set_engine_kind(EngineKind::Threefry);
        block.reseed(7);
        assert_ne!(next_chunk(&mut block), first);
    }
}
