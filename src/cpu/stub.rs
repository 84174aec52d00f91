//! Stub implementation when CPU sampling is not compiled

use crate::error::Result;
use std::io::{self, Write};

pub struct CpuProfiler;

impl CpuProfiler {
    pub fn start(_frequency: i32) -> Result<Self> {
        Ok(CpuProfiler)
    }

    pub fn finish<W: Write>(self, _out: &mut W) -> io::Result<()> {
        Ok(())
    }
}
