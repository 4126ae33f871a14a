//! GPU execution mode for the worker pools.

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GpuMode {
    Gpu,
    Cpu,
    Auto,
}

impl GpuMode {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "gpu" => Some(GpuMode::Gpu),
            "cpu" => Some(GpuMode::Cpu),
            "auto" => Some(GpuMode::Auto),
            _ => None,
        }
    }
}

impl fmt::Display for GpuMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            GpuMode::Gpu => "gpu",
            GpuMode::Cpu => "cpu",
            GpuMode::Auto => "auto",
        };
        write!(f, "{}", s)
    }
}
