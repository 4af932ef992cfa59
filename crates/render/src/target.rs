use crate::backend::BackendError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use stereocube_common::{DisplayOutput, Eye};

/// Colour buffer format of a render target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ColorFormat {
    Rgba8,
}

/// Depth buffer format of a render target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DepthFormat {
    Depth24Stencil8,
    Depth32,
}

/// Everything a backend needs to allocate one offscreen surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TargetDescriptor {
    pub width: u32,
    pub height: u32,
    pub color: ColorFormat,
    pub depth: DepthFormat,
}

impl Default for TargetDescriptor {
    fn default() -> Self {
        Self {
            width: 400,
            height: 240,
            color: ColorFormat::Rgba8,
            depth: DepthFormat::Depth24Stencil8,
        }
    }
}

impl TargetDescriptor {
    pub fn aspect(&self) -> f32 {
        self.width as f32 / self.height.max(1) as f32
    }
}

/// Opaque handle to a backend-owned render target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TargetHandle(u32);

impl TargetHandle {
    /// Only backends mint handles.
    pub fn new(index: u32) -> Self {
        Self(index)
    }

    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for TargetHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "target#{}", self.0)
    }
}

/// The pair of per-eye targets created at startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StereoTargets {
    pub left: TargetHandle,
    pub right: TargetHandle,
}

impl StereoTargets {
    pub fn get(&self, eye: Eye) -> TargetHandle {
        match eye {
            Eye::Left => self.left,
            Eye::Right => self.right,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (Eye, TargetHandle)> {
        [(Eye::Left, self.left), (Eye::Right, self.right)].into_iter()
    }
}

/// Target-to-output bindings. Each target binds once; each output takes one target.
#[derive(Debug, Clone, Default)]
pub struct OutputTable {
    bound: BTreeMap<TargetHandle, DisplayOutput>,
}

impl OutputTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn bind(&mut self, target: TargetHandle, output: DisplayOutput) -> Result<(), BackendError> {
        if self.bound.contains_key(&target) {
            return Err(BackendError::OutputAlreadyBound(target));
        }
        if self.target_for(output).is_some() {
            return Err(BackendError::OutputInUse(output));
        }
        self.bound.insert(target, output);
        Ok(())
    }

    pub fn output_of(&self, target: TargetHandle) -> Option<DisplayOutput> {
        self.bound.get(&target).copied()
    }

    pub fn target_for(&self, output: DisplayOutput) -> Option<TargetHandle> {
        self.bound
            .iter()
            .find(|(_, o)| **o == output)
            .map(|(t, _)| *t)
    }

    pub fn len(&self) -> usize {
        self.bound.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bound.is_empty()
    }
}
