//! The closed set of per-draw uniforms the particle shader reads.

use std::str::FromStr;

use crate::config::FieldConfig;
use crate::error::{FieldError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UniformKey {
    Time,
    InstanceCount,
    GridCols,
    GridRows,
}

impl UniformKey {
    pub const ALL: [UniformKey; 4] = [
        UniformKey::Time,
        UniformKey::InstanceCount,
        UniformKey::GridCols,
        UniformKey::GridRows,
    ];

    /// Name as declared in the shader source.
    pub fn name(self) -> &'static str {
        match self {
            UniformKey::Time => "time",
            UniformKey::InstanceCount => "instanceCount",
            UniformKey::GridCols => "gridCols",
            UniformKey::GridRows => "gridRows",
        }
    }
}

impl FromStr for UniformKey {
    type Err = FieldError;

    fn from_str(s: &str) -> Result<Self> {
        UniformKey::ALL
            .into_iter()
            .find(|key| key.name() == s)
            .ok_or_else(|| FieldError::InvalidUniformKey(s.to_string()))
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum UniformValue {
    Float(f32),
    Int(i32),
}

impl From<f32> for UniformValue {
    fn from(v: f32) -> Self {
        UniformValue::Float(v)
    }
}

impl From<i32> for UniformValue {
    fn from(v: i32) -> Self {
        UniformValue::Int(v)
    }
}

/// Live uniform values.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FieldUniforms {
    /// Shader time in seconds.
    pub time: f32,
    pub instance_count: i32,
    pub grid_cols: i32,
    pub grid_rows: i32,
}

impl FieldUniforms {
    pub fn from_config(config: &FieldConfig) -> Self {
        Self {
            time: 0.0,
            instance_count: i32::try_from(config.instance_count).unwrap_or(i32::MAX),
            grid_cols: config.grid_cols,
            grid_rows: config.grid_rows,
        }
    }

    pub fn get(&self, key: UniformKey) -> UniformValue {
        match key {
            UniformKey::Time => UniformValue::Float(self.time),
            UniformKey::InstanceCount => UniformValue::Int(self.instance_count),
            UniformKey::GridCols => UniformValue::Int(self.grid_cols),
            UniformKey::GridRows => UniformValue::Int(self.grid_rows),
        }
    }

    /// Write one slot. The value's type must match the slot's.
    pub fn set(&mut self, key: UniformKey, value: UniformValue) -> Result<()> {
        match (key, value) {
            (UniformKey::Time, UniformValue::Float(v)) => self.time = v,
            (UniformKey::InstanceCount, UniformValue::Int(v)) => self.instance_count = v,
            (UniformKey::GridCols, UniformValue::Int(v)) => self.grid_cols = v,
            (UniformKey::GridRows, UniformValue::Int(v)) => self.grid_rows = v,
            (key @ UniformKey::Time, _) => {
                return Err(FieldError::UniformType {
                    key: key.name(),
                    expected: "float",
                })
            }
            (key, _) => {
                return Err(FieldError::UniformType {
                    key: key.name(),
                    expected: "int",
                })
            }
        }
        Ok(())
    }

    /// Write a slot addressed by its shader name.
    pub fn set_by_name(&mut self, name: &str, value: UniformValue) -> Result<()> {
        self.set(name.parse()?, value)
    }

    /// `(key, value)` pairs in declaration order, for uploading.
    pub fn iter(&self) -> impl Iterator<Item = (UniformKey, UniformValue)> + '_ {
        UniformKey::ALL.into_iter().map(move |key| (key, self.get(key)))
    }
}
