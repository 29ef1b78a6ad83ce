//! Shader source descriptions and preprocessor macros.

use std::fmt::Display;

/// A preprocessor define passed to the shader compiler to specialize a pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ShaderMacro {
    pub name: String,
    pub value: String,
}

impl ShaderMacro {
    pub fn new(name: impl Into<String>, value: impl Display) -> Self {
        Self {
            name: name.into(),
            value: value.to_string(),
        }
    }
}

/// Pipeline stage a shader runs in.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum ShaderStage {
    Vertex,
    Pixel,
    Compute,
}

/// A shader source file, its entry point and target profile.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Shader {
    pub path: String,
    pub entry_point: String,
    pub profile: String,
    pub stage: ShaderStage,
    pub macros: Vec<ShaderMacro>,
}

impl Shader {
    fn new(path: impl Into<String>, entry_point: impl Into<String>, profile: &str, stage: ShaderStage) -> Self {
        Self {
            path: path.into(),
            entry_point: entry_point.into(),
            profile: profile.to_owned(),
            stage,
            macros: Vec::new(),
        }
    }

    /// A compute shader compiled with the `cs_5_0` profile.
    pub fn compute(path: impl Into<String>, entry_point: impl Into<String>) -> Self {
        Self::new(path, entry_point, "cs_5_0", ShaderStage::Compute)
    }

    /// A vertex shader compiled with the `vs_5_0` profile.
    pub fn vertex(path: impl Into<String>, entry_point: impl Into<String>) -> Self {
        Self::new(path, entry_point, "vs_5_0", ShaderStage::Vertex)
    }

    /// A pixel shader compiled with the `ps_5_0` profile.
    pub fn pixel(path: impl Into<String>, entry_point: impl Into<String>) -> Self {
        Self::new(path, entry_point, "ps_5_0", ShaderStage::Pixel)
    }

    /// The vertex shader emitting a single triangle covering the whole viewport.
    pub fn fullscreen_triangle() -> Self {
        Self::vertex("FullScreenTriangleVS.hlsl", "Main")
    }

    /// Add a preprocessor define.
    pub fn define(mut self, name: impl Into<String>, value: impl Display) -> Self {
        self.macros.push(ShaderMacro::new(name, value));
        self
    }

    /// Add several preprocessor defines.
    pub fn with_macros(mut self, macros: impl IntoIterator<Item = ShaderMacro>) -> Self {
        self.macros.extend(macros);
        self
    }

    /// Look up the value of a define.
    pub fn macro_value(&self, name: &str) -> Option<&str> {
        self.macros.iter().find(|m| m.name == name).map(|m| m.value.as_str())
    }
}
