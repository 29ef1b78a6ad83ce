//! Exposes the structs holding renderer-wide initialization parameters.

/// Renderer-wide settings. Create these through a [`RenderSettingsBuilder`].
///
/// # Example
/// ```
/// # use deimos::prelude::*;
/// let settings = RenderSettingsBuilder::new()
///     .name("voxel GI demo")
///     .tile_size(16)
///     .num_tiles(58, 48)
///     .voxel_grid(64, 640.0)
///     .profiling(true)
///     .build();
/// assert_eq!(settings.num_tiles_x * settings.tile_size, 928);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct RenderSettings {
    /// Application name, used in log output.
    pub name: String,
    /// Number of back buffers in the swap chain.
    pub back_buffer_count: u32,
    /// Width and height of a screen tile in pixels.
    pub tile_size: u32,
    pub num_tiles_x: u32,
    pub num_tiles_y: u32,
    /// Number of voxel grid cells along each axis.
    pub num_grid_cells: [u32; 3],
    /// World-space extent of the voxel grid along each axis.
    pub grid_size: [f32; 3],
    pub shader_visible_heap_size: u32,
    pub shader_invisible_heap_size: u32,
    pub rtv_heap_size: u32,
    pub dsv_heap_size: u32,
    pub sampler_heap_size: u32,
    /// Maximum number of distinct profile names.
    pub max_profiles: u32,
    /// Number of frames whose timestamps may be pending at the same time.
    pub render_latency: u32,
    /// Whether to create a GPU profiler.
    pub enable_profiling: bool,
}

impl RenderSettings {
    /// Render target width covered by the tile grid.
    pub fn screen_width(&self) -> u32 {
        self.num_tiles_x * self.tile_size
    }

    /// Render target height covered by the tile grid.
    pub fn screen_height(&self) -> u32 {
        self.num_tiles_y * self.tile_size
    }
}

/// Builder for [`RenderSettings`].
#[derive(Debug)]
pub struct RenderSettingsBuilder {
    inner: RenderSettings,
}

impl Default for RenderSettingsBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl RenderSettingsBuilder {
    /// Create a new builder with default settings.
    pub fn new() -> Self {
        RenderSettingsBuilder {
            inner: RenderSettings {
                name: String::from(""),
                back_buffer_count: 3,
                tile_size: 16,
                num_tiles_x: 58,
                num_tiles_y: 48,
                num_grid_cells: [64, 64, 64],
                grid_size: [640.0, 640.0, 640.0],
                shader_visible_heap_size: 64,
                shader_invisible_heap_size: 64,
                rtv_heap_size: 16,
                dsv_heap_size: 4,
                sampler_heap_size: 16,
                max_profiles: 64,
                render_latency: 3,
                enable_profiling: false,
            },
        }
    }

    /// Sets the application name.
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.inner.name = name.into();
        self
    }

    pub fn back_buffer_count(mut self, count: u32) -> Self {
        self.inner.back_buffer_count = count;
        self
    }

    /// Size of a screen tile in pixels.
    pub fn tile_size(mut self, size: u32) -> Self {
        self.inner.tile_size = size;
        self
    }

    pub fn num_tiles(mut self, x: u32, y: u32) -> Self {
        self.inner.num_tiles_x = x;
        self.inner.num_tiles_y = y;
        self
    }

    /// Cubic voxel grid with `cells` cells per axis spanning `size` world units.
    pub fn voxel_grid(mut self, cells: u32, size: f32) -> Self {
        self.inner.num_grid_cells = [cells; 3];
        self.inner.grid_size = [size; 3];
        self
    }

    /// Capacities of the shader visible and shader invisible CBV/SRV/UAV heaps.
    pub fn srv_heap_sizes(mut self, shader_visible: u32, shader_invisible: u32) -> Self {
        self.inner.shader_visible_heap_size = shader_visible;
        self.inner.shader_invisible_heap_size = shader_invisible;
        self
    }

    pub fn rtv_heap_size(mut self, size: u32) -> Self {
        self.inner.rtv_heap_size = size;
        self
    }

    pub fn dsv_heap_size(mut self, size: u32) -> Self {
        self.inner.dsv_heap_size = size;
        self
    }

    pub fn sampler_heap_size(mut self, size: u32) -> Self {
        self.inner.sampler_heap_size = size;
        self
    }

    pub fn max_profiles(mut self, count: u32) -> Self {
        self.inner.max_profiles = count;
        self
    }

    pub fn render_latency(mut self, latency: u32) -> Self {
        self.inner.render_latency = latency;
        self
    }

    /// Enable the GPU profiler.
    pub fn profiling(mut self, enable: bool) -> Self {
        self.inner.enable_profiling = enable;
        self
    }

    /// Build the settings.
    /// # Panics
    /// Panics on zero sized tiles, grids or latencies.
    pub fn build(self) -> RenderSettings {
        assert!(self.inner.tile_size > 0, "Tile size cannot be zero.");
        assert!(self.inner.num_grid_cells.iter().all(|&cells| cells > 0), "Voxel grid cannot be empty.");
        assert!(self.inner.render_latency > 0, "Render latency must be at least one frame.");
        self.inner
    }
}
