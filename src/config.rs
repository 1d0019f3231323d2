use glam::Vec3;

/// Locations of the grass maps, relative to the asset root.
pub const GRASS_COLOR: &str = "textures/grass/color.jpg";
pub const GRASS_AMBIENT_OCCLUSION: &str = "textures/grass/ambientOcclusion.jpg";
pub const GRASS_NORMAL: &str = "textures/grass/normal.jpg";
pub const GRASS_ROUGHNESS: &str = "textures/grass/roughness.jpg";
pub const GRASS_HEIGHT: &str = "textures/grass/height.jpg";

pub const FOX_MODEL: &str = "models/Fox/glTF/Fox.gltf";

/// Environment variable overriding the native asset root.
pub const ASSET_ROOT_ENV: &str = "FOXSPHERE_ASSETS";

pub struct CameraConfig {
    pub fov_y_degrees: f32,
    pub z_near: f32,
    pub z_far: f32,
    pub position: Vec3,
    pub target: Vec3,
}

pub struct FloorConfig {
    pub radius: f32,
    pub width_segments: u32,
    pub height_segments: u32,
    pub texture_repeat: [f32; 2],
    pub ao_intensity: f32,
    pub roughness: f32,
    pub displacement_scale: f32,
    pub base_rotation_z: f32,
}

pub struct LightConfig {
    pub ambient_color: [f32; 3],
    pub ambient_intensity: f32,
    pub sun_color: [f32; 3],
    pub sun_intensity: f32,
    pub sun_position: Vec3,
}

pub struct ModelConfig {
    pub position: Vec3,
    pub scale: f32,
}

pub struct ControlsConfig {
    pub enable_damping: bool,
    pub damping_factor: f32,
    pub rotate_speed: f32,
    pub zoom_speed: f32,
    pub min_distance: f32,
    pub max_distance: f32,
}

/// Everything the demo sets up once at startup.
pub struct DemoConfig {
    pub asset_root: String,
    pub camera: CameraConfig,
    pub floor: FloorConfig,
    pub lights: LightConfig,
    pub model: ModelConfig,
    pub controls: ControlsConfig,
    pub max_pixel_ratio: f64,
    pub initial_width: u32,
    pub initial_height: u32,
}

impl Default for DemoConfig {
    fn default() -> Self {
        Self {
            asset_root: default_asset_root(),
            camera: CameraConfig {
                fov_y_degrees: 90.0,
                z_near: 0.1,
                z_far: 100.0,
                position: Vec3::new(1.0, 2.9, 2.0),
                target: Vec3::new(0.0, 0.75, 0.0),
            },
            floor: FloorConfig {
                radius: 2.0,
                width_segments: 32,
                height_segments: 16,
                texture_repeat: [3.0, 3.0],
                ao_intensity: 3.0,
                roughness: 0.0,
                displacement_scale: 10.0,
                base_rotation_z: -std::f32::consts::PI * 0.5,
            },
            lights: LightConfig {
                ambient_color: [1.0, 1.0, 1.0],
                ambient_intensity: 0.8,
                sun_color: [1.0, 1.0, 1.0],
                sun_intensity: 0.5,
                sun_position: Vec3::new(5.0, 5.0, 5.0),
            },
            model: ModelConfig {
                position: Vec3::new(0.0, 2.0, 0.0),
                scale: 0.007,
            },
            controls: ControlsConfig {
                enable_damping: true,
                damping_factor: 0.05,
                rotate_speed: 1.0,
                zoom_speed: 1.0,
                min_distance: 0.0,
                max_distance: f32::INFINITY,
            },
            max_pixel_ratio: 2.0,
            initial_width: 1280,
            initial_height: 720,
        }
    }
}

impl DemoConfig {
    /// Join a relative asset path onto the asset root.
    pub fn asset_path(&self, relative: &str) -> String {
        if self.asset_root.is_empty() {
            format!("/{relative}")
        } else {
            format!("{}/{}", self.asset_root.trim_end_matches('/'), relative)
        }
    }
}

#[cfg(target_arch = "wasm32")]
fn default_asset_root() -> String {
    // Fetched relative to the page origin
    String::new()
}

#[cfg(not(target_arch = "wasm32"))]
fn default_asset_root() -> String {
    std::env::var(ASSET_ROOT_ENV).unwrap_or_else(|_| "static".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_asset_path_joins_root() {
        let mut config = DemoConfig::default();
        config.asset_root = "assets/".to_string();
        assert_eq!(config.asset_path(FOX_MODEL), "assets/models/Fox/glTF/Fox.gltf");

        config.asset_root = String::new();
        assert_eq!(config.asset_path(GRASS_COLOR), "/textures/grass/color.jpg");
    }

    #[test]
    fn test_defaults_match_scene_layout() {
        let config = DemoConfig::default();
        assert_eq!(config.floor.texture_repeat, [3.0, 3.0]);
        assert_eq!(config.max_pixel_ratio, 2.0);
        assert_eq!(config.camera.fov_y_degrees, 90.0);
        assert!(config.controls.enable_damping);
    }
}
