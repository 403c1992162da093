#[derive(Debug, Clone)]
pub struct RenderConfig {
    pub clear_color: wgpu::Color,
    pub vsync: bool,
    pub skybox_faces: [&'static str; 6],
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            clear_color: wgpu::Color::BLACK,
            vsync: true,
            // +X, -X, +Y, -Y, +Z, -Z
            skybox_faces: [
                "rightImage.png",
                "leftImage.png",
                "upImage.png",
                "downImage.png",
                "backImage.png",
                "frontImage.png",
            ],
        }
    }
}
