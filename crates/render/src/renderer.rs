use crate::camera::{Camera, CameraMatrices};
use crate::uniforms::{self, RecordingSink};
use cabinview_common::Transform;

/// One mesh submitted for drawing.
#[derive(Debug, Clone, PartialEq)]
pub struct DrawItem {
    pub name: String,
    pub transform: Transform,
    pub vertex_count: usize,
}

/// Renderer-agnostic interface. All renderers implement this trait.
///
/// The camera is updated by the caller before `render`; a renderer only reads
/// it. Each frame it binds the camera matrices once, then each item's model
/// matrix before drawing that item.
pub trait Renderer {
    /// The output type produced by this renderer.
    type Output;

    /// Render one frame of `items` as seen from `camera`.
    fn render(&mut self, camera: &Camera, items: &[DrawItem]) -> Self::Output;
}

/// Debug text renderer.
///
/// Produces a human-readable description of the frame: camera state and
/// every draw with its scale. Useful for CLI output,
/// logging and testing the uniform contract without a GPU.
#[derive(Debug, Default)]
pub struct DebugTextRenderer {
    uniforms: RecordingSink,
}

impl DebugTextRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Uniform values bound during the last frame.
    pub fn uniforms(&self) -> &RecordingSink {
        &self.uniforms
    }
}

impl Renderer for DebugTextRenderer {
    type Output = String;

    fn render(&mut self, camera: &Camera, items: &[DrawItem]) -> String {
        self.uniforms = RecordingSink::default();
        let matrices = CameraMatrices {
            view: camera.view_matrix(),
            projection: camera.projection_matrix(),
        };
        matrices.upload(&mut self.uniforms);

        let p = camera.pos();
        let f = camera.front();
        let mut out = String::new();
        out.push_str(&format!(
            "=== Frame ({} meshes, {} vertices) ===\n",
            items.len(),
            items.iter().map(|i| i.vertex_count).sum::<usize>()
        ));
        out.push_str(&format!(
            "Camera: pos=({:.2}, {:.2}, {:.2}) front=({:.2}, {:.2}, {:.2}) fov={:.0} mode={}\n",
            p.x,
            p.y,
            p.z,
            f.x,
            f.y,
            f.z,
            camera.fov(),
            if camera.is_free() { "free" } else { "ground" }
        ));

        for item in items {
            let model = item.transform.model_matrix();
            uniforms::upload_model(&mut self.uniforms, model);
            let s = item.transform.scale;
            out.push_str(&format!(
                "  draw {} vertices={} scale=({:.2}, {:.2}, {:.2})\n",
                item.name, item.vertex_count, s.x, s.y, s.z
            ));
        }

        out
    }
}
