use glam::Mat4;
use std::collections::BTreeMap;

pub const MODEL: &str = "model";
pub const VIEW: &str = "view";
pub const PROJECTION: &str = "projection";

/// Anything that accepts named 4x4 matrix uniforms before a draw.
pub trait UniformSink {
    /// Store `value` in the slot called `name`. Returns `false` when the
    /// program has no such slot.
    fn set_mat4(&mut self, name: &str, value: Mat4) -> bool;
}

pub(crate) fn set_or_warn(sink: &mut impl UniformSink, name: &str, value: Mat4) {
    if !sink.set_mat4(name, value) {
        tracing::warn!("uniform `{name}` not found");
    }
}

/// Upload a mesh's model matrix.
pub fn upload_model(sink: &mut impl UniformSink, model: Mat4) {
    set_or_warn(sink, MODEL, model);
}

/// In-memory sink that accepts every name. Used by the debug renderer and
/// in tests.
#[derive(Debug, Clone, Default)]
pub struct RecordingSink {
    values: BTreeMap<String, Mat4>,
    writes: usize,
}

impl RecordingSink {
    pub fn get(&self, name: &str) -> Option<Mat4> {
        self.values.get(name).copied()
    }

    /// Total number of writes, including overwrites.
    pub fn writes(&self) -> usize {
        self.writes
    }
}

impl UniformSink for RecordingSink {
    fn set_mat4(&mut self, name: &str, value: Mat4) -> bool {
        self.values.insert(name.to_string(), value);
        self.writes += 1;
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct ViewOnly(Option<Mat4>);

    impl UniformSink for ViewOnly {
        fn set_mat4(&mut self, name: &str, value: Mat4) -> bool {
            if name == VIEW {
                self.0 = Some(value);
                true
            } else {
                false
            }
        }
    }

    #[test]
    fn missing_slots_are_skipped() {
        let mut sink = ViewOnly(None);
        upload_model(&mut sink, Mat4::IDENTITY);
        set_or_warn(&mut sink, VIEW, Mat4::from_scale(glam::Vec3::splat(2.0)));
        assert_eq!(sink.0, Some(Mat4::from_scale(glam::Vec3::splat(2.0))));
    }

    #[test]
    fn recording_sink_overwrites() {
        let mut sink = RecordingSink::default();
        upload_model(&mut sink, Mat4::IDENTITY);
        upload_model(&mut sink, Mat4::ZERO);
        assert_eq!(sink.get(MODEL), Some(Mat4::ZERO));
        assert_eq!(sink.writes(), 2);
    }
}
